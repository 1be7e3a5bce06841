use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use teloxide::types::MaybeInaccessibleMessage;
use teloxide::utils::command::BotCommands;
use tracing::info;
use vocab_bot::bot::{self, BotServices, Command};
use vocab_bot::config::AppConfig;
use vocab_bot::dialogue::{VocabDialogue, VocabDialogueState};
use vocab_bot::errors::error_logging;
use vocab_bot::localization;
use vocab_bot::observability;
use vocab_bot::observability_config::ObservabilityConfig;
use vocab_bot::storage;
use vocab_bot::tts::TtsClient;

/// Load and validate configuration from the environment
fn load_config() -> Result<AppConfig> {
    let config = AppConfig::from_env().inspect_err(|e| {
        error_logging::log_config_error(e, "environment");
    })?;
    config.validate().inspect_err(|e| {
        error_logging::log_config_error(e, "validation");
    })?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let startup_start = Instant::now();

    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    // Logging must be up before configuration errors can be reported
    let handles = observability::init_observability_with_config(&ObservabilityConfig::from_env())?;

    let config = load_config()?;
    info!("{}", config.summary());

    let store = storage::open_store(&config.storage).await?;
    let _health_metrics_handle = observability::start_health_metrics_recorder(Arc::clone(&store));

    let tts = if config.tts.enabled {
        Some(Arc::new(TtsClient::new(&config.tts)?))
    } else {
        info!("Pronunciation disabled");
        None
    };

    let localization_manager = localization::create_localization_manager()?;

    // Initialize the bot with custom client configuration for better reliability
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.bot.http_timeout_secs))
        .build()?;
    let bot = Bot::with_client(config.bot.token.clone(), client);

    let me = bot.get_me().await?;
    let bot_username = me.user.username.clone().unwrap_or_default();
    info!(bot_username = %bot_username, "Connected to Telegram");

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        error_logging::log_network_error(&e, "set_my_commands", None);
    }

    if config.server.enabled {
        observability::start_health_server(
            &config.server,
            Arc::clone(&store),
            handles.metrics_handle.clone(),
        )
        .await?;
    }

    let services = Arc::new(BotServices {
        store,
        localization: localization_manager,
        tts,
        words_page_size: config.bot.words_page_size,
        bot_username,
    });
    info!(services = ?services, "Bot services ready, starting dispatcher");

    // Create shared dialogue storage
    let dialogue_storage = InMemStorage::<VocabDialogueState>::new();

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let services = Arc::clone(&services);
            let storage = dialogue_storage.clone();
            move |bot: Bot, msg: Message| {
                let services = Arc::clone(&services);
                let dialogue = VocabDialogue::new(storage.clone(), msg.chat.id);
                async move { bot::message_handler(bot, msg, services, dialogue).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let services = Arc::clone(&services);
            let storage = dialogue_storage.clone();
            move |bot: Bot, q: CallbackQuery| {
                let services = Arc::clone(&services);
                // Use the chat ID from the message that contained the inline keyboard
                let chat_id = match &q.message {
                    Some(MaybeInaccessibleMessage::Regular(msg)) => msg.chat.id,
                    Some(MaybeInaccessibleMessage::Inaccessible(msg)) => msg.chat.id,
                    None => ChatId::from(q.from.id),
                };
                let dialogue = VocabDialogue::new(storage.clone(), chat_id);
                async move { bot::callback_handler(bot, q, services, dialogue).await }
            }
        }));

    observability::record_startup_metrics(startup_start.elapsed());

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped, shutting down");
    handles.shutdown();
    Ok(())
}

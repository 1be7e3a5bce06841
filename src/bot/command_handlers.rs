//! Command Handlers module for processing bot commands

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::utils::html;
use tracing::{debug, info};

use super::pronunciation::send_pronunciation;
use super::quiz_handlers::{start_quiz, stop_quiz};
use super::ui_builder::{
    create_clear_confirmation_keyboard, create_words_pagination_keyboard, format_stats,
    format_words_page,
};
use super::{Command, HandlerContext};
use crate::dialogue::VocabDialogue;
use crate::errors::error_logging;
use crate::observability::{self, WordOperation};
use crate::validation::validate_word_argument;

/// Dispatch a parsed command to its handler
pub async fn handle_command(
    ctx: &HandlerContext<'_>,
    msg: &Message,
    command: Command,
    dialogue: &VocabDialogue,
) -> Result<()> {
    debug!(user_id = ctx.user_id, command = command.name(), "Handling command");
    observability::record_command(command.name());

    match command {
        Command::Start => handle_start_command(ctx, msg).await,
        Command::Help => handle_help_command(ctx).await,
        Command::Words => handle_words_command(ctx).await,
        Command::Stats => handle_stats_command(ctx, dialogue).await,
        Command::Quiz => start_quiz(ctx, dialogue).await,
        Command::Stop => handle_stop_command(ctx, dialogue).await,
        Command::Delete(word) => handle_delete_command(ctx, &word).await,
        Command::Clear => handle_clear_command(ctx).await,
        Command::Say(text) => handle_say_command(ctx, &text).await,
    }
}

/// Handle the /start command
pub async fn handle_start_command(ctx: &HandlerContext<'_>, msg: &Message) -> Result<()> {
    let name = msg
        .from
        .as_ref()
        .map(|user| user.first_name.as_str())
        .unwrap_or_default();

    let welcome_message = ctx.t_args("welcome", &[("name", &html::escape(name))]);
    ctx.send_html(welcome_message, None).await?;
    Ok(())
}

/// Handle the /help command
pub async fn handle_help_command(ctx: &HandlerContext<'_>) -> Result<()> {
    ctx.send_html(ctx.t("help"), None).await?;
    Ok(())
}

/// Handle the /words command: first page of the dictionary
pub async fn handle_words_command(ctx: &HandlerContext<'_>) -> Result<()> {
    let page_size = ctx.services.words_page_size;
    let (words, total) = match ctx
        .services
        .store
        .list_words_page(ctx.user_id, page_size, 0)
        .await
    {
        Ok(page) => page,
        Err(e) => {
            error_logging::log_storage_error(
                &e,
                "list_words_page",
                Some(ctx.user_id),
                ctx.services.store.backend_name(),
            );
            ctx.send_html(ctx.t("error-loading"), None).await?;
            return Ok(());
        }
    };

    if total == 0 {
        ctx.send_html(ctx.t("words-empty"), None).await?;
        return Ok(());
    }

    let text = format_words_page(&words, total, ctx.localization(), ctx.language_code);
    let keyboard =
        create_words_pagination_keyboard(0, total, page_size, ctx.localization(), ctx.language_code);
    ctx.send_html(text, keyboard).await?;
    Ok(())
}

/// Handle the /stats command
pub async fn handle_stats_command(ctx: &HandlerContext<'_>, dialogue: &VocabDialogue) -> Result<()> {
    let stats = match ctx.services.store.get_user_stats(ctx.user_id).await {
        Ok(stats) => stats,
        Err(e) => {
            error_logging::log_storage_error(
                &e,
                "get_user_stats",
                Some(ctx.user_id),
                ctx.services.store.backend_name(),
            );
            ctx.send_html(ctx.t("error-loading"), None).await?;
            return Ok(());
        }
    };

    let state = dialogue.get().await?.unwrap_or_default();
    let text = format_stats(
        &stats,
        state.quiz_session(),
        ctx.localization(),
        ctx.language_code,
    );
    ctx.send_html(text, None).await?;
    Ok(())
}

/// Handle the /stop command
pub async fn handle_stop_command(ctx: &HandlerContext<'_>, dialogue: &VocabDialogue) -> Result<()> {
    if !stop_quiz(ctx, dialogue, None).await? {
        ctx.send_html(ctx.t("quiz-no-active"), None).await?;
    }
    Ok(())
}

/// Handle the /delete command
pub async fn handle_delete_command(ctx: &HandlerContext<'_>, argument: &str) -> Result<()> {
    let word = match validate_word_argument(argument) {
        Ok(word) => word,
        Err(key) => {
            ctx.send_html(ctx.t(key), None).await?;
            return Ok(());
        }
    };

    let escaped = html::escape(word);
    match ctx.services.store.delete_word(ctx.user_id, word).await {
        Ok(true) => {
            info!(user_id = ctx.user_id, "Word deleted");
            observability::record_word_operation(WordOperation::Deleted, true);
            ctx.send_html(ctx.t_args("delete-success", &[("word", &escaped)]), None)
                .await?;
        }
        Ok(false) => {
            ctx.send_html(ctx.t_args("delete-not-found", &[("word", &escaped)]), None)
                .await?;
        }
        Err(e) => {
            error_logging::log_storage_error(
                &e,
                "delete_word",
                Some(ctx.user_id),
                ctx.services.store.backend_name(),
            );
            observability::record_word_operation(WordOperation::Deleted, false);
            ctx.send_html(ctx.t("error-generic"), None).await?;
        }
    }
    Ok(())
}

/// Handle the /clear command: ask for confirmation first
pub async fn handle_clear_command(ctx: &HandlerContext<'_>) -> Result<()> {
    let count = match ctx.services.store.count_words(ctx.user_id).await {
        Ok(count) => count,
        Err(e) => {
            error_logging::log_storage_error(
                &e,
                "count_words",
                Some(ctx.user_id),
                ctx.services.store.backend_name(),
            );
            ctx.send_html(ctx.t("error-loading"), None).await?;
            return Ok(());
        }
    };

    if count == 0 {
        ctx.send_html(ctx.t("words-empty"), None).await?;
        return Ok(());
    }

    let text = ctx.t_args("clear-confirm", &[("count", &count.to_string())]);
    let keyboard = create_clear_confirmation_keyboard(ctx.localization(), ctx.language_code);
    ctx.send_html(text, Some(keyboard)).await?;
    Ok(())
}

/// Handle the /say command
pub async fn handle_say_command(ctx: &HandlerContext<'_>, text: &str) -> Result<()> {
    let outcome = send_pronunciation(ctx, text).await?;
    if let Some(key) = outcome.message_key() {
        ctx.send_html(ctx.t(key), None).await?;
    }
    Ok(())
}

/// Handle unsupported message types
pub async fn handle_unsupported_message(ctx: &HandlerContext<'_>) -> Result<()> {
    debug!(user_id = ctx.user_id, "Received unsupported message type from user");
    ctx.send_html(ctx.t("unsupported-message"), None).await?;
    Ok(())
}

/// Handle a slash command the bot does not know
pub async fn handle_unknown_command(ctx: &HandlerContext<'_>, text: &str) -> Result<()> {
    debug!(
        user_id = ctx.user_id,
        command = text.split_whitespace().next().unwrap_or_default(),
        "Unknown command"
    );
    ctx.send_html(ctx.t("unknown-command"), None).await?;
    Ok(())
}

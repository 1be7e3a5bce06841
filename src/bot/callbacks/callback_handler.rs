//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, MaybeInaccessibleMessage};
use tracing::{debug, Instrument};

use super::callback_types::CallbackAction;
use super::{quiz_callbacks, words_callbacks};
use crate::bot::{BotServices, HandlerContext};
use crate::dialogue::VocabDialogue;
use crate::errors::error_logging;
use crate::observability;

/// Handle callback queries from inline keyboards
///
/// The query is always answered so the client stops showing a spinner,
/// with a short toast when the handler has something to say.
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    services: Arc<BotServices>,
    dialogue: VocabDialogue,
) -> Result<()> {
    let user_id = i64::try_from(q.from.id.0).unwrap_or_default();
    let span = observability::telegram_span("callback_handler", Some(user_id));

    async move {
        let start_time = std::time::Instant::now();
        let data = q.data.as_deref().unwrap_or_default();
        let action = CallbackAction::parse(data);
        debug!(user_id, data, ?action, "Received callback query");

        let result = match (action, q.message.as_ref()) {
            (Some(action), Some(MaybeInaccessibleMessage::Regular(message))) => {
                observability::record_callback(action.name());
                let ctx = HandlerContext {
                    bot: &bot,
                    services: &services,
                    chat_id: message.chat.id,
                    user_id,
                    language_code: q.from.language_code.as_deref(),
                };
                route_action(&ctx, &dialogue, action, message.id).await
            }
            // Unknown data or a message too old to edit: just stop the spinner
            _ => Ok(None),
        };

        let notification = match &result {
            Ok(notification) => notification.clone(),
            Err(e) => {
                error_logging::log_internal_error(e, "callback_handler", data, Some(user_id));
                None
            }
        };

        let answer = bot.answer_callback_query(q.id.clone());
        match notification {
            Some(text) => answer.text(text).await?,
            None => answer.await?,
        };

        let status = if result.is_ok() { 200 } else { 500 };
        observability::record_request_metrics("telegram_callback", status, start_time.elapsed());

        result.map(|_| ())
    }
    .instrument(span)
    .await
}

async fn route_action(
    ctx: &HandlerContext<'_>,
    dialogue: &VocabDialogue,
    action: CallbackAction,
    message_id: teloxide::types::MessageId,
) -> Result<Option<String>> {
    match action {
        CallbackAction::QuizAnswer { round, index } => {
            quiz_callbacks::handle_quiz_answer(ctx, dialogue, message_id, round, index).await
        }
        CallbackAction::QuizNext => quiz_callbacks::handle_quiz_next(ctx, dialogue, message_id).await,
        CallbackAction::QuizStop => quiz_callbacks::handle_quiz_stop(ctx, dialogue, message_id).await,
        CallbackAction::QuizSay { round } => {
            quiz_callbacks::handle_quiz_say(ctx, dialogue, round).await
        }
        CallbackAction::WordsPage { page } => {
            words_callbacks::handle_words_page(ctx, message_id, page).await
        }
        CallbackAction::ClearConfirm => {
            words_callbacks::handle_clear_confirm(ctx, dialogue, message_id).await
        }
        CallbackAction::ClearCancel => words_callbacks::handle_clear_cancel(ctx, message_id).await,
        CallbackAction::Noop => Ok(None),
    }
}

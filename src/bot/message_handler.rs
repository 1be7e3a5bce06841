//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;
use tracing::{debug, info, Instrument};

use super::command_handlers::{handle_command, handle_unknown_command, handle_unsupported_message};
use super::quiz_handlers::handle_typed_answer;
use super::{BotServices, Command, HandlerContext};
use crate::dialogue::{VocabDialogue, VocabDialogueState};
use crate::errors::error_logging;
use crate::observability::{self, WordOperation};
use crate::storage::AddOutcome;
use crate::validation::{looks_like_word_pair, parse_word_pair};

/// Dictionary owner of a message: the sender, or the chat itself
pub fn message_user_id(msg: &Message) -> i64 {
    msg.from
        .as_ref()
        .and_then(|user| i64::try_from(user.id.0).ok())
        .unwrap_or(msg.chat.id.0)
}

/// Store a `word-translation` pair and confirm it
async fn handle_add_word(ctx: &HandlerContext<'_>, text: &str) -> Result<()> {
    let (word, translation) = match parse_word_pair(text) {
        Ok(pair) => pair,
        Err(key) => {
            debug!(user_id = ctx.user_id, reason = key, "Rejected word pair");
            observability::record_word_operation(WordOperation::Rejected, true);
            ctx.send_html(ctx.t(key), None).await?;
            return Ok(());
        }
    };

    let escaped_word = html::escape(&word);
    let escaped_translation = html::escape(&translation);

    match ctx
        .services
        .store
        .add_word(ctx.user_id, &word, &translation)
        .await
    {
        Ok(AddOutcome::Added) => {
            info!(user_id = ctx.user_id, "Word added");
            observability::record_word_operation(WordOperation::Added, true);
            let reply = ctx.t_args(
                "add-success",
                &[("word", &escaped_word), ("translation", &escaped_translation)],
            );
            ctx.send_html(reply, None).await?;
        }
        Ok(AddOutcome::Updated {
            previous_translation,
        }) => {
            info!(user_id = ctx.user_id, "Word translation updated");
            observability::record_word_operation(WordOperation::Updated, true);
            let reply = ctx.t_args(
                "add-updated",
                &[
                    ("word", &escaped_word),
                    ("translation", &escaped_translation),
                    ("previous", &html::escape(&previous_translation)),
                ],
            );
            ctx.send_html(reply, None).await?;
        }
        Err(e) => {
            error_logging::log_storage_error(
                &e,
                "add_word",
                Some(ctx.user_id),
                ctx.services.store.backend_name(),
            );
            observability::record_word_operation(WordOperation::Added, false);
            ctx.send_html(ctx.t("error-saving"), None).await?;
        }
    }

    Ok(())
}

/// Where a plain text message goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRoute {
    Command,
    QuizAnswer,
    AddWord,
    FormatHint,
}

/// Decide how to handle `text` given the chat's dialogue state.
/// A `word-translation` pair is always stored, even while a question is open.
pub fn route_text(state: &VocabDialogueState, text: &str) -> TextRoute {
    if text.starts_with('/') {
        TextRoute::Command
    } else if looks_like_word_pair(text) {
        TextRoute::AddWord
    } else if state.awaiting_quiz_answer() {
        TextRoute::QuizAnswer
    } else {
        TextRoute::FormatHint
    }
}

async fn handle_text_message(
    ctx: &HandlerContext<'_>,
    msg: &Message,
    text: &str,
    dialogue: &VocabDialogue,
) -> Result<()> {
    debug!(user_id = ctx.user_id, message_length = text.len(), "Received text message from user");

    let state = dialogue.get().await?.unwrap_or_default();
    match route_text(&state, text) {
        TextRoute::Command => match Command::parse(text, &ctx.services.bot_username) {
            Ok(command) => handle_command(ctx, msg, command, dialogue).await,
            Err(_) => handle_unknown_command(ctx, text).await,
        },
        TextRoute::QuizAnswer => match state {
            VocabDialogueState::Quiz { session, .. } => {
                handle_typed_answer(ctx, dialogue, session, text).await
            }
            VocabDialogueState::Idle => Ok(()),
        },
        TextRoute::AddWord => handle_add_word(ctx, text).await,
        TextRoute::FormatHint => {
            ctx.send_html(ctx.t("add-format-hint"), None).await?;
            Ok(())
        }
    }
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    services: Arc<BotServices>,
    dialogue: VocabDialogue,
) -> Result<()> {
    let user_id = message_user_id(&msg);
    let span = observability::telegram_span("message_handler", Some(user_id));

    async move {
        let start_time = std::time::Instant::now();
        let message_type = if msg.text().is_some() {
            "text"
        } else {
            "unsupported"
        };
        observability::record_telegram_message(message_type);

        let ctx = HandlerContext {
            bot: &bot,
            services: &services,
            chat_id: msg.chat.id,
            user_id,
            language_code: msg
                .from
                .as_ref()
                .and_then(|user| user.language_code.as_deref()),
        };

        let result = match msg.text() {
            Some(text) => handle_text_message(&ctx, &msg, text, &dialogue).await,
            None => handle_unsupported_message(&ctx).await,
        };

        let status = if result.is_ok() { 200 } else { 500 };
        observability::record_request_metrics("telegram_message", status, start_time.elapsed());

        if let Err(e) = &result {
            error_logging::log_internal_error(e, "message_handler", message_type, Some(user_id));
        }
        result
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuizSession;
    use crate::storage::WordPair;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiz_state(answered: bool) -> VocabDialogueState {
        let words: Vec<WordPair> = [("cat", "кошка"), ("dog", "собака"), ("sun", "солнце")]
            .into_iter()
            .map(|(word, translation)| WordPair {
                user_id: 1,
                word: word.to_string(),
                translation: translation.to_string(),
                created_at: Utc::now(),
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = QuizSession::for_user(1);
        let round = session.next_question(&words, &mut rng).unwrap().round;
        if answered {
            session.answer_option(round, 0).unwrap();
        }
        VocabDialogueState::Quiz {
            session,
            message_id: Some(1),
        }
    }

    #[test]
    fn test_plain_text_answers_open_question() {
        assert_eq!(route_text(&quiz_state(false), "кошка"), TextRoute::QuizAnswer);
    }

    #[test]
    fn test_word_pair_is_added_during_quiz() {
        assert_eq!(route_text(&quiz_state(false), "tree - дерево"), TextRoute::AddWord);
        assert_eq!(route_text(&VocabDialogueState::Idle, "tree-дерево"), TextRoute::AddWord);
    }

    #[test]
    fn test_plain_text_without_question_gets_hint() {
        assert_eq!(route_text(&VocabDialogueState::Idle, "hello"), TextRoute::FormatHint);
        assert_eq!(route_text(&quiz_state(true), "кошка"), TextRoute::FormatHint);
    }

    #[test]
    fn test_slash_text_is_a_command() {
        assert_eq!(route_text(&VocabDialogueState::Idle, "/words"), TextRoute::Command);
        assert_eq!(route_text(&quiz_state(false), "/stop"), TextRoute::Command);
    }
}

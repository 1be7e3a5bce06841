//! Quiz flow shared by `/quiz`, `/stop`, typed answers and quiz buttons

use anyhow::Result;
use teloxide::types::MessageId;
use tracing::{debug, info};

use super::ui_builder::{
    create_quiz_question_keyboard, create_quiz_result_keyboard, format_quiz_question,
    format_quiz_result, format_quiz_score,
};
use super::HandlerContext;
use crate::dialogue::{VocabDialogue, VocabDialogueState};
use crate::errors::error_logging;
use crate::observability;
use crate::quiz::{AnswerOutcome, QuizError, QuizSession};
use crate::storage::WordPair;

/// Dictionary a quiz draws from: its starter, or `presser` for sessions without one
pub fn quiz_words_owner(session: &QuizSession, presser: i64) -> i64 {
    if session.owner_id == 0 {
        presser
    } else {
        session.owner_id
    }
}

/// Load `owner_id`'s words, replying with an error message on failure
async fn load_words(ctx: &HandlerContext<'_>, owner_id: i64) -> Result<Option<Vec<WordPair>>> {
    match ctx.services.store.list_words(owner_id).await {
        Ok(words) => Ok(Some(words)),
        Err(e) => {
            error_logging::log_storage_error(
                &e,
                "list_words",
                Some(owner_id),
                ctx.services.store.backend_name(),
            );
            ctx.send_html(ctx.t("error-loading"), None).await?;
            Ok(None)
        }
    }
}

/// Send a message, or edit `target` when given
async fn show(
    ctx: &HandlerContext<'_>,
    target: Option<MessageId>,
    text: String,
    keyboard: Option<teloxide::types::InlineKeyboardMarkup>,
) -> Result<MessageId> {
    let message = match target {
        Some(message_id) => ctx.edit_html(message_id, text, keyboard).await?,
        None => ctx.send_html(text, keyboard).await?,
    };
    Ok(message.id)
}

/// Start a fresh quiz, replacing any running one
pub async fn start_quiz(ctx: &HandlerContext<'_>, dialogue: &VocabDialogue) -> Result<()> {
    observability::record_quiz_session(true);
    show_next_question(ctx, dialogue, QuizSession::for_user(ctx.user_id), None).await
}

/// Generate the next question of `session` and show it
///
/// With too few usable words the quiz ends and the chat returns to idle.
pub async fn show_next_question(
    ctx: &HandlerContext<'_>,
    dialogue: &VocabDialogue,
    mut session: QuizSession,
    target: Option<MessageId>,
) -> Result<()> {
    let owner_id = quiz_words_owner(&session, ctx.user_id);
    let Some(words) = load_words(ctx, owner_id).await? else {
        return Ok(());
    };

    // The RNG is not Send, so it must not live across an await
    let question = session.next_question(&words, &mut rand::rng()).cloned();

    match question {
        Ok(question) => {
            debug!(
                user_id = ctx.user_id,
                owner_id,
                round = question.round,
                options = question.options.len(),
                "Quiz question generated"
            );
            let text = format_quiz_question(&question, ctx.localization(), ctx.language_code);
            let keyboard = create_quiz_question_keyboard(
                &question,
                ctx.services.tts.is_some(),
                ctx.localization(),
                ctx.language_code,
            );
            let message_id = show(ctx, target, text, Some(keyboard)).await?;

            dialogue
                .update(VocabDialogueState::Quiz {
                    session,
                    message_id: Some(message_id.0),
                })
                .await?;
        }
        Err(QuizError::NotEnoughWords {
            available,
            required,
        }) => {
            info!(user_id = ctx.user_id, available, "Not enough words for a quiz");
            let text = ctx.t_args(
                "quiz-not-enough",
                &[
                    ("count", &available.to_string()),
                    ("required", &required.to_string()),
                ],
            );
            show(ctx, target, text, None).await?;
            dialogue.update(VocabDialogueState::Idle).await?;
        }
        Err(e) => {
            error_logging::log_internal_error(&e, "quiz", "next_question", Some(ctx.user_id));
            show(ctx, target, ctx.t("error-generic"), None).await?;
        }
    }

    Ok(())
}

/// Show the verdict for an answered question with Next/Stop buttons
pub async fn show_answer_result(
    ctx: &HandlerContext<'_>,
    dialogue: &VocabDialogue,
    session: QuizSession,
    outcome: AnswerOutcome,
    target: Option<MessageId>,
) -> Result<()> {
    observability::record_quiz_answer(outcome.is_correct());

    let Some(question) = session.question.as_ref() else {
        return Ok(());
    };
    debug!(
        user_id = ctx.user_id,
        round = question.round,
        correct = outcome.is_correct(),
        "Quiz answer scored"
    );

    let text = format_quiz_result(
        question,
        &outcome,
        &session,
        ctx.localization(),
        ctx.language_code,
    );
    let keyboard = create_quiz_result_keyboard(ctx.localization(), ctx.language_code);
    let message_id = show(ctx, target, text, Some(keyboard)).await?;

    dialogue
        .update(VocabDialogueState::Quiz {
            session,
            message_id: Some(message_id.0),
        })
        .await?;
    Ok(())
}

/// Score a typed answer to the open question
pub async fn handle_typed_answer(
    ctx: &HandlerContext<'_>,
    dialogue: &VocabDialogue,
    mut session: QuizSession,
    text: &str,
) -> Result<()> {
    match session.answer_text(text) {
        Ok(outcome) => show_answer_result(ctx, dialogue, session, outcome, None).await,
        Err(e) => {
            debug!(user_id = ctx.user_id, error = %e, "Typed answer ignored");
            ctx.send_html(ctx.t("quiz-already-answered"), None).await?;
            Ok(())
        }
    }
}

/// End the running quiz and show the final score
///
/// Returns `false` when there was no quiz to stop.
pub async fn stop_quiz(
    ctx: &HandlerContext<'_>,
    dialogue: &VocabDialogue,
    target: Option<MessageId>,
) -> Result<bool> {
    let state = dialogue.get().await?.unwrap_or_default();
    let VocabDialogueState::Quiz { session, .. } = state else {
        return Ok(false);
    };

    observability::record_quiz_session(false);
    info!(
        user_id = ctx.user_id,
        answered = session.answered,
        correct = session.correct_answers,
        "Quiz finished"
    );

    let text = format!(
        "{}\n\n{}",
        ctx.t("quiz-finished"),
        format_quiz_score(&session, ctx.localization(), ctx.language_code)
    );
    show(ctx, target, text, None).await?;
    dialogue.update(VocabDialogueState::Idle).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_words_come_from_starter() {
        let session = QuizSession::for_user(100);
        assert_eq!(quiz_words_owner(&session, 100), 100);
        assert_eq!(quiz_words_owner(&session, 200), 100, "another member pressed Next");
    }

    #[test]
    fn test_session_without_owner_uses_presser() {
        assert_eq!(quiz_words_owner(&QuizSession::default(), 300), 300);
    }
}

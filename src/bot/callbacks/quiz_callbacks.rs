//! Quiz callback handlers module
//!
//! Every handler returns the text of the toast shown to the user, if any.

use anyhow::Result;
use teloxide::types::MessageId;
use tracing::debug;

use crate::bot::pronunciation::send_pronunciation;
use crate::bot::quiz_handlers::{show_answer_result, show_next_question, stop_quiz};
use crate::bot::HandlerContext;
use crate::dialogue::{VocabDialogue, VocabDialogueState};
use crate::quiz::{QuizError, QuizSession};

/// Running quiz of the chat, if any
async fn current_session(dialogue: &VocabDialogue) -> Result<Option<QuizSession>> {
    match dialogue.get().await?.unwrap_or_default() {
        VocabDialogueState::Quiz { session, .. } => Ok(Some(session)),
        VocabDialogueState::Idle => Ok(None),
    }
}

/// Handle a press on one of the answer options
pub async fn handle_quiz_answer(
    ctx: &HandlerContext<'_>,
    dialogue: &VocabDialogue,
    message_id: MessageId,
    round: u32,
    index: usize,
) -> Result<Option<String>> {
    let Some(mut session) = current_session(dialogue).await? else {
        return Ok(Some(ctx.t("quiz-no-active")));
    };

    let outcome = match session.answer_option(round, index) {
        Ok(outcome) => outcome,
        Err(QuizError::AlreadyAnswered) => return Ok(Some(ctx.t("quiz-already-answered"))),
        Err(e) => {
            debug!(user_id = ctx.user_id, error = %e, "Rejected quiz answer");
            return Ok(Some(ctx.t("quiz-stale")));
        }
    };

    let notification = if outcome.is_correct() {
        "✅"
    } else {
        "❌"
    };
    show_answer_result(ctx, dialogue, session, outcome, Some(message_id)).await?;
    Ok(Some(notification.to_string()))
}

/// Handle the "Next" button
pub async fn handle_quiz_next(
    ctx: &HandlerContext<'_>,
    dialogue: &VocabDialogue,
    message_id: MessageId,
) -> Result<Option<String>> {
    let Some(session) = current_session(dialogue).await? else {
        return Ok(Some(ctx.t("quiz-no-active")));
    };

    if session.awaiting_answer() {
        // The open question was already replaced by a newer keyboard
        return Ok(Some(ctx.t("quiz-stale")));
    }

    show_next_question(ctx, dialogue, session, Some(message_id)).await?;
    Ok(None)
}

/// Handle the "Stop" button
pub async fn handle_quiz_stop(
    ctx: &HandlerContext<'_>,
    dialogue: &VocabDialogue,
    message_id: MessageId,
) -> Result<Option<String>> {
    if stop_quiz(ctx, dialogue, Some(message_id)).await? {
        Ok(None)
    } else {
        Ok(Some(ctx.t("quiz-no-active")))
    }
}

/// Handle the "Listen" button of a question
pub async fn handle_quiz_say(
    ctx: &HandlerContext<'_>,
    dialogue: &VocabDialogue,
    round: u32,
) -> Result<Option<String>> {
    let Some(session) = current_session(dialogue).await? else {
        return Ok(Some(ctx.t("quiz-no-active")));
    };

    let Some(question) = session.question.filter(|q| q.round == round) else {
        return Ok(Some(ctx.t("quiz-stale")));
    };

    let outcome = send_pronunciation(ctx, &question.word).await?;
    Ok(outcome.message_key().map(|key| ctx.t(key)))
}

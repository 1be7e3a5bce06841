//! Per-chat conversation state kept in teloxide's dialogue storage.

use crate::quiz::QuizSession;
use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Represents the conversation state of a chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum VocabDialogueState {
    /// Plain text adds word pairs
    #[default]
    Idle,
    /// A quiz is running; plain text without a separator is an answer
    Quiz {
        session: QuizSession,
        message_id: Option<i32>, // ID of the question message to edit
    },
}

impl VocabDialogueState {
    /// The running quiz session, if any
    pub fn quiz_session(&self) -> Option<&QuizSession> {
        match self {
            VocabDialogueState::Quiz { session, .. } => Some(session),
            VocabDialogueState::Idle => None,
        }
    }

    /// Whether plain text should be treated as a quiz answer
    pub fn awaiting_quiz_answer(&self) -> bool {
        self.quiz_session().is_some_and(QuizSession::awaiting_answer)
    }
}

/// Type alias for our vocabulary dialogue
pub type VocabDialogue = Dialogue<VocabDialogueState, InMemStorage<VocabDialogueState>>;

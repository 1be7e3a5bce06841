//! Callback data carried by inline keyboard buttons
//!
//! Telegram limits callback data to 64 bytes, so buttons carry short
//! prefixed strings instead of the word itself.

use std::fmt;

/// Page navigation prefix for `/words`
pub const WORDS_PAGE_PREFIX: &str = "words:page:";

/// Every action an inline button can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Pick option `index` of the question in `round`
    QuizAnswer { round: u32, index: usize },
    /// Ask the next question
    QuizNext,
    /// End the quiz and show the score
    QuizStop,
    /// Pronounce the word of the question in `round`
    QuizSay { round: u32 },
    /// Show page `page` of the word list
    WordsPage { page: usize },
    ClearConfirm,
    ClearCancel,
    /// Informational button, nothing to do
    Noop,
}

impl CallbackAction {
    /// Parse callback data; unknown or malformed data yields `None`
    pub fn parse(data: &str) -> Option<Self> {
        let parts: Vec<&str> = data.split(':').collect();
        match parts.as_slice() {
            ["quiz", "a", round, index] => Some(CallbackAction::QuizAnswer {
                round: round.parse().ok()?,
                index: index.parse().ok()?,
            }),
            ["quiz", "next"] => Some(CallbackAction::QuizNext),
            ["quiz", "stop"] => Some(CallbackAction::QuizStop),
            ["quiz", "say", round] => Some(CallbackAction::QuizSay {
                round: round.parse().ok()?,
            }),
            ["words", "page", page] => Some(CallbackAction::WordsPage {
                page: page.parse().ok()?,
            }),
            ["clear", "confirm"] => Some(CallbackAction::ClearConfirm),
            ["clear", "cancel"] => Some(CallbackAction::ClearCancel),
            ["noop"] => Some(CallbackAction::Noop),
            _ => None,
        }
    }

    /// Callback data string for this action
    pub fn data(&self) -> String {
        self.to_string()
    }

    /// Label used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            CallbackAction::QuizAnswer { .. } => "quiz_answer",
            CallbackAction::QuizNext => "quiz_next",
            CallbackAction::QuizStop => "quiz_stop",
            CallbackAction::QuizSay { .. } => "quiz_say",
            CallbackAction::WordsPage { .. } => "words_page",
            CallbackAction::ClearConfirm => "clear_confirm",
            CallbackAction::ClearCancel => "clear_cancel",
            CallbackAction::Noop => "noop",
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::QuizAnswer { round, index } => write!(f, "quiz:a:{}:{}", round, index),
            CallbackAction::QuizNext => write!(f, "quiz:next"),
            CallbackAction::QuizStop => write!(f, "quiz:stop"),
            CallbackAction::QuizSay { round } => write!(f, "quiz:say:{}", round),
            CallbackAction::WordsPage { page } => write!(f, "{}{}", WORDS_PAGE_PREFIX, page),
            CallbackAction::ClearConfirm => write!(f, "clear:confirm"),
            CallbackAction::ClearCancel => write!(f, "clear:cancel"),
            CallbackAction::Noop => write!(f, "noop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_actions() {
        assert_eq!(
            CallbackAction::parse("quiz:a:12:3"),
            Some(CallbackAction::QuizAnswer { round: 12, index: 3 })
        );
        assert_eq!(CallbackAction::parse("quiz:next"), Some(CallbackAction::QuizNext));
        assert_eq!(
            CallbackAction::parse("quiz:say:4"),
            Some(CallbackAction::QuizSay { round: 4 })
        );
        assert_eq!(
            CallbackAction::parse("words:page:2"),
            Some(CallbackAction::WordsPage { page: 2 })
        );
        assert_eq!(CallbackAction::parse("noop"), Some(CallbackAction::Noop));
    }

    #[test]
    fn test_parse_rejects_malformed_data() {
        assert_eq!(CallbackAction::parse(""), None);
        assert_eq!(CallbackAction::parse("quiz:a:x:1"), None);
        assert_eq!(CallbackAction::parse("quiz:a:1"), None);
        assert_eq!(CallbackAction::parse("words:page:-1"), None);
        assert_eq!(CallbackAction::parse("page:2"), None);
    }

    #[test]
    fn test_data_matches_parse() {
        let actions = [
            CallbackAction::QuizAnswer { round: 1, index: 0 },
            CallbackAction::QuizStop,
            CallbackAction::WordsPage { page: 7 },
            CallbackAction::ClearCancel,
        ];
        for action in actions {
            assert_eq!(CallbackAction::parse(&action.data()), Some(action));
            assert!(action.data().len() <= 64);
        }
    }
}

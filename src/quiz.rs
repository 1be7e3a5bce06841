//! Vocabulary quiz state machine
//!
//! A [`QuizSession`] shows one stored word at a time together with a shuffled
//! set of translations: the correct one plus distractors taken from the
//! dictionary of the user who started it. The session only lives in the
//! chat's dialogue state, so it is lost on restart.
//!
//! ```text
//! for_user() ──next_question()──► question open ──answer_*()──► answered
//!                                  ▲                           │
//!                                  └──────next_question()──────┘
//! ```

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::storage::WordPair;

/// Maximum number of answer options per question
pub const OPTION_COUNT: usize = 4;

/// A quiz needs at least this many stored words
pub const MIN_QUIZ_WORDS: usize = 2;

/// One question of a quiz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Sequence number used to reject presses on old keyboards
    pub round: u32,
    pub word: String,
    pub correct_translation: String,
    /// Shuffled options, always containing `correct_translation`
    pub options: Vec<String>,
    pub answered: bool,
}

impl QuizQuestion {
    /// Index of the correct option
    pub fn correct_index(&self) -> usize {
        self.options
            .iter()
            .position(|o| o == &self.correct_translation)
            .unwrap_or_default()
    }
}

/// Result of an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect { expected: String },
}

impl AnswerOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerOutcome::Correct)
    }
}

/// Reasons a quiz step cannot proceed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    /// Fewer than `required` distinct translations; `available` counts them
    NotEnoughWords { available: usize, required: usize },
    /// No question has been generated yet
    NoActiveQuestion,
    /// The button belongs to an earlier question
    StaleRound { expected: u32, got: u32 },
    /// The current question was already scored
    AlreadyAnswered,
    /// Callback data pointed past the option list
    OptionOutOfRange(usize),
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizError::NotEnoughWords {
                available,
                required,
            } => write!(
                f,
                "not enough distinct words for a quiz ({} available, {} required)",
                available, required
            ),
            QuizError::NoActiveQuestion => write!(f, "no active question"),
            QuizError::StaleRound { expected, got } => {
                write!(f, "stale answer for round {} (current round {})", got, expected)
            }
            QuizError::AlreadyAnswered => write!(f, "question already answered"),
            QuizError::OptionOutOfRange(index) => write!(f, "option {} out of range", index),
        }
    }
}

impl std::error::Error for QuizError {}

/// Build a question for `round` from the user's words
///
/// Picks a random word, avoiding `avoid_word` when another word is available,
/// then adds up to `OPTION_COUNT - 1` distractors whose translations differ
/// (case-insensitively) from the correct one and from each other.
pub fn build_question<R: Rng + ?Sized>(
    words: &[WordPair],
    round: u32,
    avoid_word: Option<&str>,
    rng: &mut R,
) -> Result<QuizQuestion, QuizError> {
    let available = distinct_translations(words);
    let not_enough = QuizError::NotEnoughWords {
        available,
        required: MIN_QUIZ_WORDS,
    };

    if available < MIN_QUIZ_WORDS {
        return Err(not_enough);
    }

    // Only words that have at least one usable distractor can be asked
    let askable: Vec<&WordPair> = words
        .iter()
        .filter(|candidate| {
            words
                .iter()
                .any(|other| !same_translation(&other.translation, &candidate.translation))
        })
        .collect();

    let preferred: Vec<&WordPair> = askable
        .iter()
        .copied()
        .filter(|w| avoid_word.is_none_or(|avoid| !w.word.eq_ignore_ascii_case(avoid)))
        .collect();

    let pool = if preferred.is_empty() {
        &askable
    } else {
        &preferred
    };
    let target = *pool.choose(rng).ok_or(not_enough)?;

    let mut distractors: Vec<&str> = Vec::new();
    for candidate in words {
        if same_translation(&candidate.translation, &target.translation) {
            continue;
        }
        if distractors
            .iter()
            .any(|d| same_translation(d, &candidate.translation))
        {
            continue;
        }
        distractors.push(candidate.translation.as_str());
    }

    let mut options: Vec<String> = distractors
        .choose_multiple(rng, OPTION_COUNT - 1)
        .map(|d| d.to_string())
        .collect();
    options.push(target.translation.clone());
    options.shuffle(rng);

    Ok(QuizQuestion {
        round,
        word: target.word.clone(),
        correct_translation: target.translation.clone(),
        options,
        answered: false,
    })
}

fn normalize_translation(translation: &str) -> String {
    translation.trim().to_lowercase()
}

fn same_translation(a: &str, b: &str) -> bool {
    normalize_translation(a) == normalize_translation(b)
}

/// Number of translations that differ case-insensitively
pub fn distinct_translations(words: &[WordPair]) -> usize {
    words
        .iter()
        .map(|w| normalize_translation(&w.translation))
        .collect::<HashSet<_>>()
        .len()
}

/// Score and current question of one chat's quiz
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizSession {
    /// User whose dictionary supplies the questions
    #[serde(default)]
    pub owner_id: i64,
    pub round: u32,
    pub correct_answers: u32,
    pub answered: u32,
    pub question: Option<QuizQuestion>,
}

impl QuizSession {
    /// Start an empty session over `owner_id`'s words
    pub fn for_user(owner_id: i64) -> Self {
        Self {
            owner_id,
            ..Self::default()
        }
    }

    /// Generate the next question, replacing the current one
    ///
    /// An unanswered question is simply dropped; it does not count as a
    /// wrong answer.
    pub fn next_question<R: Rng + ?Sized>(
        &mut self,
        words: &[WordPair],
        rng: &mut R,
    ) -> Result<&QuizQuestion, QuizError> {
        let previous_word = self.question.as_ref().map(|q| q.word.clone());
        let question = build_question(words, self.round + 1, previous_word.as_deref(), rng)?;
        self.round = question.round;
        Ok(&*self.question.insert(question))
    }

    /// Answer the current question by option index
    pub fn answer_option(&mut self, round: u32, index: usize) -> Result<AnswerOutcome, QuizError> {
        let question = self.question.as_ref().ok_or(QuizError::NoActiveQuestion)?;
        if question.round != round {
            return Err(QuizError::StaleRound {
                expected: question.round,
                got: round,
            });
        }
        let chosen = question
            .options
            .get(index)
            .ok_or(QuizError::OptionOutOfRange(index))?
            .clone();
        self.score(&chosen)
    }

    /// Answer the current question with typed text
    pub fn answer_text(&mut self, text: &str) -> Result<AnswerOutcome, QuizError> {
        self.score(text)
    }

    fn score(&mut self, answer: &str) -> Result<AnswerOutcome, QuizError> {
        let question = self.question.as_mut().ok_or(QuizError::NoActiveQuestion)?;
        if question.answered {
            return Err(QuizError::AlreadyAnswered);
        }
        question.answered = true;
        self.answered += 1;

        if same_translation(answer, &question.correct_translation) {
            self.correct_answers += 1;
            Ok(AnswerOutcome::Correct)
        } else {
            Ok(AnswerOutcome::Incorrect {
                expected: question.correct_translation.clone(),
            })
        }
    }

    /// Whether a question is waiting for an answer
    pub fn awaiting_answer(&self) -> bool {
        self.question.as_ref().is_some_and(|q| !q.answered)
    }

    /// Share of correct answers, rounded down, 0 when nothing was answered
    pub fn accuracy_percent(&self) -> u32 {
        if self.answered == 0 {
            0
        } else {
            self.correct_answers * 100 / self.answered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pair(word: &str, translation: &str) -> WordPair {
        WordPair {
            user_id: 1,
            word: word.to_string(),
            translation: translation.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_correct_index_points_at_translation() {
        let question = QuizQuestion {
            round: 1,
            word: "cat".to_string(),
            correct_translation: "кошка".to_string(),
            options: vec!["собака".to_string(), "кошка".to_string()],
            answered: false,
        };
        assert_eq!(question.correct_index(), 1);
    }

    #[test]
    fn test_single_word_is_not_enough() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = build_question(&[pair("cat", "кошка")], 1, None, &mut rng);
        assert_eq!(
            result,
            Err(QuizError::NotEnoughWords {
                available: 1,
                required: MIN_QUIZ_WORDS
            })
        );
    }

    #[test]
    fn test_shared_translations_count_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let words = [
            pair("big", "большой"),
            pair("large", "Большой"),
            pair("huge", " большой "),
        ];
        assert_eq!(distinct_translations(&words), 1);
        assert_eq!(
            build_question(&words, 1, None, &mut rng),
            Err(QuizError::NotEnoughWords {
                available: 1,
                required: MIN_QUIZ_WORDS
            })
        );
    }

    #[test]
    fn test_session_keeps_owner_across_questions() {
        let mut rng = StdRng::seed_from_u64(11);
        let words = [pair("cat", "кошка"), pair("dog", "собака")];
        let mut session = QuizSession::for_user(42);
        session.next_question(&words, &mut rng).unwrap();
        session.answer_option(1, 0).unwrap();
        session.next_question(&words, &mut rng).unwrap();
        assert_eq!(session.owner_id, 42);
        assert_eq!(session.round, 2);
    }

    #[test]
    fn test_session_without_owner_deserializes() {
        let session: QuizSession = serde_json::from_str(
            r#"{"round":0,"correct_answers":0,"answered":0,"question":null}"#,
        )
        .unwrap();
        assert_eq!(session, QuizSession::for_user(0));
    }

    #[test]
    fn test_accuracy_percent() {
        let mut session = QuizSession::for_user(1);
        assert_eq!(session.accuracy_percent(), 0);
        session.answered = 3;
        session.correct_answers = 2;
        assert_eq!(session.accuracy_percent(), 66);
    }
}

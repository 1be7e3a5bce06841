//! # Vocabulary Telegram Bot
//!
//! A Telegram bot that keeps a personal English-Russian dictionary for each
//! user, quizzes them on it with inline keyboards and pronounces words
//! through a text-to-speech service. Word pairs live in SQLite or in a
//! single JSON file.

pub mod bot;
pub mod circuit_breaker;
pub mod config;
pub mod dialogue;
pub mod errors;
pub mod localization;
pub mod observability;
pub mod observability_config;
pub mod quiz;
pub mod storage;
pub mod tts;
pub mod validation;

// Re-export types for easier access
pub use quiz::{AnswerOutcome, QuizQuestion, QuizSession};
pub use storage::{AddOutcome, UserStats, VocabularyStore, WordPair};

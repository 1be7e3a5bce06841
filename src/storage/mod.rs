//! Vocabulary persistence
//!
//! Word pairs are kept behind the [`VocabularyStore`] trait so the bot can
//! run against either a SQLite database or a single JSON file:
//!
//! - [`sqlite::SqliteStore`]: one `user_vocabulary` table keyed by `(user_id, word)`
//! - [`json::JsonStore`]: one file holding every user's list, rewritten on each mutation

pub mod json;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};

pub use json::JsonStore;
pub use sqlite::SqliteStore;

/// A stored word and its translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPair {
    pub user_id: i64,
    pub word: String,
    pub translation: String,
    pub created_at: DateTime<Utc>,
}

/// Result of adding a word pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The word was not in the user's dictionary yet
    Added,
    /// The word existed and its translation was replaced
    Updated { previous_translation: String },
}

/// Aggregate numbers shown by `/stats`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserStats {
    pub total_words: i64,
    pub distinct_translations: i64,
    pub last_added: Option<WordPair>,
}

/// Persistence operations the bot needs
///
/// Words are unique per user, compared ASCII-case-insensitively. Listing
/// operations return the newest pairs first.
#[async_trait]
pub trait VocabularyStore: Send + Sync {
    /// Insert a word pair, replacing the translation of an existing word
    async fn add_word(&self, user_id: i64, word: &str, translation: &str) -> Result<AddOutcome>;

    /// Remove a word; returns `false` if it was not stored
    async fn delete_word(&self, user_id: i64, word: &str) -> Result<bool>;

    /// Look up a single word
    async fn get_word(&self, user_id: i64, word: &str) -> Result<Option<WordPair>>;

    /// All word pairs of a user, newest first
    async fn list_words(&self, user_id: i64) -> Result<Vec<WordPair>>;

    /// One page of word pairs plus the user's total count
    async fn list_words_page(
        &self,
        user_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<WordPair>, i64)>;

    /// Number of stored word pairs
    async fn count_words(&self, user_id: i64) -> Result<i64>;

    /// Statistics for `/stats`
    async fn get_user_stats(&self, user_id: i64) -> Result<UserStats>;

    /// Delete every word of a user, returning how many were removed
    async fn clear_words(&self, user_id: i64) -> Result<u64>;

    /// Cheap probe used by the readiness endpoint
    async fn health_check(&self) -> Result<()>;

    /// Short backend name for logs and metrics
    fn backend_name(&self) -> &'static str;
}

/// Open the backend selected in the configuration
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn VocabularyStore>> {
    let store: Arc<dyn VocabularyStore> = match config.backend {
        StorageBackend::Sqlite => {
            Arc::new(SqliteStore::connect(&config.database_url, config.max_connections).await?)
        }
        StorageBackend::Json => Arc::new(JsonStore::open(&config.json_path).await?),
    };
    info!(backend = store.backend_name(), "Vocabulary store opened");
    Ok(store)
}

/// Case-insensitive word comparison shared by both backends
///
/// Mirrors SQLite's `NOCASE` collation, which folds ASCII letters only.
pub(crate) fn same_word(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Count distinct translations ignoring case and surrounding whitespace
pub(crate) fn distinct_translation_count<'a>(translations: impl Iterator<Item = &'a str>) -> i64 {
    translations
        .map(|t| t.trim().to_lowercase())
        .collect::<HashSet<_>>()
        .len() as i64
}

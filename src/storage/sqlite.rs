//! SQLite backend built on `sqlx`

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info};

use super::{distinct_translation_count, AddOutcome, UserStats, VocabularyStore, WordPair};
use crate::observability;

/// Word pairs stored in a single `user_vocabulary` table
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to the database at `url`, creating the file and schema if needed
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        info!(max_connections, "Initializing SQLite connection pool");

        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid SQLite URL: {}", url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to open SQLite database")?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create the vocabulary table
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS user_vocabulary (
                user_id INTEGER NOT NULL,
                word TEXT NOT NULL COLLATE NOCASE,
                translation TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, word)
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create user_vocabulary table")?;

        info!("Database schema initialized successfully");
        Ok(())
    }
}

// Rows are listed by rowid: upserts keep it, so it follows creation order
// without depending on how timestamps compare as text.
fn row_to_word_pair(row: &SqliteRow) -> Result<WordPair> {
    Ok(WordPair {
        user_id: row.try_get("user_id")?,
        word: row.try_get("word")?,
        translation: row.try_get("translation")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl VocabularyStore for SqliteStore {
    async fn add_word(&self, user_id: i64, word: &str, translation: &str) -> Result<AddOutcome> {
        let start = Instant::now();
        debug!(user_id = %user_id, "Adding word pair");

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let previous: Option<String> = sqlx::query_scalar(
            "SELECT translation FROM user_vocabulary WHERE user_id = ?1 AND word = ?2",
        )
        .bind(user_id)
        .bind(word)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to look up existing word")?;

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO user_vocabulary (user_id, word, translation, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(user_id, word) DO UPDATE SET
                word = excluded.word,
                translation = excluded.translation,
                updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(word)
        .bind(translation)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to upsert word pair")?;

        tx.commit().await.context("Failed to commit word pair")?;

        observability::record_storage_metrics("add_word", self.backend_name(), start.elapsed());
        info!(user_id = %user_id, updated = previous.is_some(), "Word pair stored");

        Ok(match previous {
            Some(previous_translation) => AddOutcome::Updated {
                previous_translation,
            },
            None => AddOutcome::Added,
        })
    }

    async fn delete_word(&self, user_id: i64, word: &str) -> Result<bool> {
        let start = Instant::now();
        debug!(user_id = %user_id, "Deleting word");

        let result = sqlx::query("DELETE FROM user_vocabulary WHERE user_id = ?1 AND word = ?2")
            .bind(user_id)
            .bind(word)
            .execute(&self.pool)
            .await
            .context("Failed to delete word")?;

        observability::record_storage_metrics("delete_word", self.backend_name(), start.elapsed());
        Ok(result.rows_affected() > 0)
    }

    async fn get_word(&self, user_id: i64, word: &str) -> Result<Option<WordPair>> {
        let row = sqlx::query(
            "SELECT user_id, word, translation, created_at FROM user_vocabulary
             WHERE user_id = ?1 AND word = ?2",
        )
        .bind(user_id)
        .bind(word)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read word")?;

        row.as_ref().map(row_to_word_pair).transpose()
    }

    async fn list_words(&self, user_id: i64) -> Result<Vec<WordPair>> {
        let start = Instant::now();

        let rows = sqlx::query(
            "SELECT user_id, word, translation, created_at FROM user_vocabulary
             WHERE user_id = ?1 ORDER BY rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list words")?;

        let words = rows.iter().map(row_to_word_pair).collect::<Result<Vec<_>>>()?;
        observability::record_storage_metrics("list_words", self.backend_name(), start.elapsed());
        debug!(user_id = %user_id, count = words.len(), "Listed words");
        Ok(words)
    }

    async fn list_words_page(
        &self,
        user_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<WordPair>, i64)> {
        let start = Instant::now();

        let total = self.count_words(user_id).await?;
        let rows = sqlx::query(
            "SELECT user_id, word, translation, created_at FROM user_vocabulary
             WHERE user_id = ?1 ORDER BY rowid DESC LIMIT ?2 OFFSET ?3",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list words page")?;

        let words = rows.iter().map(row_to_word_pair).collect::<Result<Vec<_>>>()?;
        observability::record_storage_metrics(
            "list_words_page",
            self.backend_name(),
            start.elapsed(),
        );
        Ok((words, total))
    }

    async fn count_words(&self, user_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_vocabulary WHERE user_id = ?1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count words")?;
        Ok(count)
    }

    async fn get_user_stats(&self, user_id: i64) -> Result<UserStats> {
        let words = self.list_words(user_id).await?;
        Ok(UserStats {
            total_words: words.len() as i64,
            distinct_translations: distinct_translation_count(
                words.iter().map(|w| w.translation.as_str()),
            ),
            last_added: words.into_iter().next(),
        })
    }

    async fn clear_words(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_vocabulary WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to clear words")?;

        info!(user_id = %user_id, removed = result.rows_affected(), "Cleared vocabulary");
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Database health check failed: {}", e))?;
        debug!("Database health check passed");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

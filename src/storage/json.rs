//! Flat JSON file backend
//!
//! The whole vocabulary lives in memory and the file is rewritten on every
//! mutation. Writes go through a temporary file in the same directory that
//! is renamed over the target, so a crash never leaves a half-written file.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, Instrument};

use super::{
    distinct_translation_count, same_word, AddOutcome, UserStats, VocabularyStore, WordPair,
};
use crate::observability;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredWord {
    word: String,
    translation: String,
    created_at: DateTime<Utc>,
}

/// On-disk layout: `{ "users": { "<user_id>": [ ...oldest first... ] } }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VocabularyFile {
    #[serde(default)]
    users: BTreeMap<i64, Vec<StoredWord>>,
}

impl VocabularyFile {
    fn entries(&self, user_id: i64) -> &[StoredWord] {
        self.users.get(&user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn newest_first(&self, user_id: i64) -> impl Iterator<Item = WordPair> + '_ {
        self.entries(user_id)
            .iter()
            .rev()
            .map(move |entry| to_word_pair(user_id, entry))
    }
}

fn to_word_pair(user_id: i64, entry: &StoredWord) -> WordPair {
    WordPair {
        user_id,
        word: entry.word.clone(),
        translation: entry.translation.clone(),
        created_at: entry.created_at,
    }
}

/// Word pairs stored in one JSON document
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    data: Mutex<VocabularyFile>,
}

impl JsonStore {
    /// Load the file at `path`; a missing or empty file starts an empty vocabulary
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let data = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => VocabularyFile::default(),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse vocabulary file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Vocabulary file not found, starting empty");
                VocabularyFile::default()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read vocabulary file {}", path.display()))
            }
        };

        info!(
            path = %path.display(),
            users = data.users.len(),
            "JSON vocabulary loaded"
        );

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Apply `mutate` to a copy of the data, persist it, then publish it
    ///
    /// The in-memory state only changes once the file write succeeded.
    async fn mutate<T>(
        &self,
        operation: &'static str,
        mutate: impl FnOnce(&mut VocabularyFile) -> T,
    ) -> Result<T> {
        let start = Instant::now();
        let mut guard = self.data.lock().await;

        let mut updated = guard.clone();
        let outcome = mutate(&mut updated);
        write_atomically(&self.path, &updated)
            .instrument(observability::storage_span(operation, self.backend_name()))
            .await?;
        *guard = updated;

        observability::record_storage_metrics(operation, self.backend_name(), start.elapsed());
        Ok(outcome)
    }
}

async fn write_atomically(path: &Path, data: &VocabularyFile) -> Result<()> {
    let serialized =
        serde_json::to_vec_pretty(data).context("Failed to serialize vocabulary")?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .context("Failed to create temporary vocabulary file")?;
        tmp.write_all(&serialized)
            .context("Failed to write temporary vocabulary file")?;
        tmp.as_file()
            .sync_all()
            .context("Failed to flush temporary vocabulary file")?;
        tmp.persist(&path)
            .with_context(|| format!("Failed to replace vocabulary file {}", path.display()))?;
        Ok(())
    })
    .await
    .context("Vocabulary writer task panicked")??;

    Ok(())
}

#[async_trait]
impl VocabularyStore for JsonStore {
    async fn add_word(&self, user_id: i64, word: &str, translation: &str) -> Result<AddOutcome> {
        debug!(user_id = %user_id, "Adding word pair");

        let outcome = self
            .mutate("add_word", |data| {
                let entries = data.users.entry(user_id).or_default();
                match entries.iter_mut().find(|e| same_word(&e.word, word)) {
                    Some(existing) => {
                        let previous_translation =
                            std::mem::replace(&mut existing.translation, translation.to_string());
                        existing.word = word.to_string();
                        AddOutcome::Updated {
                            previous_translation,
                        }
                    }
                    None => {
                        entries.push(StoredWord {
                            word: word.to_string(),
                            translation: translation.to_string(),
                            created_at: Utc::now(),
                        });
                        AddOutcome::Added
                    }
                }
            })
            .await?;

        info!(
            user_id = %user_id,
            updated = matches!(outcome, AddOutcome::Updated { .. }),
            "Word pair stored"
        );
        Ok(outcome)
    }

    async fn delete_word(&self, user_id: i64, word: &str) -> Result<bool> {
        {
            let data = self.data.lock().await;
            if !data.entries(user_id).iter().any(|e| same_word(&e.word, word)) {
                return Ok(false);
            }
        }

        self.mutate("delete_word", |data| {
            let Some(entries) = data.users.get_mut(&user_id) else {
                return false;
            };
            let before = entries.len();
            entries.retain(|e| !same_word(&e.word, word));
            let removed = entries.len() != before;
            if entries.is_empty() {
                data.users.remove(&user_id);
            }
            removed
        })
        .await
    }

    async fn get_word(&self, user_id: i64, word: &str) -> Result<Option<WordPair>> {
        let data = self.data.lock().await;
        Ok(data
            .entries(user_id)
            .iter()
            .find(|e| same_word(&e.word, word))
            .map(|e| to_word_pair(user_id, e)))
    }

    async fn list_words(&self, user_id: i64) -> Result<Vec<WordPair>> {
        let data = self.data.lock().await;
        Ok(data.newest_first(user_id).collect())
    }

    async fn list_words_page(
        &self,
        user_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<WordPair>, i64)> {
        let data = self.data.lock().await;
        let total = data.entries(user_id).len() as i64;
        let page = data
            .newest_first(user_id)
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn count_words(&self, user_id: i64) -> Result<i64> {
        let data = self.data.lock().await;
        Ok(data.entries(user_id).len() as i64)
    }

    async fn get_user_stats(&self, user_id: i64) -> Result<UserStats> {
        let data = self.data.lock().await;
        let entries = data.entries(user_id);
        let last_added = data.newest_first(user_id).next();
        Ok(UserStats {
            total_words: entries.len() as i64,
            distinct_translations: distinct_translation_count(
                entries.iter().map(|e| e.translation.as_str()),
            ),
            last_added,
        })
    }

    async fn clear_words(&self, user_id: i64) -> Result<u64> {
        {
            let data = self.data.lock().await;
            if data.entries(user_id).is_empty() {
                return Ok(0);
            }
        }

        let removed = self
            .mutate("clear_words", |data| {
                data.users
                    .remove(&user_id)
                    .map(|entries| entries.len() as u64)
                    .unwrap_or(0)
            })
            .await?;

        info!(user_id = %user_id, removed, "Cleared vocabulary");
        Ok(removed)
    }

    async fn health_check(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let metadata = tokio::fs::metadata(&dir)
            .await
            .with_context(|| format!("Storage directory {} is not accessible", dir.display()))?;
        if metadata.permissions().readonly() {
            anyhow::bail!("Storage directory {} is read-only", dir.display());
        }
        debug!("JSON storage health check passed");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "json"
    }
}

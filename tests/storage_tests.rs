//! # Storage Tests
//!
//! Every behaviour is checked against both backends: a SQLite database and
//! a JSON file, each created in a temporary directory.

use anyhow::Result;
use std::sync::Arc;
use tempfile::TempDir;
use vocab_bot::config::{StorageBackend, StorageConfig};
use vocab_bot::storage::{open_store, AddOutcome, JsonStore, SqliteStore, VocabularyStore};

async fn sqlite_store(dir: &TempDir) -> Result<Arc<dyn VocabularyStore>> {
    let url = format!("sqlite://{}", dir.path().join("vocab.db").display());
    Ok(Arc::new(SqliteStore::connect(&url, 2).await?))
}

async fn json_store(dir: &TempDir) -> Result<Arc<dyn VocabularyStore>> {
    Ok(Arc::new(JsonStore::open(dir.path().join("vocab.json")).await?))
}

/// Run `check` against a fresh store of each backend
macro_rules! for_each_backend {
    ($check:ident) => {{
        let dir = tempfile::tempdir()?;
        $check(sqlite_store(&dir).await?.as_ref()).await?;
        let dir = tempfile::tempdir()?;
        $check(json_store(&dir).await?.as_ref()).await?;
        Ok(())
    }};
}

async fn check_add_and_update(store: &dyn VocabularyStore) -> Result<()> {
    assert_eq!(store.add_word(1, "apple", "яблоко").await?, AddOutcome::Added);
    assert_eq!(
        store.add_word(1, "Apple", "яблочко").await?,
        AddOutcome::Updated {
            previous_translation: "яблоко".to_string()
        },
        "{}: words are matched case-insensitively",
        store.backend_name()
    );

    let stored = store.get_word(1, "APPLE").await?.expect("word should exist");
    assert_eq!(stored.word, "Apple");
    assert_eq!(stored.translation, "яблочко");
    assert_eq!(store.count_words(1).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_add_word_upserts_case_insensitively() -> Result<()> {
    for_each_backend!(check_add_and_update)
}

async fn check_users_are_isolated(store: &dyn VocabularyStore) -> Result<()> {
    store.add_word(1, "cat", "кошка").await?;
    store.add_word(2, "dog", "собака").await?;

    assert_eq!(store.count_words(1).await?, 1);
    assert_eq!(store.count_words(2).await?, 1);
    assert!(store.get_word(1, "dog").await?.is_none());
    assert!(!store.delete_word(1, "dog").await?);
    assert_eq!(store.count_words(3).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_users_are_isolated() -> Result<()> {
    for_each_backend!(check_users_are_isolated)
}

async fn check_listing_order_and_pages(store: &dyn VocabularyStore) -> Result<()> {
    for (word, translation) in [("one", "один"), ("two", "два"), ("three", "три")] {
        store.add_word(7, word, translation).await?;
    }

    let words: Vec<String> = store
        .list_words(7)
        .await?
        .into_iter()
        .map(|w| w.word)
        .collect();
    assert_eq!(words, vec!["three", "two", "one"], "{}", store.backend_name());

    let (page, total) = store.list_words_page(7, 2, 0).await?;
    assert_eq!(total, 3);
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].word, "three");

    let (page, total) = store.list_words_page(7, 2, 2).await?;
    assert_eq!(total, 3);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].word, "one");

    let (page, total) = store.list_words_page(7, 2, 10).await?;
    assert!(page.is_empty());
    assert_eq!(total, 3);
    Ok(())
}

#[tokio::test]
async fn test_listing_is_newest_first_and_paged() -> Result<()> {
    for_each_backend!(check_listing_order_and_pages)
}

async fn check_update_keeps_position(store: &dyn VocabularyStore) -> Result<()> {
    store.add_word(3, "first", "первый").await?;
    store.add_word(3, "second", "второй").await?;
    store.add_word(3, "first", "первое").await?;

    let words = store.list_words(3).await?;
    assert_eq!(words[0].word, "second", "{}", store.backend_name());
    assert_eq!(words[1].translation, "первое");
    Ok(())
}

#[tokio::test]
async fn test_update_keeps_creation_order() -> Result<()> {
    for_each_backend!(check_update_keeps_position)
}

async fn check_delete_and_clear(store: &dyn VocabularyStore) -> Result<()> {
    store.add_word(5, "sun", "солнце").await?;
    store.add_word(5, "moon", "луна").await?;
    store.add_word(6, "star", "звезда").await?;

    assert!(store.delete_word(5, "SUN").await?);
    assert!(!store.delete_word(5, "sun").await?);
    assert_eq!(store.count_words(5).await?, 1);

    assert_eq!(store.clear_words(5).await?, 1);
    assert_eq!(store.clear_words(5).await?, 0);
    assert_eq!(store.count_words(5).await?, 0);
    assert_eq!(store.count_words(6).await?, 1, "other users keep their words");
    Ok(())
}

#[tokio::test]
async fn test_delete_and_clear() -> Result<()> {
    for_each_backend!(check_delete_and_clear)
}

async fn check_stats(store: &dyn VocabularyStore) -> Result<()> {
    let empty = store.get_user_stats(9).await?;
    assert_eq!(empty.total_words, 0);
    assert_eq!(empty.distinct_translations, 0);
    assert!(empty.last_added.is_none());

    store.add_word(9, "big", "большой").await?;
    store.add_word(9, "large", "Большой ").await?;
    store.add_word(9, "small", "маленький").await?;

    let stats = store.get_user_stats(9).await?;
    assert_eq!(stats.total_words, 3);
    assert_eq!(stats.distinct_translations, 2, "{}", store.backend_name());
    assert_eq!(
        stats.last_added.map(|w| w.word),
        Some("small".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_user_stats() -> Result<()> {
    for_each_backend!(check_stats)
}

async fn check_health(store: &dyn VocabularyStore) -> Result<()> {
    store.health_check().await
}

#[tokio::test]
async fn test_health_check_passes() -> Result<()> {
    for_each_backend!(check_health)
}

#[tokio::test]
async fn test_json_store_persists_across_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("vocab.json");

    {
        let store = JsonStore::open(&path).await?;
        store.add_word(42, "house", "дом").await?;
        store.add_word(42, "tree", "дерево").await?;
    }

    let reopened = JsonStore::open(&path).await?;
    let words = reopened.list_words(42).await?;
    assert_eq!(words.len(), 2);
    assert_eq!(words[0].word, "tree");
    assert_eq!(words[1].translation, "дом");
    Ok(())
}

#[tokio::test]
async fn test_json_store_rejects_corrupt_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("vocab.json");
    tokio::fs::write(&path, "{ not json").await?;

    assert!(JsonStore::open(&path).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_json_store_accepts_empty_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("vocab.json");
    tokio::fs::write(&path, "").await?;

    let store = JsonStore::open(&path).await?;
    assert_eq!(store.count_words(1).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_store_persists_across_reconnect() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}", dir.path().join("vocab.db").display());

    {
        let store = SqliteStore::connect(&url, 1).await?;
        store.add_word(8, "water", "вода").await?;
    }

    let store = SqliteStore::connect(&url, 1).await?;
    let word = store.get_word(8, "Water").await?;
    assert_eq!(word.map(|w| w.translation), Some("вода".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_open_store_selects_backend() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let json_config = StorageConfig {
        backend: StorageBackend::Json,
        json_path: dir.path().join("words.json").display().to_string(),
        ..StorageConfig::default()
    };
    assert_eq!(open_store(&json_config).await?.backend_name(), "json");

    let sqlite_config = StorageConfig {
        backend: StorageBackend::Sqlite,
        database_url: format!("sqlite://{}", dir.path().join("words.db").display()),
        ..StorageConfig::default()
    };
    assert_eq!(open_store(&sqlite_config).await?.backend_name(), "sqlite");
    Ok(())
}

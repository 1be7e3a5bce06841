//! # Unified Application Configuration
//!
//! This module provides a centralized configuration system that consolidates
//! all application settings into a single, structured configuration object.
//! Values come from environment variables (optionally loaded from `.env` by
//! `dotenvy` in `main`) and are validated before the bot starts.

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Bot-specific configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Telegram bot token
    pub token: String,
    /// HTTP client timeout in seconds
    pub http_timeout_secs: u64,
    /// Number of word pairs shown per `/words` page
    pub words_page_size: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            http_timeout_secs: 30,
            words_page_size: 20,
        }
    }
}

impl BotConfig {
    /// Validate bot configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.token.trim().is_empty() {
            return Err(AppError::Config("Bot token cannot be empty".to_string()));
        }

        let parts: Vec<&str> = self.token.split(':').collect();
        if parts.len() != 2 {
            return Err(AppError::Config(
                "Bot token format is invalid. Expected format: 'bot_id:bot_token'".to_string(),
            ));
        }

        if parts[0].parse::<u64>().is_err() {
            return Err(AppError::Config(
                "Bot token bot ID must be numeric".to_string(),
            ));
        }

        if parts[1].len() < 20 {
            return Err(AppError::Config(
                "Bot token appears to be too short. Please verify it's a valid token".to_string(),
            ));
        }

        if self.http_timeout_secs == 0 || self.http_timeout_secs > 300 {
            return Err(AppError::Config(
                "HTTP timeout must be between 1 and 300 seconds".to_string(),
            ));
        }

        if self.words_page_size == 0 || self.words_page_size > 50 {
            return Err(AppError::Config(
                "Words page size must be between 1 and 50".to_string(),
            ));
        }

        Ok(())
    }
}

/// Which persistence backend stores the word pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Json,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "json" => Ok(StorageBackend::Json),
            other => Err(AppError::Config(format!(
                "Unknown storage backend '{}'. Expected 'sqlite' or 'json'",
                other
            ))),
        }
    }
}

/// Storage configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Selected backend
    pub backend: StorageBackend,
    /// SQLite connection URL
    pub database_url: String,
    /// Path of the JSON vocabulary file
    pub json_path: String,
    /// Maximum number of connections in the SQLite pool
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_url: "sqlite://vocabulary.db?mode=rwc".to_string(),
            json_path: "vocabulary.json".to_string(),
            max_connections: 5,
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> AppResult<()> {
        match self.backend {
            StorageBackend::Sqlite => {
                if !self.database_url.starts_with("sqlite:") {
                    return Err(AppError::Config(
                        "DATABASE_URL must start with 'sqlite:'".to_string(),
                    ));
                }
                if self.max_connections == 0 || self.max_connections > 100 {
                    return Err(AppError::Config(
                        "Max connections must be between 1 and 100".to_string(),
                    ));
                }
            }
            StorageBackend::Json => {
                if self.json_path.trim().is_empty() {
                    return Err(AppError::Config(
                        "JSON storage path cannot be empty".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Health check server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Whether to start the HTTP health server at all
    pub enabled: bool,
    /// Health check server port
    pub health_port: u16,
    /// Bind to all interfaces instead of localhost only
    pub bind_all_interfaces: bool,
    /// Whether to allow privileged ports (< 1024)
    pub allow_privileged_ports: bool,
    /// Bearer token required for `/metrics`, if any
    pub metrics_auth_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            health_port: 8080,
            bind_all_interfaces: true,
            allow_privileged_ports: false,
            metrics_auth_token: None,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.health_port == 0 {
            return Err(AppError::Config("Health port cannot be 0".to_string()));
        }

        if !self.allow_privileged_ports && self.health_port < 1024 {
            return Err(AppError::Config(format!(
                "Health port {} is privileged. Set ALLOW_PRIVILEGED_PORTS=true or use port >= 1024",
                self.health_port
            )));
        }

        Ok(())
    }
}

/// Text-to-speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Whether pronunciation is offered at all
    pub enabled: bool,
    /// Synthesis endpoint returning MP3 audio
    pub endpoint: String,
    /// Language the words are pronounced in
    pub language: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Consecutive failures before the circuit opens
    pub circuit_breaker_threshold: u32,
    /// Seconds the circuit stays open before a retry is allowed
    pub circuit_breaker_reset_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://translate.google.com/translate_tts".to_string(),
            language: "en".to_string(),
            timeout_secs: 15,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60,
        }
    }
}

impl TtsConfig {
    /// Validate TTS configuration
    pub fn validate(&self) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(AppError::Config(format!(
                "TTS endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }

        if self.language.trim().is_empty() {
            return Err(AppError::Config("TTS language cannot be empty".to_string()));
        }

        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(AppError::Config(
                "TTS timeout must be between 1 and 120 seconds".to_string(),
            ));
        }

        if self.circuit_breaker_threshold == 0 {
            return Err(AppError::Config(
                "TTS circuit breaker threshold cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Bot configuration
    pub bot: BotConfig,
    /// Storage configuration
    pub storage: StorageConfig,
    /// Health server configuration
    pub server: ServerConfig,
    /// Text-to-speech configuration
    pub tts: TtsConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

fn parse_or<T: FromStr>(value: Option<String>, default: T, key: &str) -> AppResult<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: '{}'", key, raw))),
        None => Ok(default),
    }
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::from_lookup(|key| env::var(key).ok())?;
        config.observability = ObservabilityConfig::from_env();
        Ok(config)
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// `from_env` is a thin wrapper around this; tests feed a map instead of
    /// mutating the process environment. Observability settings keep their
    /// defaults here.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.bot.token = lookup("TELEGRAM_BOT_TOKEN")
            .or_else(|| lookup("BOT_TOKEN"))
            .ok_or_else(|| {
                AppError::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;
        config.bot.http_timeout_secs = parse_or(
            lookup("HTTP_CLIENT_TIMEOUT_SECS"),
            config.bot.http_timeout_secs,
            "HTTP_CLIENT_TIMEOUT_SECS",
        )?;
        config.bot.words_page_size = parse_or(
            lookup("WORDS_PAGE_SIZE"),
            config.bot.words_page_size,
            "WORDS_PAGE_SIZE",
        )?;

        if let Some(backend) = lookup("STORAGE_BACKEND") {
            config.storage.backend = backend.parse()?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            config.storage.database_url = url;
        }
        if let Some(path) = lookup("JSON_STORAGE_PATH") {
            config.storage.json_path = path;
        }
        config.storage.max_connections = parse_or(
            lookup("DATABASE_MAX_CONNECTIONS"),
            config.storage.max_connections,
            "DATABASE_MAX_CONNECTIONS",
        )?;

        config.server.enabled = parse_flag(lookup("HEALTH_SERVER_ENABLED"), true);
        config.server.health_port = parse_or(
            lookup("HEALTH_PORT").or_else(|| lookup("PORT")),
            config.server.health_port,
            "HEALTH_PORT",
        )?;
        config.server.bind_all_interfaces = parse_flag(lookup("HEALTH_BIND_ALL_INTERFACES"), true);
        config.server.allow_privileged_ports = parse_flag(lookup("ALLOW_PRIVILEGED_PORTS"), false);
        config.server.metrics_auth_token =
            lookup("METRICS_AUTH_TOKEN").filter(|token| !token.trim().is_empty());

        config.tts.enabled = parse_flag(lookup("TTS_ENABLED"), true);
        if let Some(endpoint) = lookup("TTS_ENDPOINT") {
            config.tts.endpoint = endpoint;
        }
        if let Some(language) = lookup("TTS_LANGUAGE") {
            config.tts.language = language;
        }
        config.tts.timeout_secs = parse_or(
            lookup("TTS_TIMEOUT_SECS"),
            config.tts.timeout_secs,
            "TTS_TIMEOUT_SECS",
        )?;
        config.tts.circuit_breaker_threshold = parse_or(
            lookup("TTS_CIRCUIT_BREAKER_THRESHOLD"),
            config.tts.circuit_breaker_threshold,
            "TTS_CIRCUIT_BREAKER_THRESHOLD",
        )?;
        config.tts.circuit_breaker_reset_secs = parse_or(
            lookup("TTS_CIRCUIT_BREAKER_RESET_SECS"),
            config.tts.circuit_breaker_reset_secs,
            "TTS_CIRCUIT_BREAKER_RESET_SECS",
        )?;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.bot.validate()?;
        self.storage.validate()?;
        self.server.validate()?;
        self.tts.validate()?;
        self.observability.validate().map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        let storage_target = match self.storage.backend {
            StorageBackend::Sqlite => "[REDACTED]".to_string(),
            StorageBackend::Json => self.storage.json_path.clone(),
        };
        format!(
            "Configuration: bot_token=[REDACTED], storage={:?}({}), health_server={}:{}, tts_enabled={}, tts_language={}, metrics_enabled={}",
            self.storage.backend,
            storage_target,
            self.server.enabled,
            self.server.health_port,
            self.tts.enabled,
            self.tts.language,
            self.observability.enable_metrics_export
        )
    }
}

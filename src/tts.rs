//! Text-to-speech client
//!
//! Fetches an MP3 pronunciation for a word from an HTTP synthesis endpoint
//! (Google Translate's `translate_tts` by default). Calls are guarded by a
//! [`CircuitBreaker`] so an unavailable service fails fast instead of
//! stalling every handler for the full timeout.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::TtsConfig;
use crate::errors::{AppError, AppResult};
use crate::observability;
use crate::validation::validate_tts_text;

/// Synthesized audio ready to be sent to Telegram
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// HTTP client for the pronunciation service
#[derive(Debug)]
pub struct TtsClient {
    client: reqwest::Client,
    endpoint: String,
    language: String,
    breaker: CircuitBreaker,
}

impl TtsClient {
    /// Build a client from configuration
    pub fn new(config: &TtsConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("vocab-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build TTS HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
            breaker: CircuitBreaker::new(
                config.circuit_breaker_threshold,
                Duration::from_secs(config.circuit_breaker_reset_secs),
            ),
        })
    }

    /// Language the client pronounces text in
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Synthesize `text` into MP3 audio
    pub async fn synthesize(&self, text: &str) -> AppResult<SpeechAudio> {
        let text = validate_tts_text(text).map_err(|key| AppError::Validation(key.to_string()))?;

        if self.breaker.is_open() {
            observability::record_tts_metrics(false, Duration::ZERO);
            return Err(AppError::Tts(
                "Pronunciation service temporarily disabled after repeated failures".to_string(),
            ));
        }

        let start = Instant::now();
        let result = self.fetch(text).await;
        let duration = start.elapsed();

        match &result {
            Ok(audio) => {
                self.breaker.record_success();
                debug!(bytes = audio.bytes.len(), duration_ms = duration.as_millis() as u64, "TTS audio received");
            }
            Err(e) => {
                self.breaker.record_failure();
                warn!(error = %e, failures = self.breaker.failure_count(), "TTS request failed");
            }
        }
        observability::record_tts_metrics(result.is_ok(), duration);
        observability::update_circuit_breaker_state(self.breaker.is_open());

        result
    }

    async fn fetch(&self, text: &str) -> AppResult<SpeechAudio> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.language.as_str()),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Tts(format!(
                "TTS endpoint responded with status {}",
                status
            )));
        }

        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(AppError::Tts("TTS endpoint returned empty audio".to_string()));
        }

        Ok(SpeechAudio {
            bytes,
            file_name: audio_file_name(text),
        })
    }
}

/// File name shown in Telegram for a pronunciation
///
/// Keeps alphanumerics (any script), replaces the rest with `_`.
pub fn audio_file_name(text: &str) -> String {
    let stem: String = text
        .chars()
        .take(40)
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "pronunciation.mp3".to_string()
    } else {
        format!("{}.mp3", stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_file_name() {
        assert_eq!(audio_file_name("to learn"), "to_learn.mp3");
        assert_eq!(audio_file_name("кошка"), "кошка.mp3");
        assert_eq!(audio_file_name("?!"), "pronunciation.mp3");
    }

    #[tokio::test]
    async fn test_rejects_empty_text_without_network() {
        let client = TtsClient::new(&TtsConfig::default()).unwrap();
        let result = client.synthesize("   ").await;
        assert_eq!(result.unwrap_err(), AppError::Validation("say-usage".to_string()));
    }

    #[tokio::test]
    async fn test_open_circuit_fails_fast() {
        let config = TtsConfig {
            // Nothing listens here; the breaker must stop us before any request
            endpoint: "http://127.0.0.1:9/tts".to_string(),
            circuit_breaker_threshold: 1,
            ..TtsConfig::default()
        };
        let client = TtsClient::new(&config).unwrap();
        client.breaker.record_failure();

        let result = client.synthesize("apple").await;
        assert!(matches!(result, Err(AppError::Tts(_))));
    }
}

//! Pronunciation replies backed by the text-to-speech client

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use teloxide::utils::html;
use tracing::{debug, info};

use super::HandlerContext;
use crate::errors::{error_logging, AppError};

/// What happened when pronunciation was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PronunciationOutcome {
    /// Audio was sent to the chat
    Sent,
    /// Pronunciation is switched off
    Disabled,
    /// The text was rejected; carries the localization key to reply with
    Invalid(&'static str),
    /// The TTS service failed; the error is already logged
    Failed,
}

impl PronunciationOutcome {
    /// Localization key describing a failed outcome
    pub fn message_key(&self) -> Option<&'static str> {
        match self {
            PronunciationOutcome::Sent => None,
            PronunciationOutcome::Disabled => Some("tts-disabled"),
            PronunciationOutcome::Invalid(key) => Some(key),
            PronunciationOutcome::Failed => Some("tts-failed"),
        }
    }
}

/// Synthesize `text` and send it to the chat as an audio message
///
/// Only Telegram request errors are returned; TTS problems are reported
/// through the outcome so callers can answer in their own way.
pub async fn send_pronunciation(ctx: &HandlerContext<'_>, text: &str) -> Result<PronunciationOutcome> {
    let Some(tts) = ctx.services.tts.as_ref() else {
        debug!(user_id = ctx.user_id, "Pronunciation requested while TTS is disabled");
        return Ok(PronunciationOutcome::Disabled);
    };

    let audio = match tts.synthesize(text).await {
        Ok(audio) => audio,
        Err(AppError::Validation(key)) => {
            let key = match key.as_str() {
                "say-too-long" => "say-too-long",
                _ => "say-usage",
            };
            return Ok(PronunciationOutcome::Invalid(key));
        }
        Err(e) => {
            error_logging::log_tts_error(&e, Some(ctx.user_id), text);
            return Ok(PronunciationOutcome::Failed);
        }
    };

    let caption = ctx.t_args("tts-caption", &[("text", &html::escape(text.trim()))]);
    ctx.bot
        .send_audio(
            ctx.chat_id,
            InputFile::memory(audio.bytes).file_name(audio.file_name),
        )
        .caption(caption)
        .parse_mode(ParseMode::Html)
        .await?;

    info!(user_id = ctx.user_id, language = tts.language(), "Pronunciation sent");
    Ok(PronunciationOutcome::Sent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_message_keys() {
        assert_eq!(PronunciationOutcome::Sent.message_key(), None);
        assert_eq!(
            PronunciationOutcome::Disabled.message_key(),
            Some("tts-disabled")
        );
        assert_eq!(
            PronunciationOutcome::Invalid("say-too-long").message_key(),
            Some("say-too-long")
        );
        assert_eq!(PronunciationOutcome::Failed.message_key(), Some("tts-failed"));
    }
}

//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `callbacks`: All callback query handling (organized into submodules)
//! - `command_handlers`: One handler per slash command
//! - `message_handler`: Routes incoming messages to commands, quiz answers or word adding
//! - `quiz_handlers`: Quiz flow shared by commands, typed answers and buttons
//! - `pronunciation`: Sends text-to-speech audio
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callbacks;
pub mod command_handlers;
pub mod message_handler;
pub mod pronunciation;
pub mod quiz_handlers;
pub mod ui_builder;
pub mod ui_components;

use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::utils::command::BotCommands;

use crate::localization::LocalizationManager;
use crate::storage::VocabularyStore;
use crate::tts::TtsClient;

/// Shared services every handler needs
pub struct BotServices {
    pub store: Arc<dyn VocabularyStore>,
    pub localization: Arc<LocalizationManager>,
    /// `None` when pronunciation is disabled
    pub tts: Option<Arc<TtsClient>>,
    pub words_page_size: u32,
    /// Used to accept `/command@username` in groups
    pub bot_username: String,
}

impl std::fmt::Debug for BotServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotServices")
            .field("backend", &self.store.backend_name())
            .field("tts_enabled", &self.tts.is_some())
            .field("words_page_size", &self.words_page_size)
            .field("bot_username", &self.bot_username)
            .finish()
    }
}

/// Supported slash commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "start working with the bot")]
    Start,
    #[command(description = "show help")]
    Help,
    #[command(description = "show your dictionary")]
    Words,
    #[command(description = "dictionary statistics")]
    Stats,
    #[command(description = "practice your words")]
    Quiz,
    #[command(description = "finish the current quiz")]
    Stop,
    #[command(description = "remove a word")]
    Delete(String),
    #[command(description = "remove every word")]
    Clear,
    #[command(description = "hear the pronunciation")]
    Say(String),
}

impl Command {
    /// Name used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Words => "words",
            Command::Stats => "stats",
            Command::Quiz => "quiz",
            Command::Stop => "stop",
            Command::Delete(_) => "delete",
            Command::Clear => "clear",
            Command::Say(_) => "say",
        }
    }
}

/// Common context for bot handlers containing shared dependencies
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    pub bot: &'a Bot,
    pub services: &'a BotServices,
    pub chat_id: ChatId,
    /// Dictionary owner; the sender, or the chat when there is no sender
    pub user_id: i64,
    pub language_code: Option<&'a str>,
}

impl HandlerContext<'_> {
    pub fn localization(&self) -> &Arc<LocalizationManager> {
        &self.services.localization
    }

    /// Localized message without arguments
    pub fn t(&self, key: &str) -> String {
        crate::localization::t_lang(&self.services.localization, key, self.language_code)
    }

    /// Localized message with arguments
    pub fn t_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        crate::localization::t_args_lang(
            &self.services.localization,
            key,
            args,
            self.language_code,
        )
    }

    /// Send an HTML message to the current chat
    pub async fn send_html(
        &self,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, teloxide::RequestError> {
        let request = self
            .bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html);
        match keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await,
            None => request.await,
        }
    }

    /// Replace the text (and keyboard) of a message in the current chat
    pub async fn edit_html(
        &self,
        message_id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, teloxide::RequestError> {
        let request = self
            .bot
            .edit_message_text(self.chat_id, message_id, text)
            .parse_mode(ParseMode::Html);
        match keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await,
            None => request.await,
        }
    }
}

// Re-export main handler functions for use in main.rs
pub use callbacks::callback_handler::callback_handler;
pub use message_handler::message_handler;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", "vocab_bot").unwrap(), Command::Start);
        assert_eq!(
            Command::parse("/words@vocab_bot", "vocab_bot").unwrap(),
            Command::Words
        );
        assert_eq!(
            Command::parse("/delete apple", "vocab_bot").unwrap(),
            Command::Delete("apple".to_string())
        );
        assert_eq!(
            Command::parse("/say to learn", "vocab_bot").unwrap(),
            Command::Say("to learn".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_unknown_command() {
        assert!(Command::parse("/translate", "vocab_bot").is_err());
        assert!(Command::parse("/start@other_bot", "vocab_bot").is_err());
    }

    #[test]
    fn test_command_descriptions_cover_every_command() {
        let commands = Command::bot_commands();
        assert_eq!(commands.len(), 9);
        assert!(commands.iter().any(|c| c.command.ends_with("quiz")));
    }
}

//! Common UI Components for Telegram Bot
//!
//! Reusable buttons and keyboard fragments shared by the keyboards in
//! [`super::ui_builder`].

use std::sync::Arc;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::localization::{t_args_lang, t_lang, LocalizationManager};

/// Callback data of buttons that only display information
pub const NOOP_CALLBACK: &str = "noop";

/// Create a localized inline keyboard button
pub fn create_localized_button(
    localization: &Arc<LocalizationManager>,
    text_key: &str,
    callback_data: String,
    language_code: Option<&str>,
) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(t_lang(localization, text_key, language_code), callback_data)
}

/// Create a localized inline keyboard button with an emoji prefix
pub fn create_localized_button_with_emoji(
    localization: &Arc<LocalizationManager>,
    emoji: &str,
    text_key: &str,
    callback_data: String,
    language_code: Option<&str>,
) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(
        format!("{} {}", emoji, t_lang(localization, text_key, language_code)),
        callback_data,
    )
}

/// Truncate text to a maximum number of characters, adding ellipsis if truncated
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Create a confirmation dialog with Yes/No buttons
pub fn create_confirmation_dialog(
    localization: &Arc<LocalizationManager>,
    confirm_callback: String,
    cancel_callback: String,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        create_localized_button_with_emoji(
            localization,
            "✅",
            "confirm",
            confirm_callback,
            language_code,
        ),
        create_localized_button_with_emoji(
            localization,
            "❌",
            "cancel",
            cancel_callback,
            language_code,
        ),
    ]])
}

/// Create pagination buttons for a list
///
/// `callback_prefix` is followed by the zero-based target page.
pub fn create_pagination_buttons(
    localization: &Arc<LocalizationManager>,
    current_page: usize,
    total_pages: usize,
    callback_prefix: &str,
    language_code: Option<&str>,
) -> Vec<InlineKeyboardButton> {
    let mut buttons = Vec::new();

    if current_page > 0 {
        buttons.push(create_localized_button_with_emoji(
            localization,
            "⬅️",
            "previous",
            format!("{}{}", callback_prefix, current_page - 1),
            language_code,
        ));
    }

    // Page info (disabled button for display)
    let page_info = t_args_lang(
        localization,
        "page-info",
        &[
            ("current", &(current_page + 1).to_string()),
            ("total", &total_pages.to_string()),
        ],
        language_code,
    );
    buttons.push(InlineKeyboardButton::callback(
        page_info,
        NOOP_CALLBACK.to_string(),
    ));

    if current_page + 1 < total_pages {
        buttons.push(create_localized_button_with_emoji(
            localization,
            "➡️",
            "next",
            format!("{}{}", callback_prefix, current_page + 1),
            language_code,
        ));
    }

    buttons
}

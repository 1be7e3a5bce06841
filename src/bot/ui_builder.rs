//! UI Builder module for creating keyboards and formatting messages

use std::sync::Arc;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;

use super::callbacks::callback_types::{CallbackAction, WORDS_PAGE_PREFIX};
use super::ui_components::{
    create_confirmation_dialog, create_localized_button_with_emoji, create_pagination_buttons,
    truncate_text,
};
use crate::localization::{t_args_lang, t_lang, LocalizationManager};
use crate::quiz::{AnswerOutcome, QuizQuestion, QuizSession};
use crate::storage::{UserStats, WordPair};
use crate::validation::clean_html;

/// Longest option text shown on a quiz button
const MAX_OPTION_BUTTON_LEN: usize = 40;

/// Telegram's limit for message text after entity parsing
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Longest word or translation shown in the `/words` list
const MAX_LIST_PART_LEN: usize = 60;

const OVERFLOW_MARKER: &str = "…";

/// Number of pages needed for `total` items
pub fn total_pages(total: i64, page_size: u32) -> usize {
    let total = usize::try_from(total).unwrap_or(0);
    total.div_ceil(page_size.max(1) as usize).max(1)
}

/// Length Telegram checks against its limit: UTF-16 units of the text without markup
pub fn visible_len(html_text: &str) -> usize {
    clean_html(html_text).encode_utf16().count()
}

/// Format one page of the user's dictionary
///
/// Long entries are shortened and lines that would push the message past
/// Telegram's text limit are replaced by a trailing ellipsis.
pub fn format_words_page(
    words: &[WordPair],
    total: i64,
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> String {
    let header = t_args_lang(
        localization,
        "words-header",
        &[("count", &total.to_string())],
        language_code,
    );

    // Budget covers the header, the blank line and room for the ellipsis line
    let mut budget = MAX_MESSAGE_LEN
        .saturating_sub(visible_len(&header))
        .saturating_sub(2 + visible_len(OVERFLOW_MARKER) + 1);

    let mut lines: Vec<String> = Vec::with_capacity(words.len());
    for w in words {
        let word = truncate_text(&w.word, MAX_LIST_PART_LEN);
        let translation = truncate_text(&w.translation, MAX_LIST_PART_LEN);
        // "• " + word + " — " + translation + newline
        let visible = word.encode_utf16().count() + translation.encode_utf16().count() + 6;
        if visible > budget {
            lines.push(OVERFLOW_MARKER.to_string());
            break;
        }
        budget -= visible;
        lines.push(format!(
            "• <b>{}</b> — {}",
            html::escape(&word),
            html::escape(&translation)
        ));
    }

    format!("{}\n\n{}", header, lines.join("\n"))
}

/// Pagination keyboard for `/words`, `None` when everything fits on one page
pub fn create_words_pagination_keyboard(
    current_page: usize,
    total: i64,
    page_size: u32,
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> Option<InlineKeyboardMarkup> {
    let pages = total_pages(total, page_size);
    if pages <= 1 {
        return None;
    }
    Some(InlineKeyboardMarkup::new(vec![create_pagination_buttons(
        localization,
        current_page,
        pages,
        WORDS_PAGE_PREFIX,
        language_code,
    )]))
}

/// Format the `/stats` reply
pub fn format_stats(
    stats: &UserStats,
    quiz: Option<&QuizSession>,
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> String {
    let last = match &stats.last_added {
        Some(pair) => format!(
            "{} — {}",
            html::escape(&pair.word),
            html::escape(&pair.translation)
        ),
        None => t_lang(localization, "stats-last-none", language_code),
    };

    let mut text = t_args_lang(
        localization,
        "stats-text",
        &[
            ("total", &stats.total_words.to_string()),
            ("distinct", &stats.distinct_translations.to_string()),
            ("last", &last),
        ],
        language_code,
    );

    if let Some(session) = quiz.filter(|s| s.answered > 0) {
        text.push_str("\n\n");
        text.push_str(&format_quiz_score(session, localization, language_code));
    }

    text
}

/// Format a quiz question
pub fn format_quiz_question(
    question: &QuizQuestion,
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> String {
    t_args_lang(
        localization,
        "quiz-question",
        &[
            ("round", &question.round.to_string()),
            ("word", &html::escape(&question.word)),
        ],
        language_code,
    )
}

/// Format the running score of a session
pub fn format_quiz_score(
    session: &QuizSession,
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> String {
    t_args_lang(
        localization,
        "quiz-score",
        &[
            ("correct", &session.correct_answers.to_string()),
            ("answered", &session.answered.to_string()),
            ("percent", &session.accuracy_percent().to_string()),
        ],
        language_code,
    )
}

/// Format the message shown after an answer
pub fn format_quiz_result(
    question: &QuizQuestion,
    outcome: &AnswerOutcome,
    session: &QuizSession,
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> String {
    let verdict = match outcome {
        AnswerOutcome::Correct => t_args_lang(
            localization,
            "quiz-correct",
            &[
                ("word", &html::escape(&question.word)),
                ("translation", &html::escape(&question.correct_translation)),
            ],
            language_code,
        ),
        AnswerOutcome::Incorrect { expected } => t_args_lang(
            localization,
            "quiz-wrong",
            &[
                ("word", &html::escape(&question.word)),
                ("expected", &html::escape(expected)),
            ],
            language_code,
        ),
    };

    format!(
        "{}\n\n{}\n\n{}",
        format_quiz_question(question, localization, language_code),
        verdict,
        format_quiz_score(session, localization, language_code)
    )
}

/// Keyboard with one button per option plus listen/stop controls
pub fn create_quiz_question_keyboard(
    question: &QuizQuestion,
    tts_enabled: bool,
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = question
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            vec![InlineKeyboardButton::callback(
                truncate_text(option, MAX_OPTION_BUTTON_LEN),
                CallbackAction::QuizAnswer {
                    round: question.round,
                    index,
                }
                .data(),
            )]
        })
        .collect();

    let mut controls = Vec::new();
    if tts_enabled {
        controls.push(create_localized_button_with_emoji(
            localization,
            "🔊",
            "quiz-listen",
            CallbackAction::QuizSay {
                round: question.round,
            }
            .data(),
            language_code,
        ));
    }
    controls.push(create_localized_button_with_emoji(
        localization,
        "⏹",
        "quiz-stop",
        CallbackAction::QuizStop.data(),
        language_code,
    ));
    rows.push(controls);

    InlineKeyboardMarkup::new(rows)
}

/// Keyboard shown under an answered question
pub fn create_quiz_result_keyboard(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        create_localized_button_with_emoji(
            localization,
            "➡️",
            "quiz-next",
            CallbackAction::QuizNext.data(),
            language_code,
        ),
        create_localized_button_with_emoji(
            localization,
            "⏹",
            "quiz-stop",
            CallbackAction::QuizStop.data(),
            language_code,
        ),
    ]])
}

/// Yes/No keyboard for `/clear`
pub fn create_clear_confirmation_keyboard(
    localization: &Arc<LocalizationManager>,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    create_confirmation_dialog(
        localization,
        CallbackAction::ClearConfirm.data(),
        CallbackAction::ClearCancel.data(),
        language_code,
    )
}

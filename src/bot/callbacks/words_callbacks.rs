//! Word list callback handlers: pagination and `/clear` confirmation

use anyhow::Result;
use teloxide::types::MessageId;
use tracing::{debug, info};

use crate::bot::ui_builder::{create_words_pagination_keyboard, format_words_page, total_pages};
use crate::bot::HandlerContext;
use crate::dialogue::{VocabDialogue, VocabDialogueState};
use crate::errors::error_logging;
use crate::observability::{self, WordOperation};

/// Show page `page` of the word list in place
pub async fn handle_words_page(
    ctx: &HandlerContext<'_>,
    message_id: MessageId,
    page: usize,
) -> Result<Option<String>> {
    let store = &ctx.services.store;
    let page_size = ctx.services.words_page_size;
    let offset = u32::try_from(page)
        .unwrap_or(u32::MAX)
        .saturating_mul(page_size);

    let (mut words, total) = match store.list_words_page(ctx.user_id, page_size, offset).await {
        Ok(page) => page,
        Err(e) => {
            error_logging::log_storage_error(
                &e,
                "list_words_page",
                Some(ctx.user_id),
                store.backend_name(),
            );
            return Ok(Some(ctx.t("error-loading")));
        }
    };

    if total == 0 {
        ctx.edit_html(message_id, ctx.t("words-empty"), None).await?;
        return Ok(None);
    }

    // Words were deleted since the keyboard was built; fall back to the last page
    let mut current_page = page;
    if words.is_empty() {
        current_page = total_pages(total, page_size).saturating_sub(1);
        debug!(
            user_id = ctx.user_id,
            requested = page,
            current_page,
            "Requested page is past the end"
        );
        let offset = u32::try_from(current_page)
            .unwrap_or(u32::MAX)
            .saturating_mul(page_size);
        match store.list_words_page(ctx.user_id, page_size, offset).await {
            Ok((last_words, _)) => words = last_words,
            Err(e) => {
                error_logging::log_storage_error(
                    &e,
                    "list_words_page",
                    Some(ctx.user_id),
                    store.backend_name(),
                );
                return Ok(Some(ctx.t("error-loading")));
            }
        }
    }

    let text = format_words_page(&words, total, ctx.localization(), ctx.language_code);
    let keyboard = create_words_pagination_keyboard(
        current_page,
        total,
        page_size,
        ctx.localization(),
        ctx.language_code,
    );
    ctx.edit_html(message_id, text, keyboard).await?;
    Ok(None)
}

/// Delete every word after the user confirmed `/clear`
pub async fn handle_clear_confirm(
    ctx: &HandlerContext<'_>,
    dialogue: &VocabDialogue,
    message_id: MessageId,
) -> Result<Option<String>> {
    let store = &ctx.services.store;
    let removed = match store.clear_words(ctx.user_id).await {
        Ok(removed) => removed,
        Err(e) => {
            error_logging::log_storage_error(&e, "clear_words", Some(ctx.user_id), store.backend_name());
            observability::record_word_operation(WordOperation::Cleared, false);
            ctx.edit_html(message_id, ctx.t("error-generic"), None).await?;
            return Ok(None);
        }
    };

    info!(user_id = ctx.user_id, removed, "Dictionary cleared");
    observability::record_word_operation(WordOperation::Cleared, true);

    // A running quiz has nothing left to ask
    if dialogue.get().await?.unwrap_or_default().quiz_session().is_some() {
        dialogue.update(VocabDialogueState::Idle).await?;
    }

    let text = ctx.t_args("clear-done", &[("count", &removed.to_string())]);
    ctx.edit_html(message_id, text, None).await?;
    Ok(None)
}

/// Keep the dictionary and close the confirmation dialog
pub async fn handle_clear_cancel(
    ctx: &HandlerContext<'_>,
    message_id: MessageId,
) -> Result<Option<String>> {
    ctx.edit_html(message_id, ctx.t("clear-cancelled"), None).await?;
    Ok(None)
}

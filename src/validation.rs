//! Validation module for user input
//!
//! Parses the `word-translation` format users type to add vocabulary and
//! checks text handed to the pronunciation service. Errors are returned as
//! localization keys so handlers can reply with a translated message.

use lazy_static::lazy_static;
use regex::Regex;

/// Maximum length (in characters) of either half of a word pair
pub const MAX_PART_LEN: usize = 100;

/// Maximum length (in characters) of text sent to the TTS service
pub const MAX_TTS_TEXT_LEN: usize = 200;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"(?s)<[^>]*>").expect("Invalid HTML tag regex pattern");
    static ref WHITESPACE_RUN: Regex =
        Regex::new(r"[ \t\u{00A0}]+").expect("Invalid whitespace regex pattern");
}

/// Strip HTML tags and decode the handful of entities Telegram clients emit
///
/// # Examples
/// ```
/// use vocab_bot::validation::clean_html;
///
/// assert_eq!(clean_html("<b>cat</b> - кошка"), "cat - кошка");
/// assert_eq!(clean_html("rock &amp; roll"), "rock & roll");
/// ```
pub fn clean_html(text: &str) -> String {
    let without_tags = HTML_TAG.replace_all(text, "");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WHITESPACE_RUN.replace_all(&decoded, " ").trim().to_string()
}

/// Find the separator between word and translation
///
/// The first ASCII hyphen wins. En and em dashes are only accepted when no
/// hyphen is present, so hyphenated words survive when typed with a dash.
fn find_separator(text: &str) -> Option<(usize, usize)> {
    if let Some(pos) = text.find('-') {
        return Some((pos, 1));
    }
    ['—', '–']
        .iter()
        .filter_map(|dash| text.find(*dash).map(|pos| (pos, dash.len_utf8())))
        .min_by_key(|(pos, _)| *pos)
}

/// Whether the text looks like an attempt to add a word pair
pub fn looks_like_word_pair(text: &str) -> bool {
    find_separator(text).is_some()
}

/// Parse a `word-translation` string into its trimmed halves
///
/// # Returns
/// * `Ok((word, translation))` - both halves trimmed and non-empty
/// * `Err(&str)` - one of `add-multiline`, `add-no-separator`,
///   `add-empty-part` or `add-too-long`
///
/// # Examples
/// ```
/// use vocab_bot::validation::parse_word_pair;
///
/// assert_eq!(
///     parse_word_pair("to learn - учить"),
///     Ok(("to learn".to_string(), "учить".to_string()))
/// );
/// assert_eq!(parse_word_pair("hello"), Err("add-no-separator"));
/// assert_eq!(parse_word_pair("hello-"), Err("add-empty-part"));
/// ```
pub fn parse_word_pair(text: &str) -> Result<(String, String), &'static str> {
    let cleaned = clean_html(text);

    if cleaned.contains('\n') {
        return Err("add-multiline");
    }

    let (pos, sep_len) = find_separator(&cleaned).ok_or("add-no-separator")?;
    let word = cleaned[..pos].trim();
    let translation = cleaned[pos + sep_len..].trim();

    if word.is_empty() || translation.is_empty() {
        return Err("add-empty-part");
    }

    if word.chars().count() > MAX_PART_LEN || translation.chars().count() > MAX_PART_LEN {
        return Err("add-too-long");
    }

    Ok((word.to_string(), translation.to_string()))
}

/// Validate the argument of a command that names a stored word
pub fn validate_word_argument(word: &str) -> Result<&str, &'static str> {
    let trimmed = word.trim();
    if trimmed.is_empty() {
        return Err("delete-usage");
    }
    if trimmed.chars().count() > MAX_PART_LEN {
        return Err("add-too-long");
    }
    Ok(trimmed)
}

/// Validate text for pronunciation
///
/// # Examples
/// ```
/// use vocab_bot::validation::validate_tts_text;
///
/// assert_eq!(validate_tts_text("  apple "), Ok("apple"));
/// assert_eq!(validate_tts_text(""), Err("say-usage"));
/// ```
pub fn validate_tts_text(text: &str) -> Result<&str, &'static str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("say-usage");
    }
    if trimmed.chars().count() > MAX_TTS_TEXT_LEN {
        return Err("say-too-long");
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_pair() {
        assert_eq!(
            parse_word_pair("hello-привет"),
            Ok(("hello".to_string(), "привет".to_string()))
        );
    }

    #[test]
    fn test_parse_splits_on_first_hyphen() {
        assert_eq!(
            parse_word_pair("well-known - общеизвестный"),
            Ok(("well".to_string(), "known - общеизвестный".to_string()))
        );
    }

    #[test]
    fn test_parse_accepts_dashes_without_hyphen() {
        assert_eq!(
            parse_word_pair("apple — яблоко"),
            Ok(("apple".to_string(), "яблоко".to_string()))
        );
        assert_eq!(
            parse_word_pair("pear – груша"),
            Ok(("pear".to_string(), "груша".to_string()))
        );
    }

    #[test]
    fn test_parse_strips_html() {
        assert_eq!(
            parse_word_pair("<i>dog</i>&nbsp;-&nbsp;<b>собака</b>"),
            Ok(("dog".to_string(), "собака".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_word_pair("just a sentence"), Err("add-no-separator"));
        assert_eq!(parse_word_pair(" - перевод"), Err("add-empty-part"));
        assert_eq!(parse_word_pair("word -   "), Err("add-empty-part"));
        assert_eq!(parse_word_pair("a-b\nc-d"), Err("add-multiline"));

        let long = "x".repeat(MAX_PART_LEN + 1);
        assert_eq!(parse_word_pair(&format!("{}-y", long)), Err("add-too-long"));
    }

    #[test]
    fn test_length_limit_counts_characters() {
        // 100 Cyrillic characters are 200 bytes but still within the limit
        let translation = "я".repeat(MAX_PART_LEN);
        assert!(parse_word_pair(&format!("word-{}", translation)).is_ok());
    }

    #[test]
    fn test_looks_like_word_pair() {
        assert!(looks_like_word_pair("a-b"));
        assert!(looks_like_word_pair("a — b"));
        assert!(!looks_like_word_pair("яблоко"));
    }

    #[test]
    fn test_validate_word_argument() {
        assert_eq!(validate_word_argument("  cat "), Ok("cat"));
        assert_eq!(validate_word_argument(" "), Err("delete-usage"));
    }

    #[test]
    fn test_validate_tts_text_limits() {
        assert_eq!(validate_tts_text(&"a".repeat(MAX_TTS_TEXT_LEN + 1)), Err("say-too-long"));
        assert!(validate_tts_text(&"a".repeat(MAX_TTS_TEXT_LEN)).is_ok());
    }
}

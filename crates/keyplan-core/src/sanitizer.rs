//! Keyword normalization for the metrics provider.
//!
//! The provider rejects keywords containing punctuation, more than ten words,
//! or more than eighty characters. Every keyword sent downstream passes
//! through [`normalize_keyword`] first.

use std::collections::HashSet;

use crate::defaults::{KEYWORD_MAX_CHARS, KEYWORD_MAX_WORDS};

/// Normalize one raw keyword into the provider's accepted form.
///
/// Characters other than ASCII letters, digits, whitespace and `-` become
/// spaces, whitespace runs collapse, and the result is capped at
/// [`KEYWORD_MAX_WORDS`] words and [`KEYWORD_MAX_CHARS`] characters.
/// Returns an empty string when nothing usable remains.
pub fn normalize_keyword(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let limited = replaced
        .split_whitespace()
        .take(KEYWORD_MAX_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    // Only ASCII survives the filter above, so byte and char lengths agree.
    let capped = if limited.len() > KEYWORD_MAX_CHARS {
        &limited[..KEYWORD_MAX_CHARS]
    } else {
        limited.as_str()
    };

    capped.trim().to_string()
}

/// Normalize a list of keywords, dropping empties and duplicates.
///
/// Deduplication happens after normalization and keeps first-seen order.
pub fn sanitize_keyword_list<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    keywords
        .into_iter()
        .map(|k| normalize_keyword(k.as_ref()))
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

//! Lexical helpers shared by clustering, classification, and seed derivation.
//!
//! Everything here is ASCII-oriented: tokens are runs of `[a-z0-9]` after
//! lowercasing, which matches what the metrics provider accepts.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Words dropped before deriving topics or URL tokens.
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "the", "for", "to", "of", "on", "in", "with", "by", "vs", "vs.", "near",
        "best", "top", "how", "what",
    ]
    .into_iter()
    .collect()
});

/// Domain suffix labels that never count as brand tokens.
const TLD_PARTS: &[&str] = &["co", "com", "uk", "io", "net", "org"];

static SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://").expect("valid regex"));
static QUERY_OR_FRAGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?#].*$").expect("valid regex"));
static DOMAIN_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(co|com|uk|io|net|org)(/|$)").expect("valid regex"));
static LIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n,]+").expect("valid regex"));

/// Check whether a token is in the stop-word set.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Lowercase and split on anything that is not an ASCII letter or digit.
pub fn tokenize(value: &str) -> Vec<String> {
    value
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Convert a name to a URL-safe slug.
///
/// Runs of characters outside `[a-z0-9]` collapse to a single `-`, and
/// leading/trailing dashes are removed. May return an empty string.
pub fn slugify(value: &str) -> String {
    tokenize(value).join("-")
}

/// Extract candidate keyword tokens from a URL.
///
/// Drops the scheme, query, fragment and common domain suffixes, then keeps
/// lowercase tokens longer than two characters that are not stop words.
pub fn extract_keywords_from_url(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    let cleaned = SCHEME.replace(value, "");
    let cleaned = QUERY_OR_FRAGMENT.replace(&cleaned, "");
    let cleaned = DOMAIN_SUFFIX.replace_all(&cleaned, " ");

    tokenize(&cleaned)
        .into_iter()
        .filter(|t| t.len() > 2)
        .filter(|t| !is_stop_word(t))
        .collect()
}

/// Extract brand tokens from the host labels of the given URLs.
///
/// Unparseable URLs fall back to [`extract_keywords_from_url`]. Output is
/// deduplicated and keeps first-seen order.
pub fn extract_brand_terms<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut terms = Vec::new();

    for raw in urls {
        let raw = raw.as_ref();
        let tokens = match reqwest::Url::parse(raw)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
        {
            Some(host) => {
                let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
                host.split('.')
                    .map(str::to_lowercase)
                    .filter(|t| !t.is_empty())
                    .filter(|t| !TLD_PARTS.contains(&t.as_str()))
                    .filter(|t| t.len() > 2)
                    .filter(|t| !is_stop_word(t))
                    .collect::<Vec<_>>()
            }
            None => extract_keywords_from_url(raw),
        };

        for token in tokens {
            if seen.insert(token.clone()) {
                terms.push(token);
            }
        }
    }

    terms
}

/// Split a comma- or newline-separated list, trimming and dropping blanks.
pub fn parse_list_input(value: &str) -> Vec<String> {
    LIST_SEPARATOR
        .split(value)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Adjacent-token bigrams joined by a single space.
pub fn bigrams(tokens: &[String]) -> Vec<String> {
    tokens
        .windows(2)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect()
}

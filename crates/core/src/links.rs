//! `[LINK:n]` placeholder encoding for step text.
//!
//! Step text is stored with every plain http(s) URL replaced by a
//! `[LINK:n]` placeholder, where `n` is the 0-based index of the URL in the
//! step's `links` array. The frontend renders each placeholder as an inline
//! link widget.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Regex matching plain URLs. Trailing punctuation is trimmed afterwards.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'\[\]]+"#).expect("valid regex"));

/// Regex matching an already-encoded placeholder.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[LINK:(\d+)\]").expect("valid regex"));

/// Characters stripped from the end of a detected URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

/// Text with URLs swapped for placeholders, plus the extracted URLs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkedText {
    pub text: String,
    pub links: Vec<String>,
}

/// Format the placeholder for link index `n`.
pub fn placeholder(n: usize) -> String {
    format!("[LINK:{n}]")
}

/// Replace every URL in `text` with a placeholder.
///
/// `existing_links` are the links of the text's previous encoding; any
/// placeholders already in `text` are decoded with them first, so running
/// the function on its own output is a no-op. Placeholders pointing past the
/// end of `existing_links` are left untouched.
pub fn encode_links(text: &str, existing_links: &[String]) -> LinkedText {
    let plain = decode_links(text, existing_links);
    let mut links: Vec<String> = Vec::new();
    let mut out = String::with_capacity(plain.len());
    let mut last = 0;

    for m in URL_RE.find_iter(&plain) {
        let raw = m.as_str();
        let url = raw.trim_end_matches(TRAILING_PUNCTUATION);
        if url.ends_with("://") {
            continue;
        }
        let index = match links.iter().position(|l| l == url) {
            Some(i) => i,
            None => {
                links.push(url.to_string());
                links.len() - 1
            }
        };
        out.push_str(&plain[last..m.start()]);
        out.push_str(&placeholder(index));
        last = m.start() + url.len();
    }
    out.push_str(&plain[last..]);

    LinkedText { text: out, links }
}

/// First placeholder in `text` with no entry in `links`, if any.
///
/// Stored text cannot tell such a marker apart from a real placeholder, so
/// step edits containing one are refused.
pub fn unresolved_placeholder<'a>(text: &'a str, links: &[String]) -> Option<&'a str> {
    PLACEHOLDER_RE.captures_iter(text).find_map(|caps| {
        let resolved = caps[1]
            .parse::<usize>()
            .ok()
            .is_some_and(|i| i < links.len());
        (!resolved).then(|| caps.get(0).map_or("", |m| m.as_str()))
    })
}

/// Restore URLs from placeholders.
pub fn decode_links(text: &str, links: &[String]) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| links.get(i))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

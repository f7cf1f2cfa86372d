//! Free-text query sanitisation for FTS5

use regex::Regex;
use std::sync::OnceLock;

static TERM_RE: OnceLock<Regex> = OnceLock::new();

/// Turn user text into an FTS5 expression of quoted terms (implicit AND).
///
/// FTS5 operators and punctuation in the input never reach the engine.
/// Returns `None` when the text has no searchable terms.
pub fn fts_query(text: &str) -> Option<String> {
    let re = TERM_RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}_]+").unwrap());
    let terms: Vec<String> = re
        .find_iter(text)
        .map(|m| format!("\"{}\"", m.as_str()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

//! Keyword snippet mining.
//!
//! A snippet is the text around the first case-insensitive occurrence of a
//! keyword: up to [`CONTEXT_BEFORE`] characters before the match and
//! [`CONTEXT_AFTER`] characters after it, trimmed of surrounding whitespace.

use regex::RegexBuilder;

/// Characters kept before a keyword match.
pub const CONTEXT_BEFORE: usize = 50;

/// Characters kept after a keyword match.
pub const CONTEXT_AFTER: usize = 250;

/// Find `keyword` in `full_text` and carve the surrounding snippet.
///
/// Returns `None` when the keyword is blank or does not occur. Offsets are
/// counted in characters, so multi-byte text is never split mid code point.
pub fn find_snippet(full_text: &str, keyword: &str) -> Option<String> {
    if keyword.trim().is_empty() {
        return None;
    }

    let pattern = RegexBuilder::new(&regex::escape(keyword))
        .case_insensitive(true)
        .build()
        .ok()?;
    let found = pattern.find(full_text)?;

    let match_start = full_text[..found.start()].chars().count();
    let match_end = match_start + found.as_str().chars().count();
    let start = match_start.saturating_sub(CONTEXT_BEFORE);
    let end = match_end + CONTEXT_AFTER;

    let snippet: String = full_text.chars().skip(start).take(end - start).collect();
    let snippet = snippet.trim();
    (!snippet.is_empty()).then(|| snippet.to_string())
}

/// Split a comma-separated keyword list. Entries are trimmed, blanks are
/// dropped and repeats keep their first position.
pub fn parse_keywords(input: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for keyword in input.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        if !keywords.iter().any(|existing| existing == keyword) {
            keywords.push(keyword.to_string());
        }
    }
    keywords
}

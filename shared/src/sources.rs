//! Citation list shown under an answer.

use crate::knowledge_base::Passage;
use crate::models::Source;
use crate::prompt::UNKNOWN_SOURCE;

/// Maximum snippet length in characters.
pub const SNIPPET_LIMIT: usize = 500;

/// Cut `text` to [`SNIPPET_LIMIT`] characters, appending `...` when cut.
pub fn truncate_snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Build the numbered source list for the retrieved passages.
pub fn build_sources(passages: &[Passage]) -> Vec<Source> {
    passages
        .iter()
        .enumerate()
        .map(|(i, passage)| Source {
            id: i + 1,
            snippet: truncate_snippet(&passage.text),
            file: passage.uri.clone().unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        })
        .collect()
}

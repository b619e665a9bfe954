//! Text normalization and fixed-size chunking for the summary fold.

use std::sync::LazyLock;

use regex::Regex;

static BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[\]]").expect("bracket pattern is valid"));
static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("space pattern is valid"));
static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\n[\s]*").expect("newline pattern is valid"));

/// Tidy fetched text before it is chunked.
///
/// Markup is already gone: the fetcher returns the page's text nodes, so
/// `<` and `>` here are content (generics, comparisons) and are kept.
/// Removes the `[`/`]` of link syntax, collapses runs of spaces and tabs to
/// one space and runs of line breaks (with the blanks around them) to one
/// newline.
pub fn normalize_text(raw: &str) -> String {
    let text = BRACKETS.replace_all(raw, "");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = LINE_BREAKS.replace_all(&text, "\n");
    text.trim().to_string()
}

/// Split `text` into consecutive chunks of `size` characters; the last
/// chunk may be shorter. Concatenating the chunks gives back `text`.
///
/// A `size` of zero is treated as one.
pub fn split_chunks(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(text.len() / size + 1);
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == size {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

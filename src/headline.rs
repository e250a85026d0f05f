//! Headline derivation
//!
//! Every arc element carries a single-line headline derived from its
//! description: the first line, capped at 20 words and then hard-capped at
//! 250 characters. Word truncation appends an ellipsis marker; the space in
//! front of the marker is stripped before the character cap is applied so a
//! maximal headline still fits.

const HEADLINE_WORD_LIMIT: usize = 20;
const HEADLINE_CHAR_LIMIT: usize = 250;
const ELLIPSIS: char = '\u{2026}';

/// Derives the headline for a description. Runs on every description write.
pub fn derive_headline(description: &str) -> String {
    let first_line = description.split('\n').next().unwrap_or("");
    let headline = truncate_words(first_line, HEADLINE_WORD_LIMIT);
    if headline.ends_with(ELLIPSIS) {
        let compact = headline.replace(" \u{2026}", "\u{2026}");
        truncate_chars(&compact, HEADLINE_CHAR_LIMIT)
    } else {
        truncate_chars(&headline, HEADLINE_CHAR_LIMIT)
    }
}

fn truncate_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        return text.trim().to_string();
    }
    let mut truncated = words[..limit].join(" ");
    truncated.push(' ');
    truncated.push(ELLIPSIS);
    truncated
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit - 1).collect();
    truncated.push(ELLIPSIS);
    truncated
}

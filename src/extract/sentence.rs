//! Sentence segmentation and whole-word trigger matching.

use std::collections::HashSet;

/// Lowercased abbreviations whose trailing `.` does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "cf", "vs", "approx", "dr", "mr", "mrs", "ms", "prof", "fig", "eq",
];

/// Split text into sentences using basic punctuation rules.
///
/// A newline always ends a sentence. `.`, `!` and `?` end one only when
/// followed by whitespace or the end of the text, so `3.14` and `e.g.` stay
/// inside their sentence; a `.` after a known abbreviation never does. The
/// terminator stays with the sentence. Fragments of a single character are
/// dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        let ends = match ch {
            '\n' => true,
            '.' | '!' | '?' => {
                let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
                at_boundary && !(ch == '.' && ends_with_abbreviation(&current))
            }
            _ => false,
        };
        if ends {
            push_sentence(&mut sentences, &current);
            current.clear();
        }
    }

    // Text without trailing punctuation.
    push_sentence(&mut sentences, &current);

    sentences
}

fn ends_with_abbreviation(current: &str) -> bool {
    let body = current.trim_end_matches('.');
    let token = body
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(|c: char| !c.is_alphanumeric());
    ABBREVIATIONS.contains(&token.to_lowercase().as_str())
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if trimmed.chars().count() > 1 {
        sentences.push(trimmed.to_string());
    }
}

/// Word tokens of a sentence: maximal runs of alphanumerics and `_`.
pub fn words(sentence: &str) -> impl Iterator<Item = &str> {
    sentence
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

/// Whether any whole word of `sentence` is in `triggers` (compared lowercased).
///
/// `triggers` must already be lowercase.
pub fn contains_trigger(sentence: &str, triggers: &HashSet<String>) -> bool {
    words(sentence).any(|w| triggers.contains(&w.to_lowercase()))
}

/// The first `n` characters of `s` (not bytes).
pub fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

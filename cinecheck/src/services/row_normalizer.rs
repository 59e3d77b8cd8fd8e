//! Title normalization for comparison and query construction
//!
//! Cleans raw cell text into the form used for composite keys and search
//! queries: collapsed whitespace, each word's first letter upper-cased.

/// Normalize a raw title cell
///
/// Splits on whitespace, drops empty tokens, upper-cases the first character
/// of each remaining token (the rest is left unchanged), and rejoins with
/// single spaces. Leading/trailing whitespace is trimmed as a consequence.
///
/// Words starting with punctuation are normalized as-is ("-hyphenated" keeps
/// its hyphen and its lowercase letters); a known limitation, kept rather
/// than special-cased.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(word.len());
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

//! Title normalization shared by lookups, table indexes and mined tables.
//!
//! Every journal title or abbreviation goes through [`normalize_title`] before it
//! is compared, so the table and the query always agree on one spelling.
//!
//! # Casing rule
//!
//! Each word is lowercased and then gets its first letter uppercased, except the
//! minor words in [`MINOR_WORDS`], which stay lowercase unless they open or close
//! the title. Hyphenated parts are cased on their own. The output depends only on
//! the lowercased input, so normalization is case-insensitive.
//!
//! ```
//! use jabbrev::normalize_title;
//!
//! assert_eq!(normalize_title("  THE journal OF chemical physics "), "Journal of Chemical Physics");
//! assert_eq!(normalize_title(r"Physics \& Chemistry"), "Physics and Chemistry");
//! ```

use itertools::Itertools;

/// Words kept lowercase inside a title.
pub const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "en", "for", "from", "if", "in", "into", "nor",
    "of", "on", "or", "per", "the", "to", "v", "v.", "via", "vs", "vs.", "with",
];

const ESCAPED_AMPERSAND: &str = r"\&";

/// Normalizes a journal title or abbreviation for lookup.
///
/// Replaces `\&` and `&` with "and", collapses whitespace, drops a leading "The"
/// and applies [`title_case`].
///
/// # Arguments
///
/// * `input` - The raw title, e.g. the content of a BibTeX `journal` field
pub fn normalize_title(input: &str) -> String {
    let replaced = input
        .replace(ESCAPED_AMPERSAND, " and ")
        .replace('&', " and ");

    let mut words: Vec<&str> = replaced.split_whitespace().collect();
    if words.len() > 1 && words[0].eq_ignore_ascii_case("the") {
        words.remove(0);
    }

    case_words(&words)
}

/// Applies the casing rule alone, collapsing whitespace but keeping articles
/// and ampersands.
pub fn title_case(input: &str) -> String {
    let words: Vec<&str> = input.split_whitespace().collect();
    case_words(&words)
}

fn case_words(words: &[&str]) -> String {
    let last = words.len().saturating_sub(1);
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i != 0 && i != last && MINOR_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                lower.split('-').map(capitalize).join("-")
            }
        })
        .join(" ")
}

/// Uppercases the first alphabetic character, leaving leading punctuation alone.
fn capitalize(segment: &str) -> String {
    match segment.char_indices().find(|(_, c)| c.is_alphabetic()) {
        Some((index, c)) => {
            let mut result = String::with_capacity(segment.len());
            result.push_str(&segment[..index]);
            result.extend(c.to_uppercase());
            result.push_str(&segment[index + c.len_utf8()..]);
            result
        }
        None => segment.to_string(),
    }
}

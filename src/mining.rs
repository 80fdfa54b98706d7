//! Building abbreviation tables from journal index pages.
//!
//! Index pages list each journal as a `<dt>` title followed by a `<dd>`
//! abbreviation, usually in upper case and without periods. The helpers here
//! turn saved copies of such pages into a JSON table that
//! [`AbbreviationTable::from_paths`](crate::AbbreviationTable::from_paths) can load.
//! Fetching the pages is left to the caller.
//!
//! Both sides are cased with [`title_case`], the rule lookups use, and
//! periods are added to abbreviation words that look shortened. That last
//! step is a heuristic: a short word that is not in the title gets a period
//! whether or not it really is an abbreviation.
//!
//! # Example
//!
//! ```
//! use jabbrev::mining::MinedTable;
//!
//! let mut mined = MinedTable::new();
//! mined.add_html("<dl><dt>JOURNAL OF CHEMICAL PHYSICS</dt><dd>J CHEM PHYS</dd></dl>").unwrap();
//!
//! assert_eq!(mined.get("Journal of Chemical Physics"), Some("J. Chem. Phys."));
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use itertools::Itertools;
use scraper::{Html, Selector};
use serde::Serialize;

use crate::normalize::title_case;
use crate::table::AbbreviationTable;
use crate::{Error, Result};

/// Abbreviation words longer than this are taken to be full words.
const MAX_ABBREVIATED_WORD_LEN: usize = 6;

/// Title/abbreviation pairs collected from index pages, sorted by title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MinedTable {
    abbreviations: BTreeMap<String, String>,
}

impl MinedTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes and records one pair, replacing any earlier pair with the
    /// same title.
    pub fn add_pair(&mut self, title: &str, abbreviation: &str) {
        let (title, abbreviation) = normalize_pair(title, abbreviation);
        if title.is_empty() || abbreviation.is_empty() {
            tracing::warn!(title = %title, abbreviation = %abbreviation, "skipping empty mined pair");
            return;
        }
        self.abbreviations.insert(title, abbreviation);
    }

    /// Records every pair of an index page, returning how many were found.
    pub fn add_html(&mut self, html: &str) -> Result<usize> {
        let pairs = extract_pairs_from_html(html)?;
        for (title, abbreviation) in &pairs {
            self.add_pair(title, abbreviation);
        }
        tracing::debug!(pairs = pairs.len(), total = self.len(), "mined index page");
        Ok(pairs.len())
    }

    pub fn get(&self, title: &str) -> Option<&str> {
        self.abbreviations.get(title).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.abbreviations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abbreviations.is_empty()
    }

    /// Serializes to a JSON object with sorted keys and four-space indentation.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| Error::Mining(e.to_string()))?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|e| Error::Mining(e.to_string()))
    }

    /// Writes the table source file, creating or truncating `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), entries = self.len(), "saved mined abbreviations");
        Ok(())
    }

    /// Builds a lookup table directly from the mined pairs.
    pub fn into_table(self) -> AbbreviationTable {
        AbbreviationTable::from_entries(self.abbreviations)
    }
}

/// Pairs each `<dt>` of `html` with the `<dd>` at the same position.
///
/// # Errors
///
/// Returns [`Error::Mining`] when the page has a different number of titles
/// and abbreviations.
pub fn extract_pairs_from_html(html: &str) -> Result<Vec<(String, String)>> {
    let document = Html::parse_document(html);
    let titles = select_texts(&document, "dt")?;
    let abbreviations = select_texts(&document, "dd")?;

    if titles.len() != abbreviations.len() {
        return Err(Error::Mining(format!(
            "found {} titles but {} abbreviations",
            titles.len(),
            abbreviations.len()
        )));
    }

    Ok(titles.into_iter().zip(abbreviations).collect())
}

fn select_texts(document: &Html, selector: &str) -> Result<Vec<String>> {
    let selector = Selector::parse(selector).map_err(|e| Error::Mining(e.to_string()))?;
    Ok(document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .collect())
}

/// Cases both sides of a mined pair and adds periods to the abbreviation,
/// unless the page lists the journal under its own name.
pub fn normalize_pair(title: &str, abbreviation: &str) -> (String, String) {
    let cased_title = title_case(title);
    let cased_abbreviation = title_case(abbreviation);

    if title.trim() == abbreviation.trim() {
        return (cased_title, cased_abbreviation);
    }

    let dotted = add_dots_to_abbreviation(&cased_title, &cased_abbreviation);
    (cased_title, dotted)
}

/// Appends a period to each abbreviation word that is short, not already
/// dotted, and not also a word of the title.
///
/// ```
/// use jabbrev::mining::add_dots_to_abbreviation;
///
/// assert_eq!(add_dots_to_abbreviation("Physics Today", "Phys Today"), "Phys. Today");
/// ```
pub fn add_dots_to_abbreviation(title: &str, abbreviation: &str) -> String {
    let title_words: Vec<&str> = title.split(' ').collect();

    abbreviation
        .split(' ')
        .map(|word| {
            if word.is_empty()
                || word.ends_with('.')
                || word.chars().count() > MAX_ABBREVIATED_WORD_LEN
                || title_words.contains(&word)
            {
                word.to_string()
            } else {
                format!("{word}.")
            }
        })
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const INDEX_PAGE: &str = r#"<html><body><dl>
        <dt>JOURNAL OF CHEMICAL PHYSICS</dt>
        <dd>J CHEM PHYS</dd>
        <dt>CHEMPHYSCHEM</dt>
        <dd>CHEMPHYSCHEM</dd>
        <dt> ACTA CRYSTALLOGRAPHICA SECTION B </dt>
        <dd>ACTA CRYSTALLOGR B</dd>
    </dl></body></html>"#;

    #[rstest]
    #[case("Journal of Chemical Physics", "J Chem Phys", "J. Chem. Phys.")]
    #[case("Physics Today", "Phys Today", "Phys. Today")]
    #[case("Acta Crystallographica Section B", "Acta Crystallogr B", "Acta Crystallogr B")]
    #[case("Nature Reviews Chemistry", "Nat Rev Chem", "Nat. Rev. Chem.")]
    #[case("Journal of Chemical Physics", "J.  Chem Phys", "J.  Chem. Phys.")]
    fn test_add_dots_to_abbreviation(#[case] title: &str, #[case] abbreviation: &str, #[case] expected: &str) {
        assert_eq!(add_dots_to_abbreviation(title, abbreviation), expected);
    }

    #[test]
    fn test_normalize_pair() {
        assert_eq!(
            normalize_pair("JOURNAL OF CHEMICAL PHYSICS", "J CHEM PHYS"),
            ("Journal of Chemical Physics".to_string(), "J. Chem. Phys.".to_string())
        );
        assert_eq!(
            normalize_pair("SCIENCE", "SCIENCE"),
            ("Science".to_string(), "Science".to_string())
        );
    }

    #[test]
    fn test_extract_pairs_from_html() {
        let pairs = extract_pairs_from_html(INDEX_PAGE).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("JOURNAL OF CHEMICAL PHYSICS".to_string(), "J CHEM PHYS".to_string()),
                ("CHEMPHYSCHEM".to_string(), "CHEMPHYSCHEM".to_string()),
                ("ACTA CRYSTALLOGRAPHICA SECTION B".to_string(), "ACTA CRYSTALLOGR B".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_pairs_count_mismatch() {
        let err = extract_pairs_from_html("<dl><dt>A</dt><dt>B</dt><dd>a</dd></dl>").unwrap_err();
        assert!(matches!(err, Error::Mining(ref msg) if msg == "found 2 titles but 1 abbreviations"));
    }

    #[test]
    fn test_mined_table_to_json() {
        let mut mined = MinedTable::new();
        assert_eq!(mined.add_html(INDEX_PAGE).unwrap(), 3);

        assert_eq!(
            mined.to_json().unwrap(),
            "{\n    \
             \"Acta Crystallographica Section B\": \"Acta Crystallogr B\",\n    \
             \"Chemphyschem\": \"Chemphyschem\",\n    \
             \"Journal of Chemical Physics\": \"J. Chem. Phys.\"\n\
             }\n"
        );
    }

    #[test]
    fn test_mined_table_loads_as_table() {
        let mut mined = MinedTable::new();
        mined.add_html(INDEX_PAGE).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal_names_abr.json");
        mined.save(&path).unwrap();

        let table = AbbreviationTable::from_paths([&path]).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.convert_to_abbreviation("The Journal of Chemical Physics").unwrap(),
            "J. Chem. Phys."
        );
        assert_eq!(table.convert_to_abbreviation("ChemPhysChem").unwrap(), "Chemphyschem");

        let direct = mined.into_table();
        assert_eq!(direct.convert_to_title("J. Chem. Phys.").unwrap(), "Journal of Chemical Physics");
    }

    #[test]
    fn test_empty_pairs_are_skipped() {
        let mut mined = MinedTable::new();
        mined.add_pair("  ", "X");
        mined.add_pair("Journal", "");
        assert!(mined.is_empty());
    }
}

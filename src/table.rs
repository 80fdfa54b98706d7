//! Journal title/abbreviation table.
//!
//! A table is built once from one or more JSON sources, each a flat object
//! mapping full titles to abbreviations:
//!
//! ```json
//! {
//!     "Journal Of Chemical Physics": "J. Chem. Phys.",
//!     "ChemPhysChem": "ChemPhysChem"
//! }
//! ```
//!
//! Sources are merged in the order given, later sources overriding earlier ones
//! on the same title. Lookups in both directions go through
//! [`normalize_title`](crate::normalize_title), so they ignore case, surrounding
//! whitespace and a leading "The".
//!
//! # Example
//!
//! ```
//! use jabbrev::{AbbreviationTable, Lookup};
//!
//! let table = AbbreviationTable::from_entries([
//!     ("Journal Of Chemical Physics", "J. Chem. Phys."),
//!     ("ChemPhysChem", "ChemPhysChem"),
//! ]);
//!
//! assert_eq!(
//!     table.lookup_abbreviation("the journal of chemical physics"),
//!     Some(Lookup::Abbreviated("J. Chem. Phys."))
//! );
//! assert_eq!(
//!     table.lookup_abbreviation("J. Chem. Phys"),
//!     Some(Lookup::AlreadyAbbreviated("J. Chem. Phys."))
//! );
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::normalize::normalize_title;
use crate::{Error, LookupKind, Result};

/// Path reported for tables parsed from an in-memory string.
const INLINE_SOURCE: &str = "<inline>";

/// A single title and its abbreviation, as spelled in the table source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbbreviationEntry {
    pub title: String,
    pub abbreviation: String,
}

/// Outcome of a successful title lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The input is a known title; carries its abbreviation.
    Abbreviated(&'a str),
    /// The input already is a known abbreviation, possibly missing its
    /// trailing period; carries the abbreviation as the table spells it.
    AlreadyAbbreviated(&'a str),
}

impl<'a> Lookup<'a> {
    /// The abbreviation to use, whichever way it was found.
    pub fn abbreviation(&self) -> &'a str {
        match *self {
            Lookup::Abbreviated(abbr) | Lookup::AlreadyAbbreviated(abbr) => abbr,
        }
    }
}

/// Bidirectional title/abbreviation lookup.
///
/// Entries keep the order in which they were first seen. The forward and
/// inverse indexes are keyed by the normalized form and point into the entry
/// list; when two entries normalize to the same key, the later one wins.
#[derive(Debug, Clone, Default)]
pub struct AbbreviationTable {
    entries: Vec<AbbreviationEntry>,
    /// Raw title to position in `entries`, for merge-by-title.
    positions: HashMap<String, usize>,
    forward: HashMap<CompactString, usize>,
    inverse: HashMap<CompactString, usize>,
    sources: Vec<PathBuf>,
}

impl AbbreviationTable {
    /// Loads and merges the given JSON table sources.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if a file cannot be read or is not a flat
    /// object of strings. No partially loaded table is returned.
    pub fn from_paths<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut table = Self::default();
        for path in paths {
            let path = path.as_ref();
            let content = fs::read_to_string(path).map_err(|e| Error::Load {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            let pairs = parse_source(&content, path)?;
            tracing::debug!(path = %path.display(), entries = pairs.len(), "loaded abbreviation source");
            table.insert_pairs(pairs);
            table.sources.push(path.to_path_buf());
        }

        if table.sources.is_empty() {
            tracing::warn!("no abbreviation sources given, table is empty");
        }

        table.build_indexes();
        Ok(table)
    }

    /// Parses a single JSON source held in memory.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut table = Self::default();
        table.insert_pairs(parse_source(json, Path::new(INLINE_SOURCE))?);
        table.build_indexes();
        Ok(table)
    }

    /// Builds a table from title/abbreviation pairs, later pairs overriding
    /// earlier ones with the same title.
    pub fn from_entries<I, T, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (T, A)>,
        T: Into<String>,
        A: Into<String>,
    {
        let mut table = Self::default();
        table.insert_pairs(
            entries
                .into_iter()
                .map(|(title, abbr)| (title.into(), Some(abbr.into()))),
        );
        table.build_indexes();
        table
    }

    /// Layers `other` on top of this table.
    #[must_use]
    pub fn merge(mut self, other: AbbreviationTable) -> Self {
        self.insert_pairs(
            other
                .entries
                .into_iter()
                .map(|entry| (entry.title, Some(entry.abbreviation))),
        );
        self.sources.extend(other.sources);
        self.build_indexes();
        self
    }

    /// Finds the abbreviation for `title`.
    ///
    /// A title that is not in the table may already be an abbreviation; the
    /// inverse index is then checked for the input as-is and with a trailing
    /// period appended.
    pub fn lookup_abbreviation(&self, title: &str) -> Option<Lookup<'_>> {
        let key = normalize_title(title);

        if let Some(&index) = self.forward.get(key.as_str()) {
            return Some(Lookup::Abbreviated(&self.entries[index].abbreviation));
        }
        if let Some(&index) = self.inverse.get(key.as_str()) {
            return Some(Lookup::AlreadyAbbreviated(&self.entries[index].abbreviation));
        }

        let dotted = format!("{key}.");
        self.inverse
            .get(dotted.as_str())
            .map(|&index| Lookup::AlreadyAbbreviated(self.entries[index].abbreviation.as_str()))
    }

    /// Finds the full title for `abbreviation`.
    pub fn lookup_title(&self, abbreviation: &str) -> Option<&str> {
        let key = normalize_title(abbreviation);
        self.inverse
            .get(key.as_str())
            .map(|&index| self.entries[index].title.as_str())
    }

    /// Converts a title to its abbreviation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the input is neither a known title nor
    /// already a known abbreviation.
    pub fn convert_to_abbreviation(&self, title: &str) -> Result<&str> {
        self.lookup_abbreviation(title)
            .map(|lookup| lookup.abbreviation())
            .ok_or_else(|| Error::NotFound {
                kind: LookupKind::Title,
                query: title.trim().to_string(),
            })
    }

    /// Converts an abbreviation back to its full title.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the abbreviation is unknown.
    pub fn convert_to_title(&self, abbreviation: &str) -> Result<&str> {
        self.lookup_title(abbreviation).ok_or_else(|| Error::NotFound {
            kind: LookupKind::Abbreviation,
            query: abbreviation.trim().to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in table order.
    pub fn entries(&self) -> impl Iterator<Item = &AbbreviationEntry> {
        self.entries.iter()
    }

    /// Files this table was loaded from, in load order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    fn insert_pairs<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        for (title, abbreviation) in pairs {
            let abbreviation = match abbreviation {
                Some(abbr) if !abbr.trim().is_empty() && !title.trim().is_empty() => abbr,
                _ => {
                    tracing::warn!(title = %title, "discarding entry with an empty title or abbreviation");
                    continue;
                }
            };

            match self.positions.get(&title) {
                Some(&index) => self.entries[index].abbreviation = abbreviation,
                None => {
                    self.positions.insert(title.clone(), self.entries.len());
                    self.entries.push(AbbreviationEntry {
                        title,
                        abbreviation,
                    });
                }
            }
        }
    }

    fn build_indexes(&mut self) {
        self.forward.clear();
        self.inverse.clear();
        for (index, entry) in self.entries.iter().enumerate() {
            self.forward
                .insert(normalize_title(&entry.title).into(), index);
            self.inverse
                .insert(normalize_title(&entry.abbreviation).into(), index);
        }
        tracing::info!(
            entries = self.entries.len(),
            abbreviations = self.inverse.len(),
            "abbreviation table ready"
        );
    }
}

/// Title/abbreviation pairs in document order. `null` values are kept as
/// `None` and discarded on insert.
struct SourcePairs(Vec<(String, Option<String>)>);

impl<'de> Deserialize<'de> for SourcePairs {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = SourcePairs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a flat JSON object mapping journal titles to abbreviations")
            }

            fn visit_map<M>(self, mut map: M) -> std::result::Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((title, abbreviation)) = map.next_entry::<String, Option<String>>()? {
                    pairs.push((title, abbreviation));
                }
                Ok(SourcePairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

fn parse_source(json: &str, path: &Path) -> Result<Vec<(String, Option<String>)>> {
    serde_json::from_str::<SourcePairs>(json)
        .map(|pairs| pairs.0)
        .map_err(|e| Error::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = include_str!("../data/sample_abbreviations.json");

    #[fixture]
    fn table() -> AbbreviationTable {
        AbbreviationTable::from_json_str(SAMPLE).unwrap()
    }

    fn write_source(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[rstest]
    fn test_round_trip_every_entry(table: AbbreviationTable) {
        assert!(!table.is_empty());
        for entry in table.entries() {
            assert_eq!(
                table.convert_to_abbreviation(&entry.title).unwrap(),
                entry.abbreviation
            );
            assert_eq!(table.convert_to_title(&entry.abbreviation).unwrap(), entry.title);
        }
    }

    #[rstest]
    fn test_self_mapping(table: AbbreviationTable) {
        assert_eq!(table.convert_to_abbreviation("ChemPhysChem").unwrap(), "ChemPhysChem");
        assert_eq!(table.convert_to_title("ChemPhysChem").unwrap(), "ChemPhysChem");
    }

    #[rstest]
    #[case("journal of chemical physics")]
    #[case(" Journal Of Chemical Physics ")]
    #[case("JOURNAL OF CHEMICAL PHYSICS")]
    #[case("The Journal of Chemical Physics")]
    fn test_abbreviation_ignores_case_and_whitespace(table: AbbreviationTable, #[case] title: &str) {
        assert_eq!(table.convert_to_abbreviation(title).unwrap(), "J. Chem. Phys.");
    }

    #[rstest]
    fn test_leading_article_is_stripped(table: AbbreviationTable) {
        assert_eq!(
            table.convert_to_abbreviation("The Journal Of Physical Chemistry").unwrap(),
            table.convert_to_abbreviation("Journal Of Physical Chemistry").unwrap()
        );
    }

    #[rstest]
    fn test_escaped_ampersand(table: AbbreviationTable) {
        assert_eq!(
            table.convert_to_abbreviation(r"Physics \& Chemistry of Liquids").unwrap(),
            "Phys. Chem. Liq."
        );
        assert_eq!(
            table.convert_to_abbreviation("Physics and Chemistry of Liquids").unwrap(),
            "Phys. Chem. Liq."
        );
    }

    #[rstest]
    fn test_already_abbreviated(table: AbbreviationTable) {
        assert_eq!(
            table.lookup_abbreviation("J. Chem. Phys."),
            Some(Lookup::AlreadyAbbreviated("J. Chem. Phys."))
        );
        assert_eq!(
            table.lookup_abbreviation("j. chem. phys"),
            Some(Lookup::AlreadyAbbreviated("J. Chem. Phys."))
        );
        assert_eq!(table.convert_to_abbreviation("Phys. Rev. Lett").unwrap(), "Phys. Rev. Lett.");
    }

    #[rstest]
    fn test_unknown_input(table: AbbreviationTable) {
        let err = table.convert_to_abbreviation("Not A Real Journal").unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound { kind: LookupKind::Title, ref query } if query == "Not A Real Journal"
        ));

        let err = table.convert_to_title("Not. A. Real. J.").unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: LookupKind::Abbreviation, .. }));
    }

    #[rstest]
    fn test_title_lookup_has_no_self_mapping_fallback(table: AbbreviationTable) {
        assert_eq!(table.lookup_title("Journal Of Chemical Physics"), None);
        assert_eq!(table.lookup_title("J. Chem. Phys"), None);
    }

    #[test]
    fn test_inverse_collision_last_write_wins() {
        let table = AbbreviationTable::from_entries([
            ("Journal Of Things", "J. Things"),
            ("Journal Of the Things", "J. Things"),
        ]);
        assert_eq!(table.convert_to_title("J. Things").unwrap(), "Journal Of the Things");
        assert_eq!(table.convert_to_abbreviation("Journal Of Things").unwrap(), "J. Things");
    }

    #[test]
    fn test_empty_entries_are_discarded() {
        let table = AbbreviationTable::from_json_str(
            r#"{"": "X.", "Empty Abbreviation": "", "Blank": "  ", "Null": null, "Kept": "K."}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.convert_to_abbreviation("Kept").unwrap(), "K.");
        assert!(table.convert_to_abbreviation("Empty Abbreviation").is_err());
        assert!(table.convert_to_abbreviation("Null").is_err());
    }

    #[test]
    fn test_from_paths_merges_in_order() {
        let base = write_source(r#"{"Alpha Journal": "Alpha J.", "Beta Letters": "Beta Lett."}"#);
        let added = write_source(r#"{"Beta Letters": "B. Lett.", "Gamma Reviews": "Gamma Rev."}"#);

        let table = AbbreviationTable::from_paths([base.path(), added.path()]).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.sources(), &[base.path().to_path_buf(), added.path().to_path_buf()]);
        assert_eq!(table.convert_to_abbreviation("Beta Letters").unwrap(), "B. Lett.");
        assert!(table.convert_to_title("Beta Lett.").is_err());

        let titles: Vec<&str> = table.entries().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha Journal", "Beta Letters", "Gamma Reviews"]);
    }

    #[test]
    fn test_merge() {
        let base = AbbreviationTable::from_entries([("Alpha Journal", "Alpha J.")]);
        let overlay = AbbreviationTable::from_entries([("Alpha Journal", "A. J."), ("Nature", "Nature")]);

        let merged = base.merge(overlay);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.convert_to_abbreviation("alpha journal").unwrap(), "A. J.");
        assert_eq!(merged.convert_to_abbreviation("nature").unwrap(), "Nature");
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = AbbreviationTable::from_paths([&missing]).unwrap_err();
        assert!(matches!(err, Error::Load { ref path, .. } if *path == missing));
    }

    #[rstest]
    #[case("not json at all")]
    #[case(r#"["Journal", "J."]"#)]
    #[case(r#"{"Journal": 3}"#)]
    #[case(r#"{"Journal": {"nested": "J."}}"#)]
    fn test_invalid_source_is_load_error(#[case] content: &str) {
        let file = write_source(content);
        let err = AbbreviationTable::from_paths([file.path()]).unwrap_err();
        assert!(matches!(err, Error::Load { .. }), "unexpected error: {err}");
    }

    #[test]
    fn test_no_sources_gives_empty_table() {
        let table = AbbreviationTable::from_paths(Vec::<PathBuf>::new()).unwrap();
        assert!(table.is_empty());
        assert!(table.convert_to_abbreviation("Nature").is_err());
    }
}

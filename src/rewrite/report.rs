//! Per-run statistics collected while rewriting a bibliography.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Distinct journal titles seen during a run, split by outcome.
///
/// Titles are recorded as they appear between the braces, before
/// normalization, so a title written two different ways shows up twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// Titles that were replaced by an abbreviation, including those that
    /// already were one.
    pub abbreviated: BTreeSet<String>,
    /// Titles left unchanged because the table does not know them.
    pub not_found: BTreeSet<String>,
    /// Number of lines read.
    pub lines: usize,
    /// Number of `journal` lines among them.
    pub journal_lines: usize,
}

impl ConversionReport {
    /// True when every journal title was found.
    pub fn is_complete(&self) -> bool {
        self.not_found.is_empty()
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "The abbreviated titles are:")?;
        for title in &self.abbreviated {
            writeln!(f, "\t{title}")?;
        }
        writeln!(f)?;
        writeln!(f, "The following titles were not found in the data bank:")?;
        for title in &self.not_found {
            writeln!(f, "\t{title}")?;
        }
        Ok(())
    }
}

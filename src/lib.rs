//! Conversion between full journal titles and their standard abbreviations.
//!
//! `jabbrev` turns "Journal of Chemical Physics" into "J. Chem. Phys." and back,
//! and applies that conversion to the `journal = {...}` fields of a BibTeX file.
//!
//! # Key Features
//!
//! - **Bidirectional lookup**: title to abbreviation and abbreviation to title,
//!   insensitive to case, surrounding whitespace and a leading "The".
//! - **Mergeable tables**: several JSON title/abbreviation files can be layered,
//!   later files overriding earlier ones.
//! - **Line-level BibTeX rewriting**: only `journal` lines are touched, every other
//!   line is copied byte-for-byte.
//! - **Run reports**: the distinct titles that were abbreviated and those that
//!   were not found.
//!
//! # Basic Usage
//!
//! ```rust
//! use jabbrev::AbbreviationTable;
//!
//! let table = AbbreviationTable::from_json_str(
//!     r#"{"Journal Of Chemical Physics": "J. Chem. Phys."}"#,
//! ).unwrap();
//!
//! assert_eq!(table.convert_to_abbreviation("journal of chemical physics").unwrap(), "J. Chem. Phys.");
//! assert_eq!(table.convert_to_title("J. Chem. Phys.").unwrap(), "Journal Of Chemical Physics");
//! ```
//!
//! # Rewriting a Bibliography
//!
//! ```rust
//! use jabbrev::{AbbreviationTable, BibRewriter};
//!
//! let table = AbbreviationTable::from_json_str(
//!     r#"{"Journal Of Chemical Physics": "J. Chem. Phys."}"#,
//! ).unwrap();
//!
//! let input = "@article{key,\n  journal = {Journal of Chemical Physics},\n}\n";
//! let (output, report) = BibRewriter::new(&table).rewrite_str(input).unwrap();
//!
//! assert!(output.contains("journal = {J. Chem. Phys.}"));
//! assert!(report.abbreviated.contains("Journal of Chemical Physics"));
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result`], wrapping [`Error`]:
//!
//! ```rust
//! use jabbrev::{AbbreviationTable, Error};
//!
//! let table = AbbreviationTable::from_json_str("{}").unwrap();
//! match table.convert_to_abbreviation("Not A Real Journal") {
//!     Ok(abbr) => println!("{abbr}"),
//!     Err(Error::NotFound { query, .. }) => eprintln!("unknown journal: {query}"),
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
#[cfg(feature = "mining")]
pub mod mining;
pub mod normalize;
pub(crate) mod regex;
pub mod rewrite;
pub mod table;

// Reexports
pub use normalize::{normalize_title, title_case};
pub use rewrite::{BibRewriter, ConversionReport, default_output_path};
pub use table::{AbbreviationEntry, AbbreviationTable, Lookup};

/// A specialized Result type for abbreviation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which direction a failed lookup was going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupKind {
    Title,
    Abbreviation,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Title => f.write_str("title"),
            LookupKind::Abbreviation => f.write_str("abbreviation"),
        }
    }
}

/// Represents errors that can occur while loading tables or converting titles.
#[derive(Error, Debug)]
pub enum Error {
    /// The input is neither a known title nor a known abbreviation.
    #[error("The input {kind} is not in the data bank: '{query}'")]
    NotFound { kind: LookupKind, query: String },

    /// A `journal` line carries no `{...}` group.
    #[error("The following journal line (line {line}) has a wrong format:\n{content}")]
    Format { line: usize, content: String },

    /// A table source is missing or is not a flat string-to-string mapping.
    #[error("Failed to load abbreviation table {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "mining")]
    #[error("Mining error: {0}")]
    Mining(String),
}

impl Error {
    /// Returns true for the recoverable lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = Error::NotFound {
            kind: LookupKind::Title,
            query: "Not A Real Journal".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "The input title is not in the data bank: 'Not A Real Journal'"
        );
        assert!(error.is_not_found());
    }

    #[test]
    fn test_format_error_display() {
        let error = Error::Format {
            line: 3,
            content: "  journal = no braces here".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "The following journal line (line 3) has a wrong format:\n  journal = no braces here"
        );
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_load_error_display() {
        let error = Error::Load {
            path: PathBuf::from("missing.json"),
            message: "No such file or directory".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to load abbreviation table missing.json: No such file or directory"
        );
    }
}

//! Journal abbreviation for BibTeX files.
//!
//! The rewriter does not parse BibTeX. A line is a journal line when, after
//! leading whitespace (Unicode whitespace such as a no-break space included),
//! it starts with `journal` (any case); its title is the
//! first `{...}` group on the line. Every other line is copied unchanged,
//! byte-for-byte, line terminators included.
//!
//! # Example
//!
//! ```
//! use jabbrev::{AbbreviationTable, BibRewriter};
//!
//! let table = AbbreviationTable::from_entries([("Journal Of Chemical Physics", "J. Chem. Phys.")]);
//! let input = "@article{smith2020,\n  journal = {Journal of Chemical Physics},\n  title = {Some Title},\n}\n";
//!
//! let (output, report) = BibRewriter::new(&table).rewrite_str(input).unwrap();
//! assert_eq!(
//!     output,
//!     "@article{smith2020,\n  journal = {J. Chem. Phys.},\n  title = {Some Title},\n}\n"
//! );
//! assert!(report.is_complete());
//! ```

mod report;

pub use report::ConversionReport;

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::regex::first_braced;
use crate::table::AbbreviationTable;
use crate::{Error, Result};

const JOURNAL_FIELD: &str = "journal";
const OUTPUT_SUFFIX: &str = "_abbreviated";

/// Rewrites the journal lines of a bibliography using an [`AbbreviationTable`].
#[derive(Debug, Clone, Copy)]
pub struct BibRewriter<'a> {
    table: &'a AbbreviationTable,
}

impl<'a> BibRewriter<'a> {
    #[must_use]
    pub fn new(table: &'a AbbreviationTable) -> Self {
        Self { table }
    }

    /// Streams `reader` to `writer`, abbreviating journal titles on the way.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] on the first journal line without a `{...}`
    /// group, or whose bytes are not UTF-8. Lines before it have already been
    /// written; nothing after it is.
    pub fn rewrite<R, W>(&self, mut reader: R, mut writer: W) -> Result<ConversionReport>
    where
        R: BufRead,
        W: Write,
    {
        let mut report = ConversionReport::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            report.lines += 1;

            if !is_journal_line(&buf) {
                writer.write_all(&buf)?;
                continue;
            }
            report.journal_lines += 1;

            let line = std::str::from_utf8(&buf).map_err(|_| format_error(report.lines, &buf))?;
            let rewritten = self.rewrite_journal_line(line, report.lines, &mut report)?;
            writer.write_all(rewritten.as_bytes())?;
        }

        tracing::info!(
            lines = report.lines,
            journal_lines = report.journal_lines,
            abbreviated = report.abbreviated.len(),
            not_found = report.not_found.len(),
            "bibliography rewritten"
        );
        Ok(report)
    }

    /// In-memory variant of [`rewrite`](Self::rewrite).
    pub fn rewrite_str(&self, input: &str) -> Result<(String, ConversionReport)> {
        let mut output = Vec::with_capacity(input.len());
        let report = self.rewrite(input.as_bytes(), &mut output)?;
        let output = String::from_utf8(output)
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        Ok((output, report))
    }

    /// Abbreviates the journals of the file at `input`.
    ///
    /// Writes to `output`, or to [`default_output_path`] when none is given,
    /// creating or truncating it. The output file is flushed and closed on
    /// every exit path; after a format error it holds only the lines before
    /// the offending one and should be discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if a file cannot be opened or written, or if the
    /// output resolves to the input file (through `..`, a relative path or a
    /// symlink), and [`Error::Format`] as in [`rewrite`](Self::rewrite).
    pub fn convert_file(&self, input: &Path, output: Option<&Path>) -> Result<ConversionReport> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(input));

        let reader = BufReader::new(File::open(input)?);
        // Creating the output truncates it, so this must run first.
        if is_same_file(input, &output)? {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "refusing to overwrite the input file {} with {}",
                    input.display(),
                    output.display()
                ),
            )));
        }
        let mut writer = BufWriter::new(File::create(&output)?);
        tracing::debug!(input = %input.display(), output = %output.display(), "converting bibliography");

        let result = self.rewrite(reader, &mut writer);
        match (result, writer.flush()) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), flushed) => {
                if let Err(flush_err) = flushed {
                    tracing::warn!(output = %output.display(), error = %flush_err, "failed to flush partial output");
                }
                Err(e)
            }
        }
    }

    fn rewrite_journal_line<'l>(
        &self,
        line: &'l str,
        line_number: usize,
        report: &mut ConversionReport,
    ) -> Result<Cow<'l, str>> {
        let span = first_braced(line).ok_or_else(|| format_error(line_number, line.as_bytes()))?;
        let title = &line[span.clone()];

        match self.table.lookup_abbreviation(title) {
            Some(lookup) => {
                report.abbreviated.insert(title.to_string());
                let mut rewritten = String::with_capacity(line.len());
                rewritten.push_str(&line[..span.start]);
                rewritten.push_str(lookup.abbreviation());
                rewritten.push_str(&line[span.end..]);
                Ok(Cow::Owned(rewritten))
            }
            None => {
                tracing::debug!(line = line_number, title, "journal not found");
                report.not_found.insert(title.to_string());
                Ok(Cow::Borrowed(line))
            }
        }
    }
}

/// `<stem>_abbreviated.<ext>` next to `input`.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use jabbrev::default_output_path;
///
/// assert_eq!(default_output_path(Path::new("refs/library.bib")), PathBuf::from("refs/library_abbreviated.bib"));
/// ```
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push(OUTPUT_SUFFIX);
    if let Some(extension) = input.extension() {
        name.push(".");
        name.push(extension);
    }
    input.with_file_name(name)
}

fn is_journal_line(line: &[u8]) -> bool {
    String::from_utf8_lossy(line)
        .trim_start()
        .get(..JOURNAL_FIELD.len())
        .is_some_and(|field| field.eq_ignore_ascii_case(JOURNAL_FIELD))
}

/// Whether `output` names the file at `input`. An output that does not exist
/// yet cannot be the input.
fn is_same_file(input: &Path, output: &Path) -> io::Result<bool> {
    match fs::canonicalize(output) {
        Ok(output) => Ok(fs::canonicalize(input)? == output),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn format_error(line: usize, content: &[u8]) -> Error {
    Error::Format {
        line,
        content: String::from_utf8_lossy(content)
            .trim_end_matches(['\r', '\n'])
            .to_string(),
    }
}

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use itertools::Itertools;
use jabbrev::config::{self, TABLES_ENV};
use jabbrev::{AbbreviationTable, BibRewriter};

/// Journal title abbreviator - convert journal titles to and from their
/// standard abbreviations
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = None,
    after_help = "A bare `jabbrev [OPTIONS] INPUT OUTPUT` is the same as `convert INPUT OUTPUT`."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Abbreviation table to load; repeat to layer several, later ones win
    #[arg(long = "table", value_name = "PATH", global = true)]
    tables: Vec<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Abbreviate the journal fields of a BibTeX file
    Convert {
        /// Path to the .bib file
        input: PathBuf,

        /// Output path (default: <input>_abbreviated.<ext>)
        output: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the abbreviation of each journal title
    Abbreviate {
        #[arg(required = true)]
        titles: Vec<String>,
    },

    /// Print the full title of each abbreviation
    Expand {
        #[arg(required = true)]
        abbreviations: Vec<String>,
    },

    /// Build a table file from saved journal index pages
    #[cfg(feature = "mining")]
    Mine {
        /// HTML pages listing titles in <dt> and abbreviations in <dd>
        #[arg(required = true)]
        pages: Vec<PathBuf>,

        /// Path of the JSON table to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// `INPUT OUTPUT` given without a subcommand name
    #[command(external_subcommand)]
    Legacy(Vec<OsString>),
}

/// Splits the bare `INPUT OUTPUT` form into its two paths. Both are required
/// there, unlike `convert` where the output has a default.
fn legacy_paths(args: Vec<OsString>) -> Result<(PathBuf, PathBuf), clap::Error> {
    match <[OsString; 2]>::try_from(args) {
        Ok([input, output]) => Ok((input.into(), output.into())),
        Err(args) => Err(Cli::command().error(
            ErrorKind::WrongNumberOfValues,
            format!(
                "expected `INPUT OUTPUT` or a subcommand, got: {}",
                args.iter().map(|a| a.to_string_lossy()).join(" ")
            ),
        )),
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Some(Command::Convert {
            input,
            output,
            json,
        }) => convert(cli.tables, &input, output.as_deref(), json),
        Some(Command::Abbreviate { titles }) => {
            let table = load_table(cli.tables)?;
            Ok(print_lookups(&titles, |t| table.convert_to_abbreviation(t)))
        }
        Some(Command::Expand { abbreviations }) => {
            let table = load_table(cli.tables)?;
            Ok(print_lookups(&abbreviations, |a| table.convert_to_title(a)))
        }
        #[cfg(feature = "mining")]
        Some(Command::Mine { pages, output }) => mine(&pages, &output),
        Some(Command::Legacy(args)) => {
            let (input, output) = legacy_paths(args).unwrap_or_else(|e| e.exit());
            convert(cli.tables, &input, Some(&output), false)
        }
        None => {
            Cli::command().print_help()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("jabbrev={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve table paths: --table flags > JABBREV_TABLES > config file > default
fn load_table(tables: Vec<PathBuf>) -> anyhow::Result<AbbreviationTable> {
    let config = config::load_config();
    let env_value = std::env::var_os(TABLES_ENV);
    let paths = config::resolve_table_paths(tables, env_value.as_deref(), &config);

    if paths.is_empty() {
        anyhow::bail!("No abbreviation table configured. Pass --table or set {TABLES_ENV}.");
    }

    AbbreviationTable::from_paths(&paths).context("failed to load abbreviation tables")
}

fn convert(
    tables: Vec<PathBuf>,
    input: &Path,
    output: Option<&Path>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let table = load_table(tables)?;
    let report = BibRewriter::new(&table)
        .convert_file(input, output)
        .with_context(|| format!("failed to abbreviate {}", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Prints one result per query; misses go to stderr and fail the run.
fn print_lookups<'t, F>(queries: &[String], lookup: F) -> ExitCode
where
    F: Fn(&str) -> jabbrev::Result<&'t str>,
{
    let mut missing = 0;
    for query in queries {
        match lookup(query) {
            Ok(found) => println!("{found}"),
            Err(e) => {
                eprintln!("{e}");
                missing += 1;
            }
        }
    }

    if missing == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(feature = "mining")]
fn mine(pages: &[PathBuf], output: &Path) -> anyhow::Result<ExitCode> {
    let mut mined = jabbrev::mining::MinedTable::new();
    for page in pages {
        let html = std::fs::read_to_string(page)
            .with_context(|| format!("failed to read {}", page.display()))?;
        let found = mined
            .add_html(&html)
            .with_context(|| format!("failed to mine {}", page.display()))?;
        tracing::info!(page = %page.display(), pairs = found, "mined page");
    }

    mined
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote {} abbreviations to {}", mined.len(), output.display());
    Ok(ExitCode::SUCCESS)
}

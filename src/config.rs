//! On-disk TOML configuration.
//!
//! ```toml
//! [tables]
//! paths = ["~/data/journal_names_abr.json", "~/data/journal_names_abr_added.json"]
//! ```
//!
//! The platform file (`<config_dir>/jabbrev/config.toml`) is read first and a
//! `.jabbrev.toml` in the working directory overrides it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable holding table paths, in the platform's path-list syntax.
pub const TABLES_ENV: &str = "JABBREV_TABLES";

/// File name of the table used when nothing else is configured.
pub const DEFAULT_TABLE_FILE: &str = "journal_names_abr.json";

/// All fields are optional so partial configs merge with defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub tables: Option<TablesConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablesConfig {
    pub paths: Option<Vec<String>>,
}

impl ConfigFile {
    /// Table paths, with a leading `~` expanded to the home directory.
    pub fn table_paths(&self) -> Option<Vec<PathBuf>> {
        self.tables
            .as_ref()
            .and_then(|t| t.paths.as_ref())
            .map(|paths| paths.iter().map(|p| expand_home(p)).collect())
    }
}

/// Platform config file path: `<config_dir>/jabbrev/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jabbrev").join("config.toml"))
}

/// Table used when no flag, environment variable or config names one.
pub fn default_table_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("jabbrev").join(DEFAULT_TABLE_FILE))
}

/// Load config by cascading CWD `.jabbrev.toml` over the platform config.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".jabbrev.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Returns `None` if the file doesn't exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        tables: Some(TablesConfig {
            paths: overlay
                .tables
                .and_then(|t| t.paths)
                .or_else(|| base.tables.and_then(|t| t.paths)),
        }),
    }
}

/// Picks the table sources: explicit paths, then `JABBREV_TABLES`, then the
/// config file, then [`default_table_path`].
pub fn resolve_table_paths(
    explicit: Vec<PathBuf>,
    env_value: Option<&std::ffi::OsStr>,
    config: &ConfigFile,
) -> Vec<PathBuf> {
    if !explicit.is_empty() {
        return explicit;
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return std::env::split_paths(value).collect();
    }
    if let Some(paths) = config.table_paths() {
        return paths;
    }
    default_table_path().into_iter().collect()
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

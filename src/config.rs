//! TOML configuration.
//!
//! Defaults, overridden by `~/.config/gopick/gopick.toml`, overridden by a
//! `gopick.toml` in the project directory. Only the fields a file actually
//! sets are overridden, so a project file can tweak the history limit
//! without clobbering a globally configured command template.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "gopick.toml";

const DEFAULT_HISTORY_LIMIT: i64 = 100;
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Argv template for running a test. `{test}` is replaced with the run
    /// regex and `{package}` with the package name; empty means the built-in
    /// `go test -run {test} {package}`.
    pub command: Vec<String>,
    /// Extra directory names the scanner skips, in addition to the built-in
    /// `vendor` and `testdata`.
    pub ignore: Vec<String>,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryConfig {
    /// Maximum entries kept per project; negative means unlimited.
    pub limit: i64,
    /// chrono format string used when listing history.
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            ignore: Vec::new(),
            history: HistoryConfig {
                limit: DEFAULT_HISTORY_LIMIT,
                date_format: DEFAULT_DATE_FORMAT.to_string(),
            },
        }
    }
}

// Partial view of a config file: absent fields leave the base untouched,
// unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    command: Option<Vec<String>>,
    ignore: Option<Vec<String>>,
    history: Option<HistoryFile>,
}

#[derive(Debug, Default, Deserialize)]
struct HistoryFile {
    limit: Option<i64>,
    date_format: Option<String>,
}

impl Config {
    fn merge(&mut self, file: ConfigFile) {
        if let Some(command) = file.command {
            self.command = command;
        }
        if let Some(ignore) = file.ignore {
            self.ignore = ignore;
        }
        if let Some(history) = file.history {
            if let Some(limit) = history.limit {
                self.history.limit = limit;
            }
            if let Some(date_format) = history.date_format {
                self.history.date_format = date_format;
            }
        }
    }
}

/// Loads the effective configuration for a project directory.
pub fn load(project_dir: &Path) -> Result<Config> {
    let mut config = Config::default();
    if let Some(global) = global_config_path() {
        merge_file(&mut config, &global)?;
    }
    merge_file(&mut config, &project_dir.join(CONFIG_FILE_NAME))?;
    Ok(config)
}

fn merge_file(config: &mut Config, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: ConfigFile =
        toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
    config.merge(file);
    Ok(())
}

fn global_config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()?;
    Some(
        PathBuf::from(home)
            .join(".config/gopick")
            .join(CONFIG_FILE_NAME),
    )
}

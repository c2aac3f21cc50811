//! Per-project run history.
//!
//! Every executed target is recorded most-recent-first in a JSON document
//! under `~/.local/state/gopick/history/`, keyed by an md5 hash of the
//! absolute project directory so unrelated checkouts never share history.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Target;

const STATE_SUBDIR: &str = ".local/state/gopick/history";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histories {
    pub project_dir: String,
    pub histories: Vec<History>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    pub path: String,
    pub package_name: String,
    pub test_name_pattern: String,
    pub is_prefix: bool,
    pub run_at: DateTime<Utc>,
}

impl History {
    /// Two entries refer to the same test when everything but the timestamp
    /// matches.
    fn refers_to_same(&self, other: &History) -> bool {
        self.path == other.path
            && self.package_name == other.package_name
            && self.test_name_pattern == other.test_name_pattern
            && self.is_prefix == other.is_prefix
    }

    pub fn to_target(&self) -> Target {
        Target {
            path: self.path.clone(),
            package_name: self.package_name.clone(),
            test_name_pattern: self.test_name_pattern.clone(),
            is_prefix: self.is_prefix,
        }
    }
}

impl Histories {
    fn new(project_dir: &Path) -> Result<Self> {
        let abs = absolute(project_dir)?;
        Ok(Self {
            project_dir: abs.to_string_lossy().into_owned(),
            histories: Vec::new(),
        })
    }

    /// Records a run. An existing entry for the same test moves to the front
    /// instead of duplicating; a non-negative `limit` caps the list.
    pub fn add(&mut self, target: &Target, limit: i64) {
        let entry = History {
            path: target.path.clone(),
            package_name: target.package_name.clone(),
            test_name_pattern: target.test_name_pattern.clone(),
            is_prefix: target.is_prefix,
            run_at: Utc::now(),
        };

        if let Some(i) = self.histories.iter().position(|h| entry.refers_to_same(h)) {
            self.histories.remove(i);
        }
        self.histories.insert(0, entry);
        if limit >= 0 && self.histories.len() > limit as usize {
            self.histories.truncate(limit as usize);
        }
    }
}

/// Loads the project's history, or an empty list if none was recorded yet.
pub fn load(project_dir: &Path) -> Result<Histories> {
    let file_path = state_file_path(project_dir)?;
    if !file_path.exists() {
        return Histories::new(project_dir);
    }
    let bytes = std::fs::read(&file_path)
        .with_context(|| format!("failed to read {}", file_path.display()))?;
    let histories = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to decode {}", file_path.display()))?;
    Ok(histories)
}

pub fn save(project_dir: &Path, histories: &Histories) -> Result<()> {
    let file_path = state_file_path(project_dir)?;
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(histories)?;
    std::fs::write(&file_path, json)
        .with_context(|| format!("failed to write {}", file_path.display()))?;
    debug!("saved {} history entries", histories.histories.len());
    Ok(())
}

fn state_file_path(project_dir: &Path) -> Result<PathBuf> {
    Ok(state_dir()?.join(state_file_name(project_dir)?))
}

fn state_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("cannot determine home directory (HOME / USERPROFILE not set)")?;
    Ok(PathBuf::from(home).join(STATE_SUBDIR))
}

fn state_file_name(project_dir: &Path) -> Result<String> {
    let abs = absolute(project_dir)?;
    let normalized = abs.to_string_lossy().replace('\\', "/");
    let digest = md5::compute(normalized.as_bytes());
    Ok(format!("{:x}.json", digest))
}

// Lexical only: the directory does not have to exist yet, and symlinked
// views of one project keep sharing a history key.
fn absolute(dir: &Path) -> Result<PathBuf> {
    std::path::absolute(dir)
        .with_context(|| format!("failed to resolve project directory {}", dir.display()))
}

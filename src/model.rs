//! Core data model: discovered test trees and run targets.
//!
//! A `TestFunction` is one top-level `TestXxx` entry point; its `subs` tree
//! mirrors the nesting of `t.Run` calls in the source. A `Target` is the
//! fully-addressed description of what to hand to `go test`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Placeholder used when a subtest name can only be known at execution time.
pub const UNRESOLVED_NAME: &str = "<unknown>";

/// A top-level test entry point discovered in a `_test.go` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFunction {
    pub name: String,
    pub subs: Vec<SubTest>,
}

/// One node in the subtest tree of a test function.
///
/// `is_unresolved = true` means `name` is the `<unknown>` placeholder, not
/// the real runtime name; matching against it must be prefix-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTest {
    pub name: String,
    pub subs: Vec<SubTest>,
    pub is_unresolved: bool,
}

impl SubTest {
    pub fn resolved(name: impl Into<String>, subs: Vec<SubTest>) -> Self {
        Self {
            name: name.into(),
            subs,
            is_unresolved: false,
        }
    }

    pub fn unresolved(subs: Vec<SubTest>) -> Self {
        Self {
            name: UNRESOLVED_NAME.to_string(),
            subs,
            is_unresolved: true,
        }
    }
}

/// The fully-addressed description of what to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// File the selected test lives in, relative to the project root.
    pub path: String,
    /// `./`-relative slash form of the file's directory.
    pub package_name: String,
    /// Slash-joined chain of ancestor names down to the selected node.
    pub test_name_pattern: String,
    /// True iff any ancestor on the path was unresolved; the pattern then
    /// carries no placeholder suffix and matching is start-anchored only.
    pub is_prefix: bool,
}

impl Target {
    /// Builds a target from a selected flattened entry. When the selection is
    /// unresolved, the `<unknown>` placeholder suffix is stripped so that the
    /// remaining pattern can be used as a prefix.
    pub fn from_selection(path: &str, name: &str, is_unresolved: bool) -> Self {
        let pattern = if is_unresolved {
            name.strip_suffix(UNRESOLVED_NAME).unwrap_or(name).to_string()
        } else {
            name.to_string()
        };
        Self {
            path: path.to_string(),
            package_name: package_name(path),
            test_name_pattern: pattern,
            is_prefix: is_unresolved,
        }
    }

    /// The `-run` regex for this target. Resolved names are anchored at both
    /// ends; prefixes only at the start, because the true suffix (assigned by
    /// the test runner for duplicate or unresolved names) is unknown.
    pub fn run_regex(&self) -> String {
        if self.is_prefix {
            format!("^{}", self.test_name_pattern)
        } else {
            format!("^{}$", self.test_name_pattern)
        }
    }

    /// Trims the last `/`-delimited component from the pattern, producing a
    /// coarser target that addresses the whole parent group. Always forces
    /// prefix matching; an already-empty pattern stays empty.
    pub fn drop_last_segment(&mut self) {
        let trimmed = self
            .test_name_pattern
            .strip_suffix('/')
            .unwrap_or(&self.test_name_pattern);
        self.test_name_pattern = match trimmed.rfind('/') {
            Some(i) => trimmed[..=i].to_string(),
            None => String::new(),
        };
        self.is_prefix = true;
    }
}

/// Directory of `path` in `./`-relative forward-slash form, mirroring what
/// `go test` expects as a package argument.
pub fn package_name(path: &str) -> String {
    let dir = Path::new(path)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string());
    let dir = dir.replace('\\', "/");
    if dir.starts_with("./") {
        dir
    } else {
        format!("./{}", dir)
    }
}

/// A selectable leaf of the scan result: full slash-joined name plus the file
/// it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    pub path: String,
    pub name: String,
    pub is_unresolved: bool,
}

/// Flattens the scan result map into leaf entries, stable-sorted by path.
/// Within one file, entries keep declaration order.
pub fn flatten(tests: &HashMap<String, Vec<TestFunction>>) -> Vec<FlatEntry> {
    let mut entries = Vec::new();
    for (path, functions) in tests {
        for tf in functions {
            if tf.subs.is_empty() {
                entries.push(FlatEntry {
                    path: path.clone(),
                    name: tf.name.clone(),
                    is_unresolved: false,
                });
            } else {
                flatten_subs(&tf.subs, path, &tf.name, false, &mut entries);
            }
        }
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

// An unresolved ancestor taints every leaf below it: the runtime names of
// those leaves are unknown even when the leaf itself resolved.
fn flatten_subs(
    subs: &[SubTest],
    path: &str,
    base: &str,
    ancestor_unresolved: bool,
    out: &mut Vec<FlatEntry>,
) {
    for sub in subs {
        let name = format!("{}/{}", base, sub.name);
        let unresolved = ancestor_unresolved || sub.is_unresolved;
        if sub.subs.is_empty() {
            out.push(FlatEntry {
                path: path.to_string(),
                name,
                is_unresolved: unresolved,
            });
        } else {
            flatten_subs(&sub.subs, path, &name, unresolved, out);
        }
    }
}

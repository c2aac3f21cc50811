//! Static subtest resolution over Go test sources.
//!
//! One file at a time: tree-sitter parses the source, the scanner accepts
//! every top-level `TestXxx(t *testing.T)` declaration, the discoverer walks
//! its body for `t.Run` registration calls, and the resolver expands what it
//! found into a [`TestFunction`] tree. The engine never executes code; names
//! that would need runtime evaluation stay unresolved.

mod discover;
mod resolve;

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;
use tree_sitter::{Node, Parser};
use walkdir::WalkDir;

use crate::model::TestFunction;

/// Directories never descended into, in addition to configured ones.
const DEFAULT_IGNORE_DIRS: &[&str] = &["vendor", "testdata"];

const TEST_FILE_SUFFIX: &str = "_test.go";
const TEST_FUNC_PREFIX: &str = "Test";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse { path: String },
    #[error("failed to load Go grammar")]
    Grammar(#[from] tree_sitter::LanguageError),
    #[error("error walking directory")]
    Walk(#[from] walkdir::Error),
}

/// Scans every `_test.go` file under `root`, skipping ignored directories.
/// Per-file analysis is independent, so files fan out across the rayon pool.
/// The first file-level failure aborts the scan.
pub fn scan_project(
    root: &Path,
    extra_ignore_dirs: &[String],
) -> Result<HashMap<String, Vec<TestFunction>>, ScanError> {
    let mut ignore: Vec<&str> = DEFAULT_IGNORE_DIRS.to_vec();
    ignore.extend(extra_ignore_dirs.iter().map(String::as_str));

    let mut files = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| {
        !(e.file_type().is_dir() && ignore.contains(&e.file_name().to_string_lossy().as_ref()))
    }) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.file_name().to_string_lossy().ends_with(TEST_FILE_SUFFIX)
        {
            files.push(entry.into_path());
        }
    }
    debug!("scanning {} test files under {}", files.len(), root.display());

    files
        .par_iter()
        .map(|path| {
            let key = path.to_string_lossy().replace('\\', "/");
            let functions = scan_file(path)?;
            Ok((key, functions))
        })
        .collect()
}

/// Parses one test file and returns its test functions in declaration order.
pub fn scan_file(path: &Path) -> Result<Vec<TestFunction>, ScanError> {
    let content = std::fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.display().to_string(),
        source,
    })?;
    scan_source(&path.display().to_string(), &content)
}

/// Scans already-loaded Go source. `path` is only used in error reports.
pub fn scan_source(path: &str, content: &str) -> Result<Vec<TestFunction>, ScanError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_go::LANGUAGE.into())?;
    let tree = parser.parse(content, None).ok_or_else(|| ScanError::Parse {
        path: path.to_string(),
    })?;

    let src = content.as_bytes();
    let root = tree.root_node();
    let mut functions = Vec::new();
    let mut cursor = root.walk();
    for decl in root.named_children(&mut cursor) {
        if decl.kind() != "function_declaration" {
            continue;
        }
        let Some(name_node) = decl.child_by_field_name("name") else {
            continue;
        };
        let name = node_text(name_node, src);
        if !name.starts_with(TEST_FUNC_PREFIX) || !is_test_entry_point(decl, src) {
            continue;
        }
        let subs = match decl.child_by_field_name("body") {
            Some(body) => {
                let records = discover::find_sub_tests(body, src, &[]);
                records.iter().flat_map(|r| r.resolve()).collect()
            }
            // Malformed bodies degrade to "no subtests", never to an error.
            None => Vec::new(),
        };
        functions.push(TestFunction { name, subs });
    }
    debug!("found {} test functions in {}", functions.len(), path);
    Ok(functions)
}

/// A test entry point takes exactly one parameter of type `*testing.T`.
/// Benchmarks, fuzz targets, and helpers with extra parameters are skipped.
fn is_test_entry_point(decl: Node, src: &[u8]) -> bool {
    let Some(params) = decl.child_by_field_name("parameters") else {
        return false;
    };
    let mut cursor = params.walk();
    let decls: Vec<Node> = params
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "parameter_declaration")
        .collect();
    if decls.len() != 1 {
        return false;
    }
    let mut name_cursor = decls[0].walk();
    let names = decls[0]
        .children_by_field_name("name", &mut name_cursor)
        .count();
    if names != 1 {
        return false;
    }
    let Some(ty) = decls[0].child_by_field_name("type") else {
        return false;
    };
    let ty_text: String = node_text(ty, src)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    ty_text == "*testing.T"
}

pub(crate) fn node_text(node: Node, src: &[u8]) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    if start < src.len() && end <= src.len() {
        String::from_utf8_lossy(&src[start..end]).to_string()
    } else {
        String::new()
    }
}

//! gopick — pick one Go test (or table-driven subtest) and re-run exactly
//! that test, without memorizing its name or hand-building a `-run` regex.
//!
//! The core is a static subtest-resolution engine: tree-sitter parses each
//! `_test.go` file, and the [`parse`] module reconstructs the hierarchical
//! slash-joined name every subtest will have at execution time, including
//! names that only exist as table-driven data.

pub mod command;
pub mod config;
pub mod history;
pub mod model;
pub mod parse;

#[cfg(test)]
pub mod tests;

pub use model::{FlatEntry, SubTest, Target, TestFunction, UNRESOLVED_NAME};
pub use parse::{scan_file, scan_project, scan_source, ScanError};

//! Builds and executes the test-runner invocation for a selected target.

use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use crate::model::Target;

/// Replaced with the derived `-run` regex in a configured command template.
pub const TEST_PLACEHOLDER: &str = "{test}";
/// Replaced with the package name in a configured command template.
pub const PACKAGE_PLACEHOLDER: &str = "{package}";

/// The argv to execute for `target`. An empty template yields the default
/// `go test -run <regex> <package>`; otherwise each template element has the
/// placeholder markers substituted.
pub fn build_args(target: &Target, template: &[String]) -> Vec<String> {
    let regex = target.run_regex();
    if template.is_empty() {
        return vec![
            "go".to_string(),
            "test".to_string(),
            "-run".to_string(),
            regex,
            target.package_name.clone(),
        ];
    }
    template
        .iter()
        .map(|arg| {
            arg.replace(TEST_PLACEHOLDER, &regex)
                .replace(PACKAGE_PLACEHOLDER, &target.package_name)
        })
        .collect()
}

/// Runs the target's test invocation with inherited stdio and returns the
/// child's exit code unmodified.
pub fn run(target: &Target, template: &[String]) -> Result<i32> {
    let args = build_args(target, template);

    println!("{}", args.join(" "));
    debug!("running {:?}", args);

    let status = Command::new(&args[0])
        .args(&args[1..])
        .status()
        .with_context(|| format!("failed to run {}", args[0]))?;
    Ok(status.code().unwrap_or(1))
}

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use gopick::model::{flatten, FlatEntry, Target, TestFunction};
use gopick::{command, config, history};

#[derive(Parser)]
#[command(name = "gopick")]
#[command(about = "Pick one Go test or subtest and re-run exactly that test", long_about = None)]
#[command(version)]
struct Cli {
    /// Project directory to scan
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every discovered test and subtest
    List {
        /// Print flattened slash-joined leaf names instead of a tree
        #[arg(long)]
        flat: bool,
    },

    /// Run one test by its full slash-joined name
    Run {
        /// Full name, e.g. TestServer/parses_header
        name: String,

        /// File the test lives in, to disambiguate duplicate names
        #[arg(short, long)]
        path: Option<String>,

        /// Run the whole parent group instead of the selected leaf
        #[arg(long)]
        parent: bool,
    },

    /// Show recorded runs for this project
    History {
        /// Re-run the entry at this index (0 = most recent)
        #[arg(long)]
        run: Option<usize>,
    },
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let conf = config::load(&cli.dir)?;

    match cli.command {
        Commands::List { flat } => {
            let tests = gopick::scan_project(&cli.dir, &conf.ignore)?;
            if flat {
                print_flat(&tests);
            } else {
                print_tree(&tests);
            }
            Ok(())
        }
        Commands::Run { name, path, parent } => {
            let tests = gopick::scan_project(&cli.dir, &conf.ignore)?;
            let mut target = select_target(&tests, &name, path.as_deref())?;
            if parent {
                target.drop_last_segment();
            }
            execute(&cli.dir, &conf, &target)
        }
        Commands::History { run } => {
            let histories = history::load(&cli.dir)?;
            match run {
                Some(index) => {
                    let Some(entry) = histories.histories.get(index) else {
                        bail!(
                            "no history entry at index {} ({} recorded)",
                            index,
                            histories.histories.len()
                        );
                    };
                    let target = entry.to_target();
                    execute(&cli.dir, &conf, &target)
                }
                None => {
                    for (i, entry) in histories.histories.iter().enumerate() {
                        println!(
                            "{:3}  {}  {}{}  ({})",
                            i,
                            entry.run_at.format(&conf.history.date_format),
                            entry.test_name_pattern,
                            if entry.is_prefix { "…" } else { "" },
                            entry.path,
                        );
                    }
                    Ok(())
                }
            }
        }
    }
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Finds the flattened entry matching `name` (and `path`, when given) and
/// derives its run target.
fn select_target(
    tests: &HashMap<String, Vec<TestFunction>>,
    name: &str,
    path: Option<&str>,
) -> Result<Target> {
    let entries = flatten(tests);
    let matches: Vec<&FlatEntry> = entries
        .iter()
        .filter(|e| e.name == name && path.map_or(true, |p| e.path == p))
        .collect();

    match matches.as_slice() {
        [] => bail!("no test named {name} found"),
        [entry] => Ok(Target::from_selection(
            &entry.path,
            &entry.name,
            entry.is_unresolved,
        )),
        several => {
            let paths: Vec<&str> = several.iter().map(|e| e.path.as_str()).collect();
            bail!(
                "{name} is defined in multiple files ({}); use --path to pick one",
                paths.join(", ")
            )
        }
    }
}

/// Records the target in history, runs it, and exits with the child's code.
fn execute(dir: &std::path::Path, conf: &config::Config, target: &Target) -> Result<()> {
    let mut histories = history::load(dir)?;
    histories.add(target, conf.history.limit);
    history::save(dir, &histories).context("failed to save history")?;

    let code = command::run(target, &conf.command)?;
    std::process::exit(code);
}

fn print_tree(tests: &HashMap<String, Vec<TestFunction>>) {
    let mut paths: Vec<&String> = tests.keys().collect();
    paths.sort();
    for path in paths {
        println!("# {}", path);
        for tf in &tests[path] {
            println!("- {}", tf.name);
            print_subs(&tf.subs, 1);
        }
        println!();
    }
}

fn print_subs(subs: &[gopick::SubTest], indent: usize) {
    for sub in subs {
        println!("{}- {}", "  ".repeat(indent), sub.name);
        print_subs(&sub.subs, indent + 1);
    }
}

fn print_flat(tests: &HashMap<String, Vec<TestFunction>>) {
    for entry in flatten(tests) {
        let marker = if entry.is_unresolved { " (unresolved)" } else { "" };
        println!("{}: {}{}", entry.path, entry.name, marker);
    }
}

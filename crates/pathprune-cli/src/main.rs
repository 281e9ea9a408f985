use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pathprune::{export, hierarchy, parse_wildcards, Export, FilterConfig, PathSet, Session};

#[derive(Debug, Parser)]
#[command(
    name = "pathprune",
    version,
    about = "Inspect and prune element/key paths in XML and JSON files"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every path with its occurrence count
    Paths {
        /// Input file (.xml or .json)
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        /// Print the overview as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the (filtered) document hierarchy as JSON
    Tree {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Report the size saving and write the pruned document
    Prune {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        /// Directory for the optimized file, log and saved filter
        #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,
        /// Skip the audit log
        #[arg(long)]
        no_log: bool,
        /// Only print the size report
        #[arg(long)]
        dry_run: bool,
        /// Save the effective filter as NAME.filter.json
        #[arg(long, value_name = "NAME")]
        save_filter: Option<String>,
    },
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Saved filter file to start from
    #[arg(short, long, value_name = "FILE")]
    filter: Option<PathBuf>,
    /// Path to exclude; may be repeated
    #[arg(short = 'x', long = "exclude", value_name = "PATH")]
    exclude: Vec<String>,
    /// Comma-separated wildcard patterns to exclude
    #[arg(short, long, value_name = "PATTERNS")]
    wildcards: Option<String>,
}

impl FilterArgs {
    /// Saved filter with the command-line exclusions folded in
    fn resolve(&self, known: &PathSet) -> Result<FilterConfig> {
        let mut filter = match &self.filter {
            Some(path) => FilterConfig::load(path)
                .with_context(|| format!("failed to load filter {}", path.display()))?,
            None => FilterConfig::keep_all(),
        };

        if let Some(patterns) = &self.wildcards {
            filter.wildcards.extend(parse_wildcards(patterns));
        }

        if !self.exclude.is_empty() {
            let include = filter
                .include
                .take()
                .unwrap_or_else(|| known.iter().cloned().collect());
            filter.include = Some(
                include
                    .into_iter()
                    .filter(|path| !self.exclude.contains(path))
                    .collect(),
            );
        }

        Ok(filter)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Paths { input, json } => list_paths(&input, json),
        Command::Tree { input, filter } => print_tree(&input, &filter),
        Command::Prune {
            input,
            filter,
            output_dir,
            no_log,
            dry_run,
            save_filter,
        } => {
            let mut session = open_session(&input)?;
            let config = filter.resolve(session.paths())?;
            let selection = session.apply(&config)?;
            info!(
                included = selection.included.len(),
                excluded = selection.excluded.len(),
                "filter applied"
            );

            println!("{}", session.size_report()?);

            if let Some(name) = save_filter {
                let saved = FilterConfig::new(selection.included, config.wildcards)
                    .save(&output_dir, &name)
                    .with_context(|| format!("failed to save filter {name}"))?;
                println!("wrote {}", saved.display());
            }

            if dry_run {
                return Ok(());
            }

            let export = Export::build(&session, export::now())?;
            let written = export
                .write_to(&output_dir, !no_log)
                .with_context(|| format!("failed to write into {}", output_dir.display()))?;
            for path in written {
                println!("wrote {}", path.display());
            }
            Ok(())
        }
    }
}

fn open_session(path: &Path) -> Result<Session> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Session::open(name, &bytes).with_context(|| format!("failed to load {}", path.display()))
}

fn list_paths(input: &Path, json: bool) -> Result<()> {
    let session = open_session(input)?;
    let stats = session.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let width = stats
        .iter()
        .map(|s| s.path.len())
        .max()
        .unwrap_or_default()
        .max("PATH".len());
    println!("{:<width$}  {:>6}  {:>6}", "PATH", "COUNT", "TEXT");
    for s in &stats {
        println!("{:<width$}  {:>6}  {:>6}", s.path, s.occurrences, s.text_values);
    }
    Ok(())
}

fn print_tree(input: &Path, filter: &FilterArgs) -> Result<()> {
    let mut session = open_session(input)?;
    let config = filter.resolve(session.paths())?;
    session.apply(&config)?;
    println!("{}", serde_json::to_string_pretty(&hierarchy(&session.pruned()))?);
    Ok(())
}

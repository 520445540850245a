use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use domloom_cli::{run_components, run_convert, run_diff, run_sync};
use domloom_engine::{ConvertOptions, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "domloom")]
#[command(about = "Convert captured web pages into editable document trees", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a capture into a document tree
    Convert(ConvertArgs),

    /// List component patterns detected in a capture
    Components(ComponentsArgs),

    /// Diff a new capture against the document built from an old one
    Diff(DiffArgs),

    /// Diff and apply: update the old capture's document to the new capture
    Sync(SyncArgs),
}

#[derive(Args)]
struct TreeOptions {
    /// Prune nodes deeper than this
    #[arg(long, default_value_t = 25)]
    max_depth: usize,

    /// Materialize hidden nodes too
    #[arg(long)]
    include_hidden: bool,
}

impl TreeOptions {
    fn as_convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            max_depth: self.max_depth,
            include_hidden: self.include_hidden,
        }
    }
}

#[derive(Args)]
struct ConvertArgs {
    /// Capture JSON file
    input: PathBuf,

    #[command(flatten)]
    tree: TreeOptions,
}

#[derive(Args)]
struct ComponentsArgs {
    /// Capture JSON file
    input: PathBuf,
}

#[derive(Args)]
struct DiffArgs {
    /// Older capture JSON file (the materialized baseline)
    old: PathBuf,

    /// Newer capture JSON file
    new: PathBuf,

    #[command(flatten)]
    tree: TreeOptions,
}

#[derive(Args)]
struct SyncArgs {
    /// Older capture JSON file (the materialized baseline)
    old: PathBuf,

    /// Newer capture JSON file
    new: PathBuf,

    /// Apply only the changes at these paths (comma-separated); default all
    #[arg(long, value_delimiter = ',')]
    select: Option<Vec<String>>,

    #[command(flatten)]
    tree: TreeOptions,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Progress reporter rendering an indicatif bar on stderr
fn progress_bar(quiet: bool) -> Result<(Option<ProgressBar>, ProgressReporter)> {
    if quiet {
        return Ok((None, ProgressReporter::silent()));
    }
    let bar = ProgressBar::new(1000);
    bar.set_style(ProgressStyle::with_template(
        "{spinner} {msg:20} [{bar:30}] {percent}%",
    )?);
    let sink = bar.clone();
    let reporter = ProgressReporter::new(move |fraction, label| {
        sink.set_position((fraction * 1000.0) as u64);
        sink.set_message(label.to_string());
    });
    Ok((Some(bar), reporter))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let (bar, mut progress) = progress_bar(cli.quiet)?;
    let output = match &cli.command {
        Commands::Convert(args) => {
            run_convert(&args.input, &args.tree.as_convert_options(), &mut progress).await?
        }
        Commands::Components(args) => run_components(&args.input).await?,
        Commands::Diff(args) => {
            run_diff(&args.old, &args.new, &args.tree.as_convert_options(), &mut progress).await?
        }
        Commands::Sync(args) => {
            run_sync(
                &args.old,
                &args.new,
                &args.tree.as_convert_options(),
                args.select.as_deref(),
                &mut progress,
            )
            .await?
        }
    };
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

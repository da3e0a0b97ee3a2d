#![forbid(unsafe_code)]

mod cmd;
mod config;
mod input;
mod output;

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use topotree_core::TopologyError;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "topotree: rank network devices into a phased spanning forest",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file instead of searching for one.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Write the report to this file instead of stdout.
    #[arg(short, long, global = true, value_name = "PATH")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Write the full report",
        long_about = "Build the spanning forest and write every active device with its parent, Function (depth) and Phase (tree ordinal).",
        after_help = "EXAMPLES:\n    # Report from the default input files\n    topotree report\n\n    # Explicit inputs, tolerate cycles and second parents\n    topotree report --devices devices.json --topology links.json --detach\n\n    # Emit machine-readable output\n    topotree report --format json"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        about = "Write the basic connectivity report",
        long_about = "Write every active device joined to the hosts it is attached to, without Function or Phase.",
        after_help = "EXAMPLES:\n    # Tab-separated, for spreadsheets\n    topotree basic --format text --output basic.tsv"
    )]
    Basic(cmd::basic::BasicArgs),

    #[command(
        about = "Show the root ranking",
        long_about = "Show each tree's root with its depth, size, rank and phase, plus the edge-set hash.",
        after_help = "EXAMPLES:\n    # Compare topology between two exports\n    topotree roots --json | jq -r .edge_hash"
    )]
    Roots(cmd::roots::RootsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TOPOTREE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "topotree=debug,info"
        } else {
            "topotree=info,warn"
        })
    });

    let format = env::var("TOPOTREE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Render `err` on stderr and exit non-zero.
fn fail(mode: OutputMode, err: &anyhow::Error) -> ! {
    let cli_error = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<TopologyError>())
        .map_or_else(|| CliError::new(format!("{err:#}")), CliError::from);

    if render_error(mode, &cli_error).is_err() {
        eprintln!("error: {err:#}");
    }
    std::process::exit(1);
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = env::current_dir()?;
    let config = match config::load_config(cli.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(err) => fail(output::resolve_output_mode(cli.format, cli.json, None), &err),
    };
    debug!(?config, "resolved config");

    let output = output::resolve_output_mode(cli.format, cli.json, config.output.format.as_deref());
    let sink = cli.output.as_deref().or(config.output.path.as_deref());
    let ctx = cmd::CommandContext {
        config: &config,
        output,
        sink,
    };

    let command_result = match &cli.command {
        Commands::Report(args) => cmd::report::run_report(args, &ctx),
        Commands::Basic(args) => cmd::basic::run_basic(args, &ctx),
        Commands::Roots(args) => cmd::roots::run_roots(args, &ctx),
    };

    if let Err(err) = command_result {
        fail(output, &err);
    }
    Ok(())
}

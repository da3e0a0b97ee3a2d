//! `topotree report`: the full report with Function and Phase per device.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use topotree_core::{ConflictPolicy, PhaseNumbering, build_topology};
use tracing::info;

use super::{CommandContext, InputArgs};
use crate::output::{open_sink, write_rows};

/// Arguments for `topotree report`.
#[derive(Args, Debug, Default)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Report unreachable and conflicting devices as isolated instead of failing.
    #[arg(long)]
    pub detach: bool,

    /// Give every tree its own phase, even when two trees have the same shape.
    #[arg(long)]
    pub sequential_phases: bool,
}

/// Execute `topotree report`.
pub fn run_report(args: &ReportArgs, ctx: &CommandContext<'_>) -> Result<()> {
    let (devices, links) = args.input.load(ctx.config)?;

    let mut options = ctx.config.pipeline_options();
    if args.detach {
        options.conflicts = ConflictPolicy::Detach;
    }
    if args.sequential_phases {
        options.phases = PhaseNumbering::Sequential;
    }

    let report = build_topology(&devices, &links, &options)?;
    info!(
        rows = report.rows.len(),
        detached = report.detached.len(),
        edge_hash = %report.edge_hash,
        "writing report"
    );

    let mut out = open_sink(ctx.sink)?;
    write_rows(out.as_mut(), ctx.output, &report.rows)?;
    out.flush()?;
    Ok(())
}

//! `topotree basic`: devices joined to their upstream links, no ranking.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use topotree_core::build_basic;

use super::{CommandContext, InputArgs};
use crate::output::{open_sink, write_rows};

/// Arguments for `topotree basic`.
#[derive(Args, Debug, Default)]
pub struct BasicArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

/// Execute `topotree basic`.
pub fn run_basic(args: &BasicArgs, ctx: &CommandContext<'_>) -> Result<()> {
    let (devices, links) = args.input.load(ctx.config)?;
    let report = build_basic(&devices, &links, &ctx.config.pipeline_options())?;

    let mut out = open_sink(ctx.sink)?;
    write_rows(out.as_mut(), ctx.output, &report.rows)?;
    out.flush()?;
    Ok(())
}

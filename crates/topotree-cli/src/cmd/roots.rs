//! `topotree roots`: the root ranking table and the edge-set hash.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use topotree_core::{RootRank, build_topology};

use super::{CommandContext, InputArgs};
use crate::output::{OutputMode, open_sink, pretty_kv, write_rows};

/// Arguments for `topotree roots`.
#[derive(Args, Debug, Default)]
pub struct RootsArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Serialize)]
struct RootsOutput<'a> {
    edge_hash: &'a str,
    roots: &'a [RootRank],
}

/// Execute `topotree roots`.
pub fn run_roots(args: &RootsArgs, ctx: &CommandContext<'_>) -> Result<()> {
    let (devices, links) = args.input.load(ctx.config)?;
    let report = build_topology(&devices, &links, &ctx.config.pipeline_options())?;

    let mut out = open_sink(ctx.sink)?;
    match ctx.output {
        OutputMode::Json => {
            let payload = RootsOutput {
                edge_hash: &report.edge_hash,
                roots: &report.roots,
            };
            serde_json::to_writer_pretty(&mut out, &payload)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            write_rows(out.as_mut(), ctx.output, &report.roots)?;
            writeln!(out)?;
            pretty_kv(out.as_mut(), "Edge hash", &report.edge_hash)?;
        }
    }
    out.flush()?;
    Ok(())
}

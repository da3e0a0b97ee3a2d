pub mod basic;
pub mod report;
pub mod roots;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use topotree_core::{Device, Link};

use crate::config::Config;
use crate::input::load_records;
use crate::output::OutputMode;

/// Input file overrides shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct InputArgs {
    /// Device export (JSON array). Defaults to `[input].devices`.
    #[arg(long, value_name = "PATH")]
    pub devices: Option<PathBuf>,

    /// Link export (JSON array). Defaults to `[input].topology`.
    #[arg(long, value_name = "PATH")]
    pub topology: Option<PathBuf>,
}

impl InputArgs {
    pub fn load(&self, config: &Config) -> Result<(Vec<Device>, Vec<Link>)> {
        let devices = self.devices.as_deref().unwrap_or(config.input.devices.as_path());
        let topology = self.topology.as_deref().unwrap_or(config.input.topology.as_path());
        load_records(devices, topology)
    }
}

/// Settings resolved once in `main` and handed to every command.
#[derive(Debug)]
pub struct CommandContext<'a> {
    pub config: &'a Config,
    pub output: OutputMode,
    /// Report destination; stdout when `None`.
    pub sink: Option<&'a Path>,
}

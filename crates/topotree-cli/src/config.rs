use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use topotree_core::{ActivityPolicy, ConflictPolicy, DeviceStatus, PhaseNumbering, PipelineOptions};
use tracing::debug;

const PROJECT_CONFIG: &str = "topotree.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub forest: ForestConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_devices_path")]
    pub devices: PathBuf,
    #[serde(default = "default_topology_path")]
    pub topology: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            devices: default_devices_path(),
            topology: default_topology_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_active_statuses")]
    pub active_statuses: Vec<DeviceStatus>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            active_statuses: default_active_statuses(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestConfig {
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
    #[serde(default)]
    pub phase_numbering: PhaseNumbering,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Pipeline options before any per-command overrides.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            activity: ActivityPolicy::new(self.filter.active_statuses.iter().copied()),
            conflicts: self.forest.on_conflict,
            phases: self.forest.phase_numbering,
        }
    }
}

/// Load configuration, first source wins:
/// `explicit`, then `./topotree.toml`, then the user config dir, then defaults.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<Config> {
    let user_path = dirs::config_dir().map(|dir| dir.join("topotree/config.toml"));
    load_config_from(explicit, cwd, user_path.as_deref())
}

fn load_config_from(explicit: Option<&Path>, cwd: &Path, user_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    let project = cwd.join(PROJECT_CONFIG);
    if project.exists() {
        return read_config(&project);
    }

    match user_path {
        Some(path) if path.exists() => read_config(path),
        _ => {
            debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn default_devices_path() -> PathBuf {
    PathBuf::from("input_files/device.json")
}

fn default_topology_path() -> PathBuf {
    PathBuf::from("input_files/network-topology.json")
}

fn default_active_statuses() -> Vec<DeviceStatus> {
    vec![DeviceStatus::Online]
}

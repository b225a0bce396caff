use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use desk_core::{ControllerConfig, RejectionNotices};
use desk_engine::{EngineConfig, SimulationSettings};
use serde::{Deserialize, Serialize};

use crate::logging::LogDestination;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "pdfdesk.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RejectionMode {
    PerFile,
    #[default]
    Coalesced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub base_delay_ms: u64,
    pub per_megabyte_delay_ms: u64,
    pub max_delay_ms: u64,
    pub inject_failure: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let defaults = SimulationSettings::default();
        Self {
            base_delay_ms: defaults.base_delay.as_millis() as u64,
            per_megabyte_delay_ms: defaults.per_megabyte_delay.as_millis() as u64,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
            inject_failure: None,
        }
    }
}

/// User settings for the `pdfdesk` binary, read from a RON file.
///
/// Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub download_dir: PathBuf,
    /// Where `.pdfdesk_history.ron` lives.
    pub history_dir: PathBuf,
    pub log_destination: LogDestination,
    pub log_level: String,
    pub rejection_notices: RejectionMode,
    pub simulation: SimulationConfig,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("output"),
            history_dir: PathBuf::from("."),
            log_destination: LogDestination::default(),
            log_level: "info".to_string(),
            rejection_notices: RejectionMode::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl DeskConfig {
    /// An explicit path must exist; the default file may be absent.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::read(Path::new(DEFAULT_CONFIG_FILE)) {
                Err(err) if is_not_found(&err) => Ok(Self::default()),
                other => other,
            },
        }
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            rejection_notices: match self.rejection_notices {
                RejectionMode::PerFile => RejectionNotices::PerFile,
                RejectionMode::Coalesced => RejectionNotices::Coalesced,
            },
        }
    }

    pub fn simulation_settings(&self) -> SimulationSettings {
        let sim = &self.simulation;
        SimulationSettings {
            base_delay: Duration::from_millis(sim.base_delay_ms),
            per_megabyte_delay: Duration::from_millis(sim.per_megabyte_delay_ms),
            max_delay: Duration::from_millis(sim.max_delay_ms),
            inject_failure: sim.inject_failure.clone(),
        }
    }

    /// Engine settings, stamping completions with the current UTC time.
    pub fn engine_config(&self, download_dir: PathBuf) -> EngineConfig {
        let mut config = EngineConfig::default_with_output(download_dir);
        config.simulation = self.simulation_settings();
        config.finished_utc = Some(Arc::new(|| Utc::now().to_rfc3339()));
        config
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|err| err.kind() == io::ErrorKind::NotFound)
}

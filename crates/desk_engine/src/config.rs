use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::SimulationSettings;

pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct EngineConfig {
    pub simulation: SimulationSettings,
    pub download_dir: PathBuf,
    /// Stamps job completions; `None` leaves them unstamped.
    pub finished_utc: Option<Clock>,
}

impl EngineConfig {
    pub fn default_with_output(download_dir: PathBuf) -> Self {
        Self {
            simulation: SimulationSettings::default(),
            download_dir,
            finished_utc: None,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("simulation", &self.simulation)
            .field("download_dir", &self.download_dir)
            .field("finished_utc", &self.finished_utc.is_some())
            .finish()
    }
}

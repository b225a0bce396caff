//! pdfdesk engine: job execution, cancellation and downloads.
mod backend;
mod config;
mod download;
mod engine;
mod filename;
mod persist;
mod simulate;
mod types;

pub use backend::{ChannelProgressSink, ConversionBackend, ProgressSink};
pub use config::{Clock, EngineConfig};
pub use download::Downloader;
pub use engine::EngineHandle;
pub use filename::{sanitize_filename, unique_filename};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use simulate::{SimulatedBackend, SimulationSettings};
pub use types::{EngineEvent, EngineStopped, FailureKind, JobStatus};

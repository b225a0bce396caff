use std::fmt;
use std::path::PathBuf;

use desk_core::{JobId, ResultFile, ResultId};
use thiserror::Error;

/// Status of a submitted job, as reported to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Running {
        processed: usize,
        total: usize,
    },
    Completed {
        results: Vec<ResultFile>,
        finished_at: Option<String>,
    },
    Failed(FailureKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Job { job_id: JobId, status: JobStatus },
    Download {
        result_id: ResultId,
        result: Result<PathBuf, FailureKind>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Cancelled,
    EmptyInput,
    Processing(String),
    UnknownResult(ResultId),
    Io(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::EmptyInput => write!(f, "no input files"),
            FailureKind::Processing(message) => write!(f, "processing error: {message}"),
            FailureKind::UnknownResult(id) => write!(f, "unknown result {id}"),
            FailureKind::Io(message) => write!(f, "io error: {message}"),
        }
    }
}

/// The engine thread has exited; no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine stopped")]
pub struct EngineStopped;

use bytes::Bytes;
use desk_core::{JobRequest, ResultFile};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, FailureKind};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// The conversion service a job is handed to.
///
/// `run` covers submission and waiting for the terminal status; progress is
/// reported through `sink`. Implementations must return
/// `FailureKind::Cancelled` promptly once `cancel` fires.
#[async_trait::async_trait]
pub trait ConversionBackend: Send + Sync {
    async fn run(
        &self,
        request: &JobRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultFile>, FailureKind>;

    /// Content of a finished result, for downloads.
    async fn fetch_result(&self, result: &ResultFile) -> Result<Bytes, FailureKind>;
}

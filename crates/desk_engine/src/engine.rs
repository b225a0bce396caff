use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use desk_core::{JobId, JobRequest, ResultFile};
use desk_logging::{desk_debug, desk_error, desk_info, desk_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::{ChannelProgressSink, ConversionBackend, ProgressSink};
use crate::config::{Clock, EngineConfig};
use crate::download::Downloader;
use crate::simulate::SimulatedBackend;
use crate::{EngineEvent, EngineStopped, JobStatus};

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

enum EngineCommand {
    Submit(JobRequest),
    Cancel { job_id: JobId },
    Download { results: Vec<ResultFile> },
    Shutdown,
}

type CancelTokens = Arc<Mutex<HashMap<JobId, CancellationToken>>>;

/// Handle to the background runtime that executes jobs and downloads.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let backend = Arc::new(SimulatedBackend::new(config.simulation.clone()));
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: EngineConfig, backend: Arc<dyn ConversionBackend>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let downloader = Arc::new(Downloader::new(config.download_dir.clone()));
        let clock = config.finished_utc.clone();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_time()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    desk_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let tokens: CancelTokens = Arc::new(Mutex::new(HashMap::new()));
            let mut jobs: Vec<JoinHandle<()>> = Vec::new();

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Submit(request) => {
                        let token = CancellationToken::new();
                        lock(&tokens).insert(request.job_id, token.clone());
                        let backend = backend.clone();
                        let event_tx = event_tx.clone();
                        let tokens = tokens.clone();
                        let clock = clock.clone();
                        jobs.retain(|job| !job.is_finished());
                        jobs.push(runtime.spawn(async move {
                            let job_id = request.job_id;
                            run_job(backend.as_ref(), request, &token, event_tx, clock).await;
                            lock(&tokens).remove(&job_id);
                        }));
                    }
                    EngineCommand::Cancel { job_id } => match lock(&tokens).remove(&job_id) {
                        Some(token) => {
                            desk_info!("Cancelling job {}", job_id);
                            token.cancel();
                        }
                        None => desk_debug!("Cancel for job {} ignored; not running", job_id),
                    },
                    EngineCommand::Download { results } => {
                        let backend = backend.clone();
                        let downloader = downloader.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let outcomes = downloader.download(backend.as_ref(), &results).await;
                            for (result_id, result) in outcomes {
                                let _ = event_tx.send(EngineEvent::Download { result_id, result });
                            }
                        });
                    }
                    EngineCommand::Shutdown => break,
                }
            }

            for (_, token) in lock(&tokens).drain() {
                token.cancel();
            }
            // Let cancelled jobs report before the runtime drops them.
            runtime.block_on(async {
                let drain = async {
                    for job in jobs {
                        let _ = job.await;
                    }
                };
                if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
                    desk_warn!("Jobs still running after {:?}; dropping them", SHUTDOWN_GRACE);
                }
            });
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
            desk_info!("Engine stopped");
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    pub fn submit(&self, request: JobRequest) {
        desk_info!(
            "Submitting job {} tool={} inputs={}",
            request.job_id,
            request.tool,
            request.inputs.len()
        );
        self.send(EngineCommand::Submit(request));
    }

    pub fn cancel(&self, job_id: JobId) {
        self.send(EngineCommand::Cancel { job_id });
    }

    pub fn download(&self, results: Vec<ResultFile>) {
        self.send(EngineCommand::Download { results });
    }

    /// Stops accepting commands and cancels running jobs. Their `Cancelled`
    /// reports are still delivered before receives turn into `EngineStopped`.
    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    /// Waits up to `timeout` for the next event. `Ok(None)` means nothing
    /// arrived yet; `Err` means the engine thread is gone for good.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<EngineEvent>, EngineStopped> {
        match lock(&self.event_rx).recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            desk_warn!("Engine is not running; command dropped");
        }
    }
}

async fn run_job(
    backend: &dyn ConversionBackend,
    request: JobRequest,
    cancel: &CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
    clock: Option<Clock>,
) {
    let job_id = request.job_id;
    let sink = ChannelProgressSink::new(event_tx.clone());
    sink.emit(EngineEvent::Job {
        job_id,
        status: JobStatus::Running {
            processed: 0,
            total: request.inputs.len(),
        },
    });
    let status = match backend.run(&request, &sink, cancel).await {
        Ok(results) => JobStatus::Completed {
            results,
            finished_at: clock.map(|now| now()),
        },
        Err(kind) => {
            desk_warn!("Job {} failed: {}", job_id, kind);
            JobStatus::Failed(kind)
        }
    };
    let _ = event_tx.send(EngineEvent::Job { job_id, status });
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

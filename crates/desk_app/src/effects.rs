use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use desk_core::{DeskError, Effect, Msg};
use desk_engine::{
    EngineConfig, EngineEvent, EngineHandle, EngineStopped, FailureKind, JobStatus,
};
use desk_logging::{desk_debug, desk_info};

use crate::{persistence, render};

/// Executes effects from `update` and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    history_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, history_dir: PathBuf, msg_tx: mpsc::Sender<Msg>) -> Self {
        desk_debug!("Starting engine with {:?}", config);
        let engine = EngineHandle::new(config);
        let runner = Self {
            engine,
            history_dir,
        };
        runner.spawn_event_loop(msg_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Notify(notice) => render::notice(&notice),
                Effect::SubmitJob(request) => self.engine.submit(request),
                Effect::CancelJob { job_id } => self.engine.cancel(job_id),
                Effect::Download { results } => {
                    desk_info!("Downloading {} result(s)", results.len());
                    self.engine.download(results);
                }
                Effect::PersistHistory(history) => {
                    persistence::save_history(&self.history_dir, &history);
                }
            }
        }
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            let event = match engine.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                // Dropping `msg_tx` here lets the session see the disconnect.
                Err(EngineStopped) => {
                    desk_debug!("Engine event stream closed");
                    break;
                }
            };
            if let EngineEvent::Job {
                job_id,
                status: JobStatus::Running { processed, total },
            } = &event
            {
                render::progress(*job_id, *processed, *total);
            }
            if let Some(msg) = map_event(event) {
                if msg_tx.send(msg).is_err() {
                    break;
                }
            }
        });
    }
}

fn map_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::Job { job_id, status } => match status {
            JobStatus::Running { .. } => None,
            JobStatus::Completed {
                results,
                finished_at,
            } => Some(Msg::JobFinished {
                job_id,
                result: Ok(results),
                finished_at,
            }),
            JobStatus::Failed(kind) => Some(Msg::JobFinished {
                job_id,
                result: Err(map_failure(kind)),
                finished_at: None,
            }),
        },
        EngineEvent::Download { result_id, result } => Some(Msg::DownloadFinished {
            result_id,
            result: result.map_err(|kind| kind.to_string()),
        }),
    }
}

fn map_failure(kind: FailureKind) -> DeskError {
    match kind {
        FailureKind::Cancelled => DeskError::Cancelled,
        FailureKind::EmptyInput => DeskError::EmptyInput,
        FailureKind::Processing(message) => DeskError::Processing(message),
        other => DeskError::Processing(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use desk_core::ResultId;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn progress_events_are_not_forwarded() {
        let event = EngineEvent::Job {
            job_id: 1,
            status: JobStatus::Running {
                processed: 0,
                total: 3,
            },
        };
        assert_eq!(map_event(event), None);
    }

    #[test]
    fn failures_become_core_errors() {
        let msg = map_event(EngineEvent::Job {
            job_id: 4,
            status: JobStatus::Failed(FailureKind::Processing("bad xref table".into())),
        });
        assert_eq!(
            msg,
            Some(Msg::JobFinished {
                job_id: 4,
                result: Err(DeskError::Processing("bad xref table".into())),
                finished_at: None,
            })
        );
        assert_eq!(map_failure(FailureKind::Cancelled), DeskError::Cancelled);
        assert_eq!(
            map_failure(FailureKind::Io("disk full".into())),
            DeskError::Processing("io error: disk full".into())
        );
    }

    #[test]
    fn download_failures_carry_their_message() {
        let result_id = ResultId { job_id: 2, index: 0 };
        let msg = map_event(EngineEvent::Download {
            result_id,
            result: Err(FailureKind::UnknownResult(result_id)),
        });
        assert_eq!(
            msg,
            Some(Msg::DownloadFinished {
                result_id,
                result: Err("unknown result 2-0".into()),
            })
        );
    }
}

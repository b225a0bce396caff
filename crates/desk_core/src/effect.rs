use crate::{CompletedJobSnapshot, JobId, JobRequest, Notice, ResultFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Notify(Notice),
    SubmitJob(JobRequest),
    CancelJob { job_id: JobId },
    Download { results: Vec<ResultFile> },
    PersistHistory(Vec<CompletedJobSnapshot>),
}

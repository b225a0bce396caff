use std::path::PathBuf;

use crate::{
    CompletedJobSnapshot, DeskError, FileId, JobId, OptionValue, RawFile, ResultFile, ResultId,
    ToolKey,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User dropped or picked files.
    FilesDropped(Vec<RawFile>),
    /// User removed a file from the selection.
    FileRemoved(FileId),
    /// User switched tool (or conversion type).
    ToolSelected(ToolKey),
    /// User changed an option.
    OptionChanged { key: String, value: OptionValue },
    /// User clicked Convert/Compress/Sign.
    StartClicked,
    /// User clicked Cancel while a job runs.
    CancelClicked,
    /// User clicked "Start over".
    ResetClicked,
    DownloadClicked(ResultId),
    DownloadAllClicked,
    /// Engine completion for a job.
    JobFinished {
        job_id: JobId,
        result: Result<Vec<ResultFile>, DeskError>,
        finished_at: Option<String>,
    },
    /// Engine finished writing a download.
    DownloadFinished {
        result_id: ResultId,
        result: Result<PathBuf, String>,
    },
    /// Restore the recent-jobs list from persisted state.
    RestoreHistory(Vec<CompletedJobSnapshot>),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

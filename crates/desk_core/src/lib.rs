//! pdfdesk core: pure job lifecycle state machine and view-model helpers.
mod effect;
mod error;
mod intake;
mod msg;
mod notice;
mod options;
mod preview;
mod results;
mod state;
mod tool;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::DeskError;
pub use intake::{
    check_candidate, file_extension, file_stem, infer_mime_type, IntakeReport, RawFile,
    RejectionKind, RejectionNotice,
};
pub use msg::Msg;
pub use notice::{format_size, ControllerConfig, Notice, NoticeLevel, RejectionNotices};
pub use options::{JobOptions, OptionValue};
pub use preview::{PreviewHandle, PreviewRegistry, PreviewStore, PreviewUrl};
pub use results::{derived_name, plan_results};
pub use state::{
    AppState, CompletedJobSnapshot, FileId, HistoryEntry, JobId, JobInput, JobPhase, JobRequest,
    ResultFile, ResultId, UploadedFile,
};
pub use tool::{AcceptPolicy, OptionKind, OptionSpec, SizeRule, ToolKey, ToolSpec, OUTPUT_FORMAT};
pub use update::update;
pub use view_model::{DeskViewModel, FileRowView, IntakeSummary, ResultRowView};

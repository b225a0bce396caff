use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::intake::{IntakeReport, RawFile};
use crate::notice::ControllerConfig;
use crate::preview::{PreviewHandle, PreviewRegistry, PreviewStore, PreviewUrl};
use crate::view_model::{DeskViewModel, FileRowView, IntakeSummary, ResultRowView};
use crate::{JobOptions, ToolKey, ToolSpec};

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file-{}", self.0)
    }
}

/// Identifies one output of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultId {
    pub job_id: JobId,
    pub index: u32,
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.job_id, self.index)
    }
}

/// Derived phase as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Validated,
    Running,
    Completed,
    Failed,
}

/// A file the controller has taken in. Dropping it releases its preview.
#[derive(Debug)]
pub struct UploadedFile {
    id: FileId,
    name: String,
    size_bytes: u64,
    mime_type: Option<String>,
    blob: Bytes,
    preview: Option<PreviewHandle>,
}

impl UploadedFile {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn blob(&self) -> &Bytes {
        &self.blob
    }

    pub fn preview_url(&self) -> Option<&PreviewUrl> {
        self.preview.as_ref().map(PreviewHandle::url)
    }

    fn to_job_input(&self) -> JobInput {
        JobInput {
            file_id: self.id,
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            mime_type: self.mime_type.clone(),
            blob: self.blob.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFile {
    pub id: ResultId,
    /// Relation only; the source file may no longer exist.
    pub source_file_id: FileId,
    pub derived_name: String,
    pub derived_size_bytes: u64,
}

/// One input of a submitted job, detached from controller ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInput {
    pub file_id: FileId,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
    pub blob: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub job_id: JobId,
    pub tool: ToolKey,
    pub inputs: Vec<JobInput>,
    pub options: JobOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub source_name: String,
    pub derived_name: String,
    pub derived_size_bytes: u64,
}

/// Record of a completed job, kept for the recent-jobs list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedJobSnapshot {
    pub tool: ToolKey,
    pub finished_at: Option<String>,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running { job_id: JobId, snapshot: JobOptions },
    Completed { job_id: JobId, snapshot: JobOptions },
    Failed { message: String },
}

#[derive(Debug)]
pub struct AppState {
    config: ControllerConfig,
    previews: Arc<dyn PreviewStore>,
    tool: ToolKey,
    options: JobOptions,
    files: Vec<UploadedFile>,
    lifecycle: Lifecycle,
    results: Vec<ResultFile>,
    last_intake: Option<IntakeReport>,
    history: Vec<CompletedJobSnapshot>,
    next_file_id: u64,
    next_job_id: JobId,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ToolKey::default())
    }
}

impl AppState {
    pub fn new(tool: ToolKey) -> Self {
        Self::with_services(tool, ControllerConfig::default(), Arc::new(PreviewRegistry::new()))
    }

    pub fn with_services(
        tool: ToolKey,
        config: ControllerConfig,
        previews: Arc<dyn PreviewStore>,
    ) -> Self {
        Self {
            config,
            previews,
            tool,
            options: JobOptions::defaults_for(tool.spec()),
            files: Vec::new(),
            lifecycle: Lifecycle::Idle,
            results: Vec::new(),
            last_intake: None,
            history: Vec::new(),
            next_file_id: 1,
            next_job_id: 1,
            dirty: false,
        }
    }

    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    pub fn tool(&self) -> ToolKey {
        self.tool
    }

    pub fn tool_spec(&self) -> &'static ToolSpec {
        self.tool.spec()
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn results(&self) -> &[ResultFile] {
        &self.results
    }

    pub fn last_intake(&self) -> Option<&IntakeReport> {
        self.last_intake.as_ref()
    }

    pub fn history(&self) -> &[CompletedJobSnapshot] {
        &self.history
    }

    pub fn phase(&self) -> JobPhase {
        match self.lifecycle {
            Lifecycle::Idle if self.files.is_empty() => JobPhase::Idle,
            Lifecycle::Idle => JobPhase::Validated,
            Lifecycle::Running { .. } => JobPhase::Running,
            Lifecycle::Completed { .. } => JobPhase::Completed,
            Lifecycle::Failed { .. } => JobPhase::Failed,
        }
    }

    pub fn running_job(&self) -> Option<JobId> {
        match self.lifecycle {
            Lifecycle::Running { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    /// Options frozen when the current (or last completed) job started.
    pub fn options_snapshot(&self) -> Option<&JobOptions> {
        match &self.lifecycle {
            Lifecycle::Running { snapshot, .. } | Lifecycle::Completed { snapshot, .. } => {
                Some(snapshot)
            }
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.lifecycle {
            Lifecycle::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn view(&self) -> DeskViewModel {
        let spec = self.tool.spec();
        let phase = self.phase();
        DeskViewModel {
            tool: self.tool,
            tool_label: spec.label,
            phase,
            files: self
                .files
                .iter()
                .map(|file| FileRowView {
                    id: file.id,
                    name: file.name.clone(),
                    size_bytes: file.size_bytes,
                    mime_type: file.mime_type.clone(),
                    preview_url: file.preview_url().map(|url| url.as_str().to_string()),
                })
                .collect(),
            options: self
                .options
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
            output_format: self.options.output_format().to_string(),
            results: self
                .results
                .iter()
                .map(|result| ResultRowView {
                    id: result.id,
                    source_file_id: result.source_file_id,
                    source_name: self.file(result.source_file_id).map(|f| f.name.clone()),
                    derived_name: result.derived_name.clone(),
                    derived_size_bytes: result.derived_size_bytes,
                })
                .collect(),
            total_input_bytes: self.files.iter().map(|f| f.size_bytes).sum(),
            total_result_bytes: self.results.iter().map(|r| r.derived_size_bytes).sum(),
            error_banner: self.error_message().map(str::to_string),
            last_intake: self.last_intake.as_ref().map(|report| IntakeSummary {
                accepted: report.accepted.len(),
                rejected: report.rejected.clone(),
            }),
            can_start: matches!(phase, JobPhase::Validated | JobPhase::Failed)
                && !self.files.is_empty(),
            history_count: self.history.len(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn file(&self, id: FileId) -> Option<&UploadedFile> {
        self.files.iter().find(|file| file.id == id)
    }

    pub(crate) fn result(&self, id: ResultId) -> Option<&ResultFile> {
        self.results.iter().find(|result| result.id == id)
    }

    pub(crate) fn accept_file(&mut self, raw: RawFile) -> FileId {
        let id = FileId(self.next_file_id);
        self.next_file_id += 1;
        let preview = self
            .tool
            .spec()
            .previews
            .then(|| PreviewHandle::acquire(&self.previews, id, &raw.blob));
        self.files.push(UploadedFile {
            id,
            name: raw.name,
            size_bytes: raw.blob.len() as u64,
            mime_type: raw.mime_type,
            blob: raw.blob,
            preview,
        });
        self.dirty = true;
        id
    }

    pub(crate) fn remove_file(&mut self, id: FileId) -> Option<String> {
        let index = self.files.iter().position(|file| file.id == id)?;
        let removed = self.files.remove(index);
        self.dirty = true;
        Some(removed.name.clone())
    }

    pub(crate) fn set_last_intake(&mut self, report: IntakeReport) {
        self.last_intake = Some(report);
        self.dirty = true;
    }

    /// Swaps in a new tool, dropping files, results and errors.
    pub(crate) fn switch_tool(&mut self, tool: ToolKey) {
        self.tool = tool;
        self.options = JobOptions::defaults_for(tool.spec());
        self.clear_session();
    }

    pub(crate) fn set_option(&mut self, key: &str, value: crate::OptionValue) -> bool {
        let applied = self.options.set(self.tool.spec(), key, value);
        self.dirty |= applied;
        applied
    }

    /// Moves to `Running`, freezing the options. Returns the request to submit.
    pub(crate) fn begin_job(&mut self) -> JobRequest {
        let job_id = self.next_job_id;
        self.next_job_id += 1;
        let snapshot = self.options.clone();
        let request = JobRequest {
            job_id,
            tool: self.tool,
            inputs: self.files.iter().map(UploadedFile::to_job_input).collect(),
            options: snapshot.clone(),
        };
        self.lifecycle = Lifecycle::Running { job_id, snapshot };
        self.results.clear();
        self.dirty = true;
        request
    }

    pub(crate) fn abandon_job(&mut self) {
        self.lifecycle = Lifecycle::Idle;
        self.dirty = true;
    }

    pub(crate) fn complete_job(&mut self, results: Vec<ResultFile>, finished_at: Option<String>) {
        if !matches!(self.lifecycle, Lifecycle::Running { .. }) {
            return;
        }
        let Lifecycle::Running { job_id, snapshot } =
            std::mem::replace(&mut self.lifecycle, Lifecycle::Idle)
        else {
            return;
        };
        let entries = results
            .iter()
            .map(|result| HistoryEntry {
                source_name: self
                    .file(result.source_file_id)
                    .map(|file| file.name.clone())
                    .unwrap_or_default(),
                derived_name: result.derived_name.clone(),
                derived_size_bytes: result.derived_size_bytes,
            })
            .collect();
        self.history.push(CompletedJobSnapshot {
            tool: self.tool,
            finished_at,
            entries,
        });
        self.results = results;
        self.lifecycle = Lifecycle::Completed { job_id, snapshot };
        self.dirty = true;
    }

    pub(crate) fn fail_job(&mut self, message: String) {
        self.lifecycle = Lifecycle::Failed { message };
        self.results.clear();
        self.dirty = true;
    }

    /// Drops every file (releasing previews), results and errors.
    pub(crate) fn clear_session(&mut self) {
        self.files.clear();
        self.results.clear();
        self.last_intake = None;
        self.lifecycle = Lifecycle::Idle;
        self.dirty = true;
    }

    pub(crate) fn restore_history(&mut self, history: Vec<CompletedJobSnapshot>) {
        self.history = history;
        self.dirty = true;
    }
}

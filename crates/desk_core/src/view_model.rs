use crate::{FileId, JobPhase, OptionValue, RejectionNotice, ResultId, ToolKey};

/// Read-only state handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeskViewModel {
    pub tool: ToolKey,
    pub tool_label: &'static str,
    pub phase: JobPhase,
    pub files: Vec<FileRowView>,
    pub options: Vec<(String, OptionValue)>,
    pub output_format: String,
    pub results: Vec<ResultRowView>,
    pub total_input_bytes: u64,
    pub total_result_bytes: u64,
    /// Inline alert shown while the job is `Failed`.
    pub error_banner: Option<String>,
    pub last_intake: Option<IntakeSummary>,
    pub can_start: bool,
    pub history_count: usize,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub id: FileId,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRowView {
    pub id: ResultId,
    pub source_file_id: FileId,
    pub source_name: Option<String>,
    pub derived_name: String,
    pub derived_size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntakeSummary {
    pub accepted: usize,
    pub rejected: Vec<RejectionNotice>,
}

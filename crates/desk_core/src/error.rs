use thiserror::Error;

/// Errors surfaced to the user by the controller.
///
/// The `Display` text doubles as the notice message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeskError {
    #[error("unsupported file type (accepted: {accepted})")]
    UnsupportedType { accepted: String },
    #[error("file exceeds the {limit} limit")]
    TooLarge { limit: String },
    #[error("at most {max_count} file(s) allowed")]
    TooMany { max_count: usize },
    #[error("please select at least one file")]
    EmptyInput,
    #[error("processing failed: {0}")]
    Processing(String),
    #[error("job was cancelled")]
    Cancelled,
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
}

use bytes::Bytes;

use crate::tool::AcceptPolicy;
use crate::FileId;

/// A candidate file as handed over by a drop zone or file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub blob: Bytes,
}

impl RawFile {
    /// Builds a candidate, inferring the MIME type from the extension.
    pub fn new(name: impl Into<String>, blob: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime_type = infer_mime_type(&name).map(str::to_string);
        Self {
            name,
            mime_type,
            blob: blob.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn size_bytes(&self) -> u64 {
        self.blob.len() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectionKind {
    UnsupportedType,
    TooLarge,
    TooMany,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionNotice {
    pub file_name: String,
    pub kind: RejectionKind,
}

/// Outcome of one intake batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntakeReport {
    pub accepted: Vec<FileId>,
    pub rejected: Vec<RejectionNotice>,
}

/// Type check first, then size. Count limits are enforced by the caller,
/// which knows how many files are already held.
pub fn check_candidate(policy: &AcceptPolicy, candidate: &RawFile) -> Result<(), RejectionKind> {
    let extension = file_extension(&candidate.name);
    if !policy.accepts_type(extension.as_deref(), candidate.mime_type.as_deref()) {
        return Err(RejectionKind::UnsupportedType);
    }
    if candidate.size_bytes() > policy.max_size_bytes {
        return Err(RejectionKind::TooLarge);
    }
    Ok(())
}

/// Lowercased extension without the dot; `None` for dotfiles and bare names.
pub fn file_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

pub fn infer_mime_type(name: &str) -> Option<&'static str> {
    let mime = match file_extension(name)?.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "rtf" => "application/rtf",
        "odt" => "application/vnd.oasis.opendocument.text",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    };
    Some(mime)
}

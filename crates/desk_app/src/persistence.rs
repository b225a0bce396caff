use std::fs;
use std::path::{Path, PathBuf};

use desk_core::{CompletedJobSnapshot, HistoryEntry, ToolKey};
use desk_engine::{ensure_output_dir, AtomicFileWriter};
use desk_logging::{desk_error, desk_info, desk_warn};
use serde::{Deserialize, Serialize};

pub(crate) const HISTORY_FILENAME: &str = ".pdfdesk_history.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PersistedEntry {
    source: String,
    result: String,
    bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PersistedJob {
    tool: String,
    finished_at: Option<String>,
    entries: Vec<PersistedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedHistory {
    completed: Vec<PersistedJob>,
}

impl From<&CompletedJobSnapshot> for PersistedJob {
    fn from(job: &CompletedJobSnapshot) -> Self {
        Self {
            tool: job.tool.as_str().to_string(),
            finished_at: job.finished_at.clone(),
            entries: job
                .entries
                .iter()
                .map(|entry| PersistedEntry {
                    source: entry.source_name.clone(),
                    result: entry.derived_name.clone(),
                    bytes: entry.derived_size_bytes,
                })
                .collect(),
        }
    }
}

impl PersistedJob {
    fn into_snapshot(self) -> Option<CompletedJobSnapshot> {
        let tool: ToolKey = match self.tool.parse() {
            Ok(tool) => tool,
            Err(err) => {
                desk_warn!("Skipping persisted job: {}", err);
                return None;
            }
        };
        Some(CompletedJobSnapshot {
            tool,
            finished_at: self.finished_at,
            entries: self
                .entries
                .into_iter()
                .map(|entry| HistoryEntry {
                    source_name: entry.source,
                    derived_name: entry.result,
                    derived_size_bytes: entry.bytes,
                })
                .collect(),
        })
    }
}

/// Missing or unreadable history loads as empty.
pub(crate) fn load_history(history_dir: &Path) -> Vec<CompletedJobSnapshot> {
    let path = history_dir.join(HISTORY_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Vec::new();
        }
        Err(err) => {
            desk_warn!("Failed to read job history from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    let history: PersistedHistory = match ron::from_str(&content) {
        Ok(history) => history,
        Err(err) => {
            desk_warn!("Failed to parse job history from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    let completed: Vec<_> = history
        .completed
        .into_iter()
        .filter_map(PersistedJob::into_snapshot)
        .collect();
    desk_info!("Loaded {} past job(s) from {:?}", completed.len(), path);
    completed
}

pub(crate) fn save_history(history_dir: &Path, completed: &[CompletedJobSnapshot]) {
    if let Err(err) = ensure_output_dir(history_dir) {
        desk_error!("Failed to ensure history dir {:?}: {}", history_dir, err);
        return;
    }

    let history = PersistedHistory {
        completed: completed.iter().map(PersistedJob::from).collect(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&history, pretty) {
        Ok(text) => text,
        Err(err) => {
            desk_error!("Failed to serialize job history: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(history_dir));
    if let Err(err) = writer.write(HISTORY_FILENAME, content.as_bytes()) {
        desk_error!("Failed to write job history to {:?}: {}", history_dir, err);
    }
}

/// History as pretty JSON, for `pdfdesk history --json`.
pub(crate) fn history_json(completed: &[CompletedJobSnapshot]) -> serde_json::Result<String> {
    let jobs: Vec<PersistedJob> = completed.iter().map(PersistedJob::from).collect();
    serde_json::to_string_pretty(&jobs)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn snapshot(tool: ToolKey) -> CompletedJobSnapshot {
        CompletedJobSnapshot {
            tool,
            finished_at: Some("2026-10-18T09:30:00+00:00".into()),
            entries: vec![HistoryEntry {
                source_name: "contract.pdf".into(),
                derived_name: "contract.docx".into(),
                derived_size_bytes: 4096,
            }],
        }
    }

    #[test]
    fn saved_history_loads_back() {
        let temp = TempDir::new().unwrap();
        let history = vec![snapshot(ToolKey::PdfToWord), snapshot(ToolKey::Compress)];

        save_history(temp.path(), &history);

        assert!(temp.path().join(HISTORY_FILENAME).is_file());
        assert_eq!(load_history(temp.path()), history);
    }

    #[test]
    fn missing_or_corrupt_history_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(load_history(temp.path()).is_empty());

        fs::write(temp.path().join(HISTORY_FILENAME), "(completed: [").unwrap();
        assert!(load_history(temp.path()).is_empty());
    }

    #[test]
    fn unknown_tools_are_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(HISTORY_FILENAME),
            r#"(completed: [
                (tool: "pdf-to-fax", finished_at: None, entries: []),
                (tool: "sign", finished_at: None, entries: []),
            ])"#,
        )
        .unwrap();

        let loaded = load_history(temp.path());
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].tool, ToolKey::Sign);
    }

    #[test]
    fn json_export_uses_tool_keys() {
        let json = history_json(&[snapshot(ToolKey::ExcelToPdf)]).unwrap();
        assert!(json.contains("\"tool\": \"excel-to-pdf\""));
        assert!(json.contains("\"bytes\": 4096"));
    }
}

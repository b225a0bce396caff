use std::collections::HashSet;
use std::path::PathBuf;

use desk_core::{ResultFile, ResultId};
use desk_logging::{desk_info, desk_warn};

use crate::backend::ConversionBackend;
use crate::filename::{sanitize_filename, unique_filename};
use crate::persist::{AtomicFileWriter, PersistError};
use crate::FailureKind;

/// Saves result blobs into the download directory.
#[derive(Debug, Clone)]
pub struct Downloader {
    writer: AtomicFileWriter,
}

impl Downloader {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }

    /// Fetches and writes each result. Names never collide within a batch or
    /// with files already on disk.
    pub async fn download(
        &self,
        backend: &dyn ConversionBackend,
        results: &[ResultFile],
    ) -> Vec<(ResultId, Result<PathBuf, FailureKind>)> {
        let mut written: HashSet<String> = HashSet::new();
        let mut outcomes = Vec::with_capacity(results.len());
        for result in results {
            let outcome = self.download_one(backend, result, &mut written).await;
            match &outcome {
                Ok(path) => desk_info!("Saved result {} to {:?}", result.id, path),
                Err(kind) => desk_warn!("Download of result {} failed: {}", result.id, kind),
            }
            outcomes.push((result.id, outcome));
        }
        outcomes
    }

    async fn download_one(
        &self,
        backend: &dyn ConversionBackend,
        result: &ResultFile,
        written: &mut HashSet<String>,
    ) -> Result<PathBuf, FailureKind> {
        let blob = backend.fetch_result(result).await?;
        let wanted = sanitize_filename(&result.derived_name);
        let dir = self.writer.dir().to_path_buf();
        loop {
            let name = unique_filename(&wanted, |candidate| {
                written.contains(candidate) || dir.join(candidate).exists()
            });
            match self.writer.write_new(&name, &blob) {
                Ok(path) => {
                    written.insert(name);
                    return Ok(path);
                }
                // Lost a race with another writer; try the next suffix.
                Err(PersistError::AlreadyExists(_)) => {
                    written.insert(name);
                }
                Err(err) => return Err(FailureKind::Io(err.to_string())),
            }
        }
    }
}

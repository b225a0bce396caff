use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} already exists")]
    AlreadyExists(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates `dir` (and parents) unless it already is a directory.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let create_failed = |source: io::Error| PersistError::CreateDir {
        path: dir.to_path_buf(),
        source,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::NotADirectory(dir.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(create_failed)
        }
        Err(err) => Err(create_failed(err)),
    }
}

/// Writes files into one directory through temp files staged beside them,
/// so readers see the old content or the new, never a partial file.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `{dir}/{filename}`, replacing any existing file.
    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        self.stage(content)?
            .persist(&target)
            .map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }

    /// Like [`write`](Self::write) but never replaces an existing file.
    pub fn write_new(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        match self.stage(content)?.persist_noclobber(&target) {
            Ok(_) => Ok(target),
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(PersistError::AlreadyExists(target))
            }
            Err(err) => Err(PersistError::Io(err.error)),
        }
    }

    fn stage(&self, content: &[u8]) -> Result<NamedTempFile, PersistError> {
        ensure_output_dir(&self.dir)?;
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(content)?;
        staged.as_file_mut().sync_all()?;
        Ok(staged)
    }
}

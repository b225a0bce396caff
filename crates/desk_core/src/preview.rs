//! Preview handles for uploaded files.
//!
//! A [`PreviewHandle`] is acquired at intake and released when dropped, so
//! every path that destroys an [`crate::UploadedFile`] (removal, reset, tool
//! switch, dropping the controller) releases its preview exactly once.
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::FileId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues and revokes transient local references to file content.
pub trait PreviewStore: fmt::Debug + Send + Sync {
    fn create(&self, file_id: FileId, blob: &Bytes) -> PreviewUrl;
    fn release(&self, url: &PreviewUrl);
}

#[derive(Debug)]
pub struct PreviewHandle {
    url: PreviewUrl,
    store: Arc<dyn PreviewStore>,
}

impl PreviewHandle {
    pub fn acquire(store: &Arc<dyn PreviewStore>, file_id: FileId, blob: &Bytes) -> Self {
        Self {
            url: store.create(file_id, blob),
            store: Arc::clone(store),
        }
    }

    pub fn url(&self) -> &PreviewUrl {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.release(&self.url);
    }
}

/// In-memory store that hands out `blob:pdfdesk/<n>` URLs and tracks
/// which are still live.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next: u64,
    live: HashMap<PreviewUrl, FileId>,
    created: u64,
    released: u64,
    unknown_releases: u64,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outstanding(&self) -> usize {
        self.lock().live.len()
    }

    pub fn created(&self) -> u64 {
        self.lock().created
    }

    pub fn released(&self) -> u64 {
        self.lock().released
    }

    /// Releases of URLs this registry never issued or already revoked.
    pub fn unknown_releases(&self) -> u64 {
        self.lock().unknown_releases
    }

    pub fn url_for(&self, file_id: FileId) -> Option<PreviewUrl> {
        self.lock()
            .live
            .iter()
            .find(|(_, owner)| **owner == file_id)
            .map(|(url, _)| url.clone())
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreviewStore for PreviewRegistry {
    fn create(&self, file_id: FileId, _blob: &Bytes) -> PreviewUrl {
        let mut inner = self.lock();
        inner.next += 1;
        inner.created += 1;
        let url = PreviewUrl(format!("blob:pdfdesk/{}", inner.next));
        inner.live.insert(url.clone(), file_id);
        url
    }

    fn release(&self, url: &PreviewUrl) {
        let mut inner = self.lock();
        if inner.live.remove(url).is_some() {
            inner.released += 1;
        } else {
            inner.unknown_releases += 1;
        }
    }
}

//! Origin byte sources behind [`CachingFetcher`](super::CachingFetcher).

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use super::FetchError;
use crate::location::Location;

/// Loads the raw bytes behind a location from its origin.
#[async_trait]
pub trait ByteSource: Send + Sync {
    async fn load(&self, location: &Location) -> Result<Bytes, FetchError>;
}

#[async_trait]
impl<S: ByteSource + ?Sized> ByteSource for Arc<S> {
    async fn load(&self, location: &Location) -> Result<Bytes, FetchError> {
        (**self).load(location).await
    }
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// In-memory origin. Clones share the same contents and load counter, so a
/// test can keep a handle, edit documents, and count origin hits.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: Arc<RwLock<HashMap<Location, Bytes>>>,
    loads: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with `(location, content)` pairs.
    pub fn with_files<I, B>(files: I) -> Self
    where
        I: IntoIterator<Item = (Location, B)>,
        B: Into<Bytes>,
    {
        let source = Self::new();
        {
            let mut map = source.files.write();
            for (location, content) in files {
                map.insert(location, content.into());
            }
        }
        source
    }

    /// Insert or replace the content at `location`.
    pub fn insert(&self, location: Location, content: impl Into<Bytes>) {
        self.files.write().insert(location, content.into());
    }

    /// Remove `location`; later loads report [`FetchError::NotFound`].
    pub fn remove(&self, location: &Location) -> bool {
        self.files.write().remove(location).is_some()
    }

    /// Total number of origin loads served (hits and misses).
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn load(&self, location: &Location) -> Result<Bytes, FetchError> {
        self.loads.fetch_add(1, Ordering::AcqRel);
        self.files
            .read()
            .get(location)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(location.clone()))
    }
}

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

/// Loads `file://` locations from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

#[async_trait]
impl ByteSource for FileSource {
    async fn load(&self, location: &Location) -> Result<Bytes, FetchError> {
        if location.scheme() != "file" {
            return Err(FetchError::UnsupportedLocation(location.clone()));
        }
        let path = location
            .as_url()
            .to_file_path()
            .map_err(|()| FetchError::UnsupportedLocation(location.clone()))?;
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(Bytes::from(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(location.clone()))
            }
            Err(err) => Err(FetchError::Io {
                location: location.clone(),
                message: err.to_string(),
            }),
        }
    }
}

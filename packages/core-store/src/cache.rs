//! Read-through cache in front of a tree.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::{DirEntry, Error, Metadata, Path, Tree};

/// A path-keyed map that keeps whatever is inserted first.
struct Slots<V> {
    inner: RwLock<HashMap<Path, V>>,
}

impl<V: Clone> Slots<V> {
    fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn get(&self, path: &Path) -> Option<V> {
        self.inner.read().get(path).cloned()
    }

    /// Look up `path`, filling it from `fetch` on a miss.
    ///
    /// The lock is not held while fetching, so two callers can miss on the
    /// same path at once and both fetch. The first insert wins and both get
    /// the cached value back.
    fn get_or_fill(
        &self,
        path: &Path,
        fetch: impl FnOnce() -> Result<V, Error>,
    ) -> Result<V, Error> {
        if let Some(hit) = self.get(path) {
            return Ok(hit);
        }
        let value = fetch()?;
        let mut slots = self.inner.write();
        Ok(slots.entry(path.clone()).or_insert(value).clone())
    }

    fn len(&self) -> usize {
        self.inner.read().len()
    }
}

/// Caches every successful `stat`, `read_dir` and `read` of the inner tree.
///
/// Entries are never evicted or expired: once a path has been read, later
/// reads are served from memory even if the backend has gone away. Failed
/// lookups are not cached, so a transient error is retried on the next call.
pub struct CachedTree<T> {
    inner: T,
    stats: Slots<Metadata>,
    listings: Slots<Vec<DirEntry>>,
    contents: Slots<Bytes>,
}

impl<T: Tree> CachedTree<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            stats: Slots::new(),
            listings: Slots::new(),
            contents: Slots::new(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Number of cached file bodies.
    pub fn cached_files(&self) -> usize {
        self.contents.len()
    }
}

impl<T: Tree> Tree for CachedTree<T> {
    fn stat(&self, path: &Path) -> Result<Metadata, Error> {
        self.stats.get_or_fill(path, || self.inner.stat(path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, Error> {
        self.listings.get_or_fill(path, || {
            tracing::debug!(%path, "cache miss: listing");
            self.inner.read_dir(path)
        })
    }

    fn read(&self, path: &Path) -> Result<Bytes, Error> {
        self.contents.get_or_fill(path, || {
            tracing::debug!(%path, "cache miss: file");
            self.inner.read(path)
        })
    }
}

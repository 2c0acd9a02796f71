//! Re-rooting a tree at one of its sub-directories.

use bytes::Bytes;

use crate::{DirEntry, Error, File, Metadata, Path, Tree};

/// Views into a sub-directory of a tree.
///
/// Every path is joined onto `prefix` before it reaches the inner tree.
/// Because [`Path`] cannot climb above its root, nothing outside the prefix
/// is reachable. Errors name the path as the caller saw it.
pub struct SubTree<T> {
    inner: T,
    prefix: Path,
}

impl<T: Tree> SubTree<T> {
    /// Create a view of `inner` rooted at `prefix`.
    ///
    /// The prefix is not checked here; a missing prefix surfaces as
    /// `NotFound` on the first access.
    pub fn new(inner: T, prefix: Path) -> Self {
        Self { inner, prefix }
    }

    /// Re-root `inner` at `prefix`, failing now if the prefix is not an
    /// existing directory.
    pub fn mount(inner: T, prefix: Path) -> Result<Self, Error> {
        let metadata = inner.stat(&prefix)?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory { path: prefix });
        }
        Ok(Self { inner, prefix })
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn full(&self, path: &Path) -> Path {
        self.prefix.join(path)
    }

    /// Report errors relative to this view, not the inner tree.
    fn relative(&self, error: Error) -> Error {
        let strip = |p: Path| p.strip_prefix(&self.prefix).unwrap_or(p);
        match error {
            Error::NotFound { path } => Error::NotFound { path: strip(path) },
            Error::NotADirectory { path } => Error::NotADirectory { path: strip(path) },
            Error::IsADirectory { path } => Error::IsADirectory { path: strip(path) },
            Error::Io { path, source } => Error::Io {
                path: strip(path),
                source,
            },
            other => other,
        }
    }
}

impl<T: Tree> Tree for SubTree<T> {
    fn stat(&self, path: &Path) -> Result<Metadata, Error> {
        self.inner
            .stat(&self.full(path))
            .map_err(|e| self.relative(e))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, Error> {
        self.inner
            .read_dir(&self.full(path))
            .map_err(|e| self.relative(e))
    }

    fn read(&self, path: &Path) -> Result<Bytes, Error> {
        self.inner
            .read(&self.full(path))
            .map_err(|e| self.relative(e))
    }

    fn open(&self, path: &Path) -> Result<File, Error> {
        let metadata = self.stat(path)?;
        if metadata.is_dir() {
            Ok(File::directory(path.clone(), metadata, self.read_dir(path)?))
        } else {
            Ok(File::regular(path.clone(), metadata, self.read(path)?))
        }
    }
}

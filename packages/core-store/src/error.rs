//! Error types for tree access.

use crate::path::{Path, PathError};

/// Errors produced by trees.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Nothing exists at the path.
    #[error("not found: {path}")]
    NotFound { path: Path },

    /// A directory operation hit a file.
    #[error("not a directory: {path}")]
    NotADirectory { path: Path },

    /// A file operation hit a directory.
    #[error("is a directory: {path}")]
    IsADirectory { path: Path },

    /// A mutation was attempted on a read-only tree.
    #[error("read-only file system: cannot {op} {path}")]
    ReadOnly { op: &'static str, path: Path },

    /// Path parsing error.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// I/O failure from an OS-backed tree, carried verbatim.
    #[error("{path}: {source}")]
    Io {
        path: Path,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Map an I/O error, turning `NotFound` into [`Error::NotFound`].
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound { path: path.clone() },
            _ => Error::Io {
                path: path.clone(),
                source,
            },
        }
    }

    /// True for the one error a layered lookup is allowed to fall through.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

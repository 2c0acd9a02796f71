//! Core traits: Tree, TreeMut.

use std::sync::Arc;

use bytes::Bytes;

use crate::{DirEntry, Error, File, Metadata, Path};

/// Read access to a file tree.
///
/// All paths are relative to the tree root. Receivers are `&self` so a
/// composed tree can be shared between concurrent readers; implementations
/// that hold mutable state guard it internally.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Tree>` or `Arc<dyn Tree>`.
pub trait Tree: Send + Sync {
    /// Get metadata for a file or directory.
    fn stat(&self, path: &Path) -> Result<Metadata, Error>;

    /// List a directory, sorted by entry name.
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, Error>;

    /// Read the entire contents of a file.
    fn read(&self, path: &Path) -> Result<Bytes, Error>;

    /// Open a node, materializing file content or the directory listing.
    fn open(&self, path: &Path) -> Result<File, Error> {
        let metadata = self.stat(path)?;
        if metadata.is_dir() {
            let entries = self.read_dir(path)?;
            Ok(File::directory(path.clone(), metadata, entries))
        } else {
            let data = self.read(path)?;
            Ok(File::regular(path.clone(), metadata, data))
        }
    }

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }
}

/// Mutating access to a file tree.
///
/// Only trees that are built up in memory implement this for real; the
/// composed tree handed to callers is wrapped in [`crate::ReadOnly`], which
/// rejects every operation here.
pub trait TreeMut: Tree {
    /// Write a file, replacing any existing file at the path.
    fn write(&self, path: &Path, data: Bytes) -> Result<(), Error>;

    /// Create a directory and any missing parents.
    fn create_dir(&self, path: &Path) -> Result<(), Error>;

    /// Remove a file or directory (recursively).
    fn remove(&self, path: &Path) -> Result<(), Error>;

    /// Move a node to a new path.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), Error>;

    /// Change permission bits.
    fn set_mode(&self, path: &Path, mode: u32) -> Result<(), Error>;
}

// Blanket implementations for boxes and shared handles

impl<T: Tree + ?Sized> Tree for Box<T> {
    fn stat(&self, path: &Path) -> Result<Metadata, Error> {
        self.as_ref().stat(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, Error> {
        self.as_ref().read_dir(path)
    }

    fn read(&self, path: &Path) -> Result<Bytes, Error> {
        self.as_ref().read(path)
    }

    fn open(&self, path: &Path) -> Result<File, Error> {
        self.as_ref().open(path)
    }
}

impl<T: Tree + ?Sized> Tree for Arc<T> {
    fn stat(&self, path: &Path) -> Result<Metadata, Error> {
        self.as_ref().stat(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, Error> {
        self.as_ref().read_dir(path)
    }

    fn read(&self, path: &Path) -> Result<Bytes, Error> {
        self.as_ref().read(path)
    }

    fn open(&self, path: &Path) -> Result<File, Error> {
        self.as_ref().open(path)
    }
}

impl<T: TreeMut + ?Sized> TreeMut for Box<T> {
    fn write(&self, path: &Path, data: Bytes) -> Result<(), Error> {
        self.as_ref().write(path, data)
    }

    fn create_dir(&self, path: &Path) -> Result<(), Error> {
        self.as_ref().create_dir(path)
    }

    fn remove(&self, path: &Path) -> Result<(), Error> {
        self.as_ref().remove(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), Error> {
        self.as_ref().rename(from, to)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<(), Error> {
        self.as_ref().set_mode(path, mode)
    }
}

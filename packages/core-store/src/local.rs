//! Tree backed by a directory on the local disk.

use std::{ffi, fs, path};

use bytes::Bytes;

use crate::{DirEntry, EntryKind, Error, Metadata, Path, Tree};

/// A tree rooted at an on-disk directory.
///
/// Nothing is read ahead of time: every call goes to the OS, so the
/// read-through cache in front of it is what keeps repeat reads cheap.
#[derive(Debug, Clone)]
pub struct OsTree {
    root: path::PathBuf,
}

impl OsTree {
    /// Mount `root`, which must be an existing directory.
    pub fn new(root: impl Into<path::PathBuf>) -> Result<OsTree, Error> {
        let root = root.into();
        let attr = fs::metadata(&root).map_err(|error| Error::from_io(&Path::root(), error))?;

        if !attr.is_dir() {
            return Err(Error::NotADirectory { path: Path::root() });
        }

        Ok(OsTree { root })
    }

    /// The directory this tree is rooted at.
    pub fn root(&self) -> &path::Path {
        &self.root
    }

    fn tree_path_to_file_path(&self, path: &Path) -> path::PathBuf {
        self.root
            .components()
            .chain(
                path.components
                    .iter()
                    .map(|s| path::Component::Normal(ffi::OsStr::new(s))),
            )
            .collect()
    }

    fn convert_metadata(attr: &fs::Metadata) -> Metadata {
        let kind = if attr.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Metadata {
            kind,
            size: if attr.is_dir() { 0 } else { attr.len() },
            mode: Self::mode_of(attr),
            modified: attr.modified().ok(),
        }
    }

    #[cfg(unix)]
    fn mode_of(attr: &fs::Metadata) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        attr.permissions().mode() & 0o7777
    }

    #[cfg(not(unix))]
    fn mode_of(attr: &fs::Metadata) -> u32 {
        match (attr.is_dir(), attr.permissions().readonly()) {
            (true, _) => 0o755,
            (false, true) => 0o444,
            (false, false) => 0o644,
        }
    }
}

impl Tree for OsTree {
    fn stat(&self, path: &Path) -> Result<Metadata, Error> {
        let file_path = self.tree_path_to_file_path(path);
        let attr = fs::metadata(&file_path).map_err(|e| Error::from_io(path, e))?;
        Ok(Self::convert_metadata(&attr))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, Error> {
        let file_path = self.tree_path_to_file_path(path);
        tracing::trace!(path = %file_path.display(), "listing directory");

        let attr = fs::metadata(&file_path).map_err(|e| Error::from_io(path, e))?;
        if !attr.is_dir() {
            return Err(Error::NotADirectory { path: path.clone() });
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&file_path).map_err(|e| Error::from_io(path, e))? {
            let entry = entry.map_err(|e| Error::from_io(path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follow symlinks like stat does; dangling links are skipped.
            match fs::metadata(entry.path()) {
                Ok(attr) => entries.push(DirEntry::new(name, Self::convert_metadata(&attr))),
                Err(e) => {
                    tracing::debug!(entry = %entry.path().display(), error = %e, "skipping unreadable entry");
                }
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, path: &Path) -> Result<Bytes, Error> {
        let file_path = self.tree_path_to_file_path(path);
        tracing::trace!(path = %file_path.display(), "reading file");

        let attr = fs::metadata(&file_path).map_err(|e| Error::from_io(path, e))?;
        if attr.is_dir() {
            return Err(Error::IsADirectory { path: path.clone() });
        }
        let data = fs::read(&file_path).map_err(|e| Error::from_io(path, e))?;
        Ok(Bytes::from(data))
    }
}

//! Node descriptions and opened files.

use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::time::SystemTime;

use bytes::Bytes;

use crate::Path;

/// Kind of node in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// Metadata about a file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Permission bits.
    pub mode: u32,
    /// Last modification time, if the source recorded one.
    pub modified: Option<SystemTime>,
}

impl Metadata {
    pub fn file(size: u64) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            mode: 0o644,
            modified: None,
        }
    }

    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            mode: 0o755,
            modified: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_modified(mut self, modified: Option<SystemTime>) -> Self {
        self.modified = modified;
        self
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// An entry returned by `read_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name of the entry (not the full path).
    pub name: String,
    pub metadata: Metadata,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            name: name.into(),
            metadata,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }
}

#[derive(Debug)]
enum Content {
    Data(Cursor<Bytes>),
    Listing(Vec<DirEntry>),
}

/// An opened node.
///
/// Regular files are fully materialized and readable through
/// [`std::io::Read`] and [`std::io::Seek`]. Directories carry their listing.
#[derive(Debug)]
pub struct File {
    path: Path,
    metadata: Metadata,
    content: Content,
}

impl File {
    pub fn regular(path: Path, metadata: Metadata, data: Bytes) -> Self {
        Self {
            path,
            metadata,
            content: Content::Data(Cursor::new(data)),
        }
    }

    pub fn directory(path: Path, metadata: Metadata, entries: Vec<DirEntry>) -> Self {
        Self {
            path,
            metadata,
            content: Content::Listing(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }

    /// The whole file content, independent of the read position.
    ///
    /// `None` for directories.
    pub fn contents(&self) -> Option<&Bytes> {
        match &self.content {
            Content::Data(cursor) => Some(cursor.get_ref()),
            Content::Listing(_) => None,
        }
    }

    /// Directory listing. `None` for regular files.
    pub fn entries(&self) -> Option<&[DirEntry]> {
        match &self.content {
            Content::Data(_) => None,
            Content::Listing(entries) => Some(entries),
        }
    }

    fn is_a_directory(&self) -> io::Error {
        io::Error::other(format!("is a directory: {}", self.path))
    }
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let err = self.is_a_directory();
        match &mut self.content {
            Content::Data(cursor) => cursor.read(buf),
            Content::Listing(_) => Err(err),
        }
    }
}

impl Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let err = self.is_a_directory();
        match &mut self.content {
            Content::Data(cursor) => cursor.seek(pos),
            Content::Listing(_) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn regular_file_reads_and_seeks() {
        let mut file = File::regular(
            path!("hello.txt"),
            Metadata::file(11),
            Bytes::from_static(b"hello world"),
        );

        let mut head = [0u8; 5];
        file.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"hello");

        file.seek(SeekFrom::Start(6)).unwrap();
        let mut rest = String::new();
        file.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "world");

        // contents() ignores the cursor position
        assert_eq!(file.contents().unwrap().as_ref(), b"hello world");
        assert!(file.entries().is_none());
    }

    #[test]
    fn directory_refuses_reads() {
        let mut dir = File::directory(
            path!("assets"),
            Metadata::directory(),
            vec![DirEntry::new("a.css", Metadata::file(3))],
        );
        assert!(dir.is_dir());
        assert_eq!(dir.entries().unwrap().len(), 1);

        let mut buf = [0u8; 4];
        let err = dir.read(&mut buf).unwrap_err();
        assert!(err.to_string().contains("is a directory"));
    }
}

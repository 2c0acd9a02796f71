//! Guard that rejects every mutation.

use bytes::Bytes;

use crate::{DirEntry, Error, File, Metadata, Path, Tree, TreeMut};

/// Wraps a tree to reject all writes.
///
/// Reads pass straight through. Every [`TreeMut`] operation fails with
/// [`Error::ReadOnly`] without consulting the inner tree, so the result does
/// not depend on whether the path exists or was ever read.
pub struct ReadOnly<T> {
    inner: T,
}

impl<T> ReadOnly<T> {
    /// Create a new read-only wrapper.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Get a reference to the inner tree.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Tree> Tree for ReadOnly<T> {
    fn stat(&self, path: &Path) -> Result<Metadata, Error> {
        self.inner.stat(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, Error> {
        self.inner.read_dir(path)
    }

    fn read(&self, path: &Path) -> Result<Bytes, Error> {
        self.inner.read(path)
    }

    fn open(&self, path: &Path) -> Result<File, Error> {
        self.inner.open(path)
    }
}

impl<T: Tree> TreeMut for ReadOnly<T> {
    fn write(&self, path: &Path, _data: Bytes) -> Result<(), Error> {
        Err(Error::ReadOnly {
            op: "write",
            path: path.clone(),
        })
    }

    fn create_dir(&self, path: &Path) -> Result<(), Error> {
        Err(Error::ReadOnly {
            op: "create",
            path: path.clone(),
        })
    }

    fn remove(&self, path: &Path) -> Result<(), Error> {
        Err(Error::ReadOnly {
            op: "remove",
            path: path.clone(),
        })
    }

    fn rename(&self, from: &Path, _to: &Path) -> Result<(), Error> {
        Err(Error::ReadOnly {
            op: "rename",
            path: from.clone(),
        })
    }

    fn set_mode(&self, path: &Path, _mode: u32) -> Result<(), Error> {
        Err(Error::ReadOnly {
            op: "chmod",
            path: path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{path, MemTree};

    fn guarded() -> ReadOnly<MemTree> {
        let tree = MemTree::new();
        tree.write(&path!("a.txt"), Bytes::from_static(b"a")).unwrap();
        ReadOnly::new(tree)
    }

    #[test]
    fn reads_pass_through() {
        let tree = guarded();
        assert_eq!(tree.read(&path!("a.txt")).unwrap().as_ref(), b"a");
        assert_eq!(tree.read_dir(&Path::root()).unwrap().len(), 1);
    }

    #[test]
    fn every_mutation_is_rejected() {
        let tree = guarded();
        for p in [path!("a.txt"), path!("never/read"), Path::root()] {
            let results = [
                tree.write(&p, Bytes::new()),
                tree.create_dir(&p),
                tree.remove(&p),
                tree.rename(&p, &path!("elsewhere")),
                tree.set_mode(&p, 0o777),
            ];
            for result in results {
                assert!(matches!(result, Err(Error::ReadOnly { .. })));
            }
        }
        // Nothing changed underneath.
        assert!(tree.inner().exists(&path!("a.txt")));
        assert!(!tree.inner().exists(&path!("never")));
    }
}

//! In-memory tree.
//!
//! Backs decoded archives and the read-through cache. All data lives in a
//! single ordered map guarded by a `RwLock`, so listings come out sorted.

use std::collections::BTreeMap;
use std::time::SystemTime;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::{DirEntry, Error, Metadata, Path, Tree, TreeMut};

#[derive(Debug, Clone)]
enum Node {
    File { data: Bytes, metadata: Metadata },
    Directory { metadata: Metadata },
}

impl Node {
    fn metadata(&self) -> &Metadata {
        match self {
            Node::File { metadata, .. } | Node::Directory { metadata } => metadata,
        }
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Node::File { metadata, .. } | Node::Directory { metadata } => metadata,
        }
    }
}

/// A tree held entirely in memory.
///
/// # Example
///
/// ```rust
/// use layerfs_core_store::{Bytes, MemTree, Tree, TreeMut, path};
///
/// let tree = MemTree::new();
/// tree.write(&path!("site/index.html"), Bytes::from_static(b"<html/>")).unwrap();
///
/// // Parent directories are synthesized
/// assert!(tree.stat(&path!("site")).unwrap().is_dir());
/// ```
#[derive(Debug)]
pub struct MemTree {
    nodes: RwLock<BTreeMap<Path, Node>>,
}

impl Default for MemTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemTree {
    /// Create a tree containing only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            Path::root(),
            Node::Directory {
                metadata: Metadata::directory(),
            },
        );
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Insert a file with explicit metadata, synthesizing missing parents.
    ///
    /// The size recorded in `metadata` is replaced with the length of `data`.
    pub fn insert_file(&self, path: &Path, data: Bytes, metadata: Metadata) -> Result<(), Error> {
        if path.is_root() {
            return Err(Error::IsADirectory { path: path.clone() });
        }
        let mut nodes = self.nodes.write();
        Self::ensure_parents(&mut nodes, path)?;
        if let Some(Node::Directory { .. }) = nodes.get(path) {
            return Err(Error::IsADirectory { path: path.clone() });
        }
        let metadata = Metadata {
            size: data.len() as u64,
            ..metadata
        };
        nodes.insert(path.clone(), Node::File { data, metadata });
        Ok(())
    }

    /// Insert a directory with explicit metadata, synthesizing missing parents.
    ///
    /// An existing directory keeps its children; only its metadata changes.
    pub fn insert_dir(&self, path: &Path, metadata: Metadata) -> Result<(), Error> {
        let mut nodes = self.nodes.write();
        Self::ensure_parents(&mut nodes, path)?;
        match nodes.get_mut(path) {
            Some(Node::File { .. }) => Err(Error::NotADirectory { path: path.clone() }),
            Some(Node::Directory { metadata: existing }) => {
                *existing = metadata;
                Ok(())
            }
            None => {
                nodes.insert(path.clone(), Node::Directory { metadata });
                Ok(())
            }
        }
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// True if only the root exists.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn ensure_parents(nodes: &mut BTreeMap<Path, Node>, path: &Path) -> Result<(), Error> {
        for ancestor in path.ancestors() {
            match nodes.get(&ancestor) {
                Some(Node::Directory { .. }) => {}
                Some(Node::File { .. }) => return Err(Error::NotADirectory { path: ancestor }),
                None => {
                    nodes.insert(
                        ancestor,
                        Node::Directory {
                            metadata: Metadata::directory(),
                        },
                    );
                }
            }
        }
        Ok(())
    }

    fn subtree_keys(nodes: &BTreeMap<Path, Node>, path: &Path) -> Vec<Path> {
        nodes
            .range(path.clone()..)
            .take_while(|(p, _)| p.has_prefix(path))
            .map(|(p, _)| p.clone())
            .collect()
    }
}

impl Tree for MemTree {
    fn stat(&self, path: &Path) -> Result<Metadata, Error> {
        self.nodes
            .read()
            .get(path)
            .map(|node| node.metadata().clone())
            .ok_or_else(|| Error::NotFound { path: path.clone() })
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, Error> {
        let nodes = self.nodes.read();
        match nodes.get(path) {
            None => return Err(Error::NotFound { path: path.clone() }),
            Some(Node::File { .. }) => return Err(Error::NotADirectory { path: path.clone() }),
            Some(Node::Directory { .. }) => {}
        }

        // Children sort directly after their parent and before any sibling
        // of the parent, so a bounded range scan finds them all.
        let depth = path.len() + 1;
        let entries = nodes
            .range(path.clone()..)
            .skip(1)
            .take_while(|(p, _)| p.has_prefix(path))
            .filter(|(p, _)| p.len() == depth)
            .filter_map(|(p, node)| {
                p.file_name()
                    .map(|name| DirEntry::new(name, node.metadata().clone()))
            })
            .collect();
        Ok(entries)
    }

    fn read(&self, path: &Path) -> Result<Bytes, Error> {
        match self.nodes.read().get(path) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Directory { .. }) => Err(Error::IsADirectory { path: path.clone() }),
            None => Err(Error::NotFound { path: path.clone() }),
        }
    }
}

impl TreeMut for MemTree {
    fn write(&self, path: &Path, data: Bytes) -> Result<(), Error> {
        let metadata = Metadata::file(0).with_modified(Some(SystemTime::now()));
        self.insert_file(path, data, metadata)
    }

    fn create_dir(&self, path: &Path) -> Result<(), Error> {
        let mut nodes = self.nodes.write();
        Self::ensure_parents(&mut nodes, path)?;
        match nodes.get(path) {
            Some(Node::File { .. }) => Err(Error::NotADirectory { path: path.clone() }),
            Some(Node::Directory { .. }) => Ok(()),
            None => {
                nodes.insert(
                    path.clone(),
                    Node::Directory {
                        metadata: Metadata::directory().with_modified(Some(SystemTime::now())),
                    },
                );
                Ok(())
            }
        }
    }

    fn remove(&self, path: &Path) -> Result<(), Error> {
        if path.is_root() {
            return Err(Error::IsADirectory { path: path.clone() });
        }
        let mut nodes = self.nodes.write();
        let keys = Self::subtree_keys(&nodes, path);
        if keys.is_empty() {
            return Err(Error::NotFound { path: path.clone() });
        }
        for key in keys {
            nodes.remove(&key);
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), Error> {
        if from.is_root() || to.has_prefix(from) {
            return Err(Error::IsADirectory { path: from.clone() });
        }
        // Replacing an ancestor would clear `from` before it is moved.
        if from.has_prefix(to) {
            return Err(Error::IsADirectory { path: to.clone() });
        }
        let mut nodes = self.nodes.write();
        let keys = Self::subtree_keys(&nodes, from);
        if keys.is_empty() {
            return Err(Error::NotFound { path: from.clone() });
        }
        Self::ensure_parents(&mut nodes, to)?;
        for key in Self::subtree_keys(&nodes, to) {
            nodes.remove(&key);
        }
        for key in keys {
            if let (Some(node), Some(suffix)) = (nodes.remove(&key), key.strip_prefix(from)) {
                nodes.insert(to.join(&suffix), node);
            }
        }
        Ok(())
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<(), Error> {
        match self.nodes.write().get_mut(path) {
            Some(node) => {
                node.metadata_mut().mode = mode;
                Ok(())
            }
            None => Err(Error::NotFound { path: path.clone() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{path, EntryKind};

    fn bytes(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn write_then_read() {
        let tree = MemTree::new();
        tree.write(&path!("a/b/c.txt"), bytes("hello")).unwrap();

        assert_eq!(tree.read(&path!("a/b/c.txt")).unwrap(), bytes("hello"));
        assert_eq!(tree.stat(&path!("a/b/c.txt")).unwrap().size, 5);
        assert!(tree.stat(&path!("a")).unwrap().is_dir());
        assert!(tree.stat(&path!("a/b")).unwrap().is_dir());
    }

    #[test]
    fn read_dir_lists_direct_children_sorted() {
        let tree = MemTree::new();
        tree.write(&path!("z.txt"), bytes("z")).unwrap();
        tree.write(&path!("a/deep/file"), bytes("d")).unwrap();
        tree.write(&path!("m.txt"), bytes("m")).unwrap();

        let names: Vec<String> = tree
            .read_dir(&Path::root())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a", "m.txt", "z.txt"]);

        let entries = tree.read_dir(&path!("a")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].metadata.kind, EntryKind::Directory);
    }

    #[test]
    fn read_dir_does_not_leak_sibling_prefixes() {
        let tree = MemTree::new();
        tree.write(&path!("a/x"), bytes("1")).unwrap();
        tree.write(&path!("a-b/y"), bytes("2")).unwrap();

        let entries = tree.read_dir(&path!("a")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "x");
    }

    #[test]
    fn missing_and_wrong_kind_errors() {
        let tree = MemTree::new();
        tree.write(&path!("f"), bytes("x")).unwrap();

        assert!(tree.read(&path!("nope")).unwrap_err().is_not_found());
        assert!(matches!(
            tree.read_dir(&path!("f")),
            Err(Error::NotADirectory { .. })
        ));
        assert!(matches!(
            tree.read(&Path::root()),
            Err(Error::IsADirectory { .. })
        ));
        assert!(matches!(
            tree.write(&path!("f/child"), bytes("y")),
            Err(Error::NotADirectory { .. })
        ));
    }

    #[test]
    fn insert_dir_keeps_children() {
        let tree = MemTree::new();
        tree.write(&path!("d/f"), bytes("x")).unwrap();
        tree.insert_dir(&path!("d"), Metadata::directory().with_mode(0o700))
            .unwrap();

        assert_eq!(tree.stat(&path!("d")).unwrap().mode, 0o700);
        assert!(tree.exists(&path!("d/f")));
    }

    #[test]
    fn remove_is_recursive() {
        let tree = MemTree::new();
        tree.write(&path!("d/a"), bytes("1")).unwrap();
        tree.write(&path!("d/sub/b"), bytes("2")).unwrap();
        tree.write(&path!("keep"), bytes("3")).unwrap();

        tree.remove(&path!("d")).unwrap();
        assert!(!tree.exists(&path!("d")));
        assert!(!tree.exists(&path!("d/sub/b")));
        assert!(tree.exists(&path!("keep")));
        assert!(tree.remove(&path!("d")).unwrap_err().is_not_found());
    }

    #[test]
    fn rename_moves_subtree() {
        let tree = MemTree::new();
        tree.write(&path!("old/a"), bytes("1")).unwrap();
        tree.rename(&path!("old"), &path!("new/place")).unwrap();

        assert!(!tree.exists(&path!("old")));
        assert_eq!(tree.read(&path!("new/place/a")).unwrap(), bytes("1"));
    }

    #[test]
    fn rename_onto_ancestor_is_rejected_and_keeps_data() {
        let tree = MemTree::new();
        tree.write(&path!("a/b/x"), bytes("1")).unwrap();

        assert!(matches!(
            tree.rename(&path!("a/b"), &path!("a")),
            Err(Error::IsADirectory { .. })
        ));
        assert!(tree.rename(&path!("a/b/x"), &Path::root()).is_err());
        assert_eq!(tree.read(&path!("a/b/x")).unwrap(), bytes("1"));
        assert!(tree.stat(&path!("a/b")).unwrap().is_dir());
    }

    #[test]
    fn set_mode_updates_metadata() {
        let tree = MemTree::new();
        tree.write(&path!("run.sh"), bytes("#!/bin/sh")).unwrap();
        tree.set_mode(&path!("run.sh"), 0o755).unwrap();
        assert_eq!(tree.stat(&path!("run.sh")).unwrap().mode, 0o755);
    }
}

//! LayeredTree: copy-on-write stacking of read-only trees.
//!
//! Layers are searched from the most recently pushed down to the base. The
//! first layer that has a path answers for it; a `NotFound` from a layer
//! falls through to the one below, while any other error aborts the lookup
//! so a broken layer is never silently skipped.
//!
//! Directory listings are the union of every layer that has the directory,
//! with higher layers shadowing lower ones on name collisions. A file in a
//! higher layer hides any directory of the same name below it.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::{DirEntry, Error, Metadata, Path, Tree};

/// A shared, type-erased tree.
pub type TreeBox = Arc<dyn Tree>;

/// Stack trees on top of a base tree.
///
/// # Example
///
/// ```rust
/// use layerfs_core_store::{Bytes, LayeredTree, MemTree, Tree, TreeMut, path};
///
/// let base = MemTree::new();
/// base.write(&path!("index.html"), Bytes::from_static(b"base")).unwrap();
/// base.write(&path!("robots.txt"), Bytes::from_static(b"allow")).unwrap();
///
/// let patch = MemTree::new();
/// patch.write(&path!("index.html"), Bytes::from_static(b"patched")).unwrap();
///
/// let mut tree = LayeredTree::new(base);
/// tree.push(patch);
///
/// assert_eq!(tree.read(&path!("index.html")).unwrap().as_ref(), b"patched");
/// assert_eq!(tree.read(&path!("robots.txt")).unwrap().as_ref(), b"allow");
/// ```
pub struct LayeredTree {
    /// Base first, most recent last.
    layers: Vec<TreeBox>,
}

impl LayeredTree {
    /// Create a stack with a single base layer.
    pub fn new<T: Tree + 'static>(base: T) -> Self {
        Self {
            layers: vec![Arc::new(base)],
        }
    }

    /// Create a stack from an already shared base.
    pub fn from_shared(base: TreeBox) -> Self {
        Self { layers: vec![base] }
    }

    /// Push a layer on top. It shadows every layer pushed before it.
    pub fn push<T: Tree + 'static>(&mut self, layer: T) {
        self.layers.push(Arc::new(layer));
    }

    /// Push an already shared layer on top.
    pub fn push_shared(&mut self, layer: TreeBox) {
        self.layers.push(layer);
    }

    /// Number of layers, the base included.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layers from the top of the stack down to the base.
    fn top_down(&self) -> impl Iterator<Item = &TreeBox> {
        self.layers.iter().rev()
    }

    /// Find the topmost layer holding `path`, with its metadata there.
    fn resolve(&self, path: &Path) -> Result<(usize, Metadata), Error> {
        for (depth, layer) in self.top_down().enumerate() {
            match layer.stat(path) {
                Ok(metadata) => return Ok((depth, metadata)),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(Error::NotFound { path: path.clone() })
    }
}

impl Tree for LayeredTree {
    fn stat(&self, path: &Path) -> Result<Metadata, Error> {
        self.resolve(path).map(|(_, metadata)| metadata)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, Error> {
        let (top, metadata) = self.resolve(path)?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory { path: path.clone() });
        }

        let mut merged: BTreeMap<String, DirEntry> = BTreeMap::new();
        for layer in self.top_down().skip(top) {
            match layer.stat(path) {
                Ok(m) if m.is_dir() => {}
                // A file here hides this directory in every lower layer.
                Ok(_) => break,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
            for entry in layer.read_dir(path)? {
                merged.entry(entry.name.clone()).or_insert(entry);
            }
        }
        Ok(merged.into_values().collect())
    }

    fn read(&self, path: &Path) -> Result<Bytes, Error> {
        let (top, metadata) = self.resolve(path)?;
        if metadata.is_dir() {
            return Err(Error::IsADirectory { path: path.clone() });
        }
        match self.top_down().nth(top) {
            Some(layer) => layer.read(path),
            None => Err(Error::NotFound { path: path.clone() }),
        }
    }
}

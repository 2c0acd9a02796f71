//! The lifecycle handle handed to hosts.

use std::fmt;

use layerfs_core_store::{
    Bytes, CachedTree, DirEntry, File, Metadata, Path, ReadOnly, Tree, TreeBox, TreeMut,
};
use tracing::info;

use crate::{Composer, Error, Overlay};

/// The tree a provisioned [`Vfs`] exposes.
pub type ExposedTree = ReadOnly<CachedTree<TreeBox>>;

/// A composed, cached, read-only filesystem.
///
/// Nothing is fetched until [`provision`](Vfs::provision). Until then, and
/// after [`cleanup`](Vfs::cleanup), every lookup fails with
/// [`Error::NotProvisioned`].
///
/// ```no_run
/// use layerfs::{Overlay, Vfs};
///
/// let mut vfs = Vfs::new(Overlay::new("/srv/site.tar.gz"));
/// vfs.provision()?;
/// let index = vfs.read("/index.html")?;
/// # let _ = index;
/// vfs.cleanup()?;
/// # Ok::<(), layerfs::Error>(())
/// ```
pub struct Vfs {
    overlay: Overlay,
    composer: Composer,
    tree: Option<ExposedTree>,
}

impl fmt::Debug for Vfs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vfs")
            .field("overlay", &self.overlay.to_string())
            .field("provisioned", &self.is_provisioned())
            .finish()
    }
}

impl Vfs {
    pub fn new(overlay: Overlay) -> Self {
        Self {
            overlay,
            composer: Composer::new(),
            tree: None,
        }
    }

    /// Parse the overlay from JSON.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(Self::new(Overlay::from_json(json)?))
    }

    pub fn with_composer(mut self, composer: Composer) -> Self {
        self.composer = composer;
        self
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Compose the overlay tree and wrap it in a cache and a read-only guard.
    ///
    /// On failure the previous state is kept; a half-built tree is never
    /// exposed.
    pub fn provision(&mut self) -> Result<(), Error> {
        let composed = self.composer.compose(&self.overlay)?;
        self.tree = Some(ReadOnly::new(CachedTree::new(composed)));
        info!(overlay = %self.overlay, layers = self.overlay.node_count(), "filesystem provisioned");
        Ok(())
    }

    pub fn is_provisioned(&self) -> bool {
        self.tree.is_some()
    }

    /// Release the composed tree and every handle it holds. Safe to call
    /// more than once.
    pub fn cleanup(&mut self) -> Result<(), Error> {
        if self.tree.take().is_some() {
            info!(overlay = %self.overlay, "filesystem released");
        }
        Ok(())
    }

    /// The exposed tree.
    pub fn tree(&self) -> Result<&ExposedTree, Error> {
        self.tree.as_ref().ok_or(Error::NotProvisioned)
    }

    fn path(name: &str) -> Result<Path, Error> {
        Path::parse(name.trim_matches('/')).map_err(|e| Error::Tree(e.into()))
    }

    /// Open `name` relative to the root. Leading and trailing `/` are ignored.
    pub fn open(&self, name: &str) -> Result<File, Error> {
        Ok(self.tree()?.open(&Self::path(name)?)?)
    }

    pub fn stat(&self, name: &str) -> Result<Metadata, Error> {
        Ok(self.tree()?.stat(&Self::path(name)?)?)
    }

    pub fn read_dir(&self, name: &str) -> Result<Vec<DirEntry>, Error> {
        Ok(self.tree()?.read_dir(&Self::path(name)?)?)
    }

    pub fn read(&self, name: &str) -> Result<Bytes, Error> {
        Ok(self.tree()?.read(&Self::path(name)?)?)
    }

    // Mutations are forwarded so callers get the guard's error.

    pub fn write(&self, name: &str, data: Bytes) -> Result<(), Error> {
        Ok(self.tree()?.write(&Self::path(name)?, data)?)
    }

    pub fn create_dir(&self, name: &str) -> Result<(), Error> {
        Ok(self.tree()?.create_dir(&Self::path(name)?)?)
    }

    pub fn remove(&self, name: &str) -> Result<(), Error> {
        Ok(self.tree()?.remove(&Self::path(name)?)?)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<(), Error> {
        Ok(self.tree()?.rename(&Self::path(from)?, &Self::path(to)?)?)
    }

    pub fn set_mode(&self, name: &str, mode: u32) -> Result<(), Error> {
        Ok(self.tree()?.set_mode(&Self::path(name)?, mode)?)
    }
}

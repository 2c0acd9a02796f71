//! # layerfs
//!
//! Compose one read-only file tree out of local directories and archives
//! fetched from disk, HTTP(S) or S3.
//!
//! An [`Overlay`] names a source, an optional `workdir` to re-root at, an
//! optional forced archive `type`, headers, and child overlays layered on
//! top. The [`Composer`] resolves the whole tree; a [`Vfs`] wraps the result
//! in a read-through cache and a read-only guard and exposes the
//! `provision` / `open` / `cleanup` lifecycle.
//!
//! ```no_run
//! use layerfs::Vfs;
//!
//! let mut vfs = Vfs::from_json(r#"{
//!     "source": "s3://s3.amazonaws.com/assets/site.tar.gz",
//!     "workdir": "public",
//!     "overlay": [{ "source": "/srv/overrides" }]
//! }"#)?;
//! vfs.provision()?;
//! for entry in vfs.read_dir("/")? {
//!     println!("{}", entry.name);
//! }
//! # Ok::<(), layerfs::Error>(())
//! ```

mod backend;
mod composer;
mod error;
mod headers;
mod overlay;
mod placeholder;
mod vfs;

pub use backend::Backend;
pub use composer::Composer;
pub use error::{Error, ErrorKind};
pub use headers::Headers;
pub use overlay::Overlay;
pub use placeholder::{EnvReplacer, NoopReplacer, Replacer};
pub use vfs::{ExposedTree, Vfs};

pub use layerfs_core_store::{Bytes, DirEntry, EntryKind, File, Metadata};

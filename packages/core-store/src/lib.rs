//! layerfs core: read-only file trees
//!
//! This layer defines what a resolved filesystem looks like and the
//! wrappers the composer stacks on top of each other:
//! - `Path`: normalized, root-relative path that cannot escape its root
//! - `Tree` / `TreeMut`: read and mutate interfaces
//! - `MemTree`, `OsTree`: in-memory and on-disk trees
//! - `SubTree`: re-root a tree at a sub-directory
//! - `LayeredTree`: copy-on-write stacking, later layers shadow earlier ones
//! - `CachedTree`: read-through cache that never expires
//! - `ReadOnly`: guard that rejects every mutation
//!
//! # Example
//!
//! ```rust
//! use layerfs_core_store::{Bytes, CachedTree, MemTree, ReadOnly, Tree, TreeMut, path};
//!
//! let tree = MemTree::new();
//! tree.write(&path!("index.html"), Bytes::from_static(b"<h1>hi</h1>")).unwrap();
//!
//! let exposed = ReadOnly::new(CachedTree::new(tree));
//! assert!(exposed.read(&path!("index.html")).is_ok());
//! assert!(exposed.remove(&path!("index.html")).is_err());
//! ```

pub use bytes::Bytes;

mod cache;
mod entry;
mod error;
mod layered;
mod local;
mod memory;
mod path;
mod read_only;
mod sub_tree;
mod traits;

pub use cache::CachedTree;
pub use entry::{DirEntry, EntryKind, File, Metadata};
pub use error::Error;
pub use layered::{LayeredTree, TreeBox};
pub use local::OsTree;
pub use memory::MemTree;
pub use path::{Path, PathError};
pub use read_only::ReadOnly;
pub use sub_tree::SubTree;
pub use traits::{Tree, TreeMut};

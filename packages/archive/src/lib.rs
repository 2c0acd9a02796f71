//! Archive decoding for layerfs.
//!
//! Turns zip, tar and gzip-compressed tar payloads into a
//! [`MemTree`](layerfs_core_store::MemTree). The format is taken from an
//! explicit type hint when one is given, otherwise from the file name's
//! suffix.
//!
//! ```rust,no_run
//! use layerfs_archive::{decode_named, ArchiveKind};
//!
//! let file = std::fs::File::open("site.tar.gz").unwrap();
//! let tree = decode_named("", "site.tar.gz", file).unwrap();
//! # let _ = tree;
//! assert_eq!(ArchiveKind::sniff("site.tgz"), Some(ArchiveKind::TarGz));
//! ```

mod decode;
mod error;
mod kind;

pub use decode::{decode, decode_bytes, decode_named};
pub use error::Error;
pub use kind::{detect, ArchiveKind};

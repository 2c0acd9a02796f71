//! Decoding archives into in-memory trees.
//!
//! Archives are read fully into memory before decoding. Zip needs random
//! access to its central directory and the tar variants are small enough in
//! practice that streaming buys nothing.

use std::io::{Cursor, Read};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use flate2::read::GzDecoder;
use layerfs_core_store::{MemTree, Metadata, Path, Tree};
use tracing::debug;

use crate::{detect, ArchiveKind, Error};

const MODE_MASK: u32 = 0o7777;
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Decode an archive of a known kind.
pub fn decode<R: Read>(kind: ArchiveKind, mut reader: R) -> Result<MemTree, Error> {
    let mut body = Vec::new();
    reader.read_to_end(&mut body)?;
    decode_bytes(kind, Bytes::from(body))
}

/// Decode an archive that is already in memory.
pub fn decode_bytes(kind: ArchiveKind, body: Bytes) -> Result<MemTree, Error> {
    debug!(%kind, size = body.len(), "decoding archive");
    let tree = match kind {
        ArchiveKind::Zip => decode_zip(body)?,
        ArchiveKind::Tar => decode_tar(Cursor::new(body))?,
        ArchiveKind::TarGz => decode_tar(GzDecoder::new(Cursor::new(body)))?,
    };
    debug!(%kind, nodes = tree.len(), "archive decoded");
    Ok(tree)
}

/// Detect the kind from `type_hint` and `name`, then decode.
///
/// Fails with [`Error::NotAnArchive`] when there is no hint and the name has
/// no recognized suffix.
pub fn decode_named<R: Read>(type_hint: &str, name: &str, reader: R) -> Result<MemTree, Error> {
    match detect(type_hint, name)? {
        Some(kind) => decode(kind, reader),
        None => Err(Error::NotAnArchive {
            name: name.to_string(),
        }),
    }
}

fn entry_path(name: &str) -> Result<Path, Error> {
    Path::parse(name).map_err(|source| Error::InvalidEntry {
        name: name.to_string(),
        source,
    })
}

fn decode_zip(body: Bytes) -> Result<MemTree, Error> {
    let tree = MemTree::new();
    let mut archive = zip::ZipArchive::new(Cursor::new(body))?;

    for index in 0..archive.len() {
        let mut member = archive.by_index(index)?;
        let name = member.name().to_string();
        let path = entry_path(&name)?;
        let unix_mode = member.unix_mode();

        if unix_mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            debug!(entry = %name, "skipping symlink in zip");
            continue;
        }

        // Some writers store zero permissions; keep the defaults then.
        let permissions = unix_mode.map(|m| m & MODE_MASK).filter(|m| *m != 0);

        if member.is_dir() {
            let mut metadata = Metadata::directory();
            if let Some(mode) = permissions {
                metadata = metadata.with_mode(mode);
            }
            tree.insert_dir(&path, metadata)?;
            continue;
        }

        if path.is_root() {
            debug!(entry = %name, "skipping zip entry with empty name");
            continue;
        }

        // Declared sizes are untrusted; let the buffer grow with the data.
        let mut data = Vec::new();
        member.read_to_end(&mut data)?;
        let mut metadata = Metadata::file(0);
        if let Some(mode) = permissions {
            metadata = metadata.with_mode(mode);
        }
        tree.insert_file(&path, Bytes::from(data), metadata)?;
    }

    Ok(tree)
}

fn decode_tar<R: Read>(reader: R) -> Result<MemTree, Error> {
    let tree = MemTree::new();
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        let path = entry_path(&name)?;
        let header = entry.header();
        let entry_type = header.entry_type();
        let mode = header.mode()? & MODE_MASK;
        let modified = header
            .mtime()
            .ok()
            .filter(|secs| *secs > 0)
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));

        // Old-style archives mark directories only with a trailing slash.
        let is_dir = entry_type.is_dir() || (entry_type.is_file() && name.ends_with('/'));

        if is_dir {
            tree.insert_dir(&path, dir_metadata(mode, modified))?;
        } else if entry_type.is_file() {
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            tree.insert_file(&path, Bytes::from(data), file_metadata(mode, modified))?;
        } else if entry_type.is_hard_link() {
            let target = match entry.link_name()? {
                Some(target) => entry_path(&target.to_string_lossy())?,
                None => {
                    debug!(entry = %name, "skipping hard link without target");
                    continue;
                }
            };
            match tree.read(&target) {
                Ok(data) => tree.insert_file(&path, data, file_metadata(mode, modified))?,
                Err(e) => debug!(entry = %name, target = %target, error = %e, "skipping dangling hard link"),
            }
        } else {
            debug!(entry = %name, kind = ?entry_type, "skipping unsupported tar entry");
        }
    }

    Ok(tree)
}

fn file_metadata(mode: u32, modified: Option<SystemTime>) -> Metadata {
    Metadata::file(0).with_mode(mode).with_modified(modified)
}

fn dir_metadata(mode: u32, modified: Option<SystemTime>) -> Metadata {
    Metadata::directory().with_mode(mode).with_modified(modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerfs_core_store::path;

    fn tar_with(entries: &[(&str, tar::EntryType, &[u8], Option<&str>)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, kind, data, link) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(*kind);
            header.set_size(data.len() as u64);
            header.set_mode(0o640);
            header.set_mtime(1_700_000_000);
            if let Some(link) = link {
                header.set_link_name(link).unwrap();
            }
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn tar_modes_and_times_survive() {
        let body = tar_with(&[("bin/run.sh", tar::EntryType::Regular, b"#!/bin/sh", None)]);
        let tree = decode(ArchiveKind::Tar, body.as_slice()).unwrap();

        let meta = tree.stat(&path!("bin/run.sh")).unwrap();
        assert_eq!(meta.mode, 0o640);
        assert_eq!(meta.size, 9);
        assert_eq!(
            meta.modified,
            Some(UNIX_EPOCH + Duration::from_secs(1_700_000_000))
        );
    }

    #[test]
    fn tar_hard_link_copies_target() {
        let body = tar_with(&[
            ("a.txt", tar::EntryType::Regular, b"shared", None),
            ("b.txt", tar::EntryType::Link, b"", Some("a.txt")),
        ]);
        let tree = decode(ArchiveKind::Tar, body.as_slice()).unwrap();
        assert_eq!(tree.read(&path!("b.txt")).unwrap().as_ref(), b"shared");
    }

    #[test]
    fn tar_symlinks_are_skipped() {
        let body = tar_with(&[
            ("real", tar::EntryType::Regular, b"x", None),
            ("alias", tar::EntryType::Symlink, b"", Some("real")),
        ]);
        let tree = decode(ArchiveKind::Tar, body.as_slice()).unwrap();
        assert!(tree.exists(&path!("real")));
        assert!(!tree.exists(&path!("alias")));
    }

    #[test]
    fn dot_slash_prefix_is_normalized() {
        let body = tar_with(&[
            ("./", tar::EntryType::Directory, b"", None),
            ("./docs/readme.md", tar::EntryType::Regular, b"# hi", None),
        ]);
        let tree = decode(ArchiveKind::Tar, body.as_slice()).unwrap();
        assert_eq!(tree.read(&path!("docs/readme.md")).unwrap().as_ref(), b"# hi");
    }

    #[test]
    fn garbage_is_an_error_not_a_panic() {
        let junk = b"definitely not an archive".repeat(40);
        assert!(decode(ArchiveKind::Zip, junk.as_slice()).is_err());
        assert!(decode(ArchiveKind::TarGz, junk.as_slice()).is_err());
    }

    #[test]
    fn tar_oversized_declared_size_is_an_error() {
        let mut header = tar::Header::new_gnu();
        header.set_path("huge.bin").unwrap();
        header.set_size(1 << 62);
        header.set_mode(0o644);
        header.set_cksum();
        let mut builder = tar::Builder::new(Vec::new());
        builder.append(&header, &b"only a few bytes"[..]).unwrap();
        let body = builder.into_inner().unwrap();

        assert!(decode(ArchiveKind::Tar, body.as_slice()).is_err());
    }

    fn zip_with(name: &str, data: &[u8], options: zip::write::SimpleFileOptions) -> Vec<u8> {
        use std::io::Write;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(name, options).unwrap();
        writer.write_all(data).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn zip_declared_size_is_not_trusted() {
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        let mut body = zip_with("small.txt", b"hello", options);

        // Central directory record: uncompressed size lives at offset 24.
        let central = body
            .windows(4)
            .position(|w| w == b"PK\x01\x02")
            .unwrap();
        body[central + 24..central + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());

        // Either the mismatch is reported or the real bytes are kept.
        if let Ok(tree) = decode(ArchiveKind::Zip, body.as_slice()) {
            assert_eq!(tree.read(&path!("small.txt")).unwrap().as_ref(), b"hello");
        }
    }

    #[test]
    fn zip_zero_permissions_keep_defaults() {
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0);
        let body = zip_with("page.html", b"<p/>", options);
        let tree = decode(ArchiveKind::Zip, body.as_slice()).unwrap();

        assert_eq!(tree.stat(&path!("page.html")).unwrap().mode, 0o644);
    }

    #[test]
    fn decode_named_without_suffix_is_not_an_archive() {
        let err = decode_named("", "payload.bin", &b""[..]).unwrap_err();
        assert!(matches!(err, Error::NotAnArchive { .. }));
    }

    #[test]
    fn decode_named_rejects_unknown_hint() {
        let err = decode_named(".7z", "payload.7z", &b""[..]).unwrap_err();
        assert_eq!(err.to_string(), "unsupported file type: .7z");
    }
}

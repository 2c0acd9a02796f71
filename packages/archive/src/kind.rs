//! Archive type detection.

use std::fmt;

use crate::Error;

/// The archive formats the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveKind {
    /// Parse an explicit type hint such as `.zip`, `tar` or `.tgz`.
    pub fn from_type(hint: &str) -> Result<Self, Error> {
        let normalized = hint.trim().to_ascii_lowercase();
        match normalized.trim_start_matches('.') {
            "zip" => Ok(ArchiveKind::Zip),
            "tar" => Ok(ArchiveKind::Tar),
            "tar.gz" | "tgz" => Ok(ArchiveKind::TarGz),
            _ => Err(Error::UnsupportedType {
                file_type: hint.to_string(),
            }),
        }
    }

    /// Guess the kind from a file name or URL suffix.
    ///
    /// Suffixes are checked in order `.zip`, `.tar.gz`/`.tgz`, `.tar`.
    /// Returns `None` when nothing matches.
    pub fn sniff(name: &str) -> Option<Self> {
        if name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".tar") {
            Some(ArchiveKind::Tar)
        } else {
            None
        }
    }

    /// The canonical suffix for this kind.
    pub fn suffix(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => ".zip",
            ArchiveKind::Tar => ".tar",
            ArchiveKind::TarGz => ".tar.gz",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Decide which decoder to use.
///
/// A non-empty `type_hint` always wins over the name and must name a
/// supported format. With no hint the name's suffix decides, and `Ok(None)`
/// means the input is not an archive.
pub fn detect(type_hint: &str, name: &str) -> Result<Option<ArchiveKind>, Error> {
    if type_hint.is_empty() {
        Ok(ArchiveKind::sniff(name))
    } else {
        ArchiveKind::from_type(type_hint).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_by_suffix() {
        assert_eq!(ArchiveKind::sniff("site.zip"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::sniff("site.tar.gz"), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::sniff("site.tgz"), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::sniff("site.tar"), Some(ArchiveKind::Tar));
        assert_eq!(
            ArchiveKind::sniff("https://cdn.example.com/builds/site.tar.gz"),
            Some(ArchiveKind::TarGz)
        );
    }

    #[test]
    fn sniff_unknown_suffix_is_none() {
        assert_eq!(ArchiveKind::sniff("site.rar"), None);
        assert_eq!(ArchiveKind::sniff("README"), None);
        // Query strings defeat suffix sniffing; callers pass a type hint.
        assert_eq!(ArchiveKind::sniff("site.zip?token=abc"), None);
    }

    #[test]
    fn explicit_types_with_or_without_dot() {
        assert_eq!(ArchiveKind::from_type(".zip").unwrap(), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::from_type("tar").unwrap(), ArchiveKind::Tar);
        assert_eq!(ArchiveKind::from_type(".tgz").unwrap(), ArchiveKind::TarGz);
        assert_eq!(
            ArchiveKind::from_type("TAR.GZ").unwrap(),
            ArchiveKind::TarGz
        );
    }

    #[test]
    fn unsupported_type_is_an_error() {
        let err = ArchiveKind::from_type(".xz").unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { ref file_type } if file_type == ".xz"));
    }

    #[test]
    fn hint_overrides_suffix() {
        assert_eq!(
            detect(".zip", "bundle.tar").unwrap(),
            Some(ArchiveKind::Zip)
        );
        assert_eq!(detect("", "bundle.tar").unwrap(), Some(ArchiveKind::Tar));
        assert_eq!(detect("", "bundle.bin").unwrap(), None);
        assert!(detect("rar", "bundle.tar").is_err());
    }
}

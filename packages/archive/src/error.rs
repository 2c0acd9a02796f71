//! Error types for archive decoding.

use layerfs_core_store::PathError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An explicit type hint named a format we cannot decode.
    #[error("unsupported file type: {file_type}")]
    UnsupportedType { file_type: String },

    /// No type hint was given and the name carries no archive suffix.
    #[error("not an archive: {name}")]
    NotAnArchive { name: String },

    /// A member name cannot be placed inside the tree.
    #[error("invalid archive entry '{name}': {source}")]
    InvalidEntry {
        name: String,
        #[source]
        source: PathError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("tree error: {0}")]
    Tree(#[from] layerfs_core_store::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_names_the_type() {
        let e = Error::UnsupportedType {
            file_type: ".rar".to_string(),
        };
        assert_eq!(e.to_string(), "unsupported file type: .rar");
    }

    #[test]
    fn invalid_entry_keeps_source() {
        let e = Error::InvalidEntry {
            name: "../evil".to_string(),
            source: PathError::EscapesRoot {
                path: "../evil".to_string(),
            },
        };
        assert!(e.to_string().contains("../evil"));
        assert!(std::error::Error::source(&e).is_some());
    }
}

//! Error types for overlay composition.

use std::path::PathBuf;

/// Broad classification of a failure, for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad scheme, unknown key, malformed URI.
    Configuration,
    /// Missing local path or remote object.
    NotFound,
    /// Network failure or a non-200 answer.
    Transport,
    /// Archive type that cannot be decoded.
    UnsupportedFormat,
    /// Mutation attempted on the composed tree.
    ReadOnlyViolation,
    Other,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Archive(#[from] layerfs_archive::Error),

    #[error(transparent)]
    Remote(#[from] layerfs_http::Error),

    #[error(transparent)]
    Tree(#[from] layerfs_core_store::Error),

    /// A node of the overlay tree failed to resolve.
    #[error("initialize overlay {description}: {source}")]
    Overlay {
        description: String,
        #[source]
        source: Box<Error>,
    },

    #[error("filesystem is not provisioned")]
    NotProvisioned,
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Classify the error, looking through overlay wrappers.
    pub fn kind(&self) -> ErrorKind {
        use layerfs_archive::Error as A;
        use layerfs_http::Error as H;

        match self {
            Error::Config { .. } => ErrorKind::Configuration,
            Error::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::NotFound
            }
            Error::Io { .. } => ErrorKind::Other,
            Error::Archive(A::UnsupportedType { .. } | A::NotAnArchive { .. }) => {
                ErrorKind::UnsupportedFormat
            }
            Error::Archive(A::Tree(inner)) => Error::tree_kind(inner),
            Error::Archive(_) => ErrorKind::Other,
            Error::Remote(H::NotFound { .. }) => ErrorKind::NotFound,
            Error::Remote(
                H::Http(_) | H::Status { .. } | H::Transport { .. } | H::Signing { .. },
            ) => ErrorKind::Transport,
            Error::Remote(
                H::UrlParse(_)
                | H::InvalidUrl { .. }
                | H::InvalidHeaderName(_)
                | H::InvalidHeaderValue(_),
            ) => ErrorKind::Configuration,
            Error::Tree(inner) => Error::tree_kind(inner),
            Error::Overlay { source, .. } => source.kind(),
            Error::NotProvisioned => ErrorKind::Other,
        }
    }

    fn tree_kind(error: &layerfs_core_store::Error) -> ErrorKind {
        use layerfs_core_store::Error as T;
        match error {
            T::NotFound { .. } => ErrorKind::NotFound,
            T::ReadOnly { .. } => ErrorKind::ReadOnlyViolation,
            T::Path(_) => ErrorKind::Configuration,
            T::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::NotFound
            }
            _ => ErrorKind::Other,
        }
    }
}

//! Backend dispatch and the three resolvers.
//!
//! A source URI picks exactly one backend by scheme. Local directories are
//! mounted as they are; everything else is read fully into memory and
//! decoded as an archive.

use std::fs;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use layerfs_archive::{self as archive, ArchiveKind};
use layerfs_core_store::{OsTree, TreeBox};
use layerfs_http::{HttpExecutor, HttpFetcher, S3Client, S3Config};
use tracing::{debug, warn};
use url::Url;

use crate::{Error, Overlay};

/// Where an overlay's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Local(PathBuf),
    Http(Url),
    S3(Url),
}

impl Backend {
    /// Pick the backend for `source` by URI scheme.
    ///
    /// Plain paths and `file://` URIs are local; `http`, `https` and `s3`
    /// are remote. Any other scheme is a configuration error.
    pub fn parse(source: &str) -> Result<Self, Error> {
        if source.is_empty() {
            return Err(Error::config("missing source"));
        }
        match Url::parse(source) {
            Ok(url) => match url.scheme() {
                "file" => url
                    .to_file_path()
                    .map(Backend::Local)
                    .map_err(|_| Error::config(format!("invalid file URI: {source}"))),
                "http" | "https" => Ok(Backend::Http(url)),
                "s3" => Ok(Backend::S3(url)),
                other => Err(Error::config(format!("unrecognized scheme: {other}"))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(Backend::Local(PathBuf::from(source)))
            }
            Err(e) => Err(Error::config(format!("malformed source {source}: {e}"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Local(_) => "local",
            Backend::Http(_) => "http",
            Backend::S3(_) => "s3",
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, Backend::Local(_))
    }
}

/// Archive kind for a payload, falling back to tar when neither the hint
/// nor the name says otherwise.
pub(crate) fn archive_kind(type_hint: &str, name: &str) -> Result<ArchiveKind, Error> {
    match archive::detect(type_hint, name)? {
        Some(kind) => Ok(kind),
        None => {
            warn!(name, "no archive type or known suffix, decoding as tar");
            Ok(ArchiveKind::Tar)
        }
    }
}

pub(crate) fn resolve_local(path: &FsPath, overlay: &Overlay) -> Result<TreeBox, Error> {
    let io_error = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(io_error)?;
    if metadata.is_dir() {
        debug!(path = %path.display(), "mounting local directory");
        return Ok(Arc::new(OsTree::new(path)?));
    }

    let kind = archive_kind(&overlay.file_type, &path.to_string_lossy())?;
    debug!(path = %path.display(), %kind, "decoding local archive");
    let file = fs::File::open(path).map_err(io_error)?;
    Ok(Arc::new(archive::decode(kind, file)?))
}

pub(crate) fn resolve_http(
    url: &Url,
    overlay: &Overlay,
    executor: Arc<dyn HttpExecutor>,
) -> Result<TreeBox, Error> {
    let kind = archive_kind(&overlay.file_type, url.path())?;
    debug!(%url, %kind, headers = overlay.headers.len(), "fetching remote archive");
    let body = HttpFetcher::new(executor).fetch(url.as_str(), overlay.headers.iter())?;
    Ok(Arc::new(archive::decode_bytes(kind, body)?))
}

pub(crate) fn resolve_s3(
    url: &Url,
    overlay: &Overlay,
    executor: Arc<dyn HttpExecutor>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<TreeBox, Error> {
    // Overlay headers first, then the environment.
    let config = S3Config::resolve(|name| {
        overlay
            .headers
            .get(name)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| env(name))
    });
    let kind = archive_kind(&overlay.file_type, url.path())?;
    debug!(
        %url,
        %kind,
        region = %config.region,
        anonymous = config.is_anonymous(),
        "fetching S3 archive"
    );
    let body = S3Client::new(executor, config).get_object(url)?;
    Ok(Arc::new(archive::decode_bytes(kind, body)?))
}

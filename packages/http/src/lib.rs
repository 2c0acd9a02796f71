//! # layerfs-http
//!
//! Remote fetch for layerfs overlays.
//!
//! - [`HttpFetcher`]: plain GET of an `http(s)://` resource, headers passed
//!   through verbatim, anything but `200 OK` is an error.
//! - [`S3Client`]: GET-object against an S3-compatible store, signed with
//!   AWS Signature V4 when credentials are configured and anonymous
//!   otherwise.
//!
//! Both go through an [`HttpExecutor`], so tests can substitute
//! `executor::mock::MockExecutor` (feature `test-utils`). The production
//! [`ReqwestExecutor`] always carries a client timeout.
//!
//! ```no_run
//! use std::sync::Arc;
//! use layerfs_http::{HttpFetcher, ReqwestExecutor};
//!
//! let executor = Arc::new(ReqwestExecutor::with_default_timeout()?);
//! let fetcher = HttpFetcher::new(executor);
//! let body = fetcher.fetch("https://example.com/site.zip", [("Authorization", "Bearer t")])?;
//! # let _ = body;
//! # Ok::<(), layerfs_http::Error>(())
//! ```

pub mod error;
pub mod executor;
pub mod s3;
pub mod sigv4;
pub mod types;

mod fetch;

pub use error::Error;
pub use executor::{HttpExecutor, ReqwestExecutor, DEFAULT_TIMEOUT};
pub use fetch::HttpFetcher;
pub use s3::{S3Client, S3Config, S3Object};
pub use sigv4::Credentials;
pub use types::{HttpRequest, HttpResponse};

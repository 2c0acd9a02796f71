//! GET-object against S3-compatible stores.
//!
//! Settings come from a lookup function so callers decide where they live;
//! layerfs checks overlay headers first and the process environment second.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::debug;
use url::Url;

use crate::executor::HttpExecutor;
use crate::sigv4::{self, Credentials};
use crate::types::HttpRequest;
use crate::Error;

pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const USE_PATH_STYLE: &str = "AWS_USE_PATH_STYLE";
pub const BUCKET_NAME: &str = "AWS_BUCKET_NAME";
pub const ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";
pub const DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

/// Every setting name the resolver consults, in lookup order.
pub const SETTINGS: [&str; 6] = [
    ACCESS_KEY_ID,
    SECRET_ACCESS_KEY,
    USE_PATH_STYLE,
    BUCKET_NAME,
    ENDPOINT_URL,
    DEFAULT_REGION,
];

pub const FALLBACK_REGION: &str = "us-east-1";

/// Resolved S3 settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    /// `None` means anonymous, unsigned requests.
    pub credentials: Option<Credentials>,
    pub path_style: bool,
    pub bucket_name: Option<String>,
    pub endpoint: Option<String>,
    pub region: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            credentials: None,
            path_style: false,
            bucket_name: None,
            endpoint: None,
            region: FALLBACK_REGION.to_string(),
        }
    }
}

impl S3Config {
    /// Build settings from `lookup`. Empty values count as unset.
    pub fn resolve<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let access_key_id = get(ACCESS_KEY_ID).unwrap_or_default();
        let secret_access_key = get(SECRET_ACCESS_KEY).unwrap_or_default();
        let credentials = if access_key_id.is_empty() && secret_access_key.is_empty() {
            None
        } else {
            Some(Credentials {
                access_key_id,
                secret_access_key,
            })
        };

        Self {
            credentials,
            path_style: get(USE_PATH_STYLE).is_some_and(|v| parse_path_style(&v)),
            bucket_name: get(BUCKET_NAME),
            endpoint: get(ENDPOINT_URL),
            region: get(DEFAULT_REGION).unwrap_or_else(|| FALLBACK_REGION.to_string()),
        }
    }

    /// Settings from the process environment alone.
    pub fn from_env() -> Self {
        Self::resolve(|name| std::env::var(name).ok())
    }

    pub fn is_anonymous(&self) -> bool {
        self.credentials.is_none()
    }

    /// The configured endpoint, or `https://<host of uri>`.
    pub fn endpoint_for(&self, uri: &Url) -> Result<Url, Error> {
        match &self.endpoint {
            Some(endpoint) => Ok(Url::parse(endpoint)?),
            None => {
                let host = uri.host_str().ok_or_else(|| Error::InvalidUrl {
                    message: format!("no host in {uri}"),
                })?;
                let authority = match uri.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                };
                Ok(Url::parse(&format!("https://{authority}"))?)
            }
        }
    }
}

/// `true`/`t`/`yes` select path-style addressing; anything else, including
/// `false`/`f`/`no`, keeps virtual-hosted addressing.
fn parse_path_style(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "t" | "yes")
}

/// Bucket and key of one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Object {
    pub bucket: String,
    pub key: String,
}

impl S3Object {
    /// Locate the object named by an `s3://host/...` URI.
    ///
    /// With an explicit bucket the whole path is the key. Otherwise the
    /// first path segment is the bucket and the rest is the key.
    pub fn locate(uri: &Url, bucket_override: Option<&str>) -> Result<Self, Error> {
        let path = sigv4::uri_decode(uri.path().trim_start_matches('/'));

        let (bucket, key) = match bucket_override.filter(|b| !b.is_empty()) {
            Some(bucket) => (bucket.to_string(), path),
            None => match path.split_once('/') {
                Some((bucket, key)) => (bucket.to_string(), key.to_string()),
                None => (path, String::new()),
            },
        };

        if bucket.is_empty() {
            return Err(Error::InvalidUrl {
                message: format!("no bucket in {uri}"),
            });
        }
        if key.is_empty() {
            return Err(Error::InvalidUrl {
                message: format!("no object key in {uri}"),
            });
        }
        Ok(Self { bucket, key })
    }
}

/// Minimal S3 client: one signed (or anonymous) GET per object.
#[derive(Clone)]
pub struct S3Client {
    executor: Arc<dyn HttpExecutor>,
    config: S3Config,
}

impl S3Client {
    pub fn new(executor: Arc<dyn HttpExecutor>, config: S3Config) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// The URL an object is fetched from.
    pub fn object_url(&self, endpoint: &Url, object: &S3Object) -> Result<Url, Error> {
        let key = sigv4::uri_encode(&object.key, true);
        let url = if self.config.path_style {
            let base = endpoint.as_str().trim_end_matches('/');
            format!("{base}/{}/{key}", sigv4::uri_encode(&object.bucket, false))
        } else {
            let host = endpoint.host_str().ok_or_else(|| Error::InvalidUrl {
                message: format!("no host in endpoint {endpoint}"),
            })?;
            let authority = match endpoint.port() {
                Some(port) => format!("{}.{host}:{port}", object.bucket),
                None => format!("{}.{host}", object.bucket),
            };
            let base = endpoint.path().trim_end_matches('/');
            format!("{}://{authority}{base}/{key}", endpoint.scheme())
        };
        Ok(Url::parse(&url)?)
    }

    /// Download the object named by `uri`.
    pub fn get_object(&self, uri: &Url) -> Result<Bytes, Error> {
        let object = S3Object::locate(uri, self.config.bucket_name.as_deref())?;
        let endpoint = self.config.endpoint_for(uri)?;
        let url = self.object_url(&endpoint, &object)?;

        let mut request = HttpRequest::get(url.as_str());
        match &self.config.credentials {
            Some(credentials) => {
                let signed =
                    sigv4::sign_get(&url, credentials, &self.config.region, "s3", Utc::now())?;
                request = request.with_headers(signed);
            }
            None => debug!(bucket = %object.bucket, "anonymous S3 request"),
        }

        debug!(
            bucket = %object.bucket,
            key = %object.key,
            url = %url,
            path_style = self.config.path_style,
            "fetching S3 object"
        );
        let response = self.executor.execute(&request)?;
        match response.status {
            200 => Ok(response.body),
            404 => Err(Error::NotFound {
                bucket: object.bucket,
                key: object.key,
            }),
            status => Err(Error::Status {
                status,
                status_text: response.status_text,
            }),
        }
    }
}

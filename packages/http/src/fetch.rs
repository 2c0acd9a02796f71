//! Plain HTTP(S) downloads.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::executor::HttpExecutor;
use crate::types::HttpRequest;
use crate::Error;

/// Downloads whole resources over HTTP(S).
#[derive(Clone)]
pub struct HttpFetcher {
    executor: Arc<dyn HttpExecutor>,
}

impl HttpFetcher {
    pub fn new(executor: Arc<dyn HttpExecutor>) -> Self {
        Self { executor }
    }

    /// GET `url` with every header attached and return the body.
    ///
    /// Anything but `200 OK` is an [`Error::Status`].
    pub fn fetch<I, K, V>(&self, url: &str, headers: I) -> Result<Bytes, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl {
                message: format!("expected http or https, got {}", parsed.scheme()),
            });
        }

        let request = HttpRequest::get(parsed.as_str()).with_headers(headers);
        let response = self.executor.execute(&request)?;
        if !response.is_ok() {
            debug!(url = %parsed, status = response.status, "fetch rejected");
            return Err(Error::Status {
                status: response.status,
                status_text: response.status_text,
            });
        }

        debug!(url = %parsed, size = response.body.len(), "fetched");
        Ok(response.body)
    }
}

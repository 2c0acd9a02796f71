//! The transport seam under every remote fetch.
//!
//! HTTP and S3 fetches both issue plain GETs through [`HttpExecutor`]; tests
//! substitute [`mock::MockExecutor`] to stay off the network.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::trace;

use crate::types::{HttpRequest, HttpResponse};
use crate::Error;

/// Default client timeout applied by [`ReqwestExecutor::with_default_timeout`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends one GET and hands back whatever the server answered.
///
/// A non-200 status is not an error at this level.
pub trait HttpExecutor: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error>;
}

/// Blocking reqwest client with a fixed per-request timeout.
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Uses [`DEFAULT_TIMEOUT`].
    pub fn with_default_timeout() -> Result<Self, Error> {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            let header_name = HeaderName::try_from(name.as_str())?;
            let header_value = HeaderValue::try_from(value.as_str())?;
            // `header` appends, so repeated names are all sent.
            builder = builder.header(header_name, header_value);
        }

        trace!(url = %request.url, headers = request.headers.len(), "sending request");
        let response = builder.send()?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();

        let body = response.bytes()?;

        Ok(HttpResponse {
            status,
            status_text,
            headers,
            body,
        })
    }
}

/// Canned responses for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use parking_lot::Mutex;

    /// Serves responses by exact URL and records every request it sees.
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Responses keyed by full request URL.
        responses: Arc<Mutex<HashMap<String, HttpResponse>>>,
        recorded: Arc<Mutex<Vec<HttpRequest>>>,
        /// When set, every request fails with this message.
        failure: Arc<Mutex<Option<String>>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer requests for `url` with `response`.
        pub fn with_response(self, url: impl Into<String>, response: HttpResponse) -> Self {
            self.responses.lock().insert(url.into(), response);
            self
        }

        /// Fail every request with a transport error until [`recover`](Self::recover).
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            *self.failure.lock() = Some(message.into());
            self
        }

        /// Stop failing; configured responses are served again.
        pub fn recover(&self) {
            *self.failure.lock() = None;
        }

        /// Every request seen so far, oldest first.
        pub fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.recorded.lock().clone()
        }

        /// What unmatched URLs get.
        pub fn not_found() -> HttpResponse {
            HttpResponse::new(404, "Not Found", "")
        }
    }

    impl HttpExecutor for MockExecutor {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
            self.recorded.lock().push(request.clone());

            if let Some(message) = self.failure.lock().clone() {
                return Err(Error::Transport { message });
            }

            Ok(self
                .responses
                .lock()
                .get(&request.url)
                .cloned()
                .unwrap_or_else(Self::not_found))
        }
    }
}

use bytes::Bytes;

/// A GET request for a remote resource.
///
/// Headers are kept as an ordered list so repeated names survive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute URL.
    pub url: String,

    /// Request headers, in the order they will be sent.
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Append a header. Existing headers with the same name are kept.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// All values sent for `name`, compared case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,

    /// Response headers
    pub headers: Vec<(String, String)>,

    /// Raw body
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A `200 OK` carrying `body`.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, "OK", body)
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// First value of a response header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_headers_are_kept_in_order() {
        let req = HttpRequest::get("https://example.com/a.zip")
            .with_header("X-Tag", "one")
            .with_header("Authorization", "Bearer t")
            .with_header("x-tag", "two");

        let tags: Vec<&str> = req.header_values("X-TAG").collect();
        assert_eq!(tags, vec!["one", "two"]);
        assert_eq!(req.headers.len(), 3);
    }

    #[test]
    fn response_helpers() {
        let mut resp = HttpResponse::ok("body");
        resp.headers
            .push(("Content-Type".to_string(), "application/zip".to_string()));

        assert!(resp.is_ok());
        assert_eq!(resp.header("content-type"), Some("application/zip"));
        assert!(!HttpResponse::new(204, "No Content", "").is_ok());
    }
}

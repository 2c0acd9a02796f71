#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// The server answered with something other than `200 OK`.
    #[error("unable to get network resource: {status} {status_text}")]
    Status { status: u16, status_text: String },

    /// The object store has no such object.
    #[error("object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("request signing failed: {message}")]
    Signing { message: String },

    /// The request never produced a response.
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl Error {
    /// True when the request reached the server and got a non-200 answer.
    pub fn is_status(&self) -> bool {
        matches!(self, Error::Status { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
            || matches!(self, Error::Status { status: 404, .. })
    }
}

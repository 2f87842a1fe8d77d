use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum RelayError {
    /// The upstream host name could not be resolved. Never retried.
    NameResolution { endpoint: String, reason: String },
    /// Upstream answered with a non-success status other than 429.
    UpstreamStatus { endpoint: String, status: u16 },
    /// Any other non-retryable failure while talking to upstream.
    RequestFailed(String),
    /// Every attempt failed with a transient error.
    RetryExhausted { endpoint: String, attempts: u32, payload: String },
    /// An expected field was absent from an upstream payload.
    MissingField(String),
    /// Upstream returned an empty result for the lookup.
    NotFound(String),
    PageLimitExceeded(usize),
    ParsingError(String),
    SelectorError(String),
    ElementNotFound(String),
    AttributeNotFound(String),
    UnknownSource(String),
    BadRequest(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::NameResolution { endpoint, reason } => write!(f, "Unable to resolve {}: {}", endpoint, reason),
            RelayError::UpstreamStatus { endpoint, status } => write!(f, "Upstream {} answered with HTTP {}", endpoint, status),
            RelayError::RequestFailed(msg) => write!(f, "Failed to make HTTP request: {}", msg),
            RelayError::RetryExhausted { endpoint, attempts, .. } => write!(f, "Reached the maximum number of attempts ({}) for {}", attempts, endpoint),
            RelayError::MissingField(path) => write!(f, "Missing key in response: {}", path),
            RelayError::NotFound(msg) => write!(f, "{}", msg),
            RelayError::PageLimitExceeded(pages) => write!(f, "Pagination did not finish within {} pages", pages),
            RelayError::ParsingError(msg) => write!(f, "Failed to parse response: {}", msg),
            RelayError::SelectorError(msg) => write!(f, "Invalid CSS selector: {}", msg),
            RelayError::ElementNotFound(msg) => write!(f, "Element not found: {}", msg),
            RelayError::AttributeNotFound(msg) => write!(f, "Attribute not found: {}", msg),
            RelayError::UnknownSource(name) => write!(f, "Unknown ranobe source: {}", name),
            RelayError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl Error for RelayError {}

impl RelayError {
    /// HTTP status used when the error reaches an endpoint.
    pub fn http_status(&self) -> u16 {
        match self {
            RelayError::NotFound(_) => 404,
            RelayError::UnknownSource(_) | RelayError::BadRequest(_) => 400,
            _ => 500,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => RelayError::UpstreamStatus {
                endpoint: err.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            },
            None => RelayError::RequestFailed(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::ParsingError(err.to_string())
    }
}

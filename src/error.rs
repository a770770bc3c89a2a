//! Error types for tethys-pager
//!
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! The error is `Clone` so that a single failed page fetch can be handed to
//! every caller waiting on it.

use std::fmt;
use thiserror::Error;

/// Classification of transport-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkError {
    /// The server answered with something that could not be read
    BadResponse,
    /// The request was dropped before it completed
    Cancelled,
    /// Host name resolution failed
    Dns,
    /// No network connectivity
    InternetDown,
    /// The host could not be reached
    ServerNotFound,
    /// The request or connection timed out
    TimedOut,
    /// Anything else
    Unknown,
}

impl NetworkError {
    /// Classify a reqwest error
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::TimedOut;
        }
        if error.is_connect() {
            let chain = error_chain(error).to_lowercase();
            if chain.contains("dns") || chain.contains("lookup address") {
                return Self::Dns;
            }
            if chain.contains("network is unreachable") {
                return Self::InternetDown;
            }
            return Self::ServerNotFound;
        }
        if error.is_body() || error.is_decode() || error.is_redirect() {
            return Self::BadResponse;
        }
        Self::Unknown
    }

    /// Whether a retry could plausibly succeed
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::TimedOut | Self::ServerNotFound | Self::InternetDown | Self::Dns
        )
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::BadResponse => "bad response from server",
            Self::Cancelled => "request cancelled",
            Self::Dns => "DNS lookup failed",
            Self::InternetDown => "internet connection appears to be offline",
            Self::ServerNotFound => "server not found",
            Self::TimedOut => "request timed out",
            Self::Unknown => "unknown network error",
        };
        f.write_str(text)
    }
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

/// The main error type for tethys-pager
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {message}")]
    YamlParse { message: String },

    #[error("Failed to parse JSON: {message}")]
    JsonParse { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("Network error for {url}: {kind}")]
    Network { url: String, kind: NetworkError },

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    // ============================================================================
    // Page Processing Errors
    // ============================================================================
    #[error("Failed to parse page: {message}")]
    Parse { message: String },

    #[error("JSONPath error: {message}")]
    JsonPath { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {message}")]
    Io { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(url: impl Into<String>, kind: NetworkError) -> Self {
        Self::Network {
            url: url.into(),
            kind,
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a page parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a JSONPath error
    pub fn json_path(message: impl Into<String>) -> Self {
        Self::JsonPath {
            message: message.into(),
        }
    }

    /// Build a network error from a reqwest failure
    pub fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        Self::network(url, NetworkError::classify(error))
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited { .. } => true,
            Error::Network { kind, .. } => kind.is_transient(),
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
///
/// Shared by `Error::is_retryable` and the client's retry loop. 520-524 are
/// CDN origin failures.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(
        status,
        429 | 500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::JsonParse {
            message: error.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Self::YamlParse {
            message: error.to_string(),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl {
            message: error.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

/// Result type alias for tethys-pager
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("base_url");
        assert_eq!(err.to_string(), "Missing required config field: base_url");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::network("https://example.com/", NetworkError::Dns);
        assert_eq!(
            err.to_string(),
            "Network error for https://example.com/: DNS lookup failed"
        );
    }

    #[test]
    fn test_network_errors_compare_by_kind_and_url() {
        let a = Error::network("https://example.com", NetworkError::InternetDown);
        let b = Error::network("https://example.com", NetworkError::InternetDown);
        let c = Error::network("https://example.org", NetworkError::InternetDown);
        let d = Error::network("https://example.com", NetworkError::Dns);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_http_errors_compare_by_status() {
        assert_eq!(Error::http_status(404, ""), Error::http_status(404, ""));
        assert_ne!(Error::http_status(404, ""), Error::http_status(500, ""));
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::RateLimited {
            retry_after_seconds: 60
        }
        .is_retryable());
        assert!(Error::network("u", NetworkError::TimedOut).is_retryable());
        assert!(Error::http_status(429, "").is_retryable());
        assert!(Error::http_status(500, "").is_retryable());
        assert!(Error::http_status(503, "").is_retryable());
        assert!(Error::http_status(522, "").is_retryable());

        assert!(!Error::network("u", NetworkError::BadResponse).is_retryable());
        assert!(!Error::http_status(400, "").is_retryable());
        assert!(!Error::http_status(404, "").is_retryable());
        assert!(!Error::http_status(501, "").is_retryable());
        assert!(!Error::parse("bad body").is_retryable());
        assert!(!Error::config("test").is_retryable());
    }

    #[test]
    fn test_from_conversions() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::JsonParse { .. }));

        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}

//! Error types for the harness.
//!
//! Construction-time and bind-time failures are returned directly from
//! [`Harness::new`](crate::Harness::new) and the `start_*` entry points.
//! Everything else (failed test cases, failed relay calls) travels through
//! the error stream as one of these values.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("bad {var}: {reason}")]
    BadPort { var: &'static str, reason: String },
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to read config file '{path}': {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("internet check timed out after {0:?}")]
    InternetTimeout(Duration),
    #[error("failed to bind proxy listener on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("proxy has already been started")]
    ProxyAlreadyStarted,
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),
    #[error("failed to build request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
    #[error("failed to read body: {0}")]
    Body(#[from] hyper::Error),
    #[error("relayed body stream failed: {0}")]
    Stream(String),
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("bad status code: {0}")]
    BadStatus(u16),
    #[error("test '{test}' failed: {source}")]
    TestFailed {
        test: String,
        source: Box<HarnessError>,
    },
    #[error("TLS setup failed: {0}")]
    Tls(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Attach the name of the test case that produced this error.
    pub fn in_test(self, test: &str) -> Self {
        HarnessError::TestFailed {
            test: test.to_string(),
            source: Box::new(self),
        }
    }

    /// The offending status code, if this is (or wraps) a bad-status failure.
    pub fn bad_status(&self) -> Option<u16> {
        match self {
            HarnessError::BadStatus(status) => Some(*status),
            HarnessError::TestFailed { source, .. } => source.bad_status(),
            _ => None,
        }
    }
}

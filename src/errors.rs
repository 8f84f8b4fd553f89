//! Error types for the status page renderer

use std::fmt;

pub type Result<T> = std::result::Result<T, StatusPageError>;

#[derive(Debug)]
pub enum StatusPageError {
    /// IO operation failed
    Io(std::io::Error),

    /// HTTP request failed
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed
    Json(serde_json::Error),

    /// Configuration error
    Config(String),

    /// The status source answered, but not with a usable document
    Fetch(String),
}

impl fmt::Display for StatusPageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusPageError::Io(err) => write!(f, "IO error: {}", err),
            StatusPageError::Http(err) => write!(f, "HTTP error: {}", err),
            StatusPageError::Json(err) => write!(f, "JSON error: {}", err),
            StatusPageError::Config(msg) => write!(f, "Configuration error: {}", msg),
            StatusPageError::Fetch(msg) => write!(f, "Fetch error: {}", msg),
        }
    }
}

impl std::error::Error for StatusPageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StatusPageError::Io(err) => Some(err),
            StatusPageError::Http(err) => Some(err),
            StatusPageError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StatusPageError {
    fn from(err: std::io::Error) -> Self {
        StatusPageError::Io(err)
    }
}

impl From<reqwest::Error> for StatusPageError {
    fn from(err: reqwest::Error) -> Self {
        StatusPageError::Http(err)
    }
}

impl From<serde_json::Error> for StatusPageError {
    fn from(err: serde_json::Error) -> Self {
        StatusPageError::Json(err)
    }
}

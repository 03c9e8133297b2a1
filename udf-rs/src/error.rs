//! Error types
//!
//! `UdfError` is what query callers see; its `Display` strings are the exact
//! messages sent on the wire. The other errors belong to the infrastructure
//! seams (store, feed, transformation) and are logged rather than surfaced.

use thiserror::Error;

/// Broad classification used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unavailable,
    Upstream,
}

/// Errors returned by the query engine
#[derive(Debug, Error)]
pub enum UdfError {
    #[error("Symbol Not Found")]
    SymbolNotFound,

    #[error("Invalid Resolution")]
    InvalidResolution,

    #[error("Symbol catalog is not loaded yet")]
    CatalogUnavailable,

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl UdfError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UdfError::SymbolNotFound | UdfError::InvalidResolution => ErrorKind::NotFound,
            UdfError::CatalogUnavailable => ErrorKind::Unavailable,
            UdfError::Upstream(_) => ErrorKind::Upstream,
        }
    }
}

/// Key-value store and (de)serialization failures
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Store(err.to_string())
    }
}

/// Kline window → OHLC series conversion failures
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("invalid {field} value {value:?} in window {window}")]
    InvalidNumber {
        window: i64,
        field: &'static str,
        value: String,
    },
}

/// Exchange connectivity failures
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("decode error: {0}")]
    Decode(String),
}

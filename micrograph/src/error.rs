use std::sync::Arc;
use thiserror::Error;

/// The message used when no stable key can be built for a query.
pub const QUERY_KEY_ERROR: &str = "error creating a unique key for the query";

/// A value couldn't be turned into a stable key.
///
/// This is not retryable: the same input will always fail.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct KeyError {
    message: String
}

impl KeyError {
    pub fn new<M: Into<String>>(message: M) -> Self {
        KeyError {
            message: message.into()
        }
    }
}

impl From<serde_json::Error> for KeyError {
    fn from(e: serde_json::Error) -> Self {
        KeyError::new(e.to_string())
    }
}

/// Errors raised by a [`Cache`](trait.Cache.html) implementation.
/// Cache misses are not errors.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("error creating a unique key for the query: {0}")]
    Key(#[from] KeyError),
    #[error("failed to serialize cache contents: {0}")]
    Serialize(Arc<serde_json::Error>),
    #[error("cached data doesn't match the requested type: {0}")]
    Deserialize(Arc<serde_json::Error>)
}

/// The errors a request can fail with.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("error creating a unique key for the query")]
    Key(#[from] KeyError),
    #[error("failed to parse query: {0}")]
    Parse(String),
    #[error("the document doesn't contain an operation")]
    UnsupportedDocument,
    #[error("no name found for the provided fragment")]
    NoFragmentName,
    #[error("fragment {0} spreads itself")]
    FragmentCycle(String),
    #[error("variables must serialize to a JSON object: {0}")]
    Variables(String),
    #[error("fetch error: {0}")]
    Fetch(Arc<dyn std::error::Error + Send + Sync>),
    #[error("decoding error: {0}")]
    Decode(Arc<serde_json::Error>),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError)
}

impl QueryError {
    /// Whether this is the distinguished key error.
    pub fn is_key_error(&self) -> bool {
        matches!(self, QueryError::Key(_) | QueryError::Cache(CacheError::Key(_)))
    }
}

use crate::{Error, QueryError};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Variables passed along with a query execution.
pub type Variables = serde_json::Map<String, Value>;

/// An extra header to send with each request.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderPair(pub String, pub String);

pub type HeaderFn = Arc<dyn Fn() -> Vec<HeaderPair> + Send + Sync>;

/// Convert any serializable variables into the untyped map used by the caches.
/// `None`-like values (`()`, `null`) become an empty map.
pub fn to_variables<V: Serialize + ?Sized>(variables: &V) -> Result<Variables, QueryError> {
    match serde_json::to_value(variables) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Variables::new()),
        Ok(other) => Err(QueryError::Variables(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(QueryError::Variables(e.to_string()))
    }
}

/// Options for [`Client::query`](../client/struct.Client.html#method.query).
#[derive(Debug, Clone)]
pub struct QueryOptions<V: Serialize = Variables> {
    /// Bypass the cache entirely: don't prepare the query, don't read from the cache.
    /// The result is still written to the cache.
    pub skip_cache: bool,
    pub variables: Option<V>
}

impl<V: Serialize> Default for QueryOptions<V> {
    fn default() -> Self {
        QueryOptions {
            skip_cache: false,
            variables: None
        }
    }
}

impl<V: Serialize> QueryOptions<V> {
    pub fn with_variables(variables: V) -> Self {
        QueryOptions {
            skip_cache: false,
            variables: Some(variables)
        }
    }

    pub fn skip_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }
}

/// The result delivered to callers and subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    /// `true` while a request for this query is in flight.
    pub loading: bool,
    pub data: Option<T>,
    pub errors: Option<Vec<Error>>
}

impl<T> QueryResult<T> {
    pub fn loading() -> Self {
        QueryResult {
            loading: true,
            data: None,
            errors: None
        }
    }

    pub fn from_data(data: T) -> Self {
        QueryResult {
            loading: false,
            data: Some(data),
            errors: None
        }
    }
}

use crate::{KeyError, Query, Variables};
use serde::Serialize;
use serde_json::{Map, Value};
use std::panic::{self, AssertUnwindSafe};

/// Recursively sort the keys of every object in `value` in ascending order.
/// Arrays keep their order.
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other
    }
}

/// Produce a string identity for `value` that's the same for any two values that are equal
/// up to the order of object keys. The encoding is compact JSON.
///
/// Fails with a [`KeyError`](struct.KeyError.html) if the value can't be represented as JSON,
/// for example a map with non-string keys or a `Serialize` impl that errors.
///
/// ```
/// # use micrograph::utils::stable_key;
/// # use serde_json::json;
/// let a = stable_key(&json!({ "b": 1, "a": { "y": [2, 1], "x": null } })).unwrap();
/// let b = stable_key(&json!({ "a": { "x": null, "y": [2, 1] }, "b": 1 })).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a, r#"{"a":{"x":null,"y":[2,1]},"b":1}"#);
/// ```
pub fn stable_key<T: Serialize + ?Sized>(value: &T) -> Result<String, KeyError> {
    let value = serde_json::to_value(value).map_err(KeyError::from)?;
    serde_json::to_string(&sort_keys(value)).map_err(KeyError::from)
}

/// The hashing function used to identify `{ query, variables }` pairs.
/// Swap it out with [`ClientBuilder::with_hasher`](../client/struct.ClientBuilder.html#method.with_hasher).
pub trait KeyHasher: Send + Sync + 'static {
    fn hash(&self, value: &Value) -> Result<String, KeyError>;
}

/// The default hasher, backed by [`stable_key`](fn.stable_key.html).
#[derive(Default, Clone, Copy, Debug)]
pub struct StableKeyHasher;

impl KeyHasher for StableKeyHasher {
    fn hash(&self, value: &Value) -> Result<String, KeyError> {
        stable_key(value)
    }
}

impl<F> KeyHasher for F
where
    F: Fn(&Value) -> Result<String, KeyError> + Send + Sync + 'static
{
    fn hash(&self, value: &Value) -> Result<String, KeyError> {
        self(value)
    }
}

/// Run a subscriber callback, logging instead of propagating a panic so the remaining
/// subscribers still get notified.
pub fn notify_isolated<F: FnOnce()>(callback: F) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(callback)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!("subscriber callback panicked: {}", message);
    }
}

#[derive(Serialize)]
struct QueryKeyInput<'a> {
    query: String,
    variables: &'a Variables
}

/// Compute the identity of a query execution.
pub fn query_key<H: KeyHasher + ?Sized>(
    hasher: &H,
    query: &Query,
    variables: &Variables
) -> Result<String, KeyError> {
    let input = QueryKeyInput {
        query: query.to_string(),
        variables
    };
    let value = serde_json::to_value(&input).map_err(KeyError::from)?;
    hasher.hash(&value)
}

use crate::{
    utils::{query_key, StableKeyHasher},
    CacheError, Query, Variables
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// A cache the [`Client`](client/struct.Client.html) reads from before going to the network
/// and writes results into afterwards.
pub trait Cache: Send + Sync + 'static {
    /// Rewrite the query before it's used as a cache key or sent over the network.
    fn prepare_query(&self, query: &Query) -> Query {
        query.clone()
    }

    /// Look up the data for a query. `Ok(None)` is a cache miss.
    fn try_get(&self, query: &Query, variables: &Variables) -> Result<Option<Value>, CacheError>;

    /// Store the data returned for a query.
    fn try_set(&self, query: &Query, variables: &Variables, data: &Value)
        -> Result<(), CacheError>;

    /// Serialize the entire cache, for example to embed it in server-rendered HTML.
    fn stringify(&self) -> Result<String, CacheError>;

    /// Replace the cache contents with a previously stringified state.
    fn restore(&self, serialized: &str);
}

/// A very basic cache storing whole responses under the stable key of `{ query, variables }`.
///
/// It never invalidates anything. For a cache that shares entities between queries,
/// see the `micrograph-normalized-cache` crate.
#[derive(Default)]
pub struct MemoryCache {
    results: Mutex<HashMap<String, Value>>
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn try_get(&self, query: &Query, variables: &Variables) -> Result<Option<Value>, CacheError> {
        let key = query_key(&StableKeyHasher, query, variables)?;
        Ok(self.results.lock().get(&key).cloned())
    }

    fn try_set(
        &self,
        query: &Query,
        variables: &Variables,
        data: &Value
    ) -> Result<(), CacheError> {
        let key = query_key(&StableKeyHasher, query, variables)?;
        tracing::trace!(%key, "writing result to memory cache");
        self.results.lock().insert(key, data.clone());
        Ok(())
    }

    fn stringify(&self) -> Result<String, CacheError> {
        let results = self.results.lock();
        serde_json::to_string(&*results).map_err(|e| CacheError::Serialize(e.into()))
    }

    fn restore(&self, serialized: &str) {
        let restored = match serde_json::from_str(serialized) {
            Ok(restored) => restored,
            Err(e) => {
                tracing::warn!("failed to restore memory cache, starting empty: {}", e);
                HashMap::new()
            }
        };
        *self.results.lock() = restored;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const QUERY: &str = r#"
        query TestQuery($id: ID) {
            film(filmID: $id) {
                id
                title
            }
        }
    "#;

    fn variables() -> Variables {
        let mut variables = Variables::new();
        variables.insert("id".to_string(), json!("abc"));
        variables
    }

    #[test]
    fn misses_for_unset_key() {
        let cache = MemoryCache::new();
        let query = Query::parse(QUERY).unwrap();
        assert_eq!(cache.try_get(&query, &variables()).unwrap(), None);
    }

    #[test]
    fn can_set_key_and_retrieve_value() {
        let cache = MemoryCache::new();
        let query = Query::parse(QUERY).unwrap();
        let data = json!({ "v": 10 });

        cache.try_set(&query, &variables(), &data).unwrap();
        assert_eq!(cache.try_get(&query, &variables()).unwrap(), Some(data));
    }

    #[test]
    fn can_stringify_and_restore() {
        let cache = MemoryCache::new();
        let query = Query::parse(QUERY).unwrap();
        let data = json!({ "v": 10 });
        cache.try_set(&query, &variables(), &data).unwrap();

        let restored = MemoryCache::new();
        restored.restore(&cache.stringify().unwrap());
        assert_eq!(restored.try_get(&query, &variables()).unwrap(), Some(data));
    }

    #[test]
    fn malformed_restore_leaves_an_empty_cache() {
        let cache = MemoryCache::new();
        let query = Query::parse(QUERY).unwrap();
        cache.try_set(&query, &variables(), &json!({ "v": 1 })).unwrap();

        cache.restore("{ not json");
        assert_eq!(cache.try_get(&query, &variables()).unwrap(), None);
    }
}

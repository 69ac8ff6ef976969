use crate::{
    prepare_query,
    store::{denormalize, normalize, Store},
    subscriptions::{deliver, CacheState, Callback, Subscription, Unsubscribe},
    KeyOptions, NormalizedCacheOptions
};
use micrograph::{utils::notify_isolated, Cache, CacheError, Query, Variables};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::{atomic::AtomicBool, Arc};


/// A normalized cache. Results are split into entity records, so different queries asking for
/// the same entity share its data, and subscribers are told when the data they read changes.
///
/// Cloning the cache gives another handle to the same data, which makes it possible to hand one
/// to a [`Client`](../micrograph/client/struct.Client.html) and subscribe with the other.
///
/// Every query passed in is run through [`prepare_query`](fn.prepare_query.html) first.
///
/// # Example
///
/// ```
/// # use micrograph::{Query, Variables};
/// # use micrograph_normalized_cache::NormalizedCache;
/// # use serde_json::json;
/// let cache = NormalizedCache::new();
/// let query = Query::parse("{ film { id title } }").unwrap();
///
/// cache.write_query(
///     &query,
///     &Variables::new(),
///     &json!({ "film": { "__typename": "Film", "id": "1", "title": "A New Hope" } })
/// );
///
/// let film_title = Query::parse("{ film { title } }").unwrap();
/// assert!(cache.read_query(&film_title, &Variables::new()).is_some());
/// ```
#[derive(Clone)]
pub struct NormalizedCache {
    state: Arc<Mutex<CacheState>>,
    keys: Arc<KeyOptions>,
    eager_refresh_threshold: usize
}

impl Default for NormalizedCache {
    fn default() -> Self {
        Self::with_options(NormalizedCacheOptions::default())
    }
}

impl NormalizedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: NormalizedCacheOptions) -> Self {
        NormalizedCache {
            state: Arc::new(Mutex::new(CacheState::new())),
            keys: Arc::new(options.key_options()),
            eager_refresh_threshold: options.eager_refresh_threshold
        }
    }

    pub fn prepare_query(&self, query: &Query) -> Query {
        prepare_query(query)
    }

    /// Read the data for `query`, or `None` if any of it is missing.
    pub fn read_query(&self, query: &Query, variables: &Variables) -> Option<Value> {
        let query = prepare_query(query);
        let state = self.state.lock();
        denormalize(&query, variables, &state.store).data
    }

    /// Like [`read_query`](#method.read_query), decoding the data into `T`.
    pub fn read_query_as<T: DeserializeOwned>(
        &self,
        query: &Query,
        variables: &Variables
    ) -> Result<Option<T>, CacheError> {
        self.read_query(query, variables)
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| CacheError::Deserialize(Arc::new(e)))
    }

    /// Write the response to `query` into the cache and notify every subscriber whose data
    /// changed.
    pub fn write_query(&self, query: &Query, variables: &Variables, data: &Value) {
        let query = prepare_query(query);
        let deliveries = {
            let mut state = self.state.lock();
            let fragment = normalize(&query, variables, data, &self.keys);
            let changed = state.store.merge(fragment);
            tracing::trace!(
                operation = %query.operation,
                changed = changed.len(),
                "wrote query to normalized cache"
            );
            state.refresh(&changed, self.eager_refresh_threshold)
        };
        deliver(deliveries);
    }

    /// Like [`write_query`](#method.write_query), taking any serializable data.
    pub fn write_query_as<T: Serialize + ?Sized>(
        &self,
        query: &Query,
        variables: &Variables,
        data: &T
    ) -> Result<(), CacheError> {
        let data = serde_json::to_value(data).map_err(|e| CacheError::Serialize(Arc::new(e)))?;
        self.write_query(query, variables, &data);
        Ok(())
    }

    /// Call `callback` with the data for `query` now, if it's all there, and again after every
    /// write that changes it.
    pub fn subscribe<F>(&self, query: &Query, variables: &Variables, callback: F) -> Unsubscribe
    where
        F: Fn(&Value) + Send + Sync + 'static
    {
        let query = prepare_query(query);
        let callback: Callback = Arc::new(callback);
        let active = Arc::new(AtomicBool::new(true));

        let (index, initial) = {
            let mut state = self.state.lock();
            let result = denormalize(&query, variables, &state.store);
            let index = state.subscriptions.push(Subscription {
                query,
                variables: variables.clone(),
                callback: callback.clone(),
                footprint: result.footprint,
                active: active.clone()
            });
            (index, result.data)
        };

        if let Some(data) = initial {
            notify_isolated(|| callback(&data));
        }

        Unsubscribe::new(Arc::downgrade(&self.state), index, active)
    }

    /// Like [`subscribe`](#method.subscribe), decoding the data into `T` first. Data that
    /// doesn't decode is logged and skipped.
    pub fn subscribe_as<T, F>(
        &self,
        query: &Query,
        variables: &Variables,
        callback: F
    ) -> Unsubscribe
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static
    {
        self.subscribe(query, variables, move |data| {
            match serde_json::from_value(data.clone()) {
                Ok(data) => callback(data),
                Err(e) => tracing::error!("cached data didn't match the subscribed type: {}", e)
            }
        })
    }

    /// Serialize the whole store as `{ entityKey: { fieldKey: value } }`.
    pub fn stringify(&self) -> Result<String, CacheError> {
        let state = self.state.lock();
        serde_json::to_string(&state.store).map_err(|e| CacheError::Serialize(Arc::new(e)))
    }

    /// Replace the store with a stringified one. Subscribers are not notified. Input that
    /// can't be parsed leaves an empty store.
    pub fn restore(&self, serialized: &str) {
        let store = match serde_json::from_str::<Store>(serialized) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("failed to restore normalized cache, starting empty: {}", e);
                Store::new()
            }
        };
        self.state.lock().store = store;
    }

    /// A copy of the current store.
    pub fn snapshot(&self) -> Store {
        self.state.lock().store.clone()
    }

    /// The number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.num_elements()
    }
}

impl Cache for NormalizedCache {
    fn prepare_query(&self, query: &Query) -> Query {
        prepare_query(query)
    }

    fn try_get(&self, query: &Query, variables: &Variables) -> Result<Option<Value>, CacheError> {
        Ok(self.read_query(query, variables))
    }

    fn try_set(
        &self,
        query: &Query,
        variables: &Variables,
        data: &Value
    ) -> Result<(), CacheError> {
        self.write_query(query, variables, data);
        Ok(())
    }

    fn stringify(&self) -> Result<String, CacheError> {
        NormalizedCache::stringify(self)
    }

    fn restore(&self, serialized: &str) {
        NormalizedCache::restore(self, serialized)
    }
}

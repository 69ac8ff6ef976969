use crate::{
    cache::Cache,
    client::ClientSubscription,
    types::to_variables,
    utils::{notify_isolated, query_key, KeyHasher},
    HeaderFn, Query, QueryBody, QueryError, QueryOptions, QueryResult, Response, Transport,
    Variables
};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use stable_vec::StableVec;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc
    }
};

type FetchResult = Result<Response<Value>, QueryError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;
type Listener = Arc<dyn Fn(&QueryResult<Value>) + Send + Sync>;

pub(crate) struct InFlight {
    id: u64,
    fetch: SharedFetch
}

pub struct ClientImpl {
    pub(crate) url: String,
    pub(crate) cache: Arc<dyn Cache>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) hasher: Arc<dyn KeyHasher>,
    pub(crate) extra_headers: Option<HeaderFn>,
    pub(crate) ssr: bool,
    pub(crate) subscriptions: Mutex<HashMap<String, StableVec<Listener>>>,
    pub(crate) in_flight: Mutex<HashMap<String, InFlight>>,
    pub(crate) ssr_queries: Mutex<Vec<SharedFetch>>,
    pub(crate) request_counter: AtomicU64
}

fn decode<T: DeserializeOwned>(result: QueryResult<Value>) -> Result<QueryResult<T>, QueryError> {
    let data = match result.data {
        Some(data) => {
            Some(serde_json::from_value(data).map_err(|e| QueryError::Decode(Arc::new(e)))?)
        }
        None => None
    };
    Ok(QueryResult {
        loading: result.loading,
        data,
        errors: result.errors
    })
}

fn make_listener<T, F>(active: Arc<AtomicBool>, callback: F) -> Listener
where
    T: DeserializeOwned + 'static,
    F: Fn(QueryResult<T>) + Send + Sync + 'static
{
    Arc::new(move |result: &QueryResult<Value>| {
        if !active.load(Ordering::SeqCst) {
            return;
        }
        match decode(result.clone()) {
            Ok(result) => callback(result),
            Err(e) => tracing::error!("subscription result didn't match its type: {}", e)
        }
    })
}

impl ClientImpl {
    pub(crate) fn clear_listener(&self, key: &str, index: usize) {
        let mut subscriptions = self.subscriptions.lock();
        if let Some(listeners) = subscriptions.get_mut(key) {
            listeners.remove(index);
            if listeners.is_empty() {
                subscriptions.remove(key);
            }
        }
    }

    fn notify(&self, key: &str, result: &QueryResult<Value>) {
        let listeners: Vec<Listener> = {
            let subscriptions = self.subscriptions.lock();
            match subscriptions.get(key) {
                Some(listeners) => listeners.values().cloned().collect(),
                None => return
            }
        };
        tracing::trace!(%key, count = listeners.len(), "notifying query subscribers");
        for listener in listeners {
            notify_isolated(|| listener(result));
        }
    }

    fn prepare(&self, query: Query, skip_cache: bool) -> Query {
        if skip_cache {
            query
        } else {
            self.cache.prepare_query(&query)
        }
    }

    fn read_cache(&self, query: &Query, variables: &Variables) -> Option<Value> {
        match self.cache.try_get(query, variables) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("failed to read from cache: {}", e);
                None
            }
        }
    }

    pub async fn query<T: DeserializeOwned, V: Serialize>(
        &self,
        query: Query,
        options: QueryOptions<V>
    ) -> Result<QueryResult<T>, QueryError> {
        let variables = match options.variables {
            Some(ref variables) => to_variables(variables)?,
            None => Variables::new()
        };
        let query = self.prepare(query, options.skip_cache);

        if !options.skip_cache {
            if let Some(data) = self.read_cache(&query, &variables) {
                return decode(QueryResult::from_data(data));
            }
        }

        let key = query_key(&*self.hasher, &query, &variables)?;
        self.notify(&key, &QueryResult::loading());

        let response = self.fetch(&key, &query, &variables).await?;
        if let Some(ref data) = response.data {
            if let Err(e) = self.cache.try_set(&query, &variables, data) {
                tracing::warn!("failed to write result to cache: {}", e);
            }
        }

        let result = QueryResult {
            loading: false,
            data: response.data,
            errors: response.errors
        };
        self.notify(&key, &result);
        decode(result)
    }

    /// Run the request, sharing it with any identical request that's already in flight.
    async fn fetch(&self, key: &str, query: &Query, variables: &Variables) -> FetchResult {
        let (id, fetch) = {
            let mut in_flight = self.in_flight.lock();
            if let Some(existing) = in_flight.get(key) {
                tracing::debug!(%key, "deduplicating in-flight query");
                (None, existing.fetch.clone())
            } else {
                let id = self.request_counter.fetch_add(1, Ordering::Relaxed);
                let fetch = self.start_fetch(query, variables);
                in_flight.insert(
                    key.to_string(),
                    InFlight {
                        id,
                        fetch: fetch.clone()
                    }
                );
                if self.ssr {
                    self.ssr_queries.lock().push(fetch.clone());
                }
                (Some(id), fetch)
            }
        };

        let result = fetch.await;

        if let Some(id) = id {
            let mut in_flight = self.in_flight.lock();
            if in_flight.get(key).map(|it| it.id) == Some(id) {
                in_flight.remove(key);
            }
        }
        result
    }

    fn start_fetch(&self, query: &Query, variables: &Variables) -> SharedFetch {
        let transport = self.transport.clone();
        let url = self.url.clone();
        let extra_headers = self
            .extra_headers
            .as_ref()
            .map(|header_fn| header_fn())
            .unwrap_or_default();
        let body = QueryBody {
            query: query.to_string(),
            variables: variables.clone(),
            operation_name: query.name.clone()
        };

        async move { transport.fetch(&url, &body, extra_headers).await }
            .boxed()
            .shared()
    }

    pub fn subscribe<T, V, F>(
        self: &Arc<Self>,
        query: Query,
        options: QueryOptions<V>,
        callback: F
    ) -> Result<ClientSubscription, QueryError>
    where
        T: DeserializeOwned + 'static,
        V: Serialize,
        F: Fn(QueryResult<T>) + Send + Sync + 'static
    {
        let variables = match options.variables {
            Some(ref variables) => to_variables(variables)?,
            None => Variables::new()
        };
        let query = self.prepare(query, options.skip_cache);
        let key = query_key(&*self.hasher, &query, &variables)?;

        let active = Arc::new(AtomicBool::new(true));
        let listener = make_listener(active.clone(), callback);

        if let Some(data) = self.read_cache(&query, &variables) {
            let initial = QueryResult::from_data(data);
            notify_isolated(|| listener(&initial));
        }

        let index = {
            let mut subscriptions = self.subscriptions.lock();
            subscriptions
                .entry(key.clone())
                .or_insert_with(StableVec::new)
                .push(listener)
        };

        Ok(ClientSubscription {
            client: Arc::downgrade(self),
            key,
            index,
            active
        })
    }

    pub async fn resolve_queries(&self) {
        let queries: Vec<SharedFetch> = self.ssr_queries.lock().clone();
        join_all(queries).await;
    }
}

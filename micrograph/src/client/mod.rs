use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak
};

mod builder;
mod r#impl;

use crate::{
    cache::Cache, HeaderPair, Query, QueryBody, QueryError, QueryOptions, QueryResult, Response,
    Transport
};
pub use builder::ClientBuilder;
pub use r#impl::ClientImpl;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Anything that can be turned into a parsed [`Query`](../query/struct.Query.html).
pub trait ToQuery {
    fn to_query(self) -> Result<Query, QueryError>;
}

impl ToQuery for &str {
    fn to_query(self) -> Result<Query, QueryError> {
        Query::parse(self)
    }
}

impl ToQuery for &String {
    fn to_query(self) -> Result<Query, QueryError> {
        Query::parse(self)
    }
}

impl ToQuery for Query {
    fn to_query(self) -> Result<Query, QueryError> {
        Ok(self)
    }
}

impl ToQuery for &Query {
    fn to_query(self) -> Result<Query, QueryError> {
        Ok(self.clone())
    }
}

#[derive(Clone)]
#[repr(transparent)]
pub struct Client(pub Arc<ClientImpl>);

impl Client {
    pub fn builder<U: Into<String>>(url: U) -> ClientBuilder {
        ClientBuilder::new(url)
    }

    /// Run a query, answering it from the cache if possible.
    pub async fn query<T, V, Q>(
        &self,
        query: Q,
        options: QueryOptions<V>
    ) -> Result<QueryResult<T>, QueryError>
    where
        T: DeserializeOwned,
        V: Serialize,
        Q: ToQuery
    {
        self.0.query(query.to_query()?, options).await
    }

    /// Listen to results for a query. If the cache already holds data for it, `callback` is
    /// called with that data before this returns. Afterwards it's called whenever the query
    /// is run through this client: once with `loading: true` and once with the result.
    pub fn subscribe<T, V, Q, F>(
        &self,
        query: Q,
        options: QueryOptions<V>,
        callback: F
    ) -> Result<ClientSubscription, QueryError>
    where
        T: DeserializeOwned + 'static,
        V: Serialize,
        Q: ToQuery,
        F: Fn(QueryResult<T>) + Send + Sync + 'static
    {
        self.0.subscribe(query.to_query()?, options, callback)
    }

    /// Wait for every query issued so far. Only tracks queries when built with `with_ssr(true)`.
    pub async fn resolve_queries(&self) {
        self.0.resolve_queries().await
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.0.cache
    }

    pub fn is_ssr(&self) -> bool {
        self.0.ssr
    }
}

/// A handle to a listener registered with [`Client::subscribe`](struct.Client.html#method.subscribe).
/// Dropping it does not unsubscribe.
pub struct ClientSubscription {
    client: Weak<ClientImpl>,
    key: String,
    index: usize,
    active: Arc<AtomicBool>
}

impl ClientSubscription {
    /// Stop delivering results to this listener. Calling it more than once does nothing.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(client) = self.client.upgrade() {
            client.clear_listener(&self.key, self.index);
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, thiserror::Error)]
#[error("no transport configured for this client")]
pub struct MissingTransportError;

/// The transport used when none is configured and the `default-transport` feature is off.
pub struct MissingTransport;

#[async_trait]
impl Transport for MissingTransport {
    async fn fetch(
        &self,
        _url: &str,
        _body: &QueryBody,
        _extra_headers: Vec<HeaderPair>
    ) -> Result<Response<Value>, QueryError> {
        Err(QueryError::Fetch(Arc::new(MissingTransportError)))
    }
}

use crate::{
    cache::{Cache, MemoryCache},
    client::ClientImpl,
    utils::{KeyHasher, StableKeyHasher},
    Client, HeaderFn, HeaderPair, Transport
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{atomic::AtomicU64, Arc}
};

pub struct ClientBuilder {
    url: String,
    cache: Arc<dyn Cache>,
    transport: Arc<dyn Transport>,
    hasher: Arc<dyn KeyHasher>,
    extra_headers: Option<HeaderFn>,
    ssr: bool
}

impl ClientBuilder {
    pub fn new<U: Into<String>>(url: U) -> Self {
        ClientBuilder {
            url: url.into(),
            cache: Arc::new(MemoryCache::new()),
            transport: default_transport(),
            hasher: Arc::new(StableKeyHasher),
            extra_headers: None,
            ssr: false
        }
    }

    /// Use a different cache. Defaults to a [`MemoryCache`](../cache/struct.MemoryCache.html).
    pub fn with_cache<C: Cache>(self, cache: C) -> Self {
        self.with_shared_cache(Arc::new(cache))
    }

    /// Use a cache that's also held elsewhere, for example to subscribe to it directly.
    pub fn with_shared_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    /// Use a different transport. Defaults to `FetchTransport` with the `default-transport`
    /// feature.
    pub fn with_transport<T: Transport>(mut self, transport: T) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Use a different function to build the `{ query, variables }` keys used for
    /// deduplication and subscriptions.
    pub fn with_hasher<H: KeyHasher>(mut self, hasher: H) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    pub fn with_extra_headers<F: Fn() -> Vec<HeaderPair> + Send + Sync + 'static>(
        mut self,
        header_fn: F
    ) -> Self {
        self.extra_headers = Some(Arc::new(header_fn));
        self
    }

    /// Keep track of every request so [`Client::resolve_queries`](struct.Client.html#method.resolve_queries)
    /// can wait for all of them when rendering on the server.
    pub fn with_ssr(mut self, ssr: bool) -> Self {
        self.ssr = ssr;
        self
    }

    pub fn build(self) -> Client {
        let client = ClientImpl {
            url: self.url,
            cache: self.cache,
            transport: self.transport,
            hasher: self.hasher,
            extra_headers: self.extra_headers,
            ssr: self.ssr,
            subscriptions: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            ssr_queries: Mutex::new(Vec::new()),
            request_counter: AtomicU64::new(0)
        };

        Client(Arc::new(client))
    }
}

#[cfg(feature = "default-transport")]
fn default_transport() -> Arc<dyn Transport> {
    Arc::new(crate::transport::FetchTransport::new())
}

#[cfg(not(feature = "default-transport"))]
fn default_transport() -> Arc<dyn Transport> {
    Arc::new(crate::client::MissingTransport)
}

use micrograph::{HeaderPair, QueryBody, QueryError, Response, Transport};
use parking_lot::Mutex;
use serde_json::Value;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc
    },
    time::Duration
};

/// A transport that answers every request with the same body after an optional delay,
/// and remembers what it was sent.
#[derive(Clone)]
pub struct MockTransport {
    response: Value,
    delay: Duration,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(QueryBody, Vec<HeaderPair>)>>>
}

impl MockTransport {
    pub fn new(response: Value) -> Self {
        MockTransport {
            response,
            delay: Duration::from_millis(0),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new()))
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(QueryBody, Vec<HeaderPair>)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(
        &self,
        _url: &str,
        body: &QueryBody,
        extra_headers: Vec<HeaderPair>
    ) -> Result<Response<Value>, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((body.clone(), extra_headers));
        if self.delay > Duration::from_millis(0) {
            tokio::time::sleep(self.delay).await;
        }
        serde_json::from_value(self.response.clone()).map_err(|e| QueryError::Decode(Arc::new(e)))
    }
}

use micrograph::{
    Cache, CacheError, Client, HeaderPair, KeyError, MemoryCache, Query, QueryError, QueryOptions,
    QueryResult, Variables
};
use micrograph_test::{
    assert_title, Counter, MockTransport, TitleData, TitleVariables, FILM_URL, TITLE_QUERY,
    TITLE_RESPONSE
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};

/// A cache that answers every lookup with the same value and ignores writes.
struct FixedCache(Value);

impl Cache for FixedCache {
    fn try_get(&self, _: &Query, _: &Variables) -> Result<Option<Value>, CacheError> {
        Ok(Some(self.0.clone()))
    }

    fn try_set(&self, _: &Query, _: &Variables, _: &Value) -> Result<(), CacheError> {
        Ok(())
    }

    fn stringify(&self) -> Result<String, CacheError> {
        Ok(String::new())
    }

    fn restore(&self, _: &str) {}
}

fn variables() -> QueryOptions<TitleVariables> {
    QueryOptions::with_variables(TitleVariables { id: 1 })
}

fn client(transport: &MockTransport) -> Client {
    Client::builder(FILM_URL)
        .with_transport(transport.clone())
        .build()
}

fn failing_hasher(_: &Value) -> Result<String, KeyError> {
    Err(KeyError::new("unhashable"))
}

#[tokio::test]
async fn fails_if_query_cannot_be_hashed() {
    let transport = MockTransport::new(TITLE_RESPONSE.clone());
    let client = Client::builder(FILM_URL)
        .with_transport(transport.clone())
        .with_hasher(failing_hasher)
        .build();

    let result = client
        .query::<TitleData, _, _>(TITLE_QUERY, variables())
        .await;

    let err = result.expect_err("query should fail");
    assert!(err.is_key_error());
    assert_eq!(err.to_string(), micrograph::QUERY_KEY_ERROR);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn can_return_cached_result() {
    let cached = json!({ "cached": true });
    let transport = MockTransport::new(TITLE_RESPONSE.clone());
    let client = Client::builder(FILM_URL)
        .with_transport(transport.clone())
        .with_cache(FixedCache(cached.clone()))
        .build();

    let result = client
        .query::<Value, _, _>(TITLE_QUERY, variables())
        .await
        .unwrap();

    assert!(!result.loading);
    assert_eq!(result.data, Some(cached));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn can_get_cached_result_when_subscribing() {
    let cached = json!({ "cached": true });
    let transport = MockTransport::new(TITLE_RESPONSE.clone());
    let client = Client::builder(FILM_URL)
        .with_transport(transport)
        .with_cache(FixedCache(cached.clone()))
        .build();

    let received: Arc<Mutex<Option<QueryResult<Value>>>> = Arc::new(Mutex::new(None));
    let sink = received.clone();
    client
        .subscribe(TITLE_QUERY, variables(), move |result: QueryResult<Value>| {
            *sink.lock() = Some(result);
        })
        .unwrap();

    let received = received.lock().clone().expect("no initial value delivered");
    assert_eq!(received.data, Some(cached));
}

#[tokio::test]
async fn can_make_query() {
    let transport = MockTransport::new(TITLE_RESPONSE.clone());
    let client = client(&transport);

    let result = client
        .query::<TitleData, _, _>(TITLE_QUERY, variables())
        .await
        .unwrap();

    assert!(!result.loading);
    assert_title(result.data.as_ref());

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let (body, _) = &requests[0];
    assert_eq!(body.operation_name.as_deref(), Some("TestQuery"));
    assert_eq!(body.variables.get("id"), Some(&json!(1)));
}

#[tokio::test]
async fn can_make_ssr_query() {
    let transport = MockTransport::new(TITLE_RESPONSE.clone()).with_delay(Duration::from_millis(20));
    let client = Client::builder(FILM_URL)
        .with_transport(transport.clone())
        .with_ssr(true)
        .build();
    assert!(client.is_ssr());

    let mut result = Box::pin(client.query::<TitleData, _, _>(TITLE_QUERY, variables()));
    assert!(futures::poll!(&mut result).is_pending());

    client.resolve_queries().await;

    let result = result.await.unwrap();
    assert_title(result.data.as_ref());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn answers_second_query_from_cache() {
    let transport = MockTransport::new(TITLE_RESPONSE.clone());
    let client = Client::builder(FILM_URL)
        .with_transport(transport.clone())
        .with_cache(MemoryCache::new())
        .build();

    let first = client
        .query::<TitleData, _, _>(TITLE_QUERY, variables())
        .await
        .unwrap();
    let second = client
        .query::<TitleData, _, _>(TITLE_QUERY, variables())
        .await
        .unwrap();

    assert_title(first.data.as_ref());
    assert_eq!(first.data, second.data);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn can_skip_cache() {
    let transport = MockTransport::new(TITLE_RESPONSE.clone());
    let client = client(&transport);

    let first = client
        .query::<TitleData, _, _>(TITLE_QUERY, variables())
        .await
        .unwrap();
    let second = client
        .query::<TitleData, _, _>(TITLE_QUERY, variables().skip_cache())
        .await
        .unwrap();

    assert_eq!(first.data, second.data);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn deduplicates_identical_in_flight_queries() {
    let transport = MockTransport::new(TITLE_RESPONSE.clone()).with_delay(Duration::from_millis(20));
    let client = client(&transport);

    let (first, second) = futures::join!(
        client.query::<TitleData, _, _>(TITLE_QUERY, variables()),
        client.query::<TitleData, _, _>(TITLE_QUERY, variables())
    );

    assert_title(first.unwrap().data.as_ref());
    assert_title(second.unwrap().data.as_ref());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn sends_extra_headers() {
    let transport = MockTransport::new(TITLE_RESPONSE.clone());
    let client = Client::builder(FILM_URL)
        .with_transport(transport.clone())
        .with_extra_headers(|| vec![HeaderPair("x-test".to_string(), "yes".to_string())])
        .build();

    client
        .query::<TitleData, _, _>(TITLE_QUERY, variables())
        .await
        .unwrap();

    let (_, headers) = &transport.requests()[0];
    assert_eq!(
        headers,
        &vec![HeaderPair("x-test".to_string(), "yes".to_string())]
    );
}

#[tokio::test]
async fn fails_if_subscription_cannot_be_hashed() {
    let transport = MockTransport::new(TITLE_RESPONSE.clone());
    let client = Client::builder(FILM_URL)
        .with_transport(transport)
        .with_hasher(failing_hasher)
        .build();

    let counter = Counter::sync();
    let callback_counter = counter.clone();
    let result = client.subscribe(TITLE_QUERY, variables(), move |_: QueryResult<Value>| {
        Counter::inc_sync(&callback_counter)
    });

    match result {
        Err(QueryError::Key(_)) => {}
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("subscribe should fail")
    }
    assert_eq!(Counter::get_sync(&counter), 0);
}

#[tokio::test]
async fn can_receive_subscription_value() {
    let transport = MockTransport::new(TITLE_RESPONSE.clone());
    let client = Client::builder(FILM_URL)
        .with_transport(transport.clone())
        .with_cache(MemoryCache::new())
        .build();

    let counter = Counter::sync();
    let last: Arc<Mutex<Option<QueryResult<TitleData>>>> = Arc::new(Mutex::new(None));
    let subscription = {
        let counter = counter.clone();
        let last = last.clone();
        client
            .subscribe(TITLE_QUERY, variables(), move |result: QueryResult<TitleData>| {
                Counter::inc_sync(&counter);
                *last.lock() = Some(result);
            })
            .unwrap()
    };

    let result = client
        .query::<TitleData, _, _>(TITLE_QUERY, variables())
        .await
        .unwrap();
    assert_title(result.data.as_ref());

    let delivered = last.lock().clone().expect("subscriber was not notified");
    assert!(!delivered.loading);
    assert_title(delivered.data.as_ref());

    subscription.unsubscribe();
    subscription.unsubscribe();

    let second = client
        .query::<TitleData, _, _>(TITLE_QUERY, variables().skip_cache())
        .await
        .unwrap();
    assert_eq!(second.data, result.data);

    // one `loading` notification and one result
    assert_eq!(Counter::get_sync(&counter), 2);
}

#[tokio::test]
async fn rejects_non_object_variables() {
    let transport = MockTransport::new(TITLE_RESPONSE.clone());
    let client = client(&transport);

    let result = client
        .query::<TitleData, _, _>(TITLE_QUERY, QueryOptions::with_variables(vec![1, 2]))
        .await;

    match result {
        Err(QueryError::Variables(_)) => {}
        _ => panic!("expected a variables error")
    }
}

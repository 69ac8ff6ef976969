use micrograph::{Client, Query, QueryOptions, QueryResult, Variables};
use micrograph_normalized_cache::NormalizedCache;
use micrograph_test::{
    variables, Counter, FilmData, MockTransport, FILM_ID_QUERY, FILM_QUERY, FILM_RESPONSE, FILM_URL
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

fn client(cache: &NormalizedCache, transport: &MockTransport) -> Client {
    Client::builder(FILM_URL)
        .with_cache(cache.clone())
        .with_transport(transport.clone())
        .build()
}

fn film_options() -> QueryOptions<Value> {
    QueryOptions::with_variables(json!({ "filmID": 1 }))
}

#[tokio::test]
async fn sends_annotated_queries() {
    let cache = NormalizedCache::new();
    let transport = MockTransport::new(FILM_RESPONSE.clone());
    let client = client(&cache, &transport);

    client
        .query::<FilmData, _, _>(FILM_QUERY, film_options())
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let prepared = cache.prepare_query(&Query::parse(FILM_QUERY).unwrap());
    assert_eq!(requests[0].0.query, prepared.to_string());
    assert!(requests[0].0.query.contains("__typename"));
    assert_eq!(requests[0].0.operation_name.as_deref(), Some("MockFilmQuery"));
}

#[tokio::test]
async fn answers_narrower_query_from_normalized_data() {
    let cache = NormalizedCache::new();
    let transport = MockTransport::new(FILM_RESPONSE.clone());
    let client = client(&cache, &transport);

    let result: QueryResult<FilmData> = client.query(FILM_QUERY, film_options()).await.unwrap();
    assert_eq!(result.data.unwrap().film.title, "A New Hope");
    assert_eq!(transport.calls(), 1);

    let result: QueryResult<Value> = client.query(FILM_ID_QUERY, film_options()).await.unwrap();
    assert_eq!(
        result.data,
        Some(json!({ "film": { "__typename": "Film", "id": "ZmlsbXM6MQ==" } }))
    );
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn client_results_reach_cache_subscribers() {
    let cache = NormalizedCache::new();
    let transport = MockTransport::new(FILM_RESPONSE.clone());
    let client = client(&cache, &transport);

    let counter = Counter::sync();
    let titles = Arc::new(Mutex::new(Vec::new()));
    let id_query = Query::parse(FILM_ID_QUERY).unwrap();
    let film_variables = variables(json!({ "filmID": 1 }));
    let _unsubscribe = {
        let counter = counter.clone();
        let titles = titles.clone();
        cache.subscribe_as(&Query::parse(FILM_QUERY).unwrap(), &film_variables, {
            move |data: FilmData| {
                Counter::inc_sync(&counter);
                titles.lock().push(data.film.title);
            }
        })
    };
    assert_eq!(Counter::get_sync(&counter), 0);

    client
        .query::<FilmData, _, _>(FILM_QUERY, film_options())
        .await
        .unwrap();

    assert_eq!(Counter::get_sync(&counter), 1);
    assert_eq!(*titles.lock(), vec!["A New Hope".to_string()]);
    assert!(cache.read_query(&id_query, &film_variables).is_some());
}

#[tokio::test]
async fn restored_cache_serves_queries_without_fetching() {
    let server_cache = NormalizedCache::new();
    let transport = MockTransport::new(FILM_RESPONSE.clone());
    let server = Client::builder(FILM_URL)
        .with_cache(server_cache.clone())
        .with_transport(transport.clone())
        .with_ssr(true)
        .build();

    let pending = server.query::<FilmData, _, _>(FILM_QUERY, film_options());
    let (result, _) = futures::join!(pending, server.resolve_queries());
    assert!(result.unwrap().data.is_some());
    let serialized = server_cache.stringify().unwrap();

    let browser_cache = NormalizedCache::new();
    let browser_transport = MockTransport::new(json!({ "data": null }));
    let browser = client(&browser_cache, &browser_transport);
    browser_cache.restore(&serialized);

    let result: QueryResult<FilmData> = browser.query(FILM_QUERY, film_options()).await.unwrap();
    assert_eq!(result.data.unwrap().film.episode_id, 4);
    assert_eq!(browser_transport.calls(), 0);
}

#[tokio::test]
async fn skipping_the_cache_still_fetches() {
    let cache = NormalizedCache::new();
    let transport = MockTransport::new(FILM_RESPONSE.clone());
    let client = client(&cache, &transport);

    client
        .query::<FilmData, _, _>(FILM_QUERY, film_options())
        .await
        .unwrap();
    client
        .query::<FilmData, _, _>(FILM_QUERY, film_options().skip_cache())
        .await
        .unwrap();

    assert_eq!(transport.calls(), 2);
    assert_eq!(cache.snapshot().len(), 2);
    assert!(cache
        .read_query(&Query::parse(FILM_QUERY).unwrap(), &Variables::new())
        .is_none());
}

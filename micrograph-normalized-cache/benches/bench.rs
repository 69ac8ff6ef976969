use criterion::{
    criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, BenchmarkId, Criterion,
    Throughput
};
use micrograph::{Query, Variables};
use micrograph_normalized_cache::NormalizedCache;
use rand::Rng;
use serde_json::{json, Value};

const TODOS_QUERY: &str = r#"
    query TodosQuery {
        todos {
            id
            text
            complete
            due
        }
    }
"#;

const WRITERS_QUERY: &str = r#"
    query Writers {
        writers {
            id
            name
            amountOfBooks
            recognised
            country { id name }
        }
    }
"#;

const COUNTRIES: [&str; 4] = ["UK", "BE", "ES", "US"];

criterion_group!(benches, read, write, notify);
criterion_main!(benches);

pub fn read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");

    benchmark_reads(&mut group, 100);
    benchmark_reads(&mut group, 1000);
    benchmark_reads(&mut group, 10000);

    group.finish();
}

pub fn write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");

    benchmark_writes(&mut group, 100);
    benchmark_writes(&mut group, 1000);
    benchmark_writes(&mut group, 10000);

    benchmark_write_linked(&mut group, 100);
    benchmark_write_linked(&mut group, 1000);

    group.finish();
}

pub fn notify(c: &mut Criterion) {
    let mut group = c.benchmark_group("notify");

    benchmark_write_with_subscribers(&mut group, 10);
    benchmark_write_with_subscribers(&mut group, 100);
    benchmark_write_with_subscribers(&mut group, 1000);

    group.finish();
}

fn make_todos(n: usize) -> Value {
    let mut rand = rand::thread_rng();
    let todos: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "__typename": "Todo",
                "id": i.to_string(),
                "text": format!("Todo {}", i),
                "complete": i % 2 == 0,
                "due": rand.gen::<u32>()
            })
        })
        .collect();
    json!({ "todos": todos })
}

fn make_writers(n: usize) -> Value {
    let mut rand = rand::thread_rng();
    let writers: Vec<Value> = (0..n)
        .map(|i| {
            let country = COUNTRIES[i % COUNTRIES.len()];
            json!({
                "__typename": "Writer",
                "id": i.to_string(),
                "name": format!("writer {}", i),
                "amountOfBooks": rand.gen_range(0..100),
                "recognised": i % 2 == 0,
                "country": { "__typename": "Country", "id": country, "name": country }
            })
        })
        .collect();
    json!({ "writers": writers })
}

fn benchmark_reads(group: &mut BenchmarkGroup<WallTime>, n: usize) {
    let cache = NormalizedCache::new();
    let query = Query::parse(TODOS_QUERY).unwrap();
    let variables = Variables::new();
    cache.write_query(&query, &variables, &make_todos(n));

    group.throughput(Throughput::Elements(n as u64));
    group.sample_size(usize::max(10, 10000 / n));
    group.bench_with_input(
        BenchmarkId::new("one entity", format!("{} entries", n)),
        &query,
        |b, query| {
            b.iter(|| cache.read_query(query, &variables).unwrap());
        }
    );
}

fn benchmark_writes(group: &mut BenchmarkGroup<WallTime>, n: usize) {
    let cache = NormalizedCache::new();
    let query = Query::parse(TODOS_QUERY).unwrap();
    let variables = Variables::new();
    let data = make_todos(n);

    group.throughput(Throughput::Elements(n as u64));
    group.sample_size(usize::max(10, 10000 / n));
    group.bench_with_input(
        BenchmarkId::new("one entity", format!("{} entries", n)),
        &data,
        |b, data| {
            b.iter(|| cache.write_query(&query, &variables, data));
        }
    );
}

fn benchmark_write_linked(group: &mut BenchmarkGroup<WallTime>, n: usize) {
    let cache = NormalizedCache::new();
    let query = Query::parse(WRITERS_QUERY).unwrap();
    let variables = Variables::new();
    let data = make_writers(n);

    group.throughput(Throughput::Elements(n as u64));
    group.sample_size(usize::max(10, 10000 / n));
    group.bench_with_input(
        BenchmarkId::new("linked entities", format!("{} entries", n)),
        &data,
        |b, data| {
            b.iter(|| cache.write_query(&query, &variables, data));
        }
    );
}

/// Every write changes one todo's text, with `n` subscribers watching unrelated todo lists.
fn benchmark_write_with_subscribers(group: &mut BenchmarkGroup<WallTime>, n: usize) {
    let cache = NormalizedCache::new();
    let list = Query::parse("query List($list: ID) { list(id: $list) { id text } }").unwrap();
    let subscriptions: Vec<_> = (0..n)
        .map(|i| {
            let mut variables = Variables::new();
            variables.insert("list".to_string(), json!(i));
            cache.write_query(
                &list,
                &variables,
                &json!({ "list": { "__typename": "List", "id": i, "text": "list" } })
            );
            cache.subscribe(&list, &variables, |_| {})
        })
        .collect();

    let query = Query::parse(TODOS_QUERY).unwrap();
    let variables = Variables::new();
    let mut data = make_todos(1);

    group.throughput(Throughput::Elements(n as u64));
    group.bench_function(BenchmarkId::new("unrelated", format!("{} subscribers", n)), |b| {
        let mut i = 0usize;
        b.iter(|| {
            i += 1;
            data["todos"][0]["text"] = json!(format!("Todo {}", i));
            cache.write_query(&query, &variables, &data)
        });
    });

    for subscription in subscriptions {
        subscription.unsubscribe();
    }
}

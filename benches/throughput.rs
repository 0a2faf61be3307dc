use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use laneway::binder::Binder;
use laneway::codec::JsonCodec;
use laneway::demo::{demo_registry, demo_routes};
use laneway::dispatcher::handler_fn;
use laneway::route::{ParameterSpec, RouteDescriptor, Shape};
use laneway::router::RouteTable;
use laneway::server::RequestContext;
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

fn zoo_table() -> RouteTable {
    let patterns = [
        (Method::GET, "/"),
        (Method::GET, "/zoo/animals"),
        (Method::POST, "/zoo/animals"),
        (Method::GET, "/zoo/animals/{id}"),
        (Method::PUT, "/zoo/animals/{id}"),
        (Method::DELETE, "/zoo/animals/{id}"),
        (Method::GET, "/zoo/animals/{id}/toys/{toy_id}"),
        (Method::GET, "/zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}"),
        (Method::POST, "/inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}"),
        (Method::GET, "/complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}"),
        (Method::HEAD, "/zoo/health"),
    ];
    let table = RouteTable::new();
    for (method, pattern) in patterns {
        table
            .register(RouteDescriptor::new(method, pattern, handler_fn(|_| Ok(json!(null)))))
            .expect("valid pattern");
    }
    table
}

fn bench_route_throughput(c: &mut Criterion) {
    let table = zoo_table();
    c.bench_function("route_match", |b| {
        let test_paths = [
            (Method::GET, "/zoo/animals/123"),
            (Method::GET, "/zoo/animals/123/toys/456"),
            (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
            (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
            (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
        ];
        b.iter(|| {
            for (method, path) in test_paths.iter() {
                let res = table.lookup(method, path);
                black_box(&res);
            }
        })
    });

    c.bench_function("route_match_exact", |b| {
        b.iter(|| black_box(table.lookup(&Method::HEAD, "/zoo/health")))
    });
}

fn bench_bind(c: &mut Criterion) {
    let binder = Binder::new(Arc::new(JsonCodec));
    let specs = [
        ParameterSpec::path("id").shape(Shape::Long),
        ParameterSpec::query("limit").shape(Shape::Int).default_value("20"),
        ParameterSpec::header("agent").key("User-Agent").optional(),
        ParameterSpec::body("filter"),
    ];
    let mut ctx = RequestContext::new(Method::POST, "/zoo/animals/42?limit=5")
        .with_header("User-Agent", "bench")
        .with_body(r#"{"species":["cat","dog"],"max_age":7}"#);
    ctx.path_params.insert("id".to_string(), "42".to_string());

    c.bench_function("bind_args", |b| {
        b.iter(|| black_box(binder.bind(&specs, &ctx)))
    });
}

fn bench_demo_table_build(c: &mut Criterion) {
    let registry = demo_registry();
    c.bench_function("demo_table_build", |b| {
        b.iter(|| {
            let routes = demo_routes(&registry).expect("demo manifest resolves");
            black_box(RouteTable::from_descriptors(routes))
        })
    });
}

criterion_group!(benches, bench_route_throughput, bench_bind, bench_demo_table_build);
criterion_main!(benches);

use clam_node::chainparams::NetworkRegistry;
use clam_node::node::NodeContext;
use clam_node::rpc::types::JsonRequest;
use clam_node::rpc::{default_command_table, RequestDispatcher};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use std::sync::Arc;

fn dispatcher() -> RequestDispatcher {
    let node = NodeContext::new(Arc::new(NetworkRegistry::new()));
    let table = default_command_table().expect("built-in table");
    RequestDispatcher::new(Arc::new(table), Arc::new(node))
}

fn benchmark_execute(c: &mut Criterion) {
    let dispatcher = dispatcher();

    c.bench_function("execute_thread_safe", |b| {
        b.iter(|| black_box(dispatcher.execute(black_box("help"), black_box(&[]))))
    });

    c.bench_function("execute_locked", |b| {
        b.iter(|| black_box(dispatcher.execute(black_box("getblockcount"), black_box(&[]))))
    });

    c.bench_function("execute_unknown", |b| {
        b.iter(|| black_box(dispatcher.execute(black_box("nonexistent"), black_box(&[]))))
    });
}

fn benchmark_request_body(c: &mut Criterion) {
    let dispatcher = dispatcher();
    let single = r#"{"method":"getinfo","params":[],"id":1}"#;
    let batch: String = {
        let calls: Vec<Value> = (0..32)
            .map(|id| json!({"method": "getblockcount", "id": id}))
            .collect();
        Value::Array(calls).to_string()
    };

    c.bench_function("parse_and_execute_single", |b| {
        b.iter(|| {
            let value: Value = serde_json::from_str(black_box(single)).unwrap();
            let request = JsonRequest::parse(&value).unwrap();
            black_box(dispatcher.execute_request(&request).to_body())
        })
    });

    c.bench_function("parse_and_execute_batch_32", |b| {
        b.iter(|| {
            let value: Value = serde_json::from_str(black_box(&batch)).unwrap();
            let batch = value.as_array().unwrap();
            black_box(dispatcher.execute_batch(batch))
        })
    });
}

criterion_group!(benches, benchmark_execute, benchmark_request_body);
criterion_main!(benches);

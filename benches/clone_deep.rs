use criterion::{Criterion, criterion_group, criterion_main};
use reactive_query::{Record, Ref, Value, clone_deep, clone_deep_unref};
use std::hint::black_box;

/// Options-shaped tree: a few nested records with arrays and refs
fn options_tree(width: usize) -> Value {
    let filters: Vec<Value> = (0..width)
        .map(|i| {
            Value::Record(
                Record::new()
                    .with("field", format!("field_{}", i))
                    .with("value", Ref::new(i as u32))
                    .with("tags", Value::array(["a", "b", "c"])),
            )
        })
        .collect();

    Value::Record(
        Record::new()
            .with("queryKey", Value::array([Value::from("todos"), Value::from(1)]))
            .with("staleTime", 5000)
            .with("filters", filters)
            .with("lookup", Value::map([("x", 1), ("y", 2)])),
    )
}

fn bench_clone_deep(c: &mut Criterion) {
    let small = options_tree(4);
    let large = options_tree(256);

    c.bench_function("clone_deep small", |b| b.iter(|| clone_deep(black_box(&small))));
    c.bench_function("clone_deep large", |b| b.iter(|| clone_deep(black_box(&large))));
    c.bench_function("clone_deep_unref large", |b| {
        b.iter(|| clone_deep_unref(black_box(&large)))
    });
}

criterion_group!(benches, bench_clone_deep);
criterion_main!(benches);

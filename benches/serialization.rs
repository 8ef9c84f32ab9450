use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use sprig_bson::{
    encode, from_bson, from_json, to_bson, to_json_string, IndexedKeySubstitutor, JsonParser,
};

#[derive(Serialize, Deserialize, Clone)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product {}", i),
            price: 9.99 + f64::from(i),
            quantity: i,
        })
        .collect()
}

fn products_json(size: u32) -> String {
    serde_json::to_string(&products(size)).unwrap_or_default()
}

fn benchmark_parse_simple(c: &mut Criterion) {
    let text = r#"{"id":123,"name":"Alice","email":"alice@example.com","active":true}"#;

    c.bench_function("parse_simple_object", |b| {
        b.iter(|| from_json(black_box(text)))
    });
}

fn benchmark_parse_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_array");

    for size in [10, 50, 100, 500].iter() {
        let text = products_json(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| from_json(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_parse_indexed_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_indexed_keys");

    for size in [10, 100, 500].iter() {
        let text = products_json(*size);
        let keys = IndexedKeySubstitutor::new();
        let parser = JsonParser::with_key_substitutor(&keys);

        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| parser.parse(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_write_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_json");

    for size in [10, 100, 500].iter() {
        let doc = from_json(&products_json(*size)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| to_json_string(black_box(doc)))
        });
    }
    group.finish();
}

fn benchmark_decode_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_values");

    for size in [10, 100, 500].iter() {
        let doc = from_json(&products_json(*size)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| black_box(doc).to_value())
        });
    }
    group.finish();
}

fn benchmark_encode_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_values");

    for size in [10, 100, 500].iter() {
        let value = from_json(&products_json(*size))
            .unwrap()
            .to_value()
            .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &value, |b, value| {
            b.iter(|| encode(black_box(value)))
        });
    }
    group.finish();
}

fn benchmark_numbers(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_numbers");

    let integers = serde_json::to_string(&(0..100).map(|i| i * 1000).collect::<Vec<i64>>())
        .unwrap_or_default();
    let reals = serde_json::to_string(&(0..100u32).map(|i| f64::from(i) * 1.5).collect::<Vec<f64>>())
        .unwrap_or_default();
    let big = format!("[{}]", vec!["123456789012345678901234567890"; 100].join(","));

    group.bench_function("integers", |b| b.iter(|| from_json(black_box(&integers))));
    group.bench_function("reals", |b| b.iter(|| from_json(black_box(&reals))));
    group.bench_function("big_integers", |b| b.iter(|| from_json(black_box(&big))));

    group.finish();
}

fn benchmark_comparison_with_json(c: &mut Criterion) {
    let user = User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    };

    let mut group = c.benchmark_group("comparison");

    group.bench_function("bson_serialize", |b| {
        b.iter(|| to_bson(black_box(&user)))
    });

    group.bench_function("json_serialize", |b| {
        b.iter(|| serde_json::to_string(black_box(&user)))
    });

    let bson = to_bson(&user).unwrap();
    let json_str = serde_json::to_string(&user).unwrap();

    group.bench_function("bson_deserialize", |b| {
        b.iter(|| from_bson::<User>(black_box(&bson)))
    });

    group.bench_function("json_deserialize", |b| {
        b.iter(|| serde_json::from_str::<User>(black_box(&json_str)))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_parse_simple,
    benchmark_parse_array,
    benchmark_parse_indexed_keys,
    benchmark_write_json,
    benchmark_decode_values,
    benchmark_encode_values,
    benchmark_numbers,
    benchmark_comparison_with_json
);
criterion_main!(benches);

//! # Induction Benchmarks
//!
//! Document projection, schema merging and SDL rendering.
//!
//! Run with: `cargo bench -p doccache-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use doccache_core::{ChainDocument, Policy, Schema};
use serde_json::{Value, json};
use std::hint::black_box;

/// A document with `width` content items spread over four groups.
fn document(id: u64, type_value: &str, width: usize) -> Value {
    let mut groups: Vec<Vec<Value>> = ["details", "ballot", "payout", "meta"]
        .iter()
        .map(|g| vec![json!({"label": "content_group_label", "value": ["string", g]})])
        .collect();
    for i in 0..width {
        let item = match i % 3 {
            0 => json!({"label": format!("n{i}"), "value": ["int64", i]}),
            1 => json!({"label": format!("s{i}"), "value": ["string", "text"]}),
            _ => json!({"label": format!("t{i}"), "value": ["time_point", "2021-04-12T05:09:36"]}),
        };
        groups[i % 4].push(item);
    }
    groups.push(vec![
        json!({"label": "content_group_label", "value": ["string", "system"]}),
        json!({"label": "type", "value": ["name", type_value]}),
    ]);
    json!({
        "id": id,
        "hash": format!("{id:064x}"),
        "creator": "dao.hypha",
        "created_date": "2021-04-12T05:09:36.500",
        "content_groups": groups,
    })
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");
    let policy = Policy::default();

    for width in [8usize, 64, 256] {
        let raw = document(1, "assignment", width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &raw, |b, raw| {
            b.iter(|| {
                let doc = ChainDocument::from_json(raw).expect("doc");
                black_box(policy.parse(&doc).expect("parse"))
            });
        });
    }
    group.finish();
}

fn bench_induction(c: &mut Criterion) {
    let mut group = c.benchmark_group("induction");
    let policy = Policy::default();

    for types in [4usize, 32] {
        let docs: Vec<ChainDocument> = (0..types * 4)
            .map(|i| {
                let raw = document(i as u64, &format!("type{}", i % types), 16 + i % 8);
                ChainDocument::from_json(&raw).expect("doc")
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(types), &docs, |b, docs| {
            b.iter(|| {
                let mut schema = Schema::new();
                for doc in docs {
                    let mut parsed = policy.parse(doc).expect("parse");
                    policy.apply(&schema, &mut parsed).expect("policy");
                    schema.update_type(parsed.ty).expect("update");
                }
                black_box(schema.sdl().len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_projection, bench_induction);
criterion_main!(benches);

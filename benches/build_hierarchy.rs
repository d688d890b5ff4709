//! This bench test simulates converting a large typology: records are ingested
//! into a hierarchy, walked, and serialized to XML.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use non_empty_string::NonEmptyString;
use typology::{Hierarchy, IssueRecord, storage::xml};

/// Generates a typology with `roots` top-level issues, each with `children`
/// sub-issues, each of those with `children` more.
fn records(roots: usize, children: usize) -> Vec<IssueRecord> {
    let record = |id: String, parent: &str| {
        IssueRecord::new(
            NonEmptyString::new(id.clone()).unwrap(),
            NonEmptyString::new(format!("Issue {id}")).unwrap(),
        )
        .with_parent(parent)
        .with_description("A description\nspanning two lines")
    };

    let mut records = Vec::new();
    for r in 0..roots {
        let root = format!("R{r}");
        records.push(record(root.clone(), ""));
        for c in 0..children {
            let child = format!("{root}-C{c}");
            records.push(record(child.clone(), &root));
            for g in 0..children {
                records.push(record(format!("{child}-G{g}"), &child));
            }
        }
    }
    records
}

fn build_hierarchy(c: &mut Criterion) {
    c.bench_function("ingest and walk", |b| {
        b.iter_batched(
            || records(20, 20),
            |records| {
                let mut hierarchy = Hierarchy::with_capacity(records.len());
                for record in records {
                    hierarchy.ingest(record);
                }
                black_box(hierarchy.walk().unwrap().node_count());
            },
            BatchSize::SmallInput,
        );
    });

    let mut hierarchy = Hierarchy::default();
    for record in records(20, 20) {
        hierarchy.ingest(record);
    }
    c.bench_function("render xml", |b| {
        b.iter(|| {
            let walk = hierarchy.walk().unwrap();
            black_box(xml::render(&walk, "MQM2021").unwrap());
        });
    });
}

criterion_group!(benches, build_hierarchy);
criterion_main!(benches);

use aggbench::analysis::{by_region, by_region_then_year, by_resource, weight_extremes};
use aggbench::models::{GroupKey, Record, WeightMode};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const REGIONS: [&str; 4] = ["north", "south", "east", "west"];
const RESOURCES: [&str; 3] = ["coal", "gas", "solar"];

// Synthetic nodes spread over a few regions, resources and years.
fn synthetic_dataset(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record {
            region: Some(GroupKey::from(REGIONS[i % REGIONS.len()])),
            resource: Some(GroupKey::from(RESOURCES[(i / 7) % RESOURCES.len()])),
            year: Some(GroupKey::from(2000 + (i % 20) as i64)),
            value: Some(((i * 37) % 1000) as f64 / 10.0),
            weight: Some(((i * 53) % 200) as f64 - 100.0),
        })
        .collect()
}

fn bench_subjects(c: &mut Criterion) {
    let dataset = synthetic_dataset(10_000);

    let mut group = c.benchmark_group("subjects_1e4");
    group.bench_function("by-region", |b| {
        b.iter(|| black_box(by_region(black_box(&dataset))))
    });
    group.bench_function("by-region-then-year", |b| {
        b.iter(|| black_box(by_region_then_year(black_box(&dataset))))
    });
    group.bench_function("by-resource", |b| {
        b.iter(|| black_box(by_resource(black_box(&dataset))))
    });
    group.bench_function("weight-extremes", |b| {
        b.iter(|| {
            black_box(weight_extremes(
                black_box(&dataset),
                WeightMode::RunningExtremes,
            ))
        })
    });
    group.bench_function("weight-extremes-exact", |b| {
        b.iter(|| black_box(weight_extremes(black_box(&dataset), WeightMode::Exact)))
    });
    group.finish();
}

criterion_group!(benches, bench_subjects);
criterion_main!(benches);

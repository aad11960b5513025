use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use descriptor_index::kdtree::{KDTreeBuilder, KDTreeIndex};
use descriptor_index::matching::{match_features, MatchConfig};
use descriptor_index::{Feature, LocationKind, Rect};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn generate_features(n: usize, seed: u64) -> Vec<Feature<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let descr: Vec<f32> = (0..128).map(|_| rng.gen_range(0.0..1.0)).collect();
            Feature::new(descr, rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0))
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let features = generate_features(5_000, 42);
    let queries = generate_features(100, 7);
    let tree = KDTreeBuilder::new().build_indexed(&features).unwrap();

    let mut group = c.benchmark_group("knn");
    for max_checks in [50, 200, 1_000] {
        group.bench_with_input(
            BenchmarkId::new("k=2", max_checks),
            &max_checks,
            |b, &max_checks| {
                b.iter(|| {
                    for q in &queries {
                        tree.knn(q, 2, max_checks).unwrap();
                    }
                })
            },
        );
    }
    group.finish();

    let region = Rect::new(0., 0., 320., 240.);
    c.bench_function("spatial_knn k=2 max_checks=200", |b| {
        b.iter(|| {
            for q in &queries {
                tree.spatial_knn(q, 2, 200, &region, LocationKind::Image)
                    .unwrap();
            }
        })
    });

    let config = MatchConfig::default();
    c.bench_function("match_features 100 x 5000", |b| {
        b.iter(|| match_features(&tree, &queries, &config).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

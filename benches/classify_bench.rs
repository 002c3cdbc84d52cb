use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use mesh_halo::algs::{Accumulator, ReferenceKernel, reindex_classified};
use mesh_halo::data::AccumulationField;
use mesh_halo::overlap::classify;
use mesh_halo::topology::{InteriorFace, MeshAdjacency, PartitionAssignment};

// n × n grid of quads, partitioned into vertical strips with a few random
// elements moved to a neighbouring strip
fn strip_grid(n: usize, n_parts: usize, seed: u64) -> MeshAdjacency {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut parts: Vec<usize> = (0..n * n).map(|e| (e % n) * n_parts / n).collect();
    for p in parts.iter_mut() {
        if rng.r#gen::<f64>() < 0.02 {
            *p = (*p + 1) % n_parts;
        }
    }
    let mut faces = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let e = j * n + i;
            if i + 1 < n {
                faces.push(InteriorFace::new(e, e + 1));
            }
            if j + 1 < n {
                faces.push(InteriorFace::new(e, e + n));
            }
        }
    }
    MeshAdjacency::try_new(n * n, &PartitionAssignment::new(parts), faces).unwrap()
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    for &(n, parts) in &[(100, 4), (300, 16), (500, 64)] {
        let adj = strip_grid(n, parts, 42);
        group.bench_with_input(
            BenchmarkId::new("classify", format!("{n}x{n}/{parts}")),
            &adj,
            |b, adj| b.iter(|| classify(adj, parts).unwrap()),
        );
        let c = classify(&adj, parts).unwrap();
        group.bench_with_input(
            BenchmarkId::new("reindex", format!("{n}x{n}/{parts}")),
            &adj,
            |b, adj| b.iter(|| reindex_classified(adj, &c).unwrap()),
        );
    }
    group.finish();
}

fn bench_accumulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulate");
    group.sample_size(20);
    for &parts in &[1, 4, 16] {
        let adj = strip_grid(200, parts, 7);
        let cls = classify(&adj, parts).unwrap();
        let acc = Accumulator::new(&adj, &cls).unwrap();
        let kernel = ReferenceKernel::new(1);
        let mut field: AccumulationField = AccumulationField::new(&cls, 135).unwrap();
        field.zero();
        group.bench_function(BenchmarkId::new("pass", parts), |b| {
            b.iter(|| {
                field.begin_pass().unwrap();
                acc.accumulate(&mut field, &kernel).unwrap();
                field.finalize().unwrap();
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classify, bench_accumulate);
criterion_main!(benches);

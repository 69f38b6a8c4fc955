use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use evolab_sim::base::SimRng;
use evolab_sim::geometry::{Geometry, GeometryConfig, GeometryType, Neighborhood};

fn bench_geometry_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry_generation");
    let size = 4096;
    group.throughput(Throughput::Elements(size as u64));

    let topologies = [
        GeometryType::Square {
            neighborhood: Neighborhood::Moore,
        },
        GeometryType::Hexagonal,
        GeometryType::RandomGraph { degree: 4 },
        GeometryType::RandomRegular { degree: 4 },
        GeometryType::DirectedRandom { degree: 4 },
        GeometryType::ScaleFree { degree: 2 },
        GeometryType::Hierarchical {
            units: vec![16, 16, 16],
        },
    ];

    for topology in topologies {
        let config = GeometryConfig::new(topology.clone(), size);
        group.bench_with_input(
            BenchmarkId::new(topology.name(), size),
            &config,
            |b, config| {
                let mut rng = SimRng::new(42);
                b.iter(|| black_box(Geometry::new(config, &mut rng).unwrap()))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_geometry_generation);
criterion_main!(benches);

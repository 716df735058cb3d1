//! Criterion benchmarks for the city layout.
//!
//! Benchmarks:
//!   - is_on_road on a main-street point, a roundabout point and an open lot
//!   - footprint_clear for a typical building footprint in both check modes
//!   - full layout generation with the reference configuration
//!   - single-tile region generation
//!
//! Run with: cargo bench --bench layout_bench

use bevy::math::{Rect, Vec2};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};

use city_drive::procgen::catalog::StructureCatalog;
use city_drive::procgen::layout::{CityLayoutGenerator, LayoutConfig};
use city_drive::procgen::roads::{FootprintCheck, RoadNetwork};

// ---------------------------------------------------------------------------
// Benchmark: road classification
// ---------------------------------------------------------------------------

fn bench_is_on_road(c: &mut Criterion) {
    let mut group = c.benchmark_group("road_classification");
    group.sample_size(1000);

    let roads = RoadNetwork::default();

    // Inside the main street band, the first test short-circuits
    group.bench_function("main_street", |b| {
        b.iter(|| black_box(roads.is_on_road(black_box(0.0), black_box(45.0))));
    });

    // Roundabout disc, reached after every strip test fails
    group.bench_function("roundabout", |b| {
        b.iter(|| black_box(roads.is_on_road(black_box(80.0), black_box(60.0))));
    });

    // Open lot, every test runs and fails
    group.bench_function("off_road", |b| {
        b.iter(|| black_box(roads.is_on_road(black_box(150.0), black_box(42.0))));
    });

    group.finish();
}

fn bench_footprint_clear(c: &mut Criterion) {
    let mut group = c.benchmark_group("road_footprint_clear");

    let roads = RoadNetwork::default();
    let size = Vec2::new(12.0, 12.0);

    for (name, check) in [
        ("center_only", FootprintCheck::CenterOnly),
        ("footprint", FootprintCheck::Footprint),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                black_box(roads.footprint_clear(
                    black_box(Vec2::new(150.0, 42.0)),
                    size,
                    check,
                    2.0,
                ))
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: layout generation
// ---------------------------------------------------------------------------

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_generate");
    group.sample_size(20);

    let roads = RoadNetwork::default();
    let catalog = StructureCatalog::default();
    let config = LayoutConfig::default();

    group.bench_function("reference_city", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(config.seed);
            black_box(CityLayoutGenerator::new(&roads, &catalog, &config).generate(&mut rng))
        });
    });

    group.bench_function("region_100x100", |b| {
        let bounds = Rect::new(100.0, 0.0, 200.0, 100.0);
        b.iter(|| {
            black_box(
                CityLayoutGenerator::new(&roads, &catalog, &config).generate_region(black_box(bounds)),
            )
        });
    });

    group.finish();
}

criterion_group!(benches, bench_is_on_road, bench_footprint_clear, bench_generate);
criterion_main!(benches);

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use tilescape_core::{GenerationMode, TerrainConfig, TerrainGrid};

fn bench_config(grid: u32, mode: GenerationMode) -> TerrainConfig {
    TerrainConfig {
        grid_size_x: grid,
        grid_size_y: grid,
        chunk_size: 16,
        generation_mode: mode,
        seed: Some(0xBEEF),
        ..TerrainConfig::default()
    }
}

fn bench_terrain(c: &mut Criterion) {
    let mut group = c.benchmark_group("terrain");
    let samples: usize = std::env::var("TS_BENCH_SAMPLES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(20);
    group.sample_size(samples);
    group.measurement_time(Duration::from_secs(5));

    for &grid in &[8_u32, 32] {
        group.bench_function(format!("generate_perlin_{grid}x{grid}"), |b| {
            b.iter(|| {
                let terrain =
                    TerrainGrid::new(bench_config(grid, GenerationMode::Perlin)).expect("terrain");
                black_box(terrain.tile_count())
            });
        });

        group.bench_function(format!("randomize_{grid}x{grid}"), |b| {
            b.iter_batched(
                || TerrainGrid::new(bench_config(grid, GenerationMode::Perlin)).expect("terrain"),
                |mut terrain| black_box(terrain.randomize()),
                BatchSize::LargeInput,
            );
        });
    }

    let mut terrain = TerrainGrid::new(bench_config(32, GenerationMode::Flat)).expect("terrain");
    group.bench_function("visible_tiles_after_pan", |b| {
        b.iter(|| {
            terrain
                .converter_mut()
                .pan_by((0.25, 0.0))
                .expect("pan");
            black_box(terrain.visible_tiles().len())
        });
    });

    let terrain = TerrainGrid::new(bench_config(32, GenerationMode::Flat)).expect("terrain");
    group.bench_function("arr_tile_sweep", |b| {
        let (width, height) = terrain.world_extent();
        b.iter(|| {
            let mut weight = 0.0f32;
            for y in 0..height as i64 {
                for x in 0..width as i64 {
                    if let Ok(tile) = terrain.arr_tile((x, y)) {
                        weight += tile.weight();
                    }
                }
            }
            black_box(weight)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_terrain);
criterion_main!(benches);

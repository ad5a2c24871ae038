//! Simulation step benchmarks using Criterion.
//!
//! Each iteration runs one `run_simulation_step` (physics plus all five
//! collision phases) on a freshly populated arena.

use arcade_sim::{store, Category, ShooterSim, SimConfig};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

fn crowded_arena(enemies: usize, workers: usize) -> ShooterSim {
    let config = SimConfig {
        worker_threads: Some(workers),
        initial_enemies: enemies,
        decorations: 0,
        player_max_hp: 1_000_000_000,
        ..SimConfig::default()
    };
    let mut sim = ShooterSim::new_game(config.clone()).expect("worker pool");

    let mut rng = Pcg32::seed_from_u64(99);
    let world = sim.world_mut();
    for i in 0..enemies {
        let category = if i % 2 == 0 { Category::Bullet } else { Category::EnemyBullet };
        let x = rng.random::<f32>() * config.arena_width;
        let y = rng.random::<f32>() * config.arena_height;
        store::spawn_projectile(world, category, x, y, 0.0, -400.0);
    }
    sim
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    for count in [100, 1_000, 4_000] {
        group.throughput(Throughput::Elements(count as u64 * 2));

        for workers in [1, 4] {
            let id = BenchmarkId::new(format!("workers_{workers}"), count);
            group.bench_with_input(id, &count, |b, &n| {
                b.iter_batched_ref(
                    || crowded_arena(n, workers),
                    |sim| sim.run_simulation_step(1.0 / 60.0),
                    BatchSize::LargeInput,
                );
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);

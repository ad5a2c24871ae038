//! Headless run of the arcade simulation.
//!
//! Run with: RUST_LOG=info cargo run --example arcade_demo

use arcade_sim::{Category, InputState, MemoryRecorder, RecordEvent, ShooterSim, SimConfig};

fn main() -> Result<(), arcade_sim::SimError> {
    env_logger::init();

    println!("=== Arcade Sim - Headless Demo ===\n");

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let mut sim = ShooterSim::new_game(config)?;
    let recorder = MemoryRecorder::new();
    sim.set_recorder(Box::new(recorder.clone()));

    println!("{} workers\n", sim.worker_count());

    // Circle-strafe, firing at the arena corners in turn.
    let corners = [(0.0, 0.0), (800.0, 0.0), (800.0, 600.0), (0.0, 600.0)];
    for frame in 0..1800u32 {
        let (aim_x, aim_y) = corners[(frame / 60) as usize % corners.len()];
        let phase = frame / 90 % 4;
        let input = InputState {
            up: phase == 0,
            right: phase == 1,
            down: phase == 2,
            left: phase == 3,
            ..InputState::firing_at(aim_x, aim_y)
        };
        sim.step(1.0 / 60.0, &input);

        if (frame + 1) % 300 == 0 {
            print_status(&mut sim);
        }
        if sim.is_game_over() {
            println!("\n--- Player destroyed ---");
            break;
        }
    }

    for event in recorder.events() {
        if let RecordEvent::GameOver(summary) = event {
            println!(
                "time {:.1}s, kills {}, avg fps {:.1}",
                summary.total_time, summary.kills, summary.avg_fps
            );
        }
    }

    println!("\n=== Final State (JSON) ===\n");
    println!("{}", sim.snapshot().to_json_pretty()?);

    sim.shutdown()
}

fn print_status(sim: &mut ShooterSim) {
    let snapshot = sim.snapshot();
    println!(
        "frame {:>5} t={:>5.1}s  hp {:>4}  enemies {:>3}  bullets {:>3}  enemy bullets {:>3}  kills {:>3}  failed batches {}",
        snapshot.frame,
        snapshot.time,
        snapshot.player_hp.unwrap_or(0),
        snapshot.count(Category::Enemy),
        snapshot.count(Category::Bullet),
        snapshot.count(Category::EnemyBullet),
        snapshot.kills,
        sim.failed_batches(),
    );
}

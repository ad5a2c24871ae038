//! Public API for the simulation.
//!
//! [`ShooterSim`] owns the ECS world, the gameplay schedule and the worker
//! pool. A frame is `step(dt, input)`: the gameplay systems run first on the
//! calling thread, then [`ShooterSim::run_simulation_step`] drives the
//! parallel pipeline.
//!
//! ## Frame order
//!
//! 1. Physics integration (parallel). Escaped projectiles are removed.
//! 2. Collision sub-phases 1-5 (parallel, each committed before the next).
//! 3. Commit on the calling thread: damage to the player, kill count,
//!    game-over check, then one batch removal of everything flagged.
//!
//! Once the player dies the session is frozen; later steps are no-ops.

use crate::components::*;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::input::InputState;
use crate::pool::WorkerPool;
use crate::profiler::PhaseProfiler;
use crate::recording::{GameOverSummary, Recorder};
use crate::removal::RemovalSet;
use crate::store;
use crate::systems::collision::{resolve_collisions, CollisionFrame, CollisionOutcome};
use crate::systems::gameplay::{self, DeltaTime};
use crate::systems::physics;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use std::time::Instant;

/// What one simulation step did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Projectiles culled by physics for leaving the playfield.
    pub culled: usize,
    /// Entities despawned by the collision commit.
    pub removed: usize,
    /// Damage applied to the player this frame.
    pub damage: i32,
    /// Enemies killed this frame.
    pub kills: u32,
}

/// The simulation session.
pub struct ShooterSim {
    world: World,
    schedule: Schedule,
    pool: WorkerPool,
    profiler: PhaseProfiler,
    recorder: Option<Box<dyn Recorder>>,
    config: SimConfig,
    frame: u64,
    time: f32,
    kills: u32,
    game_over: bool,
}

impl ShooterSim {
    /// Create a session with an empty arena.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        let pool = WorkerPool::new(config.resolved_worker_threads())?;

        let mut world = World::new();
        gameplay::init_resources(&mut world, &config);

        log::info!(
            "simulation ready: {}x{} arena, {} workers",
            config.arena_width,
            config.arena_height,
            pool.threads()
        );

        Ok(Self {
            world,
            schedule: gameplay::gameplay_schedule(),
            pool,
            profiler: PhaseProfiler::new(),
            recorder: None,
            config,
            frame: 0,
            time: 0.0,
            kills: 0,
            game_over: false,
        })
    }

    /// Create a session with the opening scene already spawned.
    pub fn new_game(config: SimConfig) -> Result<Self, SimError> {
        let mut sim = Self::new(config)?;
        gameplay::populate_scene(&mut sim.world, &sim.config);
        Ok(sim)
    }

    /// Attach the recorder notified when the game ends.
    pub fn set_recorder(&mut self, recorder: Box<dyn Recorder>) {
        self.recorder = Some(recorder);
    }

    /// Advance one frame: gameplay systems, then the parallel pipeline.
    pub fn step(&mut self, dt: f32, input: &InputState) -> FrameReport {
        if self.game_over {
            log::debug!("step ignored after game over");
            return FrameReport::default();
        }

        self.world.insert_resource(DeltaTime(dt));
        self.world.insert_resource(*input);
        self.schedule.run(&mut self.world);

        self.run_simulation_step(dt)
    }

    /// Run physics and the five collision phases, then commit the results.
    pub fn run_simulation_step(&mut self, dt: f32) -> FrameReport {
        if self.game_over {
            log::debug!("simulation step ignored after game over");
            return FrameReport::default();
        }
        self.frame += 1;
        self.time += dt;

        let culled = self
            .profiler
            .time("physics", || physics::run_physics_phase(&mut self.world, &self.pool, &self.config, dt));
        let removal = RemovalSet::from_entities(culled.iter().copied());
        store::remove_entities(&mut self.world, culled.iter().copied());

        let frame = CollisionFrame::capture(&mut self.world);
        let outcome = resolve_collisions(&self.pool, &frame, removal, &mut self.profiler);

        let start = Instant::now();
        let removed = self.commit(&outcome);
        self.profiler.record("commit", start.elapsed());
        self.profiler.frame();

        let report = FrameReport {
            culled: culled.len(),
            removed,
            damage: outcome.damage,
            kills: outcome.kills,
        };
        log::debug!("frame {}: {:?}", self.frame, report);
        report
    }

    /// Apply a frame's collision outcome. Returns the number despawned.
    fn commit(&mut self, outcome: &CollisionOutcome) -> usize {
        self.kills += outcome.kills;

        if let Some(player) = store::find_player(&mut self.world) {
            let dead = match self.world.get_mut::<Health>(player) {
                Some(mut health) => {
                    health.take_damage(outcome.damage);
                    health.is_dead()
                }
                None => {
                    log::warn!("player {:?} has no health component", player);
                    false
                }
            };
            if dead {
                self.enter_game_over();
            }
        }

        store::remove_entities(&mut self.world, outcome.removal.iter())
    }

    /// Freeze the session and notify the recorder. Runs before the frame's
    /// removals so the final keyframe still shows what killed the player.
    fn enter_game_over(&mut self) {
        self.game_over = true;
        let summary = GameOverSummary::new(self.time as f64, self.frame, self.kills);
        log::info!(
            "game over at frame {} ({:.1}s): {} enemies killed, {:.1} avg fps",
            self.frame,
            summary.total_time,
            summary.kills,
            summary.avg_fps
        );

        let Some(mut recorder) = self.recorder.take() else {
            return;
        };
        let snapshot = self.snapshot();
        recorder.force_keyframe(&snapshot);
        recorder.write_game_over(&summary);
        recorder.stop();
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn enemies_killed(&self) -> u32 {
        self.kills
    }

    /// Batches that panicked and were dropped since the session started.
    pub fn failed_batches(&self) -> u64 {
        self.pool.failed_batches()
    }

    pub fn worker_count(&self) -> usize {
        self.pool.threads()
    }

    /// Current player health, if a player exists.
    pub fn player_health(&mut self) -> Option<Health> {
        let player = store::find_player(&mut self.world)?;
        self.world.get::<Health>(player).copied()
    }

    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    pub fn current_time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn profiler(&self) -> &PhaseProfiler {
        &self.profiler
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.frame, self.time, self.kills, self.game_over)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Get a reference to the ECS world (for advanced queries).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get a mutable reference to the ECS world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Stop the worker pool, waiting up to the configured grace period.
    pub fn shutdown(self) -> Result<(), SimError> {
        if cfg!(feature = "profile") {
            self.profiler.log_summary();
        }
        log::info!("shutting down after {} frames", self.frame);
        self.pool.shutdown(self.config.shutdown_grace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{MemoryRecorder, RecordEvent};

    fn test_config(threads: usize) -> SimConfig {
        SimConfig {
            worker_threads: Some(threads),
            initial_enemies: 0,
            decorations: 0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_new_session() {
        let sim = ShooterSim::new(test_config(3)).unwrap();
        assert_eq!(sim.current_frame(), 0);
        assert_eq!(sim.worker_count(), 3);
        assert_eq!(sim.failed_batches(), 0);
        assert!(!sim.is_game_over());
    }

    #[test]
    fn test_new_game_populates_arena() {
        let config = SimConfig {
            worker_threads: Some(2),
            ..SimConfig::default()
        };
        let mut sim = ShooterSim::new_game(config.clone()).unwrap();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.count(Category::Player), 1);
        assert_eq!(snapshot.count(Category::Enemy), config.initial_enemies);
        assert_eq!(snapshot.player_hp, Some(config.player_max_hp));
    }

    #[test]
    fn test_melee_contact_kills_enemy_and_hurts_player() {
        let mut sim = ShooterSim::new(test_config(4)).unwrap();
        let world = sim.world_mut();
        store::spawn_player(world, 400.0, 300.0, 1000);
        let enemy = store::spawn_enemy(world, 405.0, 305.0, 0.0, 0.0);

        let report = sim.run_simulation_step(0.0);

        assert_eq!(report.kills, 1);
        assert_eq!(report.damage, 20);
        assert!(!sim.world().entities().contains(enemy));
        assert_eq!(sim.enemies_killed(), 1);
        assert_eq!(sim.player_health().unwrap().current, 980);
    }

    #[test]
    fn test_culled_projectile_also_hit_is_removed_once() {
        let mut sim = ShooterSim::new(test_config(2)).unwrap();
        let world = sim.world_mut();
        store::spawn_player(world, 400.0, 300.0, 1000);
        let stray = store::spawn_projectile(world, Category::Bullet, 900.0, 300.0, 0.0, 0.0);
        store::spawn_enemy(world, 100.0, 100.0, 0.0, 0.0);

        let report = sim.run_simulation_step(1.0 / 60.0);

        assert_eq!(report.culled, 1);
        assert_eq!(report.kills, 0);
        assert!(!sim.world().entities().contains(stray));
        assert_eq!(store::count_of(sim.world_mut(), Category::Enemy), 1);
    }

    #[test]
    fn test_game_over_notifies_recorder_once_and_freezes() {
        let mut sim = ShooterSim::new(test_config(2)).unwrap();
        let recorder = MemoryRecorder::new();
        sim.set_recorder(Box::new(recorder.clone()));

        let world = sim.world_mut();
        store::spawn_player(world, 400.0, 300.0, 20);
        let enemy = store::spawn_enemy(world, 400.0, 300.0, 0.0, 0.0);

        sim.run_simulation_step(0.5);
        assert!(sim.is_game_over());
        assert!(!sim.world().entities().contains(enemy));

        let events = recorder.events();
        assert_eq!(events.len(), 3);
        match &events[0] {
            RecordEvent::Keyframe(snapshot) => {
                // Taken before the frame's removals.
                assert_eq!(snapshot.count(Category::Enemy), 1);
                assert_eq!(snapshot.player_hp, Some(0));
                assert!(snapshot.game_over);
            }
            other => panic!("expected keyframe, got {:?}", other),
        }
        match &events[1] {
            RecordEvent::GameOver(summary) => {
                assert_eq!(summary.kills, 1);
                assert!((summary.total_time - 0.5).abs() < 1e-6);
                assert!((summary.avg_fps - 2.0).abs() < 1e-6);
            }
            other => panic!("expected game over, got {:?}", other),
        }
        assert_eq!(events[2], RecordEvent::Stopped);

        // Frozen: nothing advances and the recorder hears nothing more.
        store::spawn_enemy(sim.world_mut(), 400.0, 300.0, 0.0, 0.0);
        assert_eq!(sim.step(0.5, &InputState::default()), FrameReport::default());
        assert_eq!(sim.current_frame(), 1);
        assert_eq!(recorder.events().len(), 3);
    }

    #[test]
    fn test_step_runs_gameplay_before_pipeline() {
        let mut sim = ShooterSim::new(test_config(2)).unwrap();
        store::spawn_default_player(sim.world_mut(), &test_config(2));

        let input = InputState::firing_at(400.0, 0.0);
        sim.step(0.1, &input);
        sim.step(0.1, &input);

        assert_eq!(sim.current_frame(), 2);
        assert_eq!(store::count_of(sim.world_mut(), Category::Bullet), 1);
    }

    #[test]
    fn test_full_game_runs_and_shuts_down() {
        let config = SimConfig {
            worker_threads: Some(4),
            seed: 7,
            ..SimConfig::default()
        };
        let mut sim = ShooterSim::new_game(config).unwrap();
        let input = InputState::firing_at(100.0, 100.0);
        for _ in 0..120 {
            sim.step(1.0 / 60.0, &input);
        }

        assert_eq!(sim.failed_batches(), 0);
        assert!(sim.profiler().get("physics").is_some());
        assert!(sim.snapshot_json().contains("entities"));
        assert!(sim.shutdown().is_ok());
    }
}

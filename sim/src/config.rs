//! Simulation configuration.
//!
//! Arena geometry, gameplay tuning and worker-pool sizing live in a single
//! `SimConfig` resource. Collision thresholds are not configurable; they are
//! constants in `systems::collision`.

use crate::error::SimError;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for a simulation session.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Visible arena width in world units.
    pub arena_width: f32,
    /// Visible arena height in world units.
    pub arena_height: f32,
    /// Non-projectiles bounce once their corner reaches `size - edge_margin`.
    pub edge_margin: f32,
    /// How far outside the arena a projectile may travel before it is culled.
    pub projectile_margin: f32,
    /// Downward acceleration for bodies with `use_gravity`.
    pub gravity: f32,
    /// Worker count override. `None` picks `max(2, cores - 1)`.
    pub worker_threads: Option<usize>,
    /// How long `shutdown` waits for workers to exit.
    pub shutdown_grace_ms: u64,
    pub player_max_hp: i32,
    pub player_speed: f32,
    pub player_fire_interval: f32,
    pub bullet_speed: f32,
    pub enemy_bullet_speed: f32,
    /// Spawn distance of projectiles from the shooter's centre.
    pub muzzle_offset: f32,
    pub enemy_fire_interval: f32,
    pub enemy_spawn_interval: f32,
    pub initial_enemies: usize,
    pub decorations: usize,
    /// Seed for the spawn RNG, so sessions are reproducible.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena_width: 800.0,
            arena_height: 600.0,
            edge_margin: 15.0,
            projectile_margin: 50.0,
            gravity: 300.0,
            worker_threads: None,
            shutdown_grace_ms: 1000,
            player_max_hp: 1000,
            player_speed: 200.0,
            player_fire_interval: 0.2,
            bullet_speed: 400.0,
            enemy_bullet_speed: 300.0,
            muzzle_offset: 25.0,
            enemy_fire_interval: 1.0,
            enemy_spawn_interval: 0.2,
            initial_enemies: 30,
            decorations: 5,
            seed: 0x5eed,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_pretty(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of workers the pool should run with.
    pub fn resolved_worker_threads(&self) -> usize {
        match self.worker_threads {
            Some(n) => n.max(1),
            None => {
                let cores = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);
                cores.saturating_sub(1).max(2)
            }
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json_str(r#"{ "arena_width": 1024.0, "worker_threads": 3 }"#)
            .unwrap();
        assert_eq!(config.arena_width, 1024.0);
        assert_eq!(config.arena_height, 600.0);
        assert_eq!(config.resolved_worker_threads(), 3);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = SimConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn test_auto_worker_count_is_at_least_two() {
        let config = SimConfig::default();
        assert!(config.resolved_worker_threads() >= 2);

        let single = SimConfig { worker_threads: Some(0), ..Default::default() };
        assert_eq!(single.resolved_worker_threads(), 1);
    }

    #[test]
    fn test_roundtrip_json() {
        let config = SimConfig { seed: 7, ..Default::default() };
        let json = config.to_json_pretty().unwrap();
        assert_eq!(SimConfig::from_json_str(&json).unwrap(), config);
    }
}

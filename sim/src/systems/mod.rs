//! Systems and pipeline phases for the arcade simulation.
//!
//! ## Frame order
//!
//! **Gameplay** - bevy systems, chained on the calling thread:
//! - `player_input_system` - steering and player fire
//! - `enemy_fire_system` - enemies shoot at the player
//! - `enemy_wave_system` - periodic enemy spawns
//!
//! **Physics** - one parallel phase over every body:
//! - `run_physics_phase` - friction, gravity, motion, bounds
//!
//! **Collision** - five parallel sub-phases, committed one after another:
//! 1. player vs enemy
//! 2. bullet vs enemy
//! 3. bullet vs bullet
//! 4. enemy bullet vs player
//! 5. enemy bullet vs enemy bullet

pub mod collision;
pub mod gameplay;
pub mod physics;

pub use collision::{resolve_collisions, CollisionFrame, CollisionOutcome};
pub use gameplay::{
    enemy_fire_system, enemy_wave_system, gameplay_schedule, player_input_system, DeltaTime, SpawnRng, WaveTimer,
};
pub use physics::run_physics_phase;

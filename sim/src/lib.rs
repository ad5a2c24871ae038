//! Arcade Sim - Simulation Core
//!
//! The per-frame pipeline of a 2D arena shooter: parallel physics
//! integration followed by five ordered collision phases, all over a
//! `bevy_ecs` world and a fixed rayon worker pool.

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod input;
pub mod partition;
pub mod pool;
pub mod profiler;
pub mod recording;
pub mod removal;
pub mod store;
pub mod systems;
pub mod world;

pub use api::{FrameReport, ShooterSim};
pub use components::*;
pub use config::SimConfig;
pub use error::SimError;
pub use input::InputState;
pub use pool::WorkerPool;
pub use profiler::PhaseProfiler;
pub use recording::{GameOverSummary, MemoryRecorder, RecordEvent, Recorder};
pub use removal::RemovalSet;
pub use world::{EntitySnapshot, Snapshot};

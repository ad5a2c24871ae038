//! Interface to the session recorder.
//!
//! The recorder itself (event log, playback) lives outside this crate. The
//! simulation only notifies it once, at the moment the player dies: a final
//! keyframe, a game-over summary, then stop.

use crate::world::Snapshot;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Final statistics written when the game ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOverSummary {
    /// Elapsed simulation time in seconds.
    pub total_time: f64,
    pub kills: u32,
    pub avg_fps: f64,
}

impl GameOverSummary {
    pub fn new(total_time: f64, frames: u64, kills: u32) -> Self {
        let avg_fps = if total_time > 0.0 { frames as f64 / total_time } else { 0.0 };
        Self {
            total_time,
            kills,
            avg_fps,
        }
    }
}

/// Receiver of end-of-game notifications.
pub trait Recorder: Send {
    fn force_keyframe(&mut self, snapshot: &Snapshot);
    fn write_game_over(&mut self, summary: &GameOverSummary);
    fn stop(&mut self);
}

/// Something the simulation told the recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordEvent {
    Keyframe(Snapshot),
    GameOver(GameOverSummary),
    Stopped,
}

/// Recorder that keeps events in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    events: Arc<Mutex<Vec<RecordEvent>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, event: RecordEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl Recorder for MemoryRecorder {
    fn force_keyframe(&mut self, snapshot: &Snapshot) {
        self.push(RecordEvent::Keyframe(snapshot.clone()));
    }

    fn write_game_over(&mut self, summary: &GameOverSummary) {
        self.push(RecordEvent::GameOver(summary.clone()));
    }

    fn stop(&mut self) {
        self.push(RecordEvent::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_average_fps() {
        let summary = GameOverSummary::new(2.0, 120, 5);
        assert_eq!(summary.avg_fps, 60.0);
        assert_eq!(GameOverSummary::new(0.0, 10, 0).avg_fps, 0.0);
    }

    #[test]
    fn test_memory_recorder_clones_share_log() {
        let recorder = MemoryRecorder::new();
        let mut handle = recorder.clone();
        handle.force_keyframe(&Snapshot::default());
        handle.stop();
        assert_eq!(recorder.events(), vec![RecordEvent::Keyframe(Snapshot::default()), RecordEvent::Stopped]);
    }
}

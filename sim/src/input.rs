//! Per-frame input state, owned by the frame driver and handed to each step.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of the controls for one frame.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    /// Aim point in arena coordinates (mouse position).
    pub aim_x: f32,
    pub aim_y: f32,
}

impl InputState {
    /// Movement direction from the held keys; `(0, 0)` when idle.
    pub fn movement(&self) -> (f32, f32) {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.up {
            dy -= 1.0;
        }
        if self.down {
            dy += 1.0;
        }
        if self.left {
            dx -= 1.0;
        }
        if self.right {
            dx += 1.0;
        }
        (dx, dy)
    }

    pub fn firing_at(x: f32, y: f32) -> Self {
        Self {
            fire: true,
            aim_x: x,
            aim_y: y,
            ..Default::default()
        }
    }
}

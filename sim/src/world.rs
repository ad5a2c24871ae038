//! Serializable snapshot of the scene.
//!
//! The recorder takes one of these as a keyframe; demos and tests use it to
//! inspect the world without touching the ECS.

use crate::components::*;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// One object in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: u64,
    pub category: Category,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
}

/// Complete scene state at the end of a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Frames simulated so far.
    pub frame: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    pub kills: u32,
    pub player_hp: Option<i32>,
    pub game_over: bool,
    /// Objects ordered by id.
    pub entities: Vec<EntitySnapshot>,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, frame: u64, time: f32, kills: u32, game_over: bool) -> Self {
        let mut query = world.query::<(
            &ObjectId,
            &Category,
            &Position,
            Option<&PhysicsBody>,
            Option<&Hitbox>,
            Option<&Health>,
        )>();

        let mut player_hp = None;
        let mut entities = Vec::new();
        for (id, category, pos, body, hitbox, health) in query.iter(world) {
            if *category == Category::Player {
                player_hp = health.map(|h| h.current);
            }
            let (vx, vy) = body.map(|b| (b.vx, b.vy)).unwrap_or_default();
            let (width, height) = hitbox.map(|h| (h.width, h.height)).unwrap_or_default();
            entities.push(EntitySnapshot {
                id: id.0,
                category: *category,
                x: pos.x,
                y: pos.y,
                vx,
                vy,
                width,
                height,
            });
        }
        entities.sort_unstable_by_key(|e| e.id);

        Self {
            frame,
            time,
            kills,
            player_hp,
            game_over,
            entities,
        }
    }

    pub fn count(&self, category: Category) -> usize {
        self.entities.iter().filter(|e| e.category == category).count()
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;

    #[test]
    fn test_snapshot_lists_objects_in_id_order() {
        let mut world = World::new();
        store::spawn_player(&mut world, 400.0, 300.0, 1000);
        store::spawn_enemy(&mut world, 10.0, 20.0, 1.0, 2.0);
        store::spawn_decoration(&mut world, 5.0, 5.0);

        let snapshot = Snapshot::from_world(&mut world, 3, 0.05, 1, false);

        assert_eq!(snapshot.entities.len(), 3);
        assert_eq!(snapshot.player_hp, Some(1000));
        assert!(snapshot.entities.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(snapshot.count(Category::Enemy), 1);
        let enemy = &snapshot.entities[1];
        assert_eq!((enemy.vx, enemy.vy), (1.0, 2.0));
        assert_eq!(snapshot.entities[2].vx, 0.0);
    }

    #[test]
    fn test_snapshot_json_keeps_categories() {
        let mut world = World::new();
        store::spawn_projectile(&mut world, Category::EnemyBullet, 1.0, 1.0, 0.0, 0.0);
        let snapshot = Snapshot::from_world(&mut world, 0, 0.0, 0, false);

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("EnemyBullet"));
        assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
    }
}

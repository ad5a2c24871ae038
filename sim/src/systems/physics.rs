//! Physics integration phase.
//!
//! ## Phases
//!
//! 1. **Extract** - copy every body (entity, category, position, velocity)
//!    out of the world into one contiguous vector. O(n), sequential.
//! 2. **Integrate** - the pool splits the vector into disjoint mutable
//!    batches. Each task advances motion for its own bodies, then either
//!    culls escaped projectiles or bounces everything else off the arena
//!    edges. O(n), parallel.
//! 3. **Write back** - positions and velocities are written to the world on
//!    the calling thread, and culled projectiles are returned. O(n).
//!
//! Every body lives in exactly one batch, so no two tasks can address the
//! same entity. That follows from the slice split, not from any lock.

use crate::components::*;
use crate::config::SimConfig;
use crate::pool::WorkerPool;
use bevy_ecs::prelude::*;

/// Working copy of one body during integration.
#[derive(Debug, Clone, Copy)]
pub struct BodyState {
    pub entity: Entity,
    pub category: Category,
    pub position: Position,
    pub body: PhysicsBody,
}

/// Arena bounds used by the integration tasks.
#[derive(Debug, Clone, Copy)]
pub struct ArenaBounds {
    pub width: f32,
    pub height: f32,
    pub edge_margin: f32,
    pub projectile_margin: f32,
    pub gravity: f32,
}

impl ArenaBounds {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            width: config.arena_width,
            height: config.arena_height,
            edge_margin: config.edge_margin,
            projectile_margin: config.projectile_margin,
            gravity: config.gravity,
        }
    }

    /// Outside the extended playfield that projectiles may roam.
    pub fn projectile_escaped(&self, pos: &Position) -> bool {
        let m = self.projectile_margin;
        pos.x < -m || pos.x > self.width + m || pos.y < -m || pos.y > self.height + m
    }

    fn max_x(&self) -> f32 {
        self.width - self.edge_margin
    }

    fn max_y(&self) -> f32 {
        self.height - self.edge_margin
    }
}

/// Advance one body by `dt`. Returns true if it is a projectile that left the
/// extended playfield and must be removed.
pub fn integrate_body(state: &mut BodyState, bounds: &ArenaBounds, dt: f32) -> bool {
    let body = &mut state.body;
    let pos = &mut state.position;

    body.vx *= body.friction;
    body.vy *= body.friction;
    if body.use_gravity {
        body.vy += bounds.gravity * dt;
    }
    pos.x += body.vx * dt;
    pos.y += body.vy * dt;

    if state.category.is_projectile() {
        return bounds.projectile_escaped(pos);
    }

    let (max_x, max_y) = (bounds.max_x(), bounds.max_y());
    if pos.x <= 0.0 || pos.x >= max_x {
        body.vx = -body.vx;
    }
    if pos.y <= 0.0 || pos.y >= max_y {
        body.vy = -body.vy;
    }
    pos.x = pos.x.clamp(0.0, max_x);
    pos.y = pos.y.clamp(0.0, max_y);
    false
}

/// Integrate one batch; returns the projectiles it culled.
pub fn integrate_batch(batch: &mut [BodyState], bounds: &ArenaBounds, dt: f32) -> Vec<Entity> {
    let mut culled = Vec::new();
    for state in batch.iter_mut() {
        if integrate_body(state, bounds, dt) {
            culled.push(state.entity);
        }
    }
    culled
}

/// Copy every body with a position out of the world, ordered by object id.
pub fn extract_bodies(world: &mut World) -> Vec<BodyState> {
    let mut query = world.query::<(Entity, &ObjectId, &Category, Option<&Position>, &PhysicsBody)>();
    let mut bodies: Vec<(ObjectId, BodyState)> = Vec::new();
    for (entity, id, category, position, body) in query.iter(world) {
        let Some(position) = position else {
            log::warn!("physics: {:?} ({}) has a body but no position; skipped", entity, category.as_str());
            continue;
        };
        bodies.push((
            *id,
            BodyState {
                entity,
                category: *category,
                position: *position,
                body: *body,
            },
        ));
    }
    bodies.sort_unstable_by_key(|(id, _)| *id);
    bodies.into_iter().map(|(_, state)| state).collect()
}

/// Write integrated state back to each body's own components.
pub fn write_back(world: &mut World, bodies: &[BodyState]) {
    for state in bodies {
        if let Some(mut pos) = world.get_mut::<Position>(state.entity) {
            *pos = state.position;
        }
        if let Some(mut body) = world.get_mut::<PhysicsBody>(state.entity) {
            *body = state.body;
        }
    }
}

/// Run the physics integration phase and return the culled projectiles.
///
/// The caller is responsible for adding them to the frame's removal set and
/// despawning them before collision phases run.
pub fn run_physics_phase(world: &mut World, pool: &WorkerPool, config: &SimConfig, dt: f32) -> Vec<Entity> {
    let mut bodies = extract_bodies(world);
    let bounds = ArenaBounds::from_config(config);

    let culled: Vec<Entity> = pool
        .run_batches_mut("physics", &mut bodies, |_, batch| integrate_batch(batch, &bounds, dt))
        .into_iter()
        .flatten()
        .collect();

    write_back(world, &bodies);
    culled
}

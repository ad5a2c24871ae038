//! Collision resolution - five ordered sub-phases over a frozen frame view.
//!
//! ## Sub-phases
//!
//! 1. **Player vs Enemy** - melee contact damages the player and kills the enemy.
//! 2. **Bullet vs Enemy** - each bullet credits at most one enemy; each enemy
//!    is credited at most one kill no matter how many bullets hit it.
//! 3. **Bullet vs Bullet** - overlapping player bullets destroy each other.
//! 4. **EnemyBullet vs Player** - each hit costs the player one point.
//! 5. **EnemyBullet vs EnemyBullet** - mutual destruction, as in phase 3.
//!
//! ## Gather / Commit
//!
//! Every sub-phase gathers in parallel and commits sequentially:
//! - The work list is partitioned and each batch task builds a local result,
//!   reading only the [`CollisionFrame`] and the [`RemovalSet`] as frozen at
//!   phase start.
//! - The orchestrating thread merges batch results with commutative
//!   operations (sums, set union, per-enemy list concatenation) and builds
//!   the next frozen removal set before the next sub-phase is submitted.
//!
//! Batch completion order therefore never affects the outcome, and anything
//! flagged by an earlier sub-phase is invisible as a candidate to every later
//! one.
//!
//! ## Complexity
//! - Phases 1 and 4: O(n).
//! - Phase 2: O(bullets × enemies).
//! - Phases 3 and 5: O(n²) upper-triangular; batches split the outer index so
//!   each pair is evaluated exactly once across the pool.

use crate::components::*;
use crate::pool::WorkerPool;
use crate::profiler::PhaseProfiler;
use crate::removal::RemovalSet;
use bevy_ecs::prelude::*;
use std::collections::HashMap;
use std::ops::Range;

/// Centre distance below which an enemy touching the player counts as a hit.
pub const MELEE_THRESHOLD: f32 = 20.0;
/// Player damage from one melee contact.
pub const MELEE_DAMAGE: i32 = 20;
/// Slack added to half-sizes for bullet/enemy hits.
pub const BULLET_ENEMY_SLACK: f32 = 3.0;
/// Slack added to half-sizes for projectile/projectile hits.
pub const PROJECTILE_PAIR_SLACK: f32 = 2.0;
/// Player half-extent used by the enemy-bullet threshold.
pub const PLAYER_HALF_EXTENT: f32 = 10.0;
/// Slack added for enemy bullets hitting the player.
pub const ENEMY_BULLET_SLACK: f32 = 3.0;
/// Player damage from one enemy bullet.
pub const ENEMY_BULLET_DAMAGE: i32 = 1;

// ============================================================================
// FRAME VIEW
// ============================================================================

/// Read-only collision data for one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub entity: Entity,
    pub center: Position,
    pub half_width: f32,
}

impl Collider {
    pub fn new(entity: Entity, position: &Position, hitbox: &Hitbox) -> Self {
        Self {
            entity,
            center: hitbox.center_of(position),
            half_width: hitbox.half_width(),
        }
    }

    #[inline]
    pub fn distance_to(&self, other: &Collider) -> f32 {
        self.center.distance_to(&other.center)
    }
}

/// Per-frame read-only view of every collidable object, grouped by category
/// and ordered by object id. Never mutated while phases run.
#[derive(Debug, Clone, Default)]
pub struct CollisionFrame {
    pub player: Option<Collider>,
    pub enemies: Vec<Collider>,
    pub bullets: Vec<Collider>,
    pub enemy_bullets: Vec<Collider>,
}

impl CollisionFrame {
    /// Capture the current world. Objects missing a position or hitbox are
    /// left out of every phase.
    pub fn capture(world: &mut World) -> Self {
        let mut query = world.query::<(Entity, &ObjectId, &Category, Option<&Position>, Option<&Hitbox>)>();
        let mut rows: Vec<(ObjectId, Category, Collider)> = Vec::new();

        for (entity, id, category, position, hitbox) in query.iter(world) {
            if *category == Category::Decoration {
                continue;
            }
            match (position, hitbox) {
                (Some(position), Some(hitbox)) => {
                    rows.push((*id, *category, Collider::new(entity, position, hitbox)));
                }
                _ => {
                    log::warn!(
                        "collision: {:?} ({}) lacks a position or hitbox; excluded this frame",
                        entity,
                        category.as_str()
                    );
                }
            }
        }
        rows.sort_unstable_by_key(|(id, _, _)| *id);

        let mut frame = Self::default();
        for (_, category, collider) in rows {
            match category {
                Category::Player => {
                    if frame.player.is_none() {
                        frame.player = Some(collider);
                    }
                }
                Category::Enemy => frame.enemies.push(collider),
                Category::Bullet => frame.bullets.push(collider),
                Category::EnemyBullet => frame.enemy_bullets.push(collider),
                Category::Decoration => {}
            }
        }
        frame
    }
}

// ============================================================================
// BATCH RESULTS
// ============================================================================

/// Damage dealt to the player by one batch of contacts.
#[derive(Debug, Default, Clone)]
pub struct ContactResult {
    pub damage: i32,
    pub kills: u32,
    pub removed: Vec<Entity>,
}

impl ContactResult {
    pub fn merge(&mut self, other: ContactResult) {
        self.damage += other.damage;
        self.kills += other.kills;
        self.removed.extend(other.removed);
    }
}

/// Bullet hits keyed by the enemy they struck.
#[derive(Debug, Default, Clone)]
pub struct BulletHits {
    pub hits: HashMap<Entity, Vec<Entity>>,
}

impl BulletHits {
    pub fn merge(&mut self, other: BulletHits) {
        for (enemy, bullets) in other.hits {
            self.hits.entry(enemy).or_default().extend(bullets);
        }
    }

    /// One kill per struck enemy, however many bullets hit it.
    pub fn kills(&self) -> u32 {
        self.hits.len() as u32
    }

    /// Every enemy and every bullet that hit one.
    pub fn flagged(&self) -> impl Iterator<Item = Entity> + '_ {
        self.hits
            .iter()
            .flat_map(|(enemy, bullets)| std::iter::once(*enemy).chain(bullets.iter().copied()))
    }
}

// ============================================================================
// BATCH TASKS
// ============================================================================

/// Phase 1 over one batch of enemies.
pub fn player_enemy_batch(player: &Collider, enemies: &[Collider], frozen: &RemovalSet) -> ContactResult {
    let mut result = ContactResult::default();
    for enemy in enemies {
        if frozen.contains(enemy.entity) {
            continue;
        }
        if player.distance_to(enemy) < MELEE_THRESHOLD {
            result.damage += MELEE_DAMAGE;
            result.kills += 1;
            result.removed.push(enemy.entity);
        }
    }
    result
}

/// Phase 2 over one batch of bullets. A bullet stops at its first hit.
pub fn bullet_enemy_batch(bullets: &[Collider], enemies: &[Collider], frozen: &RemovalSet) -> BulletHits {
    let mut result = BulletHits::default();
    for bullet in bullets {
        if frozen.contains(bullet.entity) {
            continue;
        }
        let target = enemies.iter().find(|enemy| {
            !frozen.contains(enemy.entity)
                && bullet.distance_to(enemy) < enemy.half_width + bullet.half_width + BULLET_ENEMY_SLACK
        });
        if let Some(enemy) = target {
            result.hits.entry(enemy.entity).or_default().push(bullet.entity);
        }
    }
    result
}

/// Phases 3 and 5: pairs `(i, j)` with `i` in `outer` and `j > i`.
pub fn mutual_destruction_batch(projectiles: &[Collider], outer: Range<usize>, frozen: &RemovalSet) -> Vec<Entity> {
    let mut removed = Vec::new();
    for i in outer {
        let a = &projectiles[i];
        if frozen.contains(a.entity) {
            continue;
        }
        for b in &projectiles[i + 1..] {
            if frozen.contains(b.entity) {
                continue;
            }
            if a.distance_to(b) < a.half_width + b.half_width + PROJECTILE_PAIR_SLACK {
                removed.push(a.entity);
                removed.push(b.entity);
            }
        }
    }
    removed
}

/// Phase 4 over one batch of enemy bullets.
pub fn enemy_bullet_player_batch(player: &Collider, enemy_bullets: &[Collider], frozen: &RemovalSet) -> ContactResult {
    let mut result = ContactResult::default();
    for bullet in enemy_bullets {
        if frozen.contains(bullet.entity) {
            continue;
        }
        if player.distance_to(bullet) < PLAYER_HALF_EXTENT + bullet.half_width + ENEMY_BULLET_SLACK {
            result.damage += ENEMY_BULLET_DAMAGE;
            result.removed.push(bullet.entity);
        }
    }
    result
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Aggregate outcome of all five sub-phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionOutcome {
    /// Total player damage from phases 1 and 4.
    pub damage: i32,
    /// Enemies killed by melee contact or bullets.
    pub kills: u32,
    /// Removal set after the last commit.
    pub removal: RemovalSet,
}

/// Run the five collision sub-phases in order over `frame`.
///
/// `removal` is the set carried in from earlier in the frame. Phases that need
/// the player are skipped when the frame has none.
pub fn resolve_collisions(
    pool: &WorkerPool,
    frame: &CollisionFrame,
    removal: RemovalSet,
    profiler: &mut PhaseProfiler,
) -> CollisionOutcome {
    let mut damage = 0;
    let mut kills = 0;
    let mut removal = removal;

    // Phase 1: player vs enemy
    if let Some(player) = frame.player.as_ref() {
        let merged = profiler.time("player_enemy", || {
            let mut merged = ContactResult::default();
            for partial in pool.run_batches("player_enemy", frame.enemies.len(), |range| {
                player_enemy_batch(player, &frame.enemies[range], &removal)
            }) {
                merged.merge(partial);
            }
            merged
        });
        damage += merged.damage;
        kills += merged.kills;
        removal = removal.committed(merged.removed);
    }

    // Phase 2: bullet vs enemy
    let hits = profiler.time("bullet_enemy", || {
        let mut merged = BulletHits::default();
        for partial in pool.run_batches("bullet_enemy", frame.bullets.len(), |range| {
            bullet_enemy_batch(&frame.bullets[range], &frame.enemies, &removal)
        }) {
            merged.merge(partial);
        }
        merged
    });
    kills += hits.kills();
    removal = removal.committed(hits.flagged());

    // Phase 3: bullet vs bullet
    let pairs = profiler.time("bullet_bullet", || {
        pool.run_batches("bullet_bullet", frame.bullets.len(), |range| {
            mutual_destruction_batch(&frame.bullets, range, &removal)
        })
    });
    removal = removal.committed(pairs.into_iter().flatten());

    // Phase 4: enemy bullet vs player
    if let Some(player) = frame.player.as_ref() {
        let merged = profiler.time("enemy_bullet_player", || {
            let mut merged = ContactResult::default();
            for partial in pool.run_batches("enemy_bullet_player", frame.enemy_bullets.len(), |range| {
                enemy_bullet_player_batch(player, &frame.enemy_bullets[range], &removal)
            }) {
                merged.merge(partial);
            }
            merged
        });
        damage += merged.damage;
        removal = removal.committed(merged.removed);
    }

    // Phase 5: enemy bullet vs enemy bullet
    let pairs = profiler.time("enemy_bullet_enemy_bullet", || {
        pool.run_batches("enemy_bullet_enemy_bullet", frame.enemy_bullets.len(), |range| {
            mutual_destruction_batch(&frame.enemy_bullets, range, &removal)
        })
    });
    removal = removal.committed(pairs.into_iter().flatten());

    CollisionOutcome { damage, kills, removal }
}

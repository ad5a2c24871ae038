//! Entity-store operations over the bevy `World`.
//!
//! The simulation core never creates or destroys objects on its own; it reads
//! ordered per-category lists, flags entities, and hands the flags back here
//! for one idempotent batch removal. Spawning is used by the session setup and
//! the gameplay systems around the core.

use crate::components::*;
use crate::config::SimConfig;
use bevy_ecs::prelude::*;

/// Hands out monotonically increasing object ids. Ids are never reused.
#[derive(Resource, Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn allocate(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        id
    }

    /// Id the next allocation will return.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

fn allocate_id(world: &mut World) -> ObjectId {
    world.get_resource_or_insert_with(IdAllocator::default).allocate()
}

/// All entities of `category`, ordered by object id (spawn order).
pub fn entities_of(world: &mut World, category: Category) -> Vec<Entity> {
    let mut query = world.query::<(Entity, &ObjectId, &Category)>();
    let mut found: Vec<(ObjectId, Entity)> = query
        .iter(world)
        .filter(|(_, _, c)| **c == category)
        .map(|(entity, id, _)| (*id, entity))
        .collect();
    found.sort_unstable_by_key(|(id, _)| *id);
    found.into_iter().map(|(_, entity)| entity).collect()
}

/// The player entity, if one is alive.
pub fn find_player(world: &mut World) -> Option<Entity> {
    entities_of(world, Category::Player).into_iter().next()
}

/// Number of live entities in `category`.
pub fn count_of(world: &mut World, category: Category) -> usize {
    let mut query = world.query::<&Category>();
    query.iter(world).filter(|c| **c == category).count()
}

/// Despawn every entity in `entities`. Unknown or already removed entities
/// are ignored, so calling this repeatedly with overlapping sets is safe.
///
/// Returns the number of entities actually despawned.
pub fn remove_entities(world: &mut World, entities: impl IntoIterator<Item = Entity>) -> usize {
    let mut removed = 0;
    for entity in entities {
        if world.entities().contains(entity) && world.despawn(entity) {
            removed += 1;
        }
    }
    removed
}

pub fn spawn_player(world: &mut World, x: f32, y: f32, max_hp: i32) -> Entity {
    let id = allocate_id(world);
    world.spawn(PlayerBundle::new(id, x, y, max_hp)).id()
}

pub fn spawn_enemy(world: &mut World, x: f32, y: f32, vx: f32, vy: f32) -> Entity {
    let id = allocate_id(world);
    world.spawn(EnemyBundle::new(id, x, y, vx, vy)).id()
}

pub fn spawn_projectile(world: &mut World, category: Category, x: f32, y: f32, vx: f32, vy: f32) -> Entity {
    let id = allocate_id(world);
    world.spawn(ProjectileBundle::new(id, category, x, y, vx, vy)).id()
}

pub fn spawn_decoration(world: &mut World, x: f32, y: f32) -> Entity {
    let id = allocate_id(world);
    world.spawn(DecorationBundle::new(id, x, y)).id()
}

/// Spawn the player in the middle of the arena.
pub fn spawn_default_player(world: &mut World, config: &SimConfig) -> Entity {
    spawn_player(
        world,
        config.arena_width * 0.5,
        config.arena_height * 0.5,
        config.player_max_hp,
    )
}

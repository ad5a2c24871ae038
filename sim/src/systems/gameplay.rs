//! Gameplay systems that run before the physics and collision pipeline:
//! player steering and shooting, enemy fire, and enemy waves.
//!
//! These only ever spawn objects or set velocities. They never remove
//! anything; destruction is decided by the pipeline.

use crate::components::*;
use crate::config::SimConfig;
use crate::input::InputState;
use crate::store::{self, IdAllocator};
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Resource containing the delta time for the current frame.
#[derive(Resource, Default)]
pub struct DeltaTime(pub f32);

/// Seeded RNG for enemy placement.
#[derive(Resource)]
pub struct SpawnRng(pub Pcg32);

impl SpawnRng {
    pub fn seeded(seed: u64) -> Self {
        Self(Pcg32::seed_from_u64(seed))
    }
}

/// Seconds since the last enemy wave spawn.
#[derive(Resource, Default)]
pub struct WaveTimer(pub f32);

/// Unit vector from `from` towards `to`, or `fallback` if they coincide.
fn direction(from: &Position, to: &Position, fallback: (f32, f32)) -> (f32, f32) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-4 {
        fallback
    } else {
        (dx / len, dy / len)
    }
}

/// Steers the player from the held keys and fires towards the aim point.
pub fn player_input_system(
    dt: Res<DeltaTime>,
    input: Res<InputState>,
    config: Res<SimConfig>,
    mut ids: ResMut<IdAllocator>,
    mut commands: Commands,
    mut players: Query<(&Category, &Position, &Hitbox, &mut PhysicsBody, &mut ShootTimer)>,
) {
    for (category, pos, hitbox, mut body, mut cooldown) in players.iter_mut() {
        if *category != Category::Player {
            continue;
        }

        let (mx, my) = input.movement();
        let len = (mx * mx + my * my).sqrt();
        if len > 0.0 {
            body.vx = mx / len * config.player_speed;
            body.vy = my / len * config.player_speed;
        }

        // Idle time does not bank extra shots.
        cooldown.0 = (cooldown.0 + dt.0).min(config.player_fire_interval);
        if !input.fire || cooldown.0 < config.player_fire_interval {
            continue;
        }
        cooldown.0 -= config.player_fire_interval;

        let center = hitbox.center_of(pos);
        let aim = Position::new(input.aim_x, input.aim_y);
        let (dx, dy) = direction(&center, &aim, (0.0, -1.0));
        commands.spawn(ProjectileBundle::new(
            ids.allocate(),
            Category::Bullet,
            center.x + dx * config.muzzle_offset,
            center.y + dy * config.muzzle_offset,
            dx * config.bullet_speed,
            dy * config.bullet_speed,
        ));
    }
}

/// Each enemy fires at the player once per `enemy_fire_interval`.
pub fn enemy_fire_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    mut ids: ResMut<IdAllocator>,
    mut commands: Commands,
    targets: Query<(&Category, &Position, &Hitbox)>,
    mut shooters: Query<(&Category, &Position, &Hitbox, &mut ShootTimer)>,
) {
    let target = targets
        .iter()
        .find(|(category, _, _)| **category == Category::Player)
        .map(|(_, pos, hitbox)| hitbox.center_of(pos));
    let Some(target) = target else {
        return;
    };

    for (category, pos, hitbox, mut timer) in shooters.iter_mut() {
        if *category != Category::Enemy || !timer.tick(dt.0, config.enemy_fire_interval) {
            continue;
        }
        let origin = hitbox.center_of(pos);
        let (dx, dy) = direction(&origin, &target, (0.0, 1.0));
        commands.spawn(ProjectileBundle::new(
            ids.allocate(),
            Category::EnemyBullet,
            origin.x + dx * config.muzzle_offset,
            origin.y + dy * config.muzzle_offset,
            dx * config.enemy_bullet_speed,
            dy * config.enemy_bullet_speed,
        ));
    }
}

/// Spawns one enemy at a random arena position every `enemy_spawn_interval`.
pub fn enemy_wave_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    mut timer: ResMut<WaveTimer>,
    mut rng: ResMut<SpawnRng>,
    mut ids: ResMut<IdAllocator>,
    mut commands: Commands,
) {
    timer.0 += dt.0;
    if timer.0 <= config.enemy_spawn_interval {
        return;
    }
    timer.0 = 0.0;
    commands.spawn(random_enemy(&mut rng.0, &config, ids.allocate()));
}

fn random_enemy(rng: &mut Pcg32, config: &SimConfig, id: ObjectId) -> EnemyBundle {
    let x = rng.random::<f32>() * config.arena_width;
    let y = rng.random::<f32>() * config.arena_height;
    let vx = (rng.random::<f32>() - 0.5) * 100.0;
    let vy = (rng.random::<f32>() - 0.5) * 100.0;
    EnemyBundle::new(id, x, y, vx, vy)
}

/// Build the gameplay schedule. Systems run in order on the calling thread;
/// the parallel work of a frame happens in the pipeline's own worker pool.
pub fn gameplay_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems((player_input_system, enemy_fire_system, enemy_wave_system).chain());
    schedule
}

/// Insert every resource the gameplay systems read.
pub fn init_resources(world: &mut World, config: &SimConfig) {
    world.insert_resource(config.clone());
    world.insert_resource(DeltaTime::default());
    world.insert_resource(InputState::default());
    world.insert_resource(WaveTimer::default());
    world.insert_resource(SpawnRng::seeded(config.seed));
    if !world.contains_resource::<IdAllocator>() {
        world.insert_resource(IdAllocator::default());
    }
}

/// Spawn the opening scene: the player, the first enemies and some
/// decorations. Expects [`init_resources`] to have run.
pub fn populate_scene(world: &mut World, config: &SimConfig) {
    store::spawn_default_player(world, config);

    for _ in 0..config.initial_enemies {
        let bundle = world.resource_scope(|world, mut rng: Mut<SpawnRng>| {
            let id = world.resource_mut::<IdAllocator>().allocate();
            random_enemy(&mut rng.0, config, id)
        });
        world.spawn(bundle);
    }

    for _ in 0..config.decorations {
        let (x, y) = {
            let mut rng = world.resource_mut::<SpawnRng>();
            (
                rng.0.random::<f32>() * config.arena_width,
                rng.0.random::<f32>() * config.arena_height,
            )
        };
        store::spawn_decoration(world, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(config: SimConfig, dt: f32, input: InputState) -> World {
        let mut world = World::new();
        world.insert_resource(DeltaTime(dt));
        world.insert_resource(input);
        world.insert_resource(WaveTimer::default());
        world.insert_resource(SpawnRng::seeded(1));
        world.insert_resource(IdAllocator::default());
        world.insert_resource(config);
        world
    }

    #[test]
    fn test_player_moves_and_fires_towards_aim() {
        let config = SimConfig::default();
        let input = InputState {
            right: true,
            ..InputState::firing_at(410.0, 100.0)
        };
        let mut world = world_with(config, 0.2, input);
        let player = store::spawn_player(&mut world, 400.0, 300.0, 1000);

        let mut schedule = Schedule::default();
        schedule.add_systems(player_input_system);
        schedule.run(&mut world);

        let body = world.get::<PhysicsBody>(player).unwrap();
        assert_eq!(body.vx, 200.0);
        assert_eq!(body.vy, 0.0);

        let bullets = store::entities_of(&mut world, Category::Bullet);
        assert_eq!(bullets.len(), 1);
        let bullet = world.get::<PhysicsBody>(bullets[0]).unwrap();
        assert!(bullet.vx.abs() < 1e-3);
        assert!((bullet.vy + 400.0).abs() < 1e-3);
        let pos = world.get::<Position>(bullets[0]).unwrap();
        assert!((pos.y - 285.0).abs() < 1e-3);
    }

    #[test]
    fn test_player_fire_respects_cooldown() {
        let mut world = world_with(SimConfig::default(), 0.1, InputState::firing_at(0.0, 0.0));
        store::spawn_player(&mut world, 400.0, 300.0, 1000);

        let mut schedule = Schedule::default();
        schedule.add_systems(player_input_system);
        for _ in 0..4 {
            schedule.run(&mut world);
        }
        // 0.4s of holding fire at a 0.2s interval.
        assert_eq!(store::count_of(&mut world, Category::Bullet), 2);
    }

    #[test]
    fn test_enemies_fire_at_player_each_interval() {
        let mut world = world_with(SimConfig::default(), 0.5, InputState::default());
        store::spawn_player(&mut world, 400.0, 300.0, 1000);
        store::spawn_enemy(&mut world, 100.0, 300.0, 0.0, 0.0);

        let mut schedule = Schedule::default();
        schedule.add_systems(enemy_fire_system);
        schedule.run(&mut world);
        assert_eq!(store::count_of(&mut world, Category::EnemyBullet), 0);
        schedule.run(&mut world);

        let shots = store::entities_of(&mut world, Category::EnemyBullet);
        assert_eq!(shots.len(), 1);
        let body = world.get::<PhysicsBody>(shots[0]).unwrap();
        assert!((body.vx - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_wave_spawns_enemies_over_time() {
        let mut world = world_with(SimConfig::default(), 0.25, InputState::default());
        let mut schedule = gameplay_schedule();
        for _ in 0..4 {
            schedule.run(&mut world);
        }
        assert_eq!(store::count_of(&mut world, Category::Enemy), 4);
    }

    #[test]
    fn test_populate_scene_counts() {
        let mut world = World::new();
        let config = SimConfig::default();
        init_resources(&mut world, &config);
        populate_scene(&mut world, &config);

        assert_eq!(store::count_of(&mut world, Category::Player), 1);
        assert_eq!(store::count_of(&mut world, Category::Enemy), config.initial_enemies);
        assert_eq!(store::count_of(&mut world, Category::Decoration), config.decorations);
    }
}

//! ECS Components for the arcade shooter simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems and phases that read these components.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Stable object identifier, assigned monotonically and never reused.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Closed set of object kinds. Behaviour is dispatched by matching on this tag.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Player,
    Enemy,
    Bullet,
    EnemyBullet,
    Decoration,
}

impl Category {
    /// Projectiles are culled outside the playfield instead of bouncing.
    pub fn is_projectile(&self) -> bool {
        matches!(self, Category::Bullet | Category::EnemyBullet)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Player => "Player",
            Category::Enemy => "Enemy",
            Category::Bullet => "Bullet",
            Category::EnemyBullet => "EnemyBullet",
            Category::Decoration => "Decoration",
        }
    }
}

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// Top-left corner of the object in arena coordinates.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Velocity, friction and gravity settings of a movable object.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    pub vx: f32,
    pub vy: f32,
    /// Velocity multiplier applied once per step (1.0 = no drag).
    pub friction: f32,
    pub use_gravity: bool,
    pub mass: f32,
}

impl PhysicsBody {
    pub fn new(mass: f32) -> Self {
        Self {
            vx: 0.0,
            vy: 0.0,
            friction: 1.0,
            use_gravity: false,
            mass,
        }
    }

    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_gravity(mut self, use_gravity: bool) -> Self {
        self.use_gravity = use_gravity;
        self
    }
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Axis-aligned extent used for rendering and collision thresholds.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub width: f32,
    pub height: f32,
}

impl Hitbox {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn square(size: f32) -> Self {
        Self::new(size, size)
    }

    /// Centre of a box whose top-left corner sits at `pos`.
    pub fn center_of(&self, pos: &Position) -> Position {
        pos.offset(self.width * 0.5, self.height * 0.5)
    }

    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }
}

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

/// Integer hit points, always within `[0, max]`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }

    /// Subtract and clamp to zero.
    pub fn take_damage(&mut self, amount: i32) {
        self.current = (self.current - amount.max(0)).max(0);
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Seconds accumulated towards the next shot.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ShootTimer(pub f32);

impl ShootTimer {
    /// Advance by `dt`; returns true (and consumes one interval) when a shot is due.
    pub fn tick(&mut self, dt: f32, interval: f32) -> bool {
        self.0 += dt;
        if self.0 >= interval {
            self.0 -= interval;
            true
        } else {
            false
        }
    }
}

// ============================================================================
// BUNDLES
// ============================================================================

/// The player-controlled ship.
#[derive(Bundle)]
pub struct PlayerBundle {
    pub id: ObjectId,
    pub category: Category,
    pub position: Position,
    pub body: PhysicsBody,
    pub hitbox: Hitbox,
    pub health: Health,
    pub shoot_timer: ShootTimer,
}

impl PlayerBundle {
    pub fn new(id: ObjectId, x: f32, y: f32, max_hp: i32) -> Self {
        Self {
            id,
            category: Category::Player,
            position: Position::new(x, y),
            body: PhysicsBody::new(1.0).with_friction(0.95),
            hitbox: Hitbox::square(20.0),
            health: Health::new(max_hp),
            shoot_timer: ShootTimer::default(),
        }
    }
}

/// A wandering enemy that periodically fires at the player.
#[derive(Bundle)]
pub struct EnemyBundle {
    pub id: ObjectId,
    pub category: Category,
    pub position: Position,
    pub body: PhysicsBody,
    pub hitbox: Hitbox,
    pub shoot_timer: ShootTimer,
}

impl EnemyBundle {
    pub fn new(id: ObjectId, x: f32, y: f32, vx: f32, vy: f32) -> Self {
        Self {
            id,
            category: Category::Enemy,
            position: Position::new(x, y),
            body: PhysicsBody::new(0.5).with_velocity(vx, vy).with_friction(0.98),
            hitbox: Hitbox::square(20.0),
            shoot_timer: ShootTimer::default(),
        }
    }
}

/// A projectile fired by either side.
#[derive(Bundle)]
pub struct ProjectileBundle {
    pub id: ObjectId,
    pub category: Category,
    pub position: Position,
    pub body: PhysicsBody,
    pub hitbox: Hitbox,
}

impl ProjectileBundle {
    pub fn new(id: ObjectId, category: Category, x: f32, y: f32, vx: f32, vy: f32) -> Self {
        debug_assert!(category.is_projectile());
        Self {
            id,
            category,
            position: Position::new(x, y),
            body: PhysicsBody::new(0.1).with_velocity(vx, vy),
            hitbox: Hitbox::square(4.0),
        }
    }
}

/// Static scenery; takes no part in collisions with gameplay objects.
#[derive(Bundle)]
pub struct DecorationBundle {
    pub id: ObjectId,
    pub category: Category,
    pub position: Position,
    pub hitbox: Hitbox,
}

impl DecorationBundle {
    pub fn new(id: ObjectId, x: f32, y: f32) -> Self {
        Self {
            id,
            category: Category::Decoration,
            position: Position::new(x, y),
            hitbox: Hitbox::square(5.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps_at_zero() {
        let mut health = Health::new(10);
        health.take_damage(4);
        assert_eq!(health.current, 6);
        health.take_damage(50);
        assert_eq!(health.current, 0);
        assert!(health.is_dead());
    }

    #[test]
    fn test_hitbox_center() {
        let hitbox = Hitbox::square(20.0);
        let center = hitbox.center_of(&Position::new(400.0, 300.0));
        assert_eq!(center, Position::new(410.0, 310.0));
    }

    #[test]
    fn test_shoot_timer_consumes_interval() {
        let mut timer = ShootTimer::default();
        assert!(!timer.tick(0.15, 0.2));
        assert!(timer.tick(0.1, 0.2));
        assert!((timer.0 - 0.05).abs() < 1e-5);
    }
}

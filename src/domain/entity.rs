//! Actors: every simulated body (player, enemies, bullets, coins, doors,
//! blood) is one `Actor` carrying a closed `Behavior` variant.
//!
//! The per-tick contract is shared: behaviour sets velocity, physics
//! integrates and resolves against the grid, cleanup removes the dead.
//! Variant data holds only what differs between kinds.

use bitflags::bitflags;
use fastrand::Rng;

use crate::config::{EnemyConfig, ProjectileConfig};
use super::kinematics::{Facing, Kinematics};
use super::rect::Rect;

pub const PLAYER_SIZE: (f32, f32) = (24.0, 32.0);
pub const GOOMBA_SIZE: (f32, f32) = (24.0, 24.0);
pub const SHYGUY_SIZE: (f32, f32) = (24.0, 30.0);
pub const BULLET_SIZE: (f32, f32) = (8.0, 4.0);
pub const COIN_SIZE: (f32, f32) = (16.0, 16.0);
pub const DOOR_SIZE: (f32, f32) = (32.0, 48.0);
pub const BLOOD_SIZE: (f32, f32) = (2.0, 2.0);

bitflags! {
    /// Sides struck during the last resolver pass.
    ///
    /// For tile contacts the flag names the side of the *tile* that was
    /// hit: `LEFT` means the actor ran into a tile's left face while
    /// moving right, `TOP` means it landed. For world walls it names the
    /// world edge: `LEFT` is the left edge of the map.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct Contacts: u8 {
        const LEFT   = 0b0001;
        const TOP    = 0b0010;
        const RIGHT  = 0b0100;
        const BOTTOM = 0b1000;
    }
}

/// Mutually exclusive movement classification used for animation and AI.
/// Priority: falling > walking > idle.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Locomotion {
    Idle,
    Walking,
    Falling,
}

/// What a sprite depicts; the presentation layer maps it to images.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ActorKind {
    Player,
    Goomba,
    ShyGuy,
    Bullet,
    Coin,
    Door,
    Blood,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Pose {
    Idle,
    Walk,
    Jump,
    Fall,
    /// Single-image or looping sprites with no movement state.
    Still,
}

/// Logical frame chosen for an actor this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Sprite {
    pub kind: ActorKind,
    pub pose: Pose,
    pub frame: usize,
    /// Mirror horizontally (actor faces left).
    pub flip: bool,
}

/// Looping frame counter. Advances one frame every `delay + 1` ticks and
/// restarts when the pose changes.
#[derive(Clone, Copy, Debug)]
pub struct Animation {
    pose: Pose,
    frame: usize,
    delay: u32,
    wait: u32,
}

impl Animation {
    pub fn new(delay: u32) -> Self {
        Animation { pose: Pose::Still, frame: 0, delay, wait: 0 }
    }

    pub fn advance(&mut self, pose: Pose, frames: usize) {
        if pose != self.pose {
            self.pose = pose;
            self.frame = 0;
            self.wait = 0;
            return;
        }
        if self.wait < self.delay {
            self.wait += 1;
            return;
        }
        self.wait = 0;
        self.frame = if frames == 0 { 0 } else { (self.frame + 1) % frames };
    }

    pub fn pose(&self) -> Pose { self.pose }
    pub fn frame(&self) -> usize { self.frame }
}

/// Timed pause for enemies that stop and stand now and then.
///
/// Counts walking ticks up to a random delay, then stands still for
/// `wait` ticks and resumes in the direction it was heading.
#[derive(Clone, Copy, Debug)]
pub struct IdleCycle {
    pub enabled: bool,
    pub counter: u32,
    pub delay: u32,
    pub waited: u32,
    pub paused: bool,
    pub resume: Facing,
}

impl IdleCycle {
    pub fn new(stats: &EnemyConfig, rng: &mut Rng) -> Self {
        IdleCycle {
            enabled: stats.idles,
            counter: 0,
            delay: roll_delay(stats, rng),
            waited: 0,
            paused: false,
            resume: Facing::Right,
        }
    }

    pub fn rearm(&mut self, stats: &EnemyConfig, rng: &mut Rng) {
        self.counter = 0;
        self.waited = 0;
        self.paused = false;
        self.delay = roll_delay(stats, rng);
    }
}

fn roll_delay(stats: &EnemyConfig, rng: &mut Rng) -> u32 {
    rng.u32(stats.idle_delay_min..=stats.idle_delay_max)
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub stats: EnemyConfig,
    pub health: i32,
    pub idle: IdleCycle,
    /// Set when a wall was sensed ahead; cleared by the jump itself.
    pub wants_jump: bool,
}

impl Enemy {
    /// Subtract damage; returns true if this blow was fatal.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        let was_alive = self.health > 0;
        self.health -= amount;
        was_alive && self.health <= 0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Projectile {
    pub damage: i32,
    pub points: u32,
    pub age: u32,
    pub lifetime: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct Pickup {
    pub points: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct Trigger {
    pub needs_enter_key: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub age: u32,
    pub lifetime: u32,
}

#[derive(Clone, Debug)]
pub enum Behavior {
    Player,
    WalkingEnemy(Enemy),
    JumpingEnemy(Enemy),
    Projectile(Projectile),
    Pickup(Pickup),
    Trigger(Trigger),
    Particle(Particle),
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub rect: Rect,
    /// Rectangle before this tick's integration; the resolver sweeps from it.
    pub prev_rect: Rect,
    pub motion: Kinematics,
    pub falling: bool,
    pub on_ground: bool,
    /// A collidable tile sits under the rectangle's horizontal span
    /// (walls alongside do not count). Set by the last resolve.
    pub supported: bool,
    /// Opts into gravity and the falling state machine.
    pub gravity: bool,
    pub contacts: Contacts,
    pub walls: Contacts,
    pub dead: bool,
    /// One-shot guard for death effects.
    pub death_handled: bool,
    pub behavior: Behavior,
    pub anim: Animation,
}

impl Actor {
    fn base(center: (f32, f32), size: (f32, f32), facing: Facing, behavior: Behavior) -> Self {
        let rect = Rect::centered(center.0, center.1, size.0, size.1);
        debug_assert!(!rect.is_empty(), "actor rectangle must have area");
        Actor {
            rect,
            prev_rect: rect,
            motion: Kinematics::new(facing),
            falling: false,
            on_ground: false,
            supported: false,
            gravity: true,
            contacts: Contacts::empty(),
            walls: Contacts::empty(),
            dead: false,
            death_handled: false,
            behavior,
            anim: Animation::new(0),
        }
    }

    pub fn player(center: (f32, f32)) -> Self {
        Actor::base(center, PLAYER_SIZE, Facing::Right, Behavior::Player)
    }

    /// Walking enemy heading off in a random direction.
    pub fn walking_enemy(center: (f32, f32), stats: EnemyConfig, rng: &mut Rng) -> Self {
        let enemy = Enemy { stats, health: stats.health, idle: IdleCycle::new(&stats, rng), wants_jump: false };
        Actor::spawn_enemy(center, GOOMBA_SIZE, Behavior::WalkingEnemy(enemy), stats.walk_speed, rng)
    }

    /// Jumping enemy heading off in a random direction.
    pub fn jumping_enemy(center: (f32, f32), stats: EnemyConfig, rng: &mut Rng) -> Self {
        let enemy = Enemy { stats, health: stats.health, idle: IdleCycle::new(&stats, rng), wants_jump: false };
        Actor::spawn_enemy(center, SHYGUY_SIZE, Behavior::JumpingEnemy(enemy), stats.walk_speed, rng)
    }

    fn spawn_enemy(center: (f32, f32), size: (f32, f32), behavior: Behavior, walk: f32, rng: &mut Rng) -> Self {
        let facing = if rng.bool() { Facing::Left } else { Facing::Right };
        let mut actor = Actor::base(center, size, facing, behavior);
        actor.motion.set_velocity_x(facing.sign() * walk);
        actor.anim = Animation::new(1);
        actor
    }

    /// Bullet fired from `center` along `facing`. Travels in a straight line.
    pub fn projectile(center: (f32, f32), facing: Facing, cfg: &ProjectileConfig) -> Self {
        let proj = Projectile { damage: cfg.damage, points: cfg.points, age: 0, lifetime: cfg.lifetime };
        let mut actor = Actor::base(center, BULLET_SIZE, facing, Behavior::Projectile(proj));
        actor.gravity = false;
        actor.motion.set_velocity_x(facing.sign() * cfg.speed);
        actor
    }

    pub fn coin(center: (f32, f32), points: u32) -> Self {
        let mut actor = Actor::base(center, COIN_SIZE, Facing::Right, Behavior::Pickup(Pickup { points }));
        actor.gravity = false;
        actor.anim = Animation::new(1);
        actor
    }

    pub fn door(center: (f32, f32), needs_enter_key: bool) -> Self {
        let mut actor = Actor::base(center, DOOR_SIZE, Facing::Right, Behavior::Trigger(Trigger { needs_enter_key }));
        actor.gravity = false;
        actor
    }

    /// Blood droplet flung along `heading_deg` (0° = right, 90° = up) at `speed`.
    pub fn particle(center: (f32, f32), heading_deg: f32, speed: f32, lifetime: u32) -> Self {
        let mut actor = Actor::base(center, BLOOD_SIZE, Facing::Right, Behavior::Particle(Particle { age: 0, lifetime }));
        let theta = heading_deg.to_radians();
        actor.motion.set_velocity(theta.cos() * speed, -theta.sin() * speed);
        actor
    }

    pub fn kind(&self) -> ActorKind {
        match self.behavior {
            Behavior::Player => ActorKind::Player,
            Behavior::WalkingEnemy(_) => ActorKind::Goomba,
            Behavior::JumpingEnemy(_) => ActorKind::ShyGuy,
            Behavior::Projectile(_) => ActorKind::Bullet,
            Behavior::Pickup(_) => ActorKind::Coin,
            Behavior::Trigger(_) => ActorKind::Door,
            Behavior::Particle(_) => ActorKind::Blood,
        }
    }

    pub fn is_alive(&self) -> bool { !self.dead }

    pub fn kill(&mut self) {
        self.dead = true;
    }

    pub fn enemy(&self) -> Option<&Enemy> {
        match &self.behavior {
            Behavior::WalkingEnemy(e) | Behavior::JumpingEnemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn enemy_mut(&mut self) -> Option<&mut Enemy> {
        match &mut self.behavior {
            Behavior::WalkingEnemy(e) | Behavior::JumpingEnemy(e) => Some(e),
            _ => None,
        }
    }

    /// Derived locomotion state: falling > walking > idle.
    pub fn locomotion(&self) -> Locomotion {
        if self.falling {
            return Locomotion::Falling;
        }
        let paused = self.enemy().map_or(false, |e| e.idle.paused);
        if !paused && self.motion.dx() != 0.0 {
            Locomotion::Walking
        } else {
            Locomotion::Idle
        }
    }

    /// Pose and frame count for the current state.
    fn pose(&self) -> (Pose, usize) {
        match self.behavior {
            Behavior::Player => {
                if self.motion.jumping() && !self.on_ground {
                    (Pose::Jump, 2)
                } else {
                    match self.locomotion() {
                        Locomotion::Falling => (Pose::Fall, 2),
                        Locomotion::Idle => (Pose::Idle, 4),
                        Locomotion::Walking => (Pose::Walk, 4),
                    }
                }
            }
            Behavior::WalkingEnemy(_) | Behavior::JumpingEnemy(_) => match self.locomotion() {
                Locomotion::Walking => (Pose::Walk, 3),
                _ => (Pose::Idle, 3),
            },
            Behavior::Pickup(_) => (Pose::Still, 8),
            _ => (Pose::Still, 1),
        }
    }

    /// Step the animation counter for this tick.
    pub fn animate(&mut self) {
        let (pose, frames) = self.pose();
        self.anim.advance(pose, frames);
    }

    pub fn sprite(&self) -> Sprite {
        Sprite {
            kind: self.kind(),
            pose: self.anim.pose(),
            frame: self.anim.frame(),
            flip: self.motion.facing() == Facing::Left,
        }
    }
}

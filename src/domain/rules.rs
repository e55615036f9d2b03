//! Gameplay rules between actors.
//!
//! Pure functions over actor slices: they mutate the actors involved and
//! report what happened, leaving events and scoring to the tick driver.
//! Every overlap test reads the *current* rectangles, so the order in
//! which the driver calls these is part of the game's behaviour.
//!
//! ## Contact rules
//! ┌──────────────────────┬──────────────────────────────────────────┐
//! │ Pair                 │ Outcome                                  │
//! ├──────────────────────┼──────────────────────────────────────────┤
//! │ player × live enemy  │ player dead (death effects run later)    │
//! │ player × pickup      │ pickup dead, points scored               │
//! │ player × door        │ level exit (optionally needs enter key)  │
//! │ moving bullet × enemy│ damage, points, bullet dead; first only  │
//! │ still bullet × enemy │ nothing                                  │
//! └──────────────────────┴──────────────────────────────────────────┘

use fastrand::Rng;

use crate::config::{ParticleConfig, PlayerConfig};
use super::entity::{Actor, Behavior};
use super::kinematics::Facing;

/// Per-tick control snapshot for the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    /// Fire key went up since the last tick.
    pub fire_released: bool,
    /// Enter/down key held (doors).
    pub enter: bool,
}

/// What the player asked for this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intent {
    pub jumped: bool,
    pub fire: Option<Facing>,
}

/// Points earned at a position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scored {
    pub at: (f32, f32),
    pub points: u32,
}

/// A bullet connecting with an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strike {
    pub enemy: usize,
    pub points: u32,
    pub killed: bool,
    pub at: (f32, f32),
}

// ── Player ──

/// Walk while a direction is held, jump from the ground, fire on release.
pub fn control_player(player: &mut Actor, input: &Controls, cfg: &PlayerConfig) -> Intent {
    let mut intent = Intent::default();
    if player.dead {
        return intent;
    }

    let mut dx = 0.0;
    if input.left {
        dx = -cfg.walk_speed;
    }
    if input.right {
        dx = cfg.walk_speed;
    }
    player.motion.set_velocity_x(dx);

    if input.jump && player.on_ground {
        player.motion.set_velocity_y(cfg.jump_speed);
        player.on_ground = false;
        intent.jumped = true;
    }

    if input.fire_released {
        intent.fire = Some(player.motion.facing());
    }
    intent
}

/// Kill the player if this enemy is alive and overlaps it.
pub fn enemy_contact(player: &mut Actor, enemy: &Actor) -> bool {
    if player.dead || enemy.dead || enemy.enemy().is_none() {
        return false;
    }
    if enemy.rect.intersects(&player.rect) {
        player.kill();
        return true;
    }
    false
}

/// Consume every pickup the player overlaps.
pub fn collect_pickups(player: &Actor, pickups: &mut [Actor]) -> Vec<Scored> {
    let mut scored = Vec::new();
    if player.dead {
        return scored;
    }
    for pickup in pickups.iter_mut().filter(|p| p.is_alive()) {
        let points = match pickup.behavior {
            Behavior::Pickup(p) => p.points,
            _ => continue,
        };
        if pickup.rect.intersects(&player.rect) {
            pickup.kill();
            scored.push(Scored { at: pickup.rect.center(), points });
        }
    }
    scored
}

/// Does the player stand in the doorway (with enter held if required)?
pub fn door_reached(door: &Actor, player: &Actor, enter_held: bool) -> bool {
    let needs_key = match door.behavior {
        Behavior::Trigger(t) => t.needs_enter_key,
        _ => return false,
    };
    player.is_alive() && door.rect.intersects(&player.rect) && (enter_held || !needs_key)
}

// ── Projectiles ──

/// Count down a bullet's lifetime; returns true when it expires.
pub fn age_projectile(bullet: &mut Actor) -> bool {
    if let Behavior::Projectile(p) = &mut bullet.behavior {
        p.age += 1;
        if p.age >= p.lifetime {
            bullet.kill();
            return true;
        }
    }
    false
}

/// Hit the first live enemy the bullet overlaps. A bullet that has
/// stopped (speed 0) deals no damage.
pub fn strike(bullet: &mut Actor, enemies: &mut [Actor]) -> Option<Strike> {
    let proj = match bullet.behavior {
        Behavior::Projectile(p) => p,
        _ => return None,
    };
    if bullet.dead || bullet.motion.speed() == 0.0 {
        return None;
    }
    let (index, target) = enemies
        .iter_mut()
        .enumerate()
        .find(|(_, e)| e.is_alive() && e.rect.intersects(&bullet.rect))?;
    let enemy = target.enemy_mut()?;
    let killed = enemy.take_damage(proj.damage);
    if killed {
        target.kill();
    }
    bullet.kill();
    Some(Strike { enemy: index, points: proj.points, killed, at: target.rect.center() })
}

// ── Particles ──

/// Count down a droplet's lifetime; returns true when it expires.
pub fn age_particle(particle: &mut Actor) -> bool {
    if let Behavior::Particle(p) = &mut particle.behavior {
        p.age += 1;
        if p.age >= p.lifetime {
            particle.kill();
            return true;
        }
    }
    false
}

/// Spray of blood droplets flying out of `center` in random directions.
pub fn blood_burst(center: (f32, f32), cfg: &ParticleConfig, rng: &mut Rng) -> Vec<Actor> {
    (0..cfg.burst)
        .map(|_| {
            let lifetime = rng.u32(cfg.lifetime_min..=cfg.lifetime_max);
            let heading = rng.u32(0..=360) as f32;
            let speed = rng.f32() * cfg.max_speed;
            Actor::particle(center, heading, speed, lifetime)
        })
        .collect()
}

//! Enemy AI: walk, bounce, pause, hop.
//!
//! Steering reads the contacts published by the previous resolver pass
//! and sets this tick's velocity. Player contact is a rule, not steering
//! (see `rules::enemy_contact`).
//!
//! ## Steering table (evaluated top to bottom)
//!
//! | Condition                                  | Effect                                |
//! |--------------------------------------------|---------------------------------------|
//! | idle cycle enabled, delay elapsed          | stop (dx = 0), remember heading       |
//! | paused, wait elapsed                       | resume remembered heading             |
//! | paused                                     | stay still, nothing else this tick    |
//! | tile RIGHT face struck or left world edge  | head right                            |
//! | tile LEFT face struck or right world edge  | head left                             |
//! | otherwise                                  | keep heading at walk speed            |
//! | jumper: tile `probe_tiles` ahead collidable | want to jump                         |
//! | jumper: wants to jump and on ground        | dy = jump speed, clear the want       |

use fastrand::Rng;

use super::entity::{Actor, Behavior, Contacts, Enemy};
use super::kinematics::{Facing, Kinematics};
use super::rect::Rect;
use super::tile::TileGrid;

/// Run one tick of enemy steering. Returns true if the enemy jumped.
/// Non-enemy actors are left untouched.
pub fn steer_enemy(actor: &mut Actor, grid: &TileGrid, rng: &mut Rng) -> bool {
    let Actor { behavior, motion, contacts, walls, on_ground, rect, .. } = actor;
    let (enemy, can_jump) = match behavior {
        Behavior::WalkingEnemy(e) => (e, false),
        Behavior::JumpingEnemy(e) => (e, true),
        _ => return false,
    };

    if !advance_idle(enemy, motion, rng) {
        return false;
    }

    let heading = bounce(*contacts, *walls).unwrap_or_else(|| motion.facing());
    motion.set_velocity_x(heading.sign() * enemy.stats.walk_speed);

    if !can_jump {
        return false;
    }
    if wall_ahead(grid, rect, heading, enemy.stats.probe_tiles) {
        enemy.wants_jump = true;
    }
    match enemy.stats.jump_speed {
        Some(speed) if enemy.wants_jump && *on_ground => {
            motion.set_velocity_y(speed);
            enemy.wants_jump = false;
            *on_ground = false;
            true
        }
        _ => false,
    }
}

/// Step the idle cycle. Returns false while the enemy stands still.
fn advance_idle(enemy: &mut Enemy, motion: &mut Kinematics, rng: &mut Rng) -> bool {
    let idle = &mut enemy.idle;
    if !idle.enabled {
        return true;
    }
    if idle.paused {
        idle.waited += 1;
        if idle.waited < enemy.stats.idle_wait {
            return false;
        }
        let resume = idle.resume;
        idle.rearm(&enemy.stats, rng);
        motion.set_velocity_x(resume.sign() * enemy.stats.walk_speed);
        return true;
    }
    idle.counter += 1;
    if idle.counter >= idle.delay {
        idle.paused = true;
        idle.resume = motion.facing();
        motion.set_velocity_x(0.0);
        return false;
    }
    true
}

/// Heading forced by last tick's collisions, if any.
pub fn bounce(contacts: Contacts, walls: Contacts) -> Option<Facing> {
    if contacts.contains(Contacts::RIGHT) || walls.contains(Contacts::LEFT) {
        Some(Facing::Right)
    } else if contacts.contains(Contacts::LEFT) || walls.contains(Contacts::RIGHT) {
        Some(Facing::Left)
    } else {
        None
    }
}

/// Is the tile `tiles` columns ahead of the rectangle's centre collidable?
pub fn wall_ahead(grid: &TileGrid, rect: &Rect, heading: Facing, tiles: i32) -> bool {
    let (ix, iy) = grid.index_at(rect.center_x(), rect.center_y());
    let step = match heading {
        Facing::Left => -tiles,
        Facing::Right => tiles,
    };
    grid.is_collidable_at(ix + step, iy)
}

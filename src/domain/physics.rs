//! Physics layer: gravity, integration and tile collision resolution.
//!
//! ## Per-tick order (for one actor)
//!
//!   1. `integrate`: mark falling if the last sweep found no support,
//!      add gravity while falling, move by (dx, dy).
//!   2. `resolve`: doom check on the moved rect, boundary clamp, then the
//!      tile sweep (skipped for doomed actors).
//!
//! ## Tile sweep
//!
//! Every tile index covered by the actor's rectangle is visited, with the
//! right/bottom bound inclusive so tiles merely *touching* the actor are
//! visited too. For each collidable tile the actor strictly overlaps, the
//! side that was struck is classified by comparing the pre-move edge with
//! the tile's opposite edge along the sign of the velocity:
//!
//!   dx > 0 and prev.right  <= tile.left   → LEFT   (snap right  = tile.left)
//!   dx < 0 and prev.left   >= tile.right  → RIGHT  (snap left   = tile.right)
//!   dy > 0 and prev.bottom <= tile.top    → TOP    (snap bottom = tile.top, landed)
//!   dy < 0 and prev.top    >= tile.bottom → BOTTOM (snap top    = tile.bottom)
//!
//! A face only counts when the neighbouring tile on that side is not
//! collidable. Seams inside floors and walls are never struck, so an
//! actor landing while crossing a seam does not snag on it.
//!
//! ## Support
//!
//! An actor is SUPPORTED when a collidable tile is covered by the sweep
//! and lies under its horizontal span (resting on it or sunk into it).
//! Walls alongside do not support. Support is what the next tick's
//! integration reads to decide whether the actor starts falling.

use super::entity::{Actor, Contacts};
use super::rect::Rect;
use super::tile::{Boundary, TileGrid, TileKind};

/// Why the resolver destroyed an actor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fatality {
    Hazard,
    OutOfWorld,
}

// ══════════════════════════════════════════════════════════════
// Integration
// ══════════════════════════════════════════════════════════════

/// Apply gravity and move. Remembers the pre-move rectangle for the sweep.
pub fn integrate(actor: &mut Actor, gravity: f32) {
    actor.prev_rect = actor.rect;
    if actor.gravity {
        if !actor.supported {
            actor.falling = true;
        }
        if actor.falling {
            actor.motion.add_velocity_y(gravity);
        }
    }
    actor.rect.translate(actor.motion.dx(), actor.motion.dy());
}

// ══════════════════════════════════════════════════════════════
// Resolution
// ══════════════════════════════════════════════════════════════

/// Resolve one actor against the world edges and the tile grid.
///
/// Publishes `contacts`, `walls`, `supported` and `on_ground` on the
/// actor. Returns the cause if the actor was destroyed this pass.
pub fn resolve(actor: &mut Actor, grid: &TileGrid, boundary: Boundary, doom_margin: f32) -> Option<Fatality> {
    debug_assert!(grid.tile_size() > 0.0);
    debug_assert!(!actor.rect.is_empty());

    actor.contacts = Contacts::empty();
    actor.walls = Contacts::empty();

    let (map_w, map_h) = grid.size_in_pixels();
    // judged on the integrated position, before any clamp pulls it back
    let doomed = beyond_doom(&actor.rect, map_w, map_h, doom_margin);

    clamp_to_boundary(actor, boundary, map_w, map_h);

    if doomed {
        actor.kill();
        actor.supported = false;
        actor.on_ground = false;
        return Some(Fatality::OutOfWorld);
    }

    let fatality = sweep_tiles(actor, grid);

    actor.supported = is_supported(&actor.rect, grid);
    actor.on_ground = actor.supported && !actor.falling;
    fatality
}

/// More than `margin` past the map extents on any side.
pub fn beyond_doom(rect: &Rect, map_w: f32, map_h: f32, margin: f32) -> bool {
    rect.left() < -margin
        || rect.right() > map_w + margin
        || rect.top() < -margin
        || rect.bottom() > map_h + margin
}

fn clamp_to_boundary(actor: &mut Actor, boundary: Boundary, map_w: f32, map_h: f32) {
    if boundary.left && actor.rect.left() < 0.0 {
        actor.rect.set_left(0.0);
        actor.motion.set_velocity_x(0.0);
        actor.walls |= Contacts::LEFT;
    }
    if boundary.right && actor.rect.right() > map_w {
        actor.rect.set_right(map_w);
        actor.motion.set_velocity_x(0.0);
        actor.walls |= Contacts::RIGHT;
    }
    if boundary.top && actor.rect.top() < 0.0 {
        actor.rect.set_top(0.0);
        actor.motion.set_velocity_y(0.0);
        actor.walls |= Contacts::TOP;
    }
    if boundary.bottom && actor.rect.bottom() > map_h {
        actor.rect.set_bottom(map_h);
        actor.motion.set_velocity_y(0.0);
        actor.walls |= Contacts::BOTTOM;
    }
}

/// Inclusive index range covered by `rect`.
fn covered(rect: &Rect, grid: &TileGrid) -> (std::ops::RangeInclusive<i32>, std::ops::RangeInclusive<i32>) {
    let (left, top) = grid.index_at(rect.left(), rect.top());
    let (right, bottom) = grid.index_at(rect.right(), rect.bottom());
    (left..=right, top..=bottom)
}

fn tile_rect(grid: &TileGrid, ix: i32, iy: i32) -> Rect {
    let (x, y) = grid.tile_origin(ix, iy);
    let ts = grid.tile_size();
    Rect::new(x, y, ts, ts)
}

fn sweep_tiles(actor: &mut Actor, grid: &TileGrid) -> Option<Fatality> {
    let (cols, rows) = covered(&actor.rect, grid);
    let velocity = (actor.motion.dx(), actor.motion.dy());
    let mut fatality = None;

    for iy in rows {
        for ix in cols.clone() {
            let id = match grid.tile_at(ix, iy) {
                Some(id) => id,
                None => continue,
            };
            let kind = grid.kind(id);
            if !kind.is_collidable() {
                continue;
            }
            if kind == TileKind::Hazard && actor.is_alive() {
                actor.kill();
                fatality = Some(Fatality::Hazard);
            }

            let tile = tile_rect(grid, ix, iy);
            let hits = struck_sides(&actor.prev_rect, &actor.rect, &tile, velocity, exposed_faces(grid, ix, iy));
            apply_hits(actor, &tile, hits);
            actor.contacts |= hits;
        }
    }
    fatality
}

/// Faces of tile `(ix, iy)` not covered by a collidable neighbour.
fn exposed_faces(grid: &TileGrid, ix: i32, iy: i32) -> Contacts {
    let mut faces = Contacts::empty();
    if !grid.is_collidable_at(ix - 1, iy) { faces |= Contacts::LEFT; }
    if !grid.is_collidable_at(ix + 1, iy) { faces |= Contacts::RIGHT; }
    if !grid.is_collidable_at(ix, iy - 1) { faces |= Contacts::TOP; }
    if !grid.is_collidable_at(ix, iy + 1) { faces |= Contacts::BOTTOM; }
    faces
}

/// Swept classification of which tile faces `cur` passed through.
/// Empty unless `cur` strictly overlaps the tile.
pub fn struck_sides(prev: &Rect, cur: &Rect, tile: &Rect, velocity: (f32, f32), exposed: Contacts) -> Contacts {
    let mut hits = Contacts::empty();
    if !cur.intersects(tile) {
        return hits;
    }
    let (dx, dy) = velocity;
    if dx > 0.0 && prev.right() <= tile.left() {
        hits |= Contacts::LEFT;
    } else if dx < 0.0 && prev.left() >= tile.right() {
        hits |= Contacts::RIGHT;
    }
    if dy > 0.0 && prev.bottom() <= tile.top() {
        hits |= Contacts::TOP;
    } else if dy < 0.0 && prev.top() >= tile.bottom() {
        hits |= Contacts::BOTTOM;
    }
    hits & exposed
}

fn apply_hits(actor: &mut Actor, tile: &Rect, hits: Contacts) {
    if hits.contains(Contacts::TOP) {
        actor.rect.set_bottom(tile.top());
        actor.motion.set_velocity_y(0.0);
        actor.falling = false;
    }
    if hits.contains(Contacts::BOTTOM) {
        actor.rect.set_top(tile.bottom());
        actor.motion.set_velocity_y(0.0);
    }
    if hits.contains(Contacts::LEFT) {
        actor.rect.set_right(tile.left());
        actor.motion.set_velocity_x(0.0);
    }
    if hits.contains(Contacts::RIGHT) {
        actor.rect.set_left(tile.right());
        actor.motion.set_velocity_x(0.0);
    }
}

/// `rect` strictly overlaps some collidable tile. Swept resolution
/// cannot push an actor out of a tile it starts inside.
pub fn overlaps_solid(rect: &Rect, grid: &TileGrid) -> bool {
    let (cols, rows) = covered(rect, grid);
    rows.into_iter().any(|iy| {
        cols.clone()
            .any(|ix| grid.is_collidable_at(ix, iy) && rect.intersects(&tile_rect(grid, ix, iy)))
    })
}

/// Collidable tile under the rectangle's horizontal span, touching or
/// overlapping it.
pub fn is_supported(rect: &Rect, grid: &TileGrid) -> bool {
    let (cols, rows) = covered(rect, grid);
    for iy in rows {
        for ix in cols.clone() {
            if !grid.is_collidable_at(ix, iy) {
                continue;
            }
            let tile = tile_rect(grid, ix, iy);
            let under_span = tile.left() < rect.right() && tile.right() > rect.left();
            if under_span && tile.bottom() > rect.top() {
                return true;
            }
        }
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::tests::grid_from;

    const GRAVITY: f32 = 0.75;
    const DOOM: f32 = 50.0;

    /// 10x10 room of 16px tiles with a solid floor on the last row
    /// (floor top at y = 144).
    fn room() -> TileGrid {
        let mut rows = vec!["          "; 9];
        rows.push("##########");
        grid_from(&rows, 16, 0)
    }

    fn body(x: f32, y: f32) -> Actor {
        let mut a = Actor::player((0.0, 0.0));
        a.rect = Rect::new(x, y, 10.0, 10.0);
        a.prev_rect = a.rect;
        a
    }

    fn tick(a: &mut Actor, grid: &TileGrid, boundary: Boundary) -> Option<Fatality> {
        integrate(a, GRAVITY);
        resolve(a, grid, boundary, DOOM)
    }

    #[test]
    fn unsupported_actor_starts_falling_with_one_gravity_step() {
        let g = room();
        let mut a = body(40.0, 40.0);
        assert!(!a.falling);
        tick(&mut a, &g, Boundary::open_bottom());
        assert!(a.falling);
        assert_eq!(a.motion.dy(), GRAVITY);
        assert_eq!(a.rect.top(), 40.75);
    }

    #[test]
    fn gravity_opt_out_never_falls() {
        let g = room();
        let mut a = body(40.0, 40.0);
        a.gravity = false;
        tick(&mut a, &g, Boundary::open_bottom());
        assert!(!a.falling);
        assert_eq!(a.motion.dy(), 0.0);
    }

    #[test]
    fn landing_snaps_to_tile_top() {
        let g = room();
        // bottom at 141, floor top at 144
        let mut a = body(40.0, 131.0);
        a.falling = true;
        a.motion.set_velocity_y(5.0);
        tick(&mut a, &g, Boundary::open_bottom());
        assert!(a.contacts.contains(Contacts::TOP));
        assert_eq!(a.rect.bottom(), 144.0);
        assert_eq!(a.motion.dy(), 0.0);
        assert!(!a.falling);
        assert!(a.supported);
        assert!(a.on_ground);
    }

    #[test]
    fn resting_actor_stays_put_without_contacts() {
        let g = room();
        let mut a = body(40.0, 134.0);
        a.supported = true;
        for _ in 0..5 {
            tick(&mut a, &g, Boundary::open_bottom());
        }
        assert_eq!(a.rect.bottom(), 144.0);
        assert!(a.contacts.is_empty());
        assert!(!a.falling);
        assert!(a.on_ground);
    }

    #[test]
    fn landing_across_a_floor_seam_keeps_horizontal_speed() {
        let g = room();
        // right edge crosses x = 32 (a seam between floor tiles) while landing
        let mut a = body(20.0, 131.0);
        a.falling = true;
        a.motion.set_velocity(5.0, 5.0);
        tick(&mut a, &g, Boundary::open_bottom());
        assert_eq!(a.contacts, Contacts::TOP);
        assert_eq!(a.motion.dx(), 5.0);
        assert_eq!(a.rect.left(), 25.0);
    }

    #[test]
    fn running_into_wall_from_left() {
        let g = grid_from(&["    #", "    #", "#####"], 16, 0);
        let mut a = body(50.0, 22.0);
        a.supported = true;
        a.motion.set_velocity_x(5.0);
        tick(&mut a, &g, Boundary::open_bottom());
        assert!(a.contacts.contains(Contacts::LEFT));
        assert_eq!(a.rect.right(), 64.0);
        assert_eq!(a.motion.dx(), 0.0);
    }

    #[test]
    fn running_into_wall_from_right() {
        let g = grid_from(&["#    ", "#    ", "#####"], 16, 0);
        let mut a = body(18.0, 22.0);
        a.supported = true;
        a.motion.set_velocity_x(-5.0);
        tick(&mut a, &g, Boundary::open_bottom());
        assert!(a.contacts.contains(Contacts::RIGHT));
        assert_eq!(a.rect.left(), 16.0);
        assert_eq!(a.motion.dx(), 0.0);
    }

    #[test]
    fn head_bump_stops_upward_motion() {
        let g = grid_from(&["#####", "     ", "     ", "#####"], 16, 0);
        let mut a = body(20.0, 18.0);
        a.supported = true;
        a.motion.set_velocity_y(-5.0);
        tick(&mut a, &g, Boundary::open_bottom());
        assert!(a.contacts.contains(Contacts::BOTTOM));
        assert_eq!(a.rect.top(), 16.0);
        assert_eq!(a.motion.dy(), 0.0);
    }

    #[test]
    fn wall_alongside_does_not_hold_actor_up() {
        let g = grid_from(&["    #", "    #", "    #", "    #"], 16, 0);
        // pushing off the ground right next to the wall
        let mut a = body(54.0, 20.0);
        a.supported = true;
        a.motion.set_velocity_y(-4.0);
        tick(&mut a, &g, Boundary::open_bottom());
        assert!(!a.supported, "touching a wall is not support");
        tick(&mut a, &g, Boundary::open_bottom());
        assert!(a.falling);
    }

    #[test]
    fn boundary_clamps_and_reports_wall() {
        let g = room();
        let mut a = body(2.0, 134.0);
        a.supported = true;
        a.motion.set_velocity_x(-5.0);
        tick(&mut a, &g, Boundary::open_bottom());
        assert_eq!(a.rect.left(), 0.0);
        assert_eq!(a.motion.dx(), 0.0);
        assert_eq!(a.walls, Contacts::LEFT);
        assert!(a.contacts.is_empty());
    }

    #[test]
    fn open_bottom_lets_actor_leave_then_dooms_it() {
        let g = grid_from(&["   ", "   "], 16, 0);
        let mut a = body(10.0, 20.0);
        a.falling = true;
        let mut fate = None;
        for _ in 0..40 {
            fate = tick(&mut a, &g, Boundary::open_bottom());
            if fate.is_some() {
                break;
            }
        }
        assert_eq!(fate, Some(Fatality::OutOfWorld));
        assert!(a.dead);
        assert!(a.rect.bottom() > 32.0 + DOOM);
    }

    #[test]
    fn doom_applies_even_with_solid_boundaries() {
        let g = room();
        let mut a = body(100.0, 40.0);
        a.gravity = false;
        a.motion.set_velocity_x(400.0);
        let fate = tick(&mut a, &g, Boundary::new(true, true, true, true));
        assert_eq!(fate, Some(Fatality::OutOfWorld));
        assert!(a.dead);
    }

    #[test]
    fn within_margin_survives() {
        let g = grid_from(&["   ", "   "], 16, 0);
        let mut a = body(10.0, 70.0);
        a.gravity = false;
        assert!(tick(&mut a, &g, Boundary::open_bottom()).is_none());
        assert!(!a.dead);
    }

    #[test]
    fn hazard_kills_on_contact() {
        let g = grid_from(&["     ", "     ", "#^###"], 16, 0);
        let mut a = body(18.0, 20.0);
        a.falling = true;
        a.motion.set_velocity_y(4.0);
        let fate = tick(&mut a, &g, Boundary::open_bottom());
        assert_eq!(fate, Some(Fatality::Hazard));
        assert!(a.dead);
    }

    #[test]
    fn sweep_near_negative_coordinates_is_safe() {
        let g = grid_from(&["##", "##"], 16, 0);
        let mut a = body(-30.0, -30.0);
        a.gravity = false;
        assert!(tick(&mut a, &g, Boundary::default()).is_none());
        assert!(!a.supported);
    }

    #[test]
    fn corner_entry_reports_both_sides() {
        let tile = Rect::new(16.0, 16.0, 16.0, 16.0);
        let prev = Rect::new(4.0, 4.0, 10.0, 10.0);
        let cur = Rect::new(8.0, 8.0, 10.0, 10.0);
        let all = Contacts::all();
        let hits = struck_sides(&prev, &cur, &tile, (4.0, 4.0), all);
        assert_eq!(hits, Contacts::LEFT | Contacts::TOP);
        // hidden faces are never struck
        let hits = struck_sides(&prev, &cur, &tile, (4.0, 4.0), Contacts::TOP);
        assert_eq!(hits, Contacts::TOP);
    }

    #[test]
    fn static_overlap_without_crossing_is_not_a_hit() {
        let tile = Rect::new(16.0, 16.0, 16.0, 16.0);
        let prev = Rect::new(20.0, 20.0, 4.0, 4.0);
        let cur = Rect::new(22.0, 20.0, 4.0, 4.0);
        assert!(struck_sides(&prev, &cur, &tile, (2.0, 0.0), Contacts::all()).is_empty());
    }

    #[test]
    fn touching_a_tile_is_not_overlapping_it() {
        let grid = room();
        assert!(!overlaps_solid(&Rect::new(20.0, 134.0, 8.0, 10.0), &grid));
        assert!(overlaps_solid(&Rect::new(20.0, 140.0, 8.0, 10.0), &grid));
        assert!(!overlaps_solid(&Rect::new(-30.0, -30.0, 8.0, 8.0), &grid));
    }
}

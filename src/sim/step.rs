//! The step function: advances the world by one tick.
//!
//! Processing order:
//!   1. Behaviors, in fixed group order:
//!        player → enemies (steer, then touch the player) → pickups
//!        → triggers → projectiles (age, strike) → particles (age)
//!   2. Integration (gravity + move) for every live colliding actor
//!   3. Tile resolution for every live colliding actor, then animation
//!   4. Cleanup: respawn countdown, one-shot death effects, removal of
//!      the dead, insertion of actors spawned this tick
//!   5. Camera
//!
//! Overlap rules read the rectangles as they stand when the rule runs,
//! so the group order above decides ties: an enemy touching the player
//! kills it before a bullet in the same spot kills the enemy.
//! Actors spawned during a tick (bullets, blood) join their group in
//! cleanup and first move on the next tick.

use crate::domain::ai;
use crate::domain::entity::{Actor, BULLET_SIZE};
use crate::domain::kinematics::Facing;
use crate::domain::physics;
use crate::domain::rules::{self, Controls};
use super::event::{GameEvent, LevelSignal};
use super::level::Level;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, controls: &Controls) -> Vec<GameEvent> {
    if !world.is_running() {
        return vec![];
    }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    let spawned = run_behaviors(world, controls, &mut events);
    integrate_all(&mut world.level, world.config.physics.gravity);
    resolve_all(&mut world.level, world.config.physics.doom_margin);
    cleanup(world, spawned, &mut events);
    world.update_camera();

    events
}

// ══════════════════════════════════════════════════════════════
// 1. Behaviors
// ══════════════════════════════════════════════════════════════

/// Returns the projectiles fired this tick.
fn run_behaviors(world: &mut WorldState, controls: &Controls, events: &mut Vec<GameEvent>) -> Vec<Actor> {
    let WorldState { level, rng, config, score, signal, .. } = world;
    let mut fired = Vec::new();

    // ── Player ──
    if level.player.is_alive() {
        let intent = rules::control_player(&mut level.player, controls, &config.player);
        if intent.jumped {
            events.push(GameEvent::Jumped);
        }
        if let Some(facing) = intent.fire {
            let at = muzzle(&level.player, facing);
            let bullet = Actor::projectile(at, facing, &config.projectile);
            // muzzle pressed into a wall
            if physics::overlaps_solid(&bullet.rect, &level.grid) {
                log::trace!("shot smothered at ({:.0}, {:.0})", at.0, at.1);
            } else {
                fired.push(bullet);
                events.push(GameEvent::Shot { x: at.0, y: at.1 });
            }
        }
    }

    // ── Enemies ──
    for enemy in level.enemies.iter_mut().filter(|e| e.is_alive()) {
        if ai::steer_enemy(enemy, &level.grid, rng) {
            log::trace!("{:?} hops at {:?}", enemy.kind(), enemy.rect.center());
        }
        if rules::enemy_contact(&mut level.player, enemy) {
            log::debug!("player touched by {:?}", enemy.kind());
        }
    }

    // ── Pickups ──
    for got in rules::collect_pickups(&level.player, &mut level.pickups) {
        *score += got.points;
        events.push(GameEvent::CoinCollected { x: got.at.0, y: got.at.1, points: got.points });
    }

    // ── Triggers ──
    if *signal == LevelSignal::None
        && level.triggers.iter().any(|door| rules::door_reached(door, &level.player, controls.enter))
    {
        *signal = LevelSignal::AdvanceToNext;
        events.push(GameEvent::DoorEntered);
    }

    // ── Projectiles ──
    for bullet in level.projectiles.iter_mut().filter(|b| b.is_alive()) {
        if rules::age_projectile(bullet) {
            continue;
        }
        if let Some(hit) = rules::strike(bullet, &mut level.enemies) {
            *score += hit.points;
            events.push(GameEvent::EnemyHit { x: hit.at.0, y: hit.at.1, points: hit.points });
        }
    }

    // ── Particles ──
    for drop in level.particles.iter_mut().filter(|p| p.is_alive()) {
        rules::age_particle(drop);
    }

    fired
}

/// Spawn point just ahead of the player's leading side.
fn muzzle(player: &Actor, facing: Facing) -> (f32, f32) {
    let half = BULLET_SIZE.0 / 2.0;
    let x = match facing {
        Facing::Right => player.rect.right() + half,
        Facing::Left => player.rect.left() - half,
    };
    (x, player.rect.center_y())
}

// ══════════════════════════════════════════════════════════════
// 2–3. Physics
// ══════════════════════════════════════════════════════════════

fn integrate_all(level: &mut Level, gravity: f32) {
    for actor in level.colliding_mut().filter(|a| a.is_alive()) {
        physics::integrate(actor, gravity);
    }
}

fn resolve_all(level: &mut Level, doom_margin: f32) {
    let Level { grid, boundary, player, enemies, pickups, projectiles, particles, triggers, .. } = level;
    let colliding = std::iter::once(player)
        .chain(enemies.iter_mut())
        .chain(pickups.iter_mut())
        .chain(projectiles.iter_mut())
        .chain(particles.iter_mut());

    for actor in colliding.filter(|a| a.is_alive()) {
        if let Some(cause) = physics::resolve(actor, grid, *boundary, doom_margin) {
            log::trace!("{:?} destroyed: {:?}", actor.kind(), cause);
        }
        actor.animate();
    }
    for door in triggers.iter_mut() {
        door.animate();
    }
}

// ══════════════════════════════════════════════════════════════
// 4. Cleanup
// ══════════════════════════════════════════════════════════════

fn cleanup(world: &mut WorldState, fired: Vec<Actor>, events: &mut Vec<GameEvent>) {
    let respawn = tick_respawn(world, events);

    let WorldState { level, rng, config, phase, respawn_timer, lives, .. } = world;
    let mut blood = Vec::new();

    // ── One-shot death effects ──
    let player = &mut level.player;
    if player.dead && !player.death_handled {
        player.death_handled = true;
        let (x, y) = player.rect.center();
        blood.extend(rules::blood_burst((x, y), &config.particles, rng));
        events.push(GameEvent::PlayerKilled { x, y });
        *phase = Phase::Dying;
        *respawn_timer = config.player.respawn_delay.max(1);
        log::debug!("player died at ({:.0}, {:.0}) with {} lives", x, y, lives);
    }
    for enemy in level.enemies.iter_mut().filter(|e| e.dead && !e.death_handled) {
        enemy.death_handled = true;
        let (x, y) = enemy.rect.center();
        blood.extend(rules::blood_burst((x, y), &config.particles, rng));
        events.push(GameEvent::EnemyKilled { x, y });
        log::debug!("{:?} died at ({:.0}, {:.0})", enemy.kind(), x, y);
    }

    // ── Group maintenance ──
    level.enemies.retain(Actor::is_alive);
    level.pickups.retain(Actor::is_alive);
    level.projectiles.retain(Actor::is_alive);
    level.particles.retain(Actor::is_alive);
    level.projectiles.extend(fired);
    level.particles.extend(blood);

    if respawn {
        world.respawn_player();
        events.push(GameEvent::PlayerRespawned);
    }
}

/// Count down a pending respawn. On expiry a life is lost; returns true
/// when the player should come back.
fn tick_respawn(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.phase != Phase::Dying {
        return false;
    }
    world.respawn_timer = world.respawn_timer.saturating_sub(1);
    if world.respawn_timer > 0 {
        return false;
    }

    world.lives = world.lives.saturating_sub(1);
    events.push(GameEvent::LifeLost { remaining: world.lives });
    log::debug!("life lost, {} remaining", world.lives);
    if world.lives > 0 {
        return true;
    }

    world.phase = Phase::GameOver;
    world.signal = LevelSignal::GameOver;
    events.push(GameEvent::GameOver { score: world.score });
    log::info!("game over with score {}", world.score);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnemyConfig, GameConfig};
    use crate::sim::level::{EntitySpawn, LevelData};
    use fastrand::Rng;

    /// 20 playable columns of 16 px, floor on row 9 (top at y = 144).
    fn arena_data(entities: Vec<EntitySpawn>) -> LevelData {
        let mut tiles = vec![vec![0; 21]; 10];
        tiles[9] = vec![1; 21];
        LevelData {
            name: "arena".to_string(),
            tiles,
            tile_size: 16,
            images: vec!["brick.png".to_string()],
            image_dir: String::new(),
            start: (40, 128),
            entities,
        }
    }

    fn arena_with(config: GameConfig) -> WorldState {
        let data = arena_data(vec![]);
        let mut world = WorldState::new(vec![data.clone(), data], config).unwrap();
        // let the player land
        step(&mut world, &Controls::default());
        assert!(world.level.player.on_ground);
        world
    }

    fn arena() -> WorldState {
        arena_with(GameConfig { seed: Some(3), ..GameConfig::default() })
    }

    fn frail_enemy(at: (f32, f32), rng: &mut Rng) -> Actor {
        let stats = EnemyConfig { health: 10, ..EnemyConfig::goomba() };
        Actor::walking_enemy(at, stats, rng)
    }

    fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn jump_impulse_waits_a_tick_for_gravity() {
        let mut world = arena();
        let jump = Controls { right: true, jump: true, ..Default::default() };
        let events = step(&mut world, &jump);
        let p = &world.level.player;
        assert_eq!(events, vec![GameEvent::Jumped]);
        assert_eq!(p.motion.dx(), 5.0);
        assert_eq!(p.motion.dy(), -10.0);
        assert!(!p.on_ground);
        assert!(!p.falling);

        step(&mut world, &Controls { right: true, ..Default::default() });
        let p = &world.level.player;
        assert!(p.falling);
        assert_eq!(p.motion.dy(), -9.25);
    }

    #[test]
    fn enemy_contact_beats_bullet_in_same_tick() {
        let mut world = arena();
        let at = world.level.player.rect.center();
        let enemy = frail_enemy(at, &mut world.rng);
        world.level.enemies.push(enemy);
        let bullet = Actor::projectile(at, Facing::Right, &world.config.projectile);
        world.level.projectiles.push(bullet);

        let events = step(&mut world, &Controls::default());
        assert_eq!(count(&events, |e| matches!(e, GameEvent::PlayerKilled { .. })), 1);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::EnemyKilled { .. })), 1);
        assert_eq!(world.score, 10);
        assert!(world.level.enemies.is_empty());
        assert!(world.level.projectiles.is_empty());
        assert_eq!(world.phase, Phase::Dying);
    }

    #[test]
    fn second_bullet_survives_a_kill() {
        let mut world = arena();
        let at = (200.0, 132.0);
        let enemy = frail_enemy(at, &mut world.rng);
        world.level.enemies.push(enemy);
        for _ in 0..2 {
            let bullet = Actor::projectile(at, Facing::Right, &world.config.projectile);
            world.level.projectiles.push(bullet);
        }

        let events = step(&mut world, &Controls::default());
        assert_eq!(count(&events, |e| matches!(e, GameEvent::EnemyHit { .. })), 1);
        assert!(world.level.enemies.is_empty());
        assert_eq!(world.level.projectiles.len(), 1);
        assert_eq!(world.score, 10);
    }

    #[test]
    fn stopped_bullet_is_harmless() {
        let mut world = arena();
        let at = (200.0, 132.0);
        let enemy = frail_enemy(at, &mut world.rng);
        world.level.enemies.push(enemy);
        let mut bullet = Actor::projectile(at, Facing::Right, &world.config.projectile);
        bullet.motion.set_velocity_x(0.0);
        world.level.projectiles.push(bullet);

        let events = step(&mut world, &Controls::default());
        assert!(events.is_empty());
        assert_eq!(world.level.enemies[0].enemy().unwrap().health, 10);
        assert_eq!(world.level.projectiles.len(), 1);
    }

    #[test]
    fn fired_bullet_joins_next_tick() {
        let mut world = arena();
        let right_edge = world.level.player.rect.right();
        let events = step(&mut world, &Controls { fire_released: true, ..Default::default() });
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Shot { .. })), 1);
        assert_eq!(world.level.projectiles.len(), 1);
        let bullet = &world.level.projectiles[0];
        assert!(bullet.rect.left() >= right_edge);
        let x0 = bullet.rect.left();

        step(&mut world, &Controls::default());
        assert_eq!(world.level.projectiles[0].rect.left(), x0 + 20.0);
    }

    #[test]
    fn coin_scores_once() {
        let mut world = arena();
        let at = world.level.player.rect.center();
        world.level.pickups.push(Actor::coin(at, 25));
        let events = step(&mut world, &Controls::default());
        assert_eq!(count(&events, |e| matches!(e, GameEvent::CoinCollected { points: 25, .. })), 1);
        assert_eq!(world.score, 25);
        assert!(world.level.pickups.is_empty());
        assert!(step(&mut world, &Controls::default()).is_empty());
    }

    #[test]
    fn door_raises_transition_signal() {
        let mut world = arena();
        let at = world.level.player.rect.center();
        world.level.triggers.push(Actor::door(at, false));
        world.score = 40;
        let events = step(&mut world, &Controls::default());
        assert_eq!(events, vec![GameEvent::DoorEntered]);
        assert_eq!(world.signal, LevelSignal::AdvanceToNext);

        let events = world.apply_signal().unwrap();
        assert!(matches!(events.as_slice(), [GameEvent::LevelLoaded { index: 1, .. }]));
        assert_eq!(world.score, 40);
        assert!(world.level.triggers.is_empty());
    }

    #[test]
    fn door_with_enter_key_waits_for_it() {
        let mut world = arena_with(GameConfig { seed: Some(3), ..GameConfig::default() });
        let at = world.level.player.rect.center();
        world.level.triggers.push(Actor::door(at, true));
        assert!(step(&mut world, &Controls::default()).is_empty());
        let events = step(&mut world, &Controls { enter: true, ..Default::default() });
        assert_eq!(events, vec![GameEvent::DoorEntered]);
    }

    #[test]
    fn death_bleeds_once_then_respawns() {
        let mut config = GameConfig { seed: Some(5), ..GameConfig::default() };
        config.player.respawn_delay = 3;
        let mut world = arena_with(config);
        world.level.player.kill();

        let events = step(&mut world, &Controls::default());
        assert_eq!(count(&events, |e| matches!(e, GameEvent::PlayerKilled { .. })), 1);
        assert_eq!(world.level.particles.len(), 50);
        assert_eq!(world.phase, Phase::Dying);

        let mut later = Vec::new();
        for _ in 0..3 {
            later.extend(step(&mut world, &Controls { right: true, ..Default::default() }));
        }
        assert_eq!(count(&later, |e| matches!(e, GameEvent::PlayerKilled { .. })), 0);
        assert!(later.contains(&GameEvent::LifeLost { remaining: 2 }));
        assert!(later.contains(&GameEvent::PlayerRespawned));
        assert_eq!(world.phase, Phase::Playing);
        assert_eq!(world.lives, 2);
        assert_eq!(world.level.player.rect.center(), world.level.start);
    }

    #[test]
    fn last_life_ends_the_game() {
        let mut config = GameConfig { seed: Some(6), ..GameConfig::default() };
        config.player.respawn_delay = 1;
        config.player.lives = 1;
        let mut world = arena_with(config);
        world.score = 75;
        world.level.player.kill();

        step(&mut world, &Controls::default());
        let events = step(&mut world, &Controls::default());
        assert_eq!(events, vec![GameEvent::LifeLost { remaining: 0 }, GameEvent::GameOver { score: 75 }]);
        assert_eq!(world.phase, Phase::GameOver);
        assert_eq!(world.signal, LevelSignal::GameOver);
        assert!(step(&mut world, &Controls::default()).is_empty());
    }

    #[test]
    fn spikes_kill_the_player() {
        let mut data = arena_data(vec![]);
        data.images = vec!["tile.png".to_string(); 20];
        data.tiles[9][2] = 20;
        let mut world = WorldState::new(vec![data], GameConfig { seed: Some(1), ..GameConfig::default() }).unwrap();
        let events = step(&mut world, &Controls::default());
        assert_eq!(count(&events, |e| matches!(e, GameEvent::PlayerKilled { .. })), 1);
    }

    #[test]
    fn camera_tracks_player_within_map() {
        let mut world = arena();
        // arena is 320 x 160, smaller than the default viewport
        assert_eq!(world.camera.scroll, (0.0, 0.0));
        world.camera.viewport = (100.0, 100.0);
        step(&mut world, &Controls::default());
        let (cx, _) = world.level.player.rect.center();
        assert_eq!(world.camera.scroll.0, (cx - 50.0).max(0.0));
        assert_eq!(world.camera.scroll.1, 60.0);
    }

    #[test]
    fn point_blank_shot_into_a_wall_is_smothered() {
        // three-tile wall at x 96..144, a target standing behind it
        let mut data = arena_data(vec![]);
        for row in data.tiles.iter_mut().take(9).skip(4) {
            row[6..9].fill(1);
        }
        let config = GameConfig { seed: Some(3), ..GameConfig::default() };
        let mut world = WorldState::new(vec![data], config).unwrap();
        let walk = Controls { right: true, ..Default::default() };
        for _ in 0..15 {
            step(&mut world, &walk);
        }
        assert_eq!(world.level.player.rect.right(), 96.0);

        let stats = EnemyConfig { health: 10, walk_speed: 0.0, ..EnemyConfig::goomba() };
        let target = Actor::walking_enemy((170.0, 132.0), stats, &mut world.rng);
        world.level.enemies.push(target);

        let mut events = step(&mut world, &Controls { fire_released: true, ..Default::default() });
        for _ in 0..10 {
            events.extend(step(&mut world, &Controls::default()));
        }
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Shot { .. })), 0);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::EnemyHit { .. })), 0);
        assert!(world.level.projectiles.is_empty());
        assert_eq!(world.level.enemies[0].enemy().unwrap().health, 10);
    }
}

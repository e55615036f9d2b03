//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to the stock tunables if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::tile::{DEFAULT_EDGE_TRIM, DOOM_MARGIN};

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    pub goomba: EnemyConfig,
    pub shyguy: EnemyConfig,
    pub projectile: ProjectileConfig,
    pub coin: CoinConfig,
    pub particles: ParticleConfig,
    pub door: DoorConfig,
    pub levels_dir: PathBuf,
    pub viewport: (f32, f32),
    pub seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Added to dy every tick an actor is falling (px/tick²).
    pub gravity: f32,
    /// Distance past the map extents at which actors are destroyed.
    pub doom_margin: f32,
    /// Unused right-hand border columns in level data.
    pub edge_trim: usize,
    pub tick_rate_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerConfig {
    pub walk_speed: f32,
    pub jump_speed: f32,
    pub lives: u32,
    /// Ticks between the player's death and the respawn/life loss.
    pub respawn_delay: u32,
}

/// Tunables shared by both enemy variants. A walking enemy simply has
/// no `jump_speed`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyConfig {
    pub walk_speed: f32,
    pub jump_speed: Option<f32>,
    pub health: i32,
    pub idles: bool,
    pub idle_delay_min: u32,
    pub idle_delay_max: u32,
    pub idle_wait: u32,
    /// How many tiles ahead of its centre a jumping enemy looks for a wall.
    pub probe_tiles: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub lifetime: u32,
    pub damage: i32,
    pub points: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoinConfig {
    pub points: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleConfig {
    pub burst: u32,
    pub lifetime_min: u32,
    pub lifetime_max: u32,
    pub max_speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoorConfig {
    /// Require the enter key while overlapping a door.
    pub needs_enter_key: bool,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    goomba: TomlEnemy,
    #[serde(default)]
    shyguy: TomlEnemy,
    #[serde(default)]
    projectile: TomlProjectile,
    #[serde(default)]
    coin: TomlCoin,
    #[serde(default)]
    particles: TomlParticles,
    #[serde(default)]
    door: TomlDoor,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_doom_margin")]
    doom_margin: f32,
    #[serde(default = "default_edge_trim")]
    edge_trim: usize,
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_player_walk")]
    walk_speed: f32,
    #[serde(default = "default_player_jump")]
    jump_speed: f32,
    #[serde(default = "default_lives")]
    lives: u32,
    #[serde(default = "default_respawn_delay")]
    respawn_delay: u32,
}

/// Enemy sections have per-variant defaults, so missing keys inside a
/// present section are filled from the stock values of that section.
#[derive(Deserialize, Debug, Default)]
struct TomlEnemy {
    walk_speed: Option<f32>,
    jump_speed: Option<f32>,
    health: Option<i32>,
    idles: Option<bool>,
    idle_delay_min: Option<u32>,
    idle_delay_max: Option<u32>,
    idle_wait: Option<u32>,
    probe_tiles: Option<i32>,
}

#[derive(Deserialize, Debug)]
struct TomlProjectile {
    #[serde(default = "default_bullet_speed")]
    speed: f32,
    #[serde(default = "default_bullet_lifetime")]
    lifetime: u32,
    #[serde(default = "default_bullet_damage")]
    damage: i32,
    #[serde(default = "default_bullet_points")]
    points: u32,
}

#[derive(Deserialize, Debug)]
struct TomlCoin {
    #[serde(default = "default_coin_points")]
    points: u32,
}

#[derive(Deserialize, Debug)]
struct TomlParticles {
    #[serde(default = "default_burst")]
    burst: u32,
    #[serde(default = "default_particle_min")]
    lifetime_min: u32,
    #[serde(default = "default_particle_max")]
    lifetime_max: u32,
    #[serde(default = "default_particle_speed")]
    max_speed: f32,
}

#[derive(Deserialize, Debug, Default)]
struct TomlDoor {
    #[serde(default)]
    needs_enter_key: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_viewport_width")]
    viewport_width: f32,
    #[serde(default = "default_viewport_height")]
    viewport_height: f32,
    #[serde(default)]
    seed: Option<u64>,
}

// ── Defaults ──

fn default_gravity() -> f32 { 0.75 }
fn default_doom_margin() -> f32 { DOOM_MARGIN }
fn default_edge_trim() -> usize { DEFAULT_EDGE_TRIM }
fn default_tick_rate() -> u64 { 33 }     // ~30 Hz

fn default_player_walk() -> f32 { 5.0 }
fn default_player_jump() -> f32 { -10.0 }
fn default_lives() -> u32 { 3 }
fn default_respawn_delay() -> u32 { 100 }

fn default_bullet_speed() -> f32 { 20.0 }
fn default_bullet_lifetime() -> u32 { 250 }
fn default_bullet_damage() -> i32 { 10 }
fn default_bullet_points() -> u32 { 10 }
fn default_coin_points() -> u32 { 25 }

fn default_burst() -> u32 { 50 }
fn default_particle_min() -> u32 { 200 }
fn default_particle_max() -> u32 { 350 }
fn default_particle_speed() -> f32 { 15.0 }

fn default_levels_dir() -> String { "levels".into() }
fn default_viewport_width() -> f32 { 800.0 }
fn default_viewport_height() -> f32 { 600.0 }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            doom_margin: default_doom_margin(),
            edge_trim: default_edge_trim(),
            tick_rate_ms: default_tick_rate(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            walk_speed: default_player_walk(),
            jump_speed: default_player_jump(),
            lives: default_lives(),
            respawn_delay: default_respawn_delay(),
        }
    }
}

impl Default for TomlProjectile {
    fn default() -> Self {
        TomlProjectile {
            speed: default_bullet_speed(),
            lifetime: default_bullet_lifetime(),
            damage: default_bullet_damage(),
            points: default_bullet_points(),
        }
    }
}

impl Default for TomlCoin {
    fn default() -> Self {
        TomlCoin { points: default_coin_points() }
    }
}

impl Default for TomlParticles {
    fn default() -> Self {
        TomlParticles {
            burst: default_burst(),
            lifetime_min: default_particle_min(),
            lifetime_max: default_particle_max(),
            max_speed: default_particle_speed(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            seed: None,
        }
    }
}

impl TomlEnemy {
    fn resolve(&self, stock: EnemyConfig) -> EnemyConfig {
        let mut cfg = EnemyConfig {
            walk_speed: self.walk_speed.unwrap_or(stock.walk_speed),
            jump_speed: self.jump_speed.or(stock.jump_speed),
            health: self.health.unwrap_or(stock.health),
            idles: self.idles.unwrap_or(stock.idles),
            idle_delay_min: self.idle_delay_min.unwrap_or(stock.idle_delay_min),
            idle_delay_max: self.idle_delay_max.unwrap_or(stock.idle_delay_max),
            idle_wait: self.idle_wait.unwrap_or(stock.idle_wait),
            probe_tiles: self.probe_tiles.unwrap_or(stock.probe_tiles),
        };
        if cfg.idle_delay_min > cfg.idle_delay_max {
            log::warn!(
                "idle delay window {}..={} is inverted, swapping",
                cfg.idle_delay_min, cfg.idle_delay_max
            );
            std::mem::swap(&mut cfg.idle_delay_min, &mut cfg.idle_delay_max);
        }
        cfg
    }
}

// ── Stock values ──

impl EnemyConfig {
    /// Walks back and forth, never idles, cannot jump.
    pub fn goomba() -> Self {
        EnemyConfig {
            walk_speed: 4.0,
            jump_speed: None,
            health: 30,
            idles: false,
            idle_delay_min: 60,
            idle_delay_max: 120,
            idle_wait: 80,
            probe_tiles: 2,
        }
    }

    /// Slower walker that hops over walls and pauses now and then.
    pub fn shyguy() -> Self {
        EnemyConfig {
            walk_speed: 3.0,
            jump_speed: Some(-8.0),
            health: 50,
            idles: true,
            idle_delay_min: 300,
            idle_delay_max: 400,
            idle_wait: 80,
            probe_tiles: 2,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_schema(TomlConfig::default(), PathBuf::from(default_levels_dir()))
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        let levels_dir_str = toml_cfg.general.levels_dir.clone();
        let levels_dir = if PathBuf::from(&levels_dir_str).is_absolute() {
            PathBuf::from(&levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(&levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(&levels_dir_str))
        };

        GameConfig::from_schema(toml_cfg, levels_dir)
    }

    /// Parse a config document directly. Relative `levels_dir` values are
    /// kept as written.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg: TomlConfig = toml::from_str(text)?;
        let levels_dir = PathBuf::from(&cfg.general.levels_dir);
        Ok(GameConfig::from_schema(cfg, levels_dir))
    }

    fn from_schema(cfg: TomlConfig, levels_dir: PathBuf) -> Self {
        GameConfig {
            physics: PhysicsConfig {
                gravity: cfg.physics.gravity,
                doom_margin: cfg.physics.doom_margin,
                edge_trim: cfg.physics.edge_trim,
                tick_rate_ms: cfg.physics.tick_rate_ms.max(1),
            },
            player: PlayerConfig {
                walk_speed: cfg.player.walk_speed,
                jump_speed: cfg.player.jump_speed,
                lives: cfg.player.lives,
                respawn_delay: cfg.player.respawn_delay,
            },
            goomba: cfg.goomba.resolve(EnemyConfig::goomba()),
            shyguy: cfg.shyguy.resolve(EnemyConfig::shyguy()),
            projectile: ProjectileConfig {
                speed: cfg.projectile.speed,
                lifetime: cfg.projectile.lifetime,
                damage: cfg.projectile.damage,
                points: cfg.projectile.points,
            },
            coin: CoinConfig { points: cfg.coin.points },
            particles: ParticleConfig {
                burst: cfg.particles.burst,
                lifetime_min: cfg.particles.lifetime_min.min(cfg.particles.lifetime_max),
                lifetime_max: cfg.particles.lifetime_max.max(cfg.particles.lifetime_min),
                max_speed: cfg.particles.max_speed,
            },
            door: DoorConfig { needs_enter_key: cfg.door.needs_enter_key },
            levels_dir,
            viewport: (cfg.general.viewport_width, cfg.general.viewport_height),
            seed: cfg.general.seed,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::info!("loaded {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_stock_values() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.physics.gravity, 0.75);
        assert_eq!(cfg.physics.doom_margin, 50.0);
        assert_eq!(cfg.physics.edge_trim, 1);
        assert_eq!(cfg.player.jump_speed, -10.0);
        assert_eq!(cfg.player.lives, 3);
        assert_eq!(cfg.goomba, EnemyConfig::goomba());
        assert_eq!(cfg.shyguy, EnemyConfig::shyguy());
        assert_eq!(cfg.projectile.lifetime, 250);
        assert_eq!(cfg.coin.points, 25);
        assert!(!cfg.door.needs_enter_key);
        assert_eq!(cfg.viewport, (800.0, 600.0));
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn partial_enemy_section_keeps_variant_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[shyguy]\nhealth = 70\n\n[goomba]\nidles = true\n",
        )
        .unwrap();
        assert_eq!(cfg.shyguy.health, 70);
        assert_eq!(cfg.shyguy.jump_speed, Some(-8.0));
        assert_eq!(cfg.shyguy.walk_speed, 3.0);
        assert!(cfg.goomba.idles);
        assert_eq!(cfg.goomba.jump_speed, None);
        assert_eq!(cfg.goomba.health, 30);
    }

    #[test]
    fn inverted_windows_are_normalized() {
        let cfg = GameConfig::from_toml_str(
            "[goomba]\nidle_delay_min = 90\nidle_delay_max = 10\n\n[particles]\nlifetime_min = 9\nlifetime_max = 3\n",
        )
        .unwrap();
        assert_eq!((cfg.goomba.idle_delay_min, cfg.goomba.idle_delay_max), (10, 90));
        assert_eq!((cfg.particles.lifetime_min, cfg.particles.lifetime_max), (3, 9));
    }

    #[test]
    fn general_section() {
        let cfg = GameConfig::from_toml_str(
            "[general]\nseed = 7\nviewport_width = 320.0\nlevels_dir = \"maps\"\n",
        )
        .unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.viewport, (320.0, 600.0));
        assert_eq!(cfg.levels_dir, PathBuf::from("maps"));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(GameConfig::from_toml_str("[physics]\ngravity = \"heavy\"\n").is_err());
    }
}

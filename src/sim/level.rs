//! Level records, loading and assembly.
//!
//! ## Sources (priority order):
//!   1. `levels_dir` (every `*.toml` file, sorted by file name)
//!   2. Built-in embedded levels
//!
//! A broken level file is an error, not a reason to skip to the next
//! source. Embedded levels are only used when the directory is missing
//! or holds no level files.
//!
//! ## Level file format (`.toml`):
//!   ```toml
//!   name = "Mushroom Meadow"
//!   tile_size = 32
//!   image_dir = "tiles"
//!   images = ["brick.png", "stone.png"]    # image n-1 draws tile id n
//!   start = [80, 336]                      # player centre, pixels
//!   tiles = [
//!     [0, 0, 0, 0],
//!     [1, 1, 2, 0],
//!   ]
//!
//!   [[entities]]
//!   kind = "goomba"                        # goomba | shyguy | coin | door
//!   x = 64
//!   y = 16
//!   ```
//!
//! Entity and start coordinates are actor centres in pixels.
//!
//! ## Embedded tile legend:
//!   '#' = Brick (1)     '=' = Stone (2)     '^' = Spikes (hazard)
//!   'G' = Goomba        'S' = Shy guy       'c' = Coin
//!   'D' = Door          'P' = Player start  ' ' = Empty

use std::path::{Path, PathBuf};

use fastrand::Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::entity::{Actor, DOOR_SIZE};
use crate::domain::tile::{Boundary, GridError, TileGrid, TileId, SPIKES, TRANSPARENT};

/// One entity spawn record: type name plus centre position.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EntitySpawn {
    pub kind: String,
    pub x: i64,
    pub y: i64,
}

impl EntitySpawn {
    pub fn new(kind: &str, x: i64, y: i64) -> Self {
        EntitySpawn { kind: kind.to_string(), x, y }
    }
}

/// Parsed level data, as supplied by a level file or the embedded set.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct LevelData {
    #[serde(default)]
    pub name: String,
    pub tiles: Vec<Vec<TileId>>,
    pub tile_size: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub image_dir: String,
    pub start: (i64, i64),
    #[serde(default)]
    pub entities: Vec<EntitySpawn>,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no tiles")]
    EmptyGrid,
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },
    #[error("tile size must be positive, got {0}")]
    InvalidTileSize(i64),
    #[error("edge trim of {trim} leaves no playable columns out of {columns}")]
    EdgeTrim { trim: usize, columns: usize },
    #[error("tile id {id} at row {row}, column {col} has no image ({images} images listed)")]
    UnknownTile { id: TileId, row: usize, col: usize, images: usize },
    #[error("entity #{index} has unknown type {name:?}")]
    UnknownEntity { name: String, index: usize },
    #[error("start location ({x}, {y}) is outside the map")]
    StartOutsideMap { x: i64, y: i64 },
    #[error("no levels to play")]
    NoLevels,
    #[error("reading {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("parsing {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
}

impl From<GridError> for LevelError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::Empty => LevelError::EmptyGrid,
            GridError::Ragged { row, expected, found } => LevelError::RaggedRow { row, expected, found },
            GridError::InvalidTileSize(size) => LevelError::InvalidTileSize(size),
            GridError::TrimTooWide { trim, columns } => LevelError::EdgeTrim { trim, columns },
        }
    }
}

/// A level in play: the grid plus the live actor groups.
///
/// Colliding groups (player, enemies, pickups, projectiles, particles)
/// go through the resolver. Triggers are static: never moved, never
/// resolved, still drawn.
#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub grid: TileGrid,
    pub boundary: Boundary,
    /// Player start, as an actor centre.
    pub start: (f32, f32),
    pub images: Vec<String>,
    pub image_dir: String,
    pub player: Actor,
    pub enemies: Vec<Actor>,
    pub pickups: Vec<Actor>,
    pub projectiles: Vec<Actor>,
    pub particles: Vec<Actor>,
    pub triggers: Vec<Actor>,
}

impl Level {
    /// Actors subject to tile collision, in tick order.
    pub fn colliding(&self) -> impl Iterator<Item = &Actor> {
        std::iter::once(&self.player)
            .chain(&self.enemies)
            .chain(&self.pickups)
            .chain(&self.projectiles)
            .chain(&self.particles)
    }

    pub fn colliding_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        std::iter::once(&mut self.player)
            .chain(&mut self.enemies)
            .chain(&mut self.pickups)
            .chain(&mut self.projectiles)
            .chain(&mut self.particles)
    }

    pub fn statics(&self) -> impl Iterator<Item = &Actor> {
        self.triggers.iter()
    }

    /// Everything drawable, back to front.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.statics().chain(self.colliding())
    }

    /// Image file for a tile id, relative to the asset root.
    pub fn image_for(&self, id: TileId) -> Option<PathBuf> {
        let index = (id as usize).checked_sub(1)?;
        let name = self.images.get(index)?;
        Some(Path::new(&self.image_dir).join(name))
    }
}

// ══════════════════════════════════════════════════════════════
// Assembly
// ══════════════════════════════════════════════════════════════

/// Validate `data` and build the level's grid and actor groups.
pub fn assemble(data: &LevelData, config: &GameConfig, rng: &mut Rng) -> Result<Level, LevelError> {
    let grid = TileGrid::new(data.tiles.clone(), data.tile_size, config.physics.edge_trim)?
        .with_hazard(SPIKES);
    check_tile_images(data)?;

    let (map_w, map_h) = grid.size_in_pixels();
    let (sx, sy) = data.start;
    let start = (sx as f32, sy as f32);
    if !(0.0..map_w).contains(&start.0) || !(0.0..map_h).contains(&start.1) {
        return Err(LevelError::StartOutsideMap { x: sx, y: sy });
    }

    let mut level = Level {
        name: data.name.clone(),
        grid,
        boundary: Boundary::open_bottom(),
        start,
        images: data.images.clone(),
        image_dir: data.image_dir.clone(),
        player: Actor::player(start),
        enemies: Vec::new(),
        pickups: Vec::new(),
        projectiles: Vec::new(),
        particles: Vec::new(),
        triggers: Vec::new(),
    };

    for (index, spawn) in data.entities.iter().enumerate() {
        let center = (spawn.x as f32, spawn.y as f32);
        match spawn.kind.to_ascii_lowercase().as_str() {
            "goomba" => level.enemies.push(Actor::walking_enemy(center, config.goomba, rng)),
            "shyguy" => level.enemies.push(Actor::jumping_enemy(center, config.shyguy, rng)),
            "coin" => level.pickups.push(Actor::coin(center, config.coin.points)),
            "door" => level.triggers.push(Actor::door(center, config.door.needs_enter_key)),
            _ => {
                return Err(LevelError::UnknownEntity { name: spawn.kind.clone(), index });
            }
        }
    }

    log::info!(
        "assembled level {:?}: {}x{} tiles, {} enemies, {} pickups, {} triggers",
        level.name,
        level.grid.columns(),
        level.grid.rows(),
        level.enemies.len(),
        level.pickups.len(),
        level.triggers.len(),
    );
    Ok(level)
}

/// Every non-transparent id must name one of the listed images.
fn check_tile_images(data: &LevelData) -> Result<(), LevelError> {
    let images = data.images.len();
    for (row, line) in data.tiles.iter().enumerate() {
        for (col, &id) in line.iter().enumerate() {
            if id != TRANSPARENT && id as usize > images {
                return Err(LevelError::UnknownTile { id, row, col, images });
            }
        }
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

/// The ordered level set for a session.
pub fn load_levels(config: &GameConfig) -> Result<Vec<LevelData>, LevelError> {
    let dir = &config.levels_dir;
    if dir.is_dir() {
        let levels = load_from_directory(dir)?;
        if !levels.is_empty() {
            log::info!("loaded {} levels from {}", levels.len(), dir.display());
            return Ok(levels);
        }
    }
    let levels = embedded_levels(config.physics.edge_trim);
    log::info!("using {} built-in levels", levels.len());
    Ok(levels)
}

/// Every `*.toml` file in `dir`, sorted by file name.
pub fn load_from_directory(dir: &Path) -> Result<Vec<LevelData>, LevelError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|source| LevelError::Io { path: dir.to_path_buf(), source })?;
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "toml"))
        .collect();
    paths.sort();
    paths.iter().map(|p| load_file(p)).collect()
}

/// Read one level file. A missing `name` falls back to the file stem.
pub fn load_file(path: &Path) -> Result<LevelData, LevelError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    let mut data = parse_level(&text)
        .map_err(|source| LevelError::Parse { path: path.to_path_buf(), source })?;
    if data.name.is_empty() {
        data.name = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
    }
    log::debug!("read level {:?} from {}", data.name, path.display());
    Ok(data)
}

pub fn parse_level(text: &str) -> Result<LevelData, toml::de::Error> {
    toml::from_str(text)
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

pub const EMBEDDED_TILE_SIZE: i64 = 32;

const BRICK: TileId = 1;
const STONE: TileId = 2;

/// Image list shared by the embedded levels, one per tile id up to spikes.
fn embedded_images() -> Vec<String> {
    (1..=SPIKES)
        .map(|id| match id {
            BRICK => "brick.png".to_string(),
            STONE => "stone.png".to_string(),
            SPIKES => "spikes.png".to_string(),
            n => format!("tile{:02}.png", n),
        })
        .collect()
}

fn make_embedded(name: &str, rows: &[&str], edge_trim: usize) -> LevelData {
    let ts = EMBEDDED_TILE_SIZE;
    let mut tiles = Vec::with_capacity(rows.len());
    let mut entities = Vec::new();
    let mut start = (ts / 2, ts / 2);

    for (iy, row) in rows.iter().enumerate() {
        let mut line = Vec::with_capacity(row.len() + edge_trim);
        for (ix, ch) in row.chars().enumerate() {
            let cx = ix as i64 * ts + ts / 2;
            let cy = iy as i64 * ts + ts / 2;
            line.push(match ch {
                '#' => BRICK,
                '=' => STONE,
                '^' => SPIKES,
                _ => TRANSPARENT,
            });
            match ch {
                'P' => start = (cx, cy),
                'G' => entities.push(EntitySpawn::new("goomba", cx, cy)),
                'S' => entities.push(EntitySpawn::new("shyguy", cx, cy)),
                'c' => entities.push(EntitySpawn::new("coin", cx, cy)),
                // doors stand on the floor below their cell
                'D' => {
                    let bottom = (iy as i64 + 1) * ts;
                    entities.push(EntitySpawn::new("door", cx, bottom - DOOR_SIZE.1 as i64 / 2));
                }
                _ => {}
            }
        }
        // border columns the grid trims back off
        line.extend(std::iter::repeat(TRANSPARENT).take(edge_trim));
        tiles.push(line);
    }

    LevelData {
        name: name.to_string(),
        tiles,
        tile_size: ts,
        images: embedded_images(),
        image_dir: "tiles".to_string(),
        start,
        entities,
    }
}

/// Built-in levels, padded with `edge_trim` border columns.
pub fn embedded_levels(edge_trim: usize) -> Vec<LevelData> {
    vec![
        make_embedded(
            "Mushroom Meadow",
            &[
                "                                                ",
                "                                                ",
                "                                                ",
                "                                     c c c      ",
                "                                    ######      ",
                "                 c c c                          ",
                "                #######          S              ",
                "                            ############        ",
                "      c c                                       ",
                "     #####          G                           ",
                "  P            ##########    c     G         D  ",
                "#########                 #######  ######   ####",
                "=========   ====^^=======   ===============  ===",
                "=========   =============   ===============  ===",
            ],
            edge_trim,
        ),
        make_embedded(
            "Spike Caverns",
            &[
                "================================================",
                "=                                              =",
                "=  c c c                               c c c   =",
                "= #######          S                  #######  =",
                "=             ###########                      =",
                "=                                 G            =",
                "=      c   c              ###############      =",
                "=     ##   ##      G                           =",
                "=               ########        c  c  c        =",
                "= P         S                  #########     D =",
                "=#####    #####   ####   ###                ####",
                "=         =====   ====   ===^^^^^^^^^^^^^^^^====",
                "=^^^^^^^^^=====^^^====^^^=======================",
                "================================================",
            ],
            edge_trim,
        ),
        make_embedded(
            "Castle Rooftops",
            &[
                "                                                ",
                "                          c c c                 ",
                "                         #######                ",
                "             S                         G        ",
                "          ########                 ##########   ",
                "   c c                   S                      ",
                "  #####            ##############               ",
                "                                          c D   ",
                "                 G                       ##### #",
                " P        #############          S             #",
                "####                    ####  ##########       #",
                "====   ===                                 #####",
                "====   ===                                 =====",
                "====   ===                                 =====",
            ],
            edge_trim,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ActorKind;
    use crate::domain::tile::DEFAULT_EDGE_TRIM;

    fn blank(cols: usize, rows: usize) -> Vec<Vec<TileId>> {
        vec![vec![TRANSPARENT; cols]; rows]
    }

    fn data(tiles: Vec<Vec<TileId>>, entities: Vec<EntitySpawn>) -> LevelData {
        LevelData {
            name: "test".to_string(),
            tiles,
            tile_size: 16,
            images: vec!["brick.png".to_string(), "stone.png".to_string()],
            image_dir: "tiles".to_string(),
            start: (20, 20),
            entities,
        }
    }

    fn build(d: &LevelData) -> Result<Level, LevelError> {
        assemble(d, &GameConfig::default(), &mut Rng::with_seed(1))
    }

    #[test]
    fn coin_collides_door_is_static() {
        let d = data(
            blank(10, 10),
            vec![EntitySpawn::new("coin", 100, 50), EntitySpawn::new("door", 300, 50)],
        );
        let level = build(&d).unwrap();
        assert_eq!(level.pickups.len(), 1);
        assert_eq!(level.triggers.len(), 1);
        assert_eq!(level.pickups[0].rect.center(), (100.0, 50.0));
        assert_eq!(level.triggers[0].rect.center(), (300.0, 50.0));
        let count = |kind| level.colliding().filter(|a| a.kind() == kind).count();
        assert_eq!(count(ActorKind::Coin), 1);
        assert_eq!(count(ActorKind::Door), 0);
        assert_eq!(level.statics().count(), 1);
    }

    #[test]
    fn enemies_route_by_type_name() {
        let d = data(
            blank(10, 10),
            vec![EntitySpawn::new("goomba", 40, 40), EntitySpawn::new("ShyGuy", 80, 40)],
        );
        let level = build(&d).unwrap();
        let kinds: Vec<_> = level.enemies.iter().map(|a| a.kind()).collect();
        assert_eq!(kinds, vec![ActorKind::Goomba, ActorKind::ShyGuy]);
        assert_eq!(level.player.rect.center(), (20.0, 20.0));
    }

    #[test]
    fn ragged_grid_rejected() {
        let mut tiles = blank(10, 3);
        tiles[1].pop();
        let err = build(&data(tiles, vec![])).unwrap_err();
        assert!(matches!(err, LevelError::RaggedRow { row: 1, expected: 10, found: 9 }));
    }

    #[test]
    fn empty_grid_and_bad_tile_size_rejected() {
        assert!(matches!(build(&data(vec![], vec![])), Err(LevelError::EmptyGrid)));
        let mut d = data(blank(10, 10), vec![]);
        d.tile_size = 0;
        assert!(matches!(build(&d), Err(LevelError::InvalidTileSize(0))));
    }

    #[test]
    fn tile_without_image_rejected() {
        let mut tiles = blank(10, 10);
        tiles[4][7] = 3;
        let err = build(&data(tiles, vec![])).unwrap_err();
        assert!(matches!(err, LevelError::UnknownTile { id: 3, row: 4, col: 7, images: 2 }));
    }

    #[test]
    fn unknown_entity_rejected() {
        let d = data(
            blank(10, 10),
            vec![EntitySpawn::new("coin", 10, 10), EntitySpawn::new("koopa", 10, 10)],
        );
        match build(&d) {
            Err(LevelError::UnknownEntity { name, index }) => {
                assert_eq!(name, "koopa");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected {:?}", other.map(|l| l.name)),
        }
    }

    #[test]
    fn start_must_be_on_the_map() {
        let mut d = data(blank(10, 10), vec![]);
        // 10 columns less the trimmed border: 144 px wide
        d.start = (150, 20);
        assert!(matches!(build(&d), Err(LevelError::StartOutsideMap { x: 150, y: 20 })));
        d.start = (20, -1);
        assert!(matches!(build(&d), Err(LevelError::StartOutsideMap { .. })));
    }

    #[test]
    fn image_lookup_is_offset_by_one() {
        let level = build(&data(blank(10, 10), vec![])).unwrap();
        assert_eq!(level.image_for(1), Some(Path::new("tiles").join("brick.png")));
        assert_eq!(level.image_for(TRANSPARENT), None);
        assert_eq!(level.image_for(9), None);
    }

    #[test]
    fn parses_level_file_text() {
        let text = r#"
            name = "Tiny"
            tile_size = 16
            images = ["brick.png"]
            start = [8, 8]
            tiles = [
              [0, 0, 0, 0],
              [1, 1, 1, 0],
            ]

            [[entities]]
            kind = "coin"
            x = 24
            y = 8
        "#;
        let d = parse_level(text).unwrap();
        assert_eq!(d.name, "Tiny");
        assert_eq!(d.start, (8, 8));
        assert_eq!(d.tiles[1], vec![1, 1, 1, 0]);
        assert_eq!(d.entities, vec![EntitySpawn::new("coin", 24, 8)]);
        assert!(d.image_dir.is_empty());
        assert!(build(&d).is_ok());
    }

    #[test]
    fn broken_file_fails_the_directory() {
        let dir = std::env::temp_dir().join(format!("ritz-levels-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("01-ok.toml"), "tile_size = 16\nstart = [1, 1]\ntiles = [[0, 0]]\n").unwrap();
        std::fs::write(dir.join("02-bad.toml"), "tile_size = \n").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let result = load_from_directory(&dir);
        assert!(matches!(result, Err(LevelError::Parse { ref path, .. }) if path.ends_with("02-bad.toml")));

        std::fs::remove_file(dir.join("02-bad.toml")).unwrap();
        let levels = load_from_directory(&dir).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].name, "01-ok");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn embedded_levels_assemble() {
        let levels = embedded_levels(DEFAULT_EDGE_TRIM);
        assert_eq!(levels.len(), 3);
        for d in &levels {
            let level = build(d).unwrap();
            assert_eq!(level.triggers.len(), 1, "{} has no door", d.name);
            assert!(!level.enemies.is_empty());
            let (ix, iy) = level.grid.index_at(level.start.0, level.start.1);
            assert_eq!(level.grid.tile_at(ix, iy), Some(TRANSPARENT));
            // standing on solid ground
            assert!(level.grid.is_collidable_at(ix, iy + 1), "{} start floats", d.name);
        }
    }

    #[test]
    fn embedded_maps_keep_their_width_under_any_trim() {
        for trim in [0, 1, 2] {
            let mut config = GameConfig::default();
            config.physics.edge_trim = trim;
            for d in embedded_levels(trim) {
                let level = assemble(&d, &config, &mut Rng::with_seed(1)).unwrap();
                assert_eq!(level.grid.size_in_pixels().0, 48.0 * EMBEDDED_TILE_SIZE as f32, "trim {}", trim);
                // last real column is still inside the map
                let right = level.grid.size_in_pixels().0 - 1.0;
                let (ix, _) = level.grid.index_at(right, 0.0);
                assert_eq!(ix, 47);
            }
        }
    }
}

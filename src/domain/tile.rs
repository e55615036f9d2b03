//! Tile grid: the static map of tile ids for one level.
//! Tile semantics are centralized here and queried via methods,
//! so the resolver never compares raw ids itself.

use thiserror::Error;

/// Raw tile id as stored in level data. Id 0 is reserved transparent,
/// id `n > 0` maps to tile image `n - 1`.
pub type TileId = u32;

/// Id of the see-through tile. Never collidable.
pub const TRANSPARENT: TileId = 0;

/// Default id of the spike tile.
pub const SPIKES: TileId = 20;

/// Margin in pixels past the grid extents where actors are destroyed.
pub const DOOM_MARGIN: f32 = 50.0;

/// Columns of unused border the level encoding carries on the right edge.
pub const DEFAULT_EDGE_TRIM: usize = 1;

/// How a tile id behaves on contact.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileKind {
    Transparent,
    Solid,
    /// Solid and lethal on contact.
    Hazard,
}

impl TileKind {
    pub fn is_collidable(self) -> bool {
        !matches!(self, TileKind::Transparent)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("tile grid has no rows")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("tile size must be positive, got {0}")]
    InvalidTileSize(i64),
    #[error("edge trim of {trim} columns leaves no playable width ({columns} columns)")]
    TrimTooWide { trim: usize, columns: usize },
}

/// Which world edges are solid walls.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Boundary {
    pub left: bool,
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
}

impl Boundary {
    pub fn new(left: bool, top: bool, right: bool, bottom: bool) -> Self {
        Boundary { left, top, right, bottom }
    }

    /// Walls on three sides, open floor so actors can fall into pits.
    pub fn open_bottom() -> Self {
        Boundary::new(true, true, true, false)
    }
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    tiles: Vec<Vec<TileId>>,
    tile_size: u32,
    columns: usize,
    rows: usize,
    edge_trim: usize,
    hazard: TileId,
}

impl TileGrid {
    /// Build a grid from row-major tile ids.
    ///
    /// `edge_trim` is the number of right-hand columns excluded from the
    /// pixel size of the map (the border some encodings reserve). Those
    /// columns are still stored and still collide.
    pub fn new(tiles: Vec<Vec<TileId>>, tile_size: i64, edge_trim: usize) -> Result<Self, GridError> {
        if tile_size <= 0 || tile_size > u32::MAX as i64 {
            return Err(GridError::InvalidTileSize(tile_size));
        }
        let rows = tiles.len();
        let columns = tiles.first().map(|r| r.len()).unwrap_or(0);
        if rows == 0 || columns == 0 {
            return Err(GridError::Empty);
        }
        for (row, r) in tiles.iter().enumerate() {
            if r.len() != columns {
                return Err(GridError::Ragged { row, expected: columns, found: r.len() });
            }
        }
        if edge_trim >= columns {
            return Err(GridError::TrimTooWide { trim: edge_trim, columns });
        }
        Ok(TileGrid {
            tiles,
            tile_size: tile_size as u32,
            columns,
            rows,
            edge_trim,
            hazard: SPIKES,
        })
    }

    /// Override which id counts as a hazard.
    pub fn with_hazard(mut self, hazard: TileId) -> Self {
        self.hazard = hazard;
        self
    }

    #[inline] pub fn tile_size(&self) -> f32 { self.tile_size as f32 }
    #[inline] pub fn columns(&self) -> usize { self.columns }
    #[inline] pub fn rows(&self) -> usize { self.rows }

    /// Tile at `(ix, iy)`, or `None` outside the grid. Probes routinely
    /// land past the edges, so this never panics.
    #[inline]
    pub fn tile_at(&self, ix: i32, iy: i32) -> Option<TileId> {
        if ix < 0 || iy < 0 {
            return None;
        }
        self.tiles.get(iy as usize)?.get(ix as usize).copied()
    }

    pub fn kind(&self, id: TileId) -> TileKind {
        if id == TRANSPARENT {
            TileKind::Transparent
        } else if id == self.hazard {
            TileKind::Hazard
        } else {
            TileKind::Solid
        }
    }

    #[inline]
    pub fn is_collidable(&self, id: TileId) -> bool {
        id != TRANSPARENT
    }

    /// Out-of-range probes are never collidable.
    pub fn is_collidable_at(&self, ix: i32, iy: i32) -> bool {
        self.tile_at(ix, iy).map_or(false, |t| self.is_collidable(t))
    }

    /// Grid index containing the pixel `(x, y)`.
    pub fn index_at(&self, x: f32, y: f32) -> (i32, i32) {
        let ts = self.tile_size();
        ((x / ts).floor() as i32, (y / ts).floor() as i32)
    }

    /// Playable map size in pixels, with the trimmed border removed.
    pub fn size_in_pixels(&self) -> (f32, f32) {
        let ts = self.tile_size();
        (((self.columns - self.edge_trim) as f32) * ts, (self.rows as f32) * ts)
    }

    /// Pixel position of the top-left corner of tile `(ix, iy)`.
    pub fn tile_origin(&self, ix: i32, iy: i32) -> (f32, f32) {
        let ts = self.tile_size();
        (ix as f32 * ts, iy as f32 * ts)
    }
}

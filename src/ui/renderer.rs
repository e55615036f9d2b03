//! Presentation layer: double-buffered, diff-based terminal renderer.
//!
//! How it works:
//!   1. Build the next frame into the `front` buffer (grid of `Cell`)
//!   2. Compare each cell with the `back` buffer (previous frame)
//!   3. Only emit terminal commands for cells that changed
//!   4. All commands are batched with `queue!`, flushed once at the end
//!   5. Swap front/back
//!
//! One map tile is drawn as `CELL_W` terminal columns by one row. The
//! camera viewport is sized from the terminal each frame, in world
//! pixels, so the simulation's scroll clamp decides what is visible.
//! Actors are drawn in the tile cell holding their centre, using the
//! logical sprite (kind, pose, frame, flip) the simulation picked.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{ActorKind, Pose, Sprite};
use crate::domain::tile::{TileId, TileKind, TRANSPARENT};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gaps between rows match the cell colour.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Cell::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

/// Terminal columns per map tile.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, status + help below it.
const RESERVED_ROWS: usize = MAP_ROW + 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            self.last_phase = Some(world.phase);
        }

        fit_viewport(world, self.term_w, self.term_h);

        self.front.clear();
        match world.phase {
            Phase::Playing | Phase::Dying => self.compose_game(world),
            Phase::GameOver => self.compose_banner(world, "GAME OVER", Color::Rgb { r: 255, g: 60, b: 60 }),
            Phase::Complete => self.compose_banner(world, "ALL LEVELS CLEARED", Color::Rgb { r: 255, g: 220, b: 50 }),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        let level = &w.level;
        let ts = level.grid.tile_size();
        let (scroll_x, scroll_y) = w.camera.scroll;
        let view_cols = (w.camera.viewport.0 / ts) as usize;
        let view_rows = (w.camera.viewport.1 / ts) as usize;

        // ── HUD row ──
        let hud = format!(
            " {}  ({}/{})   Score: {:<6}  Lives: {} ",
            level.name,
            w.level_index + 1,
            w.level_count(),
            w.score,
            w.lives,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Tiles ──
        let glyphs: Vec<TileGlyph> = (0..=level.images.len() as TileId)
            .map(|id| tile_glyph(level.grid.kind(id), level.image_for(id).as_deref()))
            .collect();
        for vy in 0..view_rows {
            for vx in 0..view_cols {
                // sample the tile under the centre of this view cell
                let (ix, iy) = level.grid.index_at(
                    scroll_x + (vx as f32 + 0.5) * ts,
                    scroll_y + (vy as f32 + 0.5) * ts,
                );
                let id = level.grid.tile_at(ix, iy).unwrap_or(TRANSPARENT);
                let (glyph, fg, bg) = glyphs
                    .get(id as usize)
                    .copied()
                    .unwrap_or_else(|| tile_glyph(level.grid.kind(id), None));
                self.put_glyph(vx, vy, glyph, fg, bg);
            }
        }

        // ── Actors (statics under colliding) ──
        for actor in level.actors().filter(|a| a.is_alive()) {
            let (sx, sy) = w.camera.to_screen(actor.rect.center());
            if sx < 0.0 || sy < 0.0 {
                continue;
            }
            let (vx, vy) = ((sx / ts) as usize, (sy / ts) as usize);
            if vx >= view_cols || vy >= view_rows {
                continue;
            }
            let (glyph, fg) = sprite_glyph(&actor.sprite());
            self.put_glyph(vx, vy, glyph, fg, Color::Reset);
        }

        // ── Status + help ──
        let status_row = MAP_ROW + view_rows;
        if w.phase == Phase::Dying {
            self.front.put_str(1, status_row, "Ouch!", Color::Rgb { r: 255, g: 90, b: 90 }, Color::Reset);
        }
        let help = " A/D: Walk  W: Jump  Space: Fire  S: Door  Q: Quit";
        self.front.put_str(0, status_row + 1, help, Color::DarkGrey, Color::Reset);
    }

    fn put_glyph(&mut self, vx: usize, vy: usize, glyph: &str, fg: Color, bg: Color) {
        let col = vx * CELL_W;
        for (i, ch) in glyph.chars().take(CELL_W).enumerate() {
            self.front.set(col + i, MAP_ROW + vy, Cell::new(ch, fg, bg));
        }
    }

    fn compose_banner(&mut self, w: &WorldState, title: &str, color: Color) {
        let rule = "=".repeat(title.len() + 8);
        self.front.put_str(6, 4, &rule, color, Color::Reset);
        self.front.put_str(6, 5, &format!("    {}    ", title), color, Color::Reset);
        self.front.put_str(6, 6, &rule, color, Color::Reset);
        let score = format!("Final score: {}", w.score);
        let reached = format!("Reached level {} of {}", w.level_index + 1, w.level_count());
        self.front.put_str(8, 9, &score, Color::White, Color::Reset);
        self.front.put_str(8, 10, &reached, Color::White, Color::Reset);
        self.front.put_str(8, 12, "Q / Esc: quit", Color::DarkGrey, Color::Reset);
    }
}

/// Size the camera viewport (world pixels) to the terminal, then re-clamp.
fn fit_viewport(world: &mut WorldState, term_w: usize, term_h: usize) {
    let ts = world.level.grid.tile_size();
    let cols = (term_w / CELL_W).max(1);
    let rows = term_h.saturating_sub(RESERVED_ROWS).max(1);
    let (map_w, map_h) = world.level.grid.size_in_pixels();
    world.camera.viewport = (
        (cols as f32 * ts).min(map_w.max(ts)),
        (rows as f32 * ts).min(map_h.max(ts)),
    );
    world.update_camera();
}

// ── Glyph tables ──

const COIN_FRAMES: [&str; 8] = ["()", "(|", "||", "|)", "()", "(|", "||", "|)"];

type TileGlyph = (&'static str, Color, Color);

/// Glyph for a tile, picked from the stem of its image file.
fn tile_glyph(kind: TileKind, image: Option<&Path>) -> TileGlyph {
    let stem = image
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("");
    match kind {
        TileKind::Transparent => ("  ", Color::Reset, Color::Reset),
        TileKind::Hazard => ("^^", Color::Rgb { r: 230, g: 230, b: 230 }, Color::Reset),
        TileKind::Solid if stem.contains("brick") => {
            ("##", Color::Rgb { r: 180, g: 120, b: 60 }, Color::Rgb { r: 100, g: 65, b: 30 })
        }
        TileKind::Solid if stem.contains("stone") => {
            ("==", Color::Rgb { r: 120, g: 120, b: 120 }, Color::Rgb { r: 70, g: 70, b: 70 })
        }
        TileKind::Solid => ("%%", Color::Rgb { r: 90, g: 160, b: 90 }, Color::Rgb { r: 40, g: 80, b: 40 }),
    }
}

fn sprite_glyph(sprite: &Sprite) -> (&'static str, Color) {
    match sprite.kind {
        ActorKind::Player => {
            let glyph = match (sprite.pose, sprite.flip) {
                (Pose::Jump, _) => "@^",
                (Pose::Fall, _) => "@v",
                (_, true) => "<@",
                (_, false) => "@>",
            };
            (glyph, Color::Rgb { r: 80, g: 255, b: 80 })
        }
        ActorKind::Goomba => {
            let glyph = if sprite.frame % 2 == 0 { "gg" } else { "GG" };
            (glyph, Color::Rgb { r: 200, g: 140, b: 80 })
        }
        ActorKind::ShyGuy => {
            let glyph = match (sprite.pose, sprite.flip) {
                (Pose::Idle, _) => "sS",
                (_, true) => "<S",
                (_, false) => "S>",
            };
            (glyph, Color::Rgb { r: 255, g: 80, b: 120 })
        }
        ActorKind::Bullet => ("--", Color::Rgb { r: 255, g: 255, b: 120 }),
        ActorKind::Coin => (COIN_FRAMES[sprite.frame % COIN_FRAMES.len()], Color::Rgb { r: 255, g: 220, b: 50 }),
        ActorKind::Door => ("[]", Color::Rgb { r: 100, g: 200, b: 255 }),
        ActorKind::Blood => (". ", Color::Rgb { r: 200, g: 0, b: 0 }),
    }
}

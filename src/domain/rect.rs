//! Axis-aligned rectangle in world pixels.
//!
//! Overlap is strict: rectangles that only share an edge do not overlap.
//! An actor resting on a tile touches it but does not intersect it.

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// Build a rectangle of the given size centred on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Rect { x: cx - w / 2.0, y: cy - h / 2.0, w, h }
    }

    #[inline] pub fn left(&self) -> f32 { self.x }
    #[inline] pub fn top(&self) -> f32 { self.y }
    #[inline] pub fn right(&self) -> f32 { self.x + self.w }
    #[inline] pub fn bottom(&self) -> f32 { self.y + self.h }
    #[inline] pub fn center_x(&self) -> f32 { self.x + self.w / 2.0 }
    #[inline] pub fn center_y(&self) -> f32 { self.y + self.h / 2.0 }

    pub fn center(&self) -> (f32, f32) {
        (self.center_x(), self.center_y())
    }

    pub fn set_left(&mut self, v: f32) { self.x = v; }
    pub fn set_top(&mut self, v: f32) { self.y = v; }
    pub fn set_right(&mut self, v: f32) { self.x = v - self.w; }
    pub fn set_bottom(&mut self, v: f32) { self.y = v - self.h; }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

//! Camera: scroll offset that keeps a tracked actor centred in the
//! viewport without showing anything outside the map.
//!
//! World coordinates and screen coordinates are separate:
//!   - `scroll` is the world position of the viewport's top-left corner
//!   - renderers map `screen = world - scroll`

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub scroll: (f32, f32),
    pub viewport: (f32, f32),
}

impl Camera {
    pub fn new(viewport: (f32, f32)) -> Self {
        Camera { scroll: (0.0, 0.0), viewport }
    }

    /// Centre on `target` (a world point), clamped to the map.
    pub fn follow(&mut self, target: (f32, f32), map: (f32, f32)) {
        self.scroll = (
            clamp_axis(target.0, self.viewport.0, map.0),
            clamp_axis(target.1, self.viewport.1, map.1),
        );
    }

    /// World point to viewport-relative point.
    pub fn to_screen(&self, world: (f32, f32)) -> (f32, f32) {
        (world.0 - self.scroll.0, world.1 - self.scroll.1)
    }
}

/// `center - view/2` clamped into `[0, map - view]`. A map smaller than
/// the view pins the axis to 0.
pub fn clamp_axis(center: f32, view: f32, map: f32) -> f32 {
    let max = (map - view).max(0.0);
    (center - view / 2.0).clamp(0.0, max)
}

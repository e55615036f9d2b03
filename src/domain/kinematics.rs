//! Per-actor velocity with derived speed, heading and orientation.
//!
//! Every mutation goes through one of the setters so the derived values
//! never drift from `(dx, dy)`. Screen coordinates: +y points down, so
//! the heading is measured with `dy` negated (0° = right, 90° = up).

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// Unit sign along x: -1 for left, +1 for right.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Kinematics {
    dx: f32,
    dy: f32,
    speed: f32,
    heading: f32,
    facing: Facing,
    jumping: bool,
}

impl Kinematics {
    pub fn new(facing: Facing) -> Self {
        Kinematics { dx: 0.0, dy: 0.0, speed: 0.0, heading: 0.0, facing, jumping: false }
    }

    #[inline] pub fn dx(&self) -> f32 { self.dx }
    #[inline] pub fn dy(&self) -> f32 { self.dy }
    #[inline] pub fn speed(&self) -> f32 { self.speed }
    /// Heading in degrees, `atan2(-dy, dx)`.
    #[inline] pub fn heading(&self) -> f32 { self.heading }
    #[inline] pub fn facing(&self) -> Facing { self.facing }
    /// True once the actor moved upward, false once it moved downward.
    #[inline] pub fn jumping(&self) -> bool { self.jumping }

    pub fn set_velocity_x(&mut self, v: f32) {
        self.dx = v;
        self.recompute();
    }

    pub fn set_velocity_y(&mut self, v: f32) {
        self.dy = v;
        self.recompute();
    }

    pub fn add_velocity_x(&mut self, delta: f32) {
        self.dx += delta;
        self.recompute();
    }

    pub fn add_velocity_y(&mut self, delta: f32) {
        self.dy += delta;
        self.recompute();
    }

    pub fn set_velocity(&mut self, dx: f32, dy: f32) {
        self.dx = dx;
        self.dy = dy;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.speed = (self.dx * self.dx + self.dy * self.dy).sqrt();
        self.heading = (-self.dy).atan2(self.dx).to_degrees();

        if self.dx < 0.0 {
            self.facing = Facing::Left;
        } else if self.dx > 0.0 {
            self.facing = Facing::Right;
        }

        // dy == 0 leaves the flag as it was
        if self.dy < 0.0 {
            self.jumping = true;
        } else if self.dy > 0.0 {
            self.jumping = false;
        }
    }
}

//! Decorative spray particles. They move on their own and never touch the grid.

use std::f64::consts::PI;

/// Number of animation frames a spray cycles through.
pub const FRAME_COUNT: u8 = 4;

/// How a spray moves each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SprayMotion {
    /// Constant velocity.
    Linear { dx: f64, dy: f64 },
    /// Spiral into `(cx, cy)`; the radius shrinks with the remaining ttl.
    Spiral { cx: f64, cy: f64, angle: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spray {
    pub x: f64,
    pub y: f64,
    ttl: u32,
    frame: u8,
    motion: SprayMotion,
}

impl Spray {
    pub fn new(x: f64, y: f64, ttl: u32, motion: SprayMotion) -> Self {
        Self {
            x,
            y,
            ttl,
            frame: 0,
            motion,
        }
    }

    /// Spray flying away along `(dx, dy)`.
    pub fn linear(x: f64, y: f64, ttl: u32, dx: f64, dy: f64) -> Self {
        Self::new(x, y, ttl, SprayMotion::Linear { dx, dy })
    }

    /// Spray starting `radius` away from `(cx, cy)` at `angle`, absorbed into the centre.
    pub fn spiral(cx: f64, cy: f64, radius: f64, angle: f64, ttl: u32) -> Self {
        Self::new(
            cx + radius * angle.cos(),
            cy + radius * angle.sin(),
            ttl,
            SprayMotion::Spiral { cx, cy, angle },
        )
    }

    pub fn frame(&self) -> u8 {
        self.frame
    }

    /// Advances one tick. Returns false once the ttl has run out.
    pub fn step(&mut self) -> bool {
        if self.ttl == 0 {
            return false;
        }
        self.ttl -= 1;
        match &mut self.motion {
            SprayMotion::Linear { dx, dy } => {
                self.x += *dx;
                self.y += *dy;
            }
            SprayMotion::Spiral { cx, cy, angle } => {
                *angle += PI / 30.0;
                let r = 1.5 * f64::from(self.ttl);
                self.x = *cx + r * angle.cos();
                self.y = *cy + r * angle.sin();
            }
        }
        self.frame = (self.frame + 1) % FRAME_COUNT;
        true
    }
}

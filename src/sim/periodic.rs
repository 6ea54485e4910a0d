//! Periodic boundary helpers for the toroidal world
//!
//! Every pairwise displacement used for force or distance goes through
//! [`Domain::minimum_image`] whenever either side wraps.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;

/// Shortest representation of `dr` on a `width` x `height` torus
#[inline]
pub fn minimum_image(mut dr: Vec2, width: f32, height: f32) -> Vec2 {
    if dr.x > width * 0.5 {
        dr.x -= width;
    } else if dr.x < -width * 0.5 {
        dr.x += width;
    }
    if dr.y > height * 0.5 {
        dr.y -= height;
    } else if dr.y < -height * 0.5 {
        dr.y += height;
    }
    dr
}

/// Normalize `pos` into `[0, width) x [0, height)`
#[inline]
pub fn wrap_position(pos: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(wrap_axis(pos.x, width), wrap_axis(pos.y, height))
}

fn wrap_axis(v: f32, extent: f32) -> f32 {
    if !v.is_finite() {
        return v;
    }
    let mut w = v.rem_euclid(extent);
    // rem_euclid can round up to exactly `extent` for tiny negative inputs
    if w >= extent {
        w -= extent;
    }
    w
}

/// The toroidal domain a simulation runs in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub width: f32,
    pub height: f32,
}

impl Domain {
    pub fn new(width: f32, height: f32) -> Self {
        debug_assert!(width > 0.0 && height > 0.0, "domain extent must be positive");
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    #[inline]
    pub fn minimum_image(&self, dr: Vec2) -> Vec2 {
        minimum_image(dr, self.width, self.height)
    }

    #[inline]
    pub fn wrap(&self, pos: Vec2) -> Vec2 {
        wrap_position(pos, self.width, self.height)
    }

    /// Displacement from `from` to `to`, periodic only when `periodic` is set
    #[inline]
    pub fn displacement(&self, from: Vec2, to: Vec2, periodic: bool) -> Vec2 {
        let dr = to - from;
        if periodic { self.minimum_image(dr) } else { dr }
    }

    /// Image of `pos` nearest to `reference`
    #[inline]
    pub fn nearest_image(&self, pos: Vec2, reference: Vec2) -> Vec2 {
        reference + self.minimum_image(pos - reference)
    }

    /// True when `pos` lies more than `margin` outside the domain
    pub fn is_outside(&self, pos: Vec2, margin: f32) -> bool {
        pos.x < -margin
            || pos.x > self.width + margin
            || pos.y < -margin
            || pos.y > self.height + margin
    }
}

impl From<WorldConfig> for Domain {
    fn from(world: WorldConfig) -> Self {
        Domain::new(world.width, world.height)
    }
}

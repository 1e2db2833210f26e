//! Vector and attribute utilities for the arena simulation.
//!
//! Positions and velocities are plain `f32` pairs. The simulation does not
//! promise bit-identical output across machines, so there is no fixed-point
//! layer here; determinism in tests comes from seeding the injected RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 2D vector in arena pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Scale both components.
    #[must_use]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// True when both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

/// Normalized direction between two points plus the distance separating them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    /// Unit vector pointing from `from` to `to` (zero when the points coincide).
    pub unit: Vec2,
    /// Distance between the points.
    pub distance: f32,
}

/// Compute the unit direction from `from` towards `to` and their distance.
///
/// Coincident points give a zero direction rather than NaN, so agents that
/// spawn on top of each other push apart on the first hit without poisoning
/// their positions.
#[must_use]
pub fn calculate_vector(from: Vec2, to: Vec2) -> Direction {
    let delta = to - from;
    let distance = delta.length();
    if distance <= f32::EPSILON {
        return Direction {
            unit: Vec2::ZERO,
            distance: 0.0,
        };
    }
    Direction {
        unit: delta.scale(1.0 / distance),
        distance,
    }
}

/// Perturb `base` uniformly within `±band` (a fraction, e.g. `0.2` for 20%).
///
/// A band of zero (or less) returns `base` untouched and draws nothing from
/// the RNG.
pub fn randomize_attribute<R: Rng + ?Sized>(base: f32, band: f32, rng: &mut R) -> f32 {
    if band <= 0.0 {
        return base;
    }
    let band = band.min(1.0);
    base * (1.0 + rng.gen_range(-band..=band))
}

/// Axis-aligned play area. The sidebar occupies `[0, sidebar_width)` on the
/// left edge and is off limits to agents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    /// Full surface width in pixels.
    pub width: f32,
    /// Full surface height in pixels.
    pub height: f32,
    /// Width of the UI sidebar on the left edge.
    pub sidebar_width: f32,
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 540.0,
            sidebar_width: 200.0,
        }
    }
}

impl ArenaBounds {
    /// Create bounds for a surface of the given size.
    #[must_use]
    pub const fn new(width: f32, height: f32, sidebar_width: f32) -> Self {
        Self {
            width,
            height,
            sidebar_width,
        }
    }

    /// Clamp a circle's centre so the whole circle stays in the play area.
    #[must_use]
    pub fn clamp(&self, position: Vec2, radius: f32) -> Vec2 {
        let min_x = self.sidebar_width + radius;
        let max_x = (self.width - radius).max(min_x);
        let min_y = radius;
        let max_y = (self.height - radius).max(min_y);
        Vec2::new(position.x.clamp(min_x, max_x), position.y.clamp(min_y, max_y))
    }

    /// Whether a circle of `radius` centred at `position` lies inside the play area.
    #[must_use]
    pub fn contains(&self, position: Vec2, radius: f32) -> bool {
        position.x >= self.sidebar_width + radius
            && position.x <= self.width - radius
            && position.y >= radius
            && position.y <= self.height - radius
    }

    /// Whether a circle touches any wall of the play area.
    #[must_use]
    pub fn touches_edge(&self, position: Vec2, radius: f32) -> bool {
        position.x <= self.sidebar_width + radius
            || position.x >= self.width - radius
            || position.y <= radius
            || position.y >= self.height - radius
    }
}

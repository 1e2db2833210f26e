//! Blood decals: cosmetic stains that fade out and get pruned.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Default number of ticks a decal stays visible.
pub const DEFAULT_DECAL_LIFETIME: u32 = 600;

/// A single fading blood stain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodDecal {
    /// Centre of the stain.
    pub position: Vec2,
    /// Radius in pixels.
    pub size: f32,
    /// Ticks since the stain was created.
    pub age: u32,
}

impl BloodDecal {
    /// Create a fresh decal.
    #[must_use]
    pub const fn new(position: Vec2, size: f32) -> Self {
        Self {
            position,
            size,
            age: 0,
        }
    }

    /// Remaining opacity in `[0, 1]` for a given lifetime.
    #[must_use]
    pub fn opacity(&self, lifetime: u32) -> f32 {
        if lifetime == 0 {
            return 0.0;
        }
        (1.0 - self.age as f32 / lifetime as f32).clamp(0.0, 1.0)
    }

    /// Whether the decal has fully faded.
    #[must_use]
    pub const fn is_faded(&self, lifetime: u32) -> bool {
        self.age >= lifetime
    }
}

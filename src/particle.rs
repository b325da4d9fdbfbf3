//! The particle record and built-in attribute bundles.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{Attributes, Color};

/// One live particle.
///
/// Plain data with no identity beyond its slot in the system's live
/// collection. `lifetime` counts down; the particle is expired once it
/// reaches zero or below.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle<A = ()> {
    /// World-space center of the particle's quad.
    pub position: Vec2,
    /// Remaining lifetime in seconds.
    pub lifetime: f32,
    /// User-defined per-particle data.
    pub attributes: A,
}

impl<A: Attributes> Particle<A> {
    pub fn new(position: Vec2, lifetime: f32, attributes: A) -> Self {
        Self {
            position,
            lifetime,
            attributes,
        }
    }

    /// Whether the particle has run out of lifetime. A NaN lifetime counts
    /// as expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.lifetime <= 0.0 || self.lifetime.is_nan()
    }

    /// Copy of this particle moved to `position`.
    pub fn at(&self, position: Vec2) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }
}

impl<A: Attributes + Default> Default for Particle<A> {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            lifetime: 1.0,
            attributes: A::default(),
        }
    }
}

/// Attribute bundle that only carries a color.
///
/// Particles using `Tint` are drawn with their own color and are not faded
/// by the system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    pub color: Color,
}

impl Tint {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Attributes for Tint {
    const HAS_COLOR: bool = true;

    fn color(&self) -> Option<Color> {
        Some(self.color)
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![("color", format!("{:?}", self.color))]
    }
}

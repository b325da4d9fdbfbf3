//! RGBA8 color used for vertex tinting.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use serde::{Deserialize, Serialize};

/// 8-bit RGBA color.
///
/// Matches the vertex color layout, so a `Color` can be copied straight into
/// a [`Vertex`](crate::Vertex).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const ORANGE: Color = Color::rgb(255, 140, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// Opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Same color with alpha set from a `0.0..=1.0` factor.
    ///
    /// The factor is clamped, so negative or oversized ratios can never wrap
    /// the 0-255 range. Non-finite factors are treated as zero.
    #[inline]
    pub fn with_alpha_factor(self, factor: f32) -> Self {
        let factor = if factor.is_finite() { factor.clamp(0.0, 1.0) } else { 0.0 };
        self.with_alpha((255.0 * factor).round() as u8)
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Color { r, g, b, a }
    }
}

impl From<Color> for [u8; 4] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

/// Converts normalized `0.0..=1.0` components, clamping out-of-range values.
impl From<Vec4> for Color {
    fn from(v: Vec4) -> Self {
        let c = (v.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
        Color::rgba(c.x as u8, c.y as u8, c.z as u8, c.w as u8)
    }
}

impl From<Color> for Vec4 {
    fn from(c: Color) -> Self {
        Vec4::new(c.r as f32, c.g as f32, c.b as f32, c.a as f32) / 255.0
    }
}

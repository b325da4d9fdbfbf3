//! Quad vertices as uploaded to the GPU.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::Color;

/// Vertices emitted per particle.
pub const VERTICES_PER_QUAD: usize = 4;

/// Indices needed to draw one quad as two triangles.
pub const INDICES_PER_QUAD: usize = 6;

/// One corner of a particle quad.
///
/// Laid out for direct upload as a vertex buffer: two `f32x2` attributes
/// followed by an RGBA8 color, 20 bytes per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [u8; 4],
}

impl Vertex {
    pub fn new(position: Vec2, tex_coords: Vec2, color: Color) -> Self {
        Self {
            position: position.to_array(),
            tex_coords: tex_coords.to_array(),
            color: color.to_array(),
        }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color.into()
    }

    #[inline]
    pub fn set_color(&mut self, color: Color) {
        self.color = color.to_array();
    }
}

/// Append an axis-aligned quad centered on `center`.
///
/// Corners go top-left, top-right, bottom-right, bottom-left, with texture
/// coordinates covering the whole texture.
pub(crate) fn push_quad(batch: &mut Vec<Vertex>, center: Vec2, size: Vec2, color: Color) {
    let half = size * 0.5;
    batch.extend_from_slice(&[
        Vertex::new(center + Vec2::new(-half.x, -half.y), Vec2::new(0.0, 0.0), color),
        Vertex::new(center + Vec2::new(half.x, -half.y), Vec2::new(1.0, 0.0), color),
        Vertex::new(center + Vec2::new(half.x, half.y), Vec2::new(1.0, 1.0), color),
        Vertex::new(center + Vec2::new(-half.x, half.y), Vec2::new(0.0, 1.0), color),
    ]);
}

/// Triangle-list indices for `quads` consecutive quads.
pub fn quad_indices(quads: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(quads * INDICES_PER_QUAD);
    for quad in 0..quads as u32 {
        let base = quad * VERTICES_PER_QUAD as u32;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    indices
}

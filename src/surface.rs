//! Render surfaces: where a finished vertex batch is drawn.

use std::convert::Infallible;

use glam::Vec2;

use crate::{Texture, Vertex};

/// The draw hook a particle system renders into.
///
/// Implementations receive the finished batch once per frame: a flat list
/// of vertices grouped four per quad (top-left, top-right, bottom-right,
/// bottom-left) and the texture every quad samples from. The windowed
/// backend is `gpu::GpuSurface` (feature `window`); headless hosts and
/// tests can use [`CaptureSurface`].
pub trait RenderSurface {
    type Error;

    fn draw(&mut self, vertices: &[Vertex], texture: &Texture) -> Result<(), Self::Error>;
}

/// Surface that keeps a copy of the last batch it was given.
#[derive(Debug, Default, Clone)]
pub struct CaptureSurface {
    vertices: Vec<Vertex>,
    texture_size: Vec2,
    draws: u64,
}

impl CaptureSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertices from the most recent draw.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Size of the texture bound at the most recent draw.
    pub fn texture_size(&self) -> Vec2 {
        self.texture_size
    }

    /// Number of draws received.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl RenderSurface for CaptureSurface {
    type Error = Infallible;

    fn draw(&mut self, vertices: &[Vertex], texture: &Texture) -> Result<(), Infallible> {
        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
        self.texture_size = texture.size();
        self.draws += 1;
        Ok(())
    }
}

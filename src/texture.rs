//! Texture handles for particle quads.
//!
//! The particle system only needs a texture's dimensions, which size every
//! quad, and a handle it can pass along to the render surface. A [`Texture`]
//! is that handle: dimensions plus shared RGBA pixels. Cloning is cheap and
//! clones compare equal through [`Texture::same_pixels`], which is how a
//! render surface knows whether it must re-upload.
//!
//! # Quick Start
//!
//! ```ignore
//! use motes::texture::Texture;
//!
//! let dot = Texture::soft_dot(32);                  // procedural
//! let spark = Texture::from_file("assets/spark.png")?; // decoded with `image`
//! ```
//!
//! # Supported Formats
//!
//! - PNG (recommended)
//! - JPEG

use std::path::Path;
use std::sync::Arc;

use glam::Vec2;

use crate::error::TextureError;

/// Filter mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Smooth linear filtering (default). Good for soft sprites.
    #[default]
    Linear,
    /// Sharp nearest-neighbor filtering. Good for pixel art.
    Nearest,
}

/// Shared RGBA image with its dimensions.
#[derive(Debug, Clone)]
pub struct Texture {
    pixels: Arc<[u8]>,
    width: u32,
    height: u32,
    filter: FilterMode,
}

impl Texture {
    /// Create a texture from raw RGBA data (4 bytes per pixel).
    ///
    /// # Example
    ///
    /// ```ignore
    /// // 2x1: one white pixel, one transparent pixel
    /// let tex = Texture::from_rgba(vec![255, 255, 255, 255, 0, 0, 0, 0], 2, 1)?;
    /// ```
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            pixels: data.into(),
            width,
            height,
            filter: FilterMode::Linear,
        })
    }

    /// Load a texture from an image file.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let tex = Texture::from_file("assets/particle.png")?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let bytes = std::fs::read(path.as_ref())?;
        let img = image::load_from_memory(&bytes)?.into_rgba8();
        let (width, height) = img.dimensions();
        log::debug!("Loaded texture '{}' ({}x{})", path.as_ref().display(), width, height);
        Self::from_rgba(img.into_raw(), width, height)
    }

    /// Set the filter mode.
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    /// Create a solid color texture of the given size.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let data = rgba.repeat(width as usize * height as usize);
        Self {
            pixels: data.into(),
            width,
            height,
            filter: FilterMode::Nearest,
        }
    }

    /// Create a white disc that fades to transparent at its edge.
    ///
    /// Tinted by vertex color, this is the classic spark/mote sprite.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let dot = Texture::soft_dot(16); // 16x16
    /// ```
    pub fn soft_dot(size: u32) -> Self {
        let size = size.max(1);
        let center = (size as f32 - 1.0) * 0.5;
        let radius = (size as f32 * 0.5).max(f32::EPSILON);
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let d = Vec2::new(x as f32 - center, y as f32 - center).length() / radius;
                let falloff = (1.0 - d).clamp(0.0, 1.0);
                data.extend_from_slice(&[255, 255, 255, (falloff * falloff * 255.0).round() as u8]);
            }
        }
        Self {
            pixels: data.into(),
            width: size,
            height: size,
            filter: FilterMode::Linear,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions in pixels, as used for quad sizing.
    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    #[inline]
    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    /// Raw RGBA pixel data (width * height * 4 bytes).
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether both handles point at the same pixel storage.
    #[inline]
    pub fn same_pixels(&self, other: &Texture) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

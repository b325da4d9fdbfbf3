//! # Motes - short-lived particles batched into textured quads
//!
//! CPU particle lifecycles with a simple, frame-driven API.
//!
//! Motes owns the parts of a particle effect that have to run every frame
//! against thousands of entities: aging and culling, the per-frame mutation
//! pipeline, rate-controlled emission and the translation of live particles
//! into one flat vertex batch. Windowing, texture decoding and the draw call
//! stay with the host.
//!
//! ## Quick Start
//!
//! ```ignore
//! use motes::prelude::*;
//! use std::time::Duration;
//!
//! let texture = Texture::soft_dot(16);
//! let mut system = ParticleSystem::new(texture, Duration::from_secs(5), Color::RED, ())?;
//!
//! system.add_affector(Drift::new(Vec2::new(60.0, 60.0)));
//!
//! // Once per frame:
//! system.add_default();
//! system.update(Duration::from_secs_f32(1.0 / 60.0));
//! system.render(&mut surface)?;
//! ```
//!
//! ## Core Concepts
//!
//! ### Particles
//!
//! A [`Particle`] is a position, a remaining lifetime in seconds and an
//! attribute bundle. Live particles are kept oldest first: new particles are
//! appended at the tail and expired ones are reaped from the head.
//!
//! ### Attributes
//!
//! Attribute bundles implement [`Attributes`], usually through the derive:
//!
//! ```ignore
//! #[derive(Attributes, Clone, Debug)]
//! struct Ember {
//!     radius: f32,
//!     #[color]
//!     color: Color,
//! }
//! ```
//!
//! Bundles with a `#[color]` field are drawn with that color. Bundles without
//! one are drawn with the system's default color, faded by remaining lifetime.
//!
//! ### Pipelines
//!
//! Each frame runs in a fixed order:
//!
//! ```ignore
//! system.update(dt);          // reap, age, affectors
//! emitter.update(dt);         // emit due particles, run modifiers
//! system.render(&mut surface) // rebuild batch if dirty, finalizers, draw
//! ```
//!
//! | Stage | Hook | Sees |
//! |-------|------|------|
//! | Update | [`Affector`] | the live particle slice, mutable, fixed length |
//! | Emission | [`ParticleModifier`] | one new particle and the emitter state |
//! | Render | [`Finalizer`] | the assembled vertex slice, fixed count |

// Lets `#[derive(Attributes)]` resolve `motes::` paths inside this crate.
extern crate self as motes;

pub mod affector;
pub mod clock;
mod color;
pub mod config;
pub mod emitter;
mod error;
pub mod finalizer;
#[cfg(feature = "window")]
pub mod gpu;
mod particle;
pub mod shader;
mod surface;
mod system;
pub mod texture;
mod vertex;
#[cfg(feature = "window")]
pub mod window;

pub use affector::{Affector, Drift, FollowPath, Swirl};
pub use bytemuck;
pub use clock::FrameClock;
pub use color::Color;
pub use config::{EffectConfig, EmitterConfig, SystemConfig};
pub use emitter::{Band, Emitter, EmitterState, Orbit, ParticleModifier, Scatter, SharedSystem};
pub use error::{ConfigError, TextureError};
#[cfg(feature = "window")]
pub use error::{GpuError, RunError};
pub use finalizer::{BeatHighlight, Finalizer, Flash, FrameInfo};
pub use glam::{Vec2, Vec4};
pub use motes_derive::Attributes;
pub use particle::{Particle, Tint};
pub use surface::{CaptureSurface, RenderSurface};
pub use system::{ColorMode, ParticleSystem};
pub use texture::Texture;
pub use vertex::{quad_indices, Vertex, INDICES_PER_QUAD, VERTICES_PER_QUAD};

/// Per-particle attribute bundle.
///
/// Implemented by `#[derive(Attributes)]` for structs, and by hand for `()`
/// and the built-in [`Tint`]. The system is generic over the bundle and asks
/// it exactly one question at construction time: does it carry its own color?
///
/// # Color Capability
///
/// - `HAS_COLOR = true`: each quad is drawn with [`Attributes::color`]
///   verbatim.
/// - `HAS_COLOR = false`: each quad is drawn with the system's default color,
///   its alpha scaled by remaining lifetime over the default lifetime.
///
/// # Example
///
/// ```ignore
/// #[derive(Attributes, Clone, Debug)]
/// struct Mote {
///     drift: Vec2,            // plain data, visible to affectors
///     #[color]
///     tint: [u8; 4],          // optional: drawn verbatim
/// }
/// ```
pub trait Attributes: Clone + 'static {
    /// Whether [`Attributes::color`] supplies the particle color.
    const HAS_COLOR: bool = false;

    /// The particle's own color, if the bundle carries one.
    fn color(&self) -> Option<Color> {
        None
    }

    /// Field names and their display values, for diagnostics.
    fn describe(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

impl Attributes for () {}

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use motes::prelude::*;
/// ```
///
/// This imports:
/// - [`ParticleSystem`] - the live particle owner
/// - [`Emitter`] - rate-controlled particle generator
/// - [`Particle`], [`Attributes`] - the particle record and its bundle trait
/// - the built-in affectors, finalizers and modifiers
/// - [`Vec2`], [`Vec4`] - glam vector types
pub mod prelude {
    pub use crate::affector::{Affector, Drift, FollowPath, Swirl};
    pub use crate::clock::FrameClock;
    pub use crate::color::Color;
    pub use crate::config::{EffectConfig, EmitterConfig, SystemConfig};
    pub use crate::emitter::{Band, Emitter, EmitterState, Orbit, ParticleModifier, Scatter, SharedSystem};
    pub use crate::finalizer::{BeatHighlight, Finalizer, Flash, FrameInfo};
    pub use crate::particle::{Particle, Tint};
    pub use crate::surface::{CaptureSurface, RenderSurface};
    pub use crate::system::ParticleSystem;
    pub use crate::texture::Texture;
    pub use crate::vertex::Vertex;
    pub use crate::Attributes;
    pub use crate::{Vec2, Vec4};
}

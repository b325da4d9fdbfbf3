//! WGSL source and uniform layout for the quad pipeline.
//!
//! The shader draws the batch produced by
//! [`ParticleSystem`](crate::ParticleSystem) as-is: positions are in pixels
//! with the origin at the top-left corner, texture coordinates are
//! normalized, and vertex colors (RGBA8, read as normalized floats) multiply
//! the sampled texel.
//!
//! | Binding | Resource |
//! |---------|----------|
//! | 0 | [`Uniforms`] |
//! | 1 | particle texture |
//! | 2 | sampler |

use bytemuck::{Pod, Zeroable};

pub const SHADER_SOURCE: &str = include_str!("quad.wgsl");

/// Vertex entry point in [`SHADER_SOURCE`].
pub const VERTEX_ENTRY: &str = "vs_main";

/// Fragment entry point in [`SHADER_SOURCE`].
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    pub screen_size: [f32; 2],
    pub _padding: [f32; 2],
}

impl Uniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen_size: [width.max(1) as f32, height.max(1) as f32],
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use naga::front::wgsl;
    use naga::valid::{Capabilities, ValidationFlags, Validator};

    #[test]
    fn test_quad_shader_validates() {
        let module = match wgsl::parse_str(SHADER_SOURCE) {
            Ok(module) => module,
            Err(err) => panic!("{}", err.emit_to_string(SHADER_SOURCE)),
        };
        let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
        if let Err(err) = validator.validate(&module) {
            panic!("quad shader failed validation: {}", err);
        }

        let entries: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        assert!(entries.contains(&VERTEX_ENTRY));
        assert!(entries.contains(&FRAGMENT_ENTRY));
    }

    #[test]
    fn test_uniforms_layout() {
        assert_eq!(std::mem::size_of::<Uniforms>(), 16);
        let u = Uniforms::new(0, 600);
        assert_eq!(u.screen_size, [1.0, 600.0]);
    }
}

//! Error types for motes.
//!
//! The simulation itself cannot fail at runtime; its preconditions
//! (positive lifetimes, positive emission rates) are checked where values
//! enter the system and reported as [`ConfigError`]. Texture decoding and the
//! optional windowed surface have their own error types.

use thiserror::Error;

/// Rejected configuration values.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Lifetimes are the fade reference and must be strictly positive.
    #[error("particle lifetime must be positive and finite, got {0}s")]
    NonPositiveLifetime(f32),

    /// Emission rates must be strictly positive and finite.
    #[error("emission rate must be positive and finite, got {0} particles/s")]
    NonPositiveRate(f32),

    /// Failed to parse or serialize a JSON configuration.
    #[error("invalid effect configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read or write a configuration file.
    #[error("failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during texture creation.
#[derive(Error, Debug)]
pub enum TextureError {
    /// Failed to decode image data.
    #[error("failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    /// Failed to read file from disk.
    #[error("failed to read texture file: {0}")]
    Io(#[from] std::io::Error),

    /// Raw pixel data does not match the stated dimensions.
    #[error("RGBA data size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Zero-sized textures cannot size a quad.
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    Empty { width: u32, height: u32 },
}

/// Errors that can occur during GPU initialization.
#[cfg(feature = "window")]
#[derive(Error, Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; ensure your system supports Vulkan, Metal, DX12 or WebGPU")]
    NoAdapter,

    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors that can occur when running the windowed demo.
#[cfg(feature = "window")]
#[derive(Error, Debug)]
pub enum RunError {
    /// Failed to create or run the event loop.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    /// The effect configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The particle texture could not be loaded.
    #[error(transparent)]
    Texture(#[from] TextureError),
}

//! glkit: a thin, state-caching layer over OpenGL-class graphics contexts.
//!
//! This crate ties together [`glkit_core`] (device, state cache, resource
//! handles) and [`glkit_gl`] (the OpenGL backend).
//!
//! # Overview
//!
//! - [`acquire`] wraps the current OpenGL context into a [`Device`].
//! - [`Device`] creates [`Shader`]s, [`Program`]s, [`Buffer`]s,
//!   [`Texture`]s, [`FrameBuffer`]s and [`GeometryBuffer`]s and dispatches
//!   draws.
//! - [`DeviceStateCache`] drops state changes that would not change anything.
//! - [`logging::init`] prints the crate's `tracing` events.

pub mod logging;

pub use glkit_core::{attributes, bytes, draw, error, extensions, resources, state};

// Re-export primary types at crate root for convenience.
pub use glkit_core::{
    as_byte_slice, AsBytes, AttributeBuffer, AttributeDescriptor, AttributeType, Buffer,
    BufferKind, BufferUsage, Comparison, ContextConfig, ContextVersion, CullFace, Device,
    DeviceStateCache, DrawStats, Error, Extensions, FrameBuffer, GeometryBuffer,
    GraphicsContext, PowerPreference, PrimitiveType, Program, ProgramSource, Result, Shader,
    ShaderKind, Texture, TextureDesc, TextureFilter, TextureFormat, TextureKind, TextureWrap,
};
pub use glkit_gl::{acquire, validate, GlContext};

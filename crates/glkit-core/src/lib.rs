#![allow(clippy::too_many_arguments)]

//! Core of glkit: a thin, state-caching layer over an immediate-mode graphics
//! API.
//!
//! Nothing in this crate calls the driver directly. Every native call goes
//! through a [`GraphicsContext`]; `glkit-gl` provides one backed by OpenGL and
//! [`testing::RecordingContext`] (feature `testing`) one that records calls.
//!
//! # Overview
//!
//! - [`Device`] owns the per-context state: the [`DeviceStateCache`], the
//!   [`AttributeRegistry`], the [`Extensions`] and the draw statistics.
//! - [`DeviceStateCache`] mirrors binding and fixed-function state and drops
//!   redundant driver calls.
//! - [`resources`] holds the owning handles: [`Shader`], [`Program`],
//!   [`Buffer`], [`Texture`] and [`FrameBuffer`].
//! - [`GeometryBuffer`] pairs a vertex buffer with its attribute layout.
//! - [`draw`] maps primitive kinds to vertex counts and tracks per-frame
//!   statistics.

pub mod attributes;
pub mod bytes;
pub mod context;
pub mod device;
pub mod draw;
pub mod error;
pub mod extensions;
pub mod geometry;
pub mod resources;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export primary types at crate root for convenience.
pub use attributes::{
    attribute_type_size, AttributeBuffer, AttributeBufferId, AttributeDescriptor,
    AttributeRegistry, AttributeType,
};
pub use bytes::{as_byte_slice, AsBytes};
pub use context::{ContextConfig, ContextVersion, GraphicsContext, PowerPreference};
pub use device::Device;
pub use draw::{DrawStats, FrameStats, PrimitiveType};
pub use error::{Error, Result};
pub use extensions::Extensions;
pub use geometry::GeometryBuffer;
pub use resources::{
    Buffer, BufferKind, BufferUsage, FrameBuffer, Program, ProgramSource, Shader, ShaderKind,
    Texture, TextureDesc, TextureFilter, TextureFormat, TextureKind, TextureWrap,
};
pub use state::{Comparison, CullFace, DeviceStateCache, StateCell, TextureBinding, VertexArrayStrategy};

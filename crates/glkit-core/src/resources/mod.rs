//! Owning wrappers around native GPU objects.
//!
//! Every handle starts uninitialized, allocates exactly one native object in
//! `initialize` and releases it in `dispose` (or on drop). Handles keep a weak
//! reference to the [`Device`](crate::Device) that created them.

mod buffer;
mod framebuffer;
mod program;
mod shader;
mod texture;

pub use buffer::{Buffer, BufferKind, BufferUsage};
pub use framebuffer::FrameBuffer;
pub use program::{Program, ProgramSource};
pub use shader::{Shader, ShaderKind};
pub use texture::{Texture, TextureDesc, TextureFilter, TextureFormat, TextureKind, TextureWrap};

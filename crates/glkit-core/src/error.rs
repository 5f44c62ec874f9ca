//! Error taxonomy shared by every handle, the state cache and the device.
//!
//! All errors are raised synchronously at the call site. Nothing in the crate
//! retries internally; the caller decides whether to retry, substitute a
//! fallback resource or abort. Disposal never produces an error.

use thiserror::Error;

use crate::resources::ShaderKind;

/// Errors produced by `glkit-core`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// `initialize` was called on a handle that already owns a native object.
    #[error("resource is already initialized")]
    AlreadyInitialized,

    /// The device the handle should be bound to no longer exists.
    #[error("no graphics context available")]
    MissingContext,

    /// Bad texture unit, empty descriptor list, missing required handle, ...
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Shader compilation failed. Carries the driver's info log.
    #[error("{kind:?} shader failed to compile: {log}")]
    CompileFailure { kind: ShaderKind, log: String },

    /// Program linking failed. Carries the driver's info log.
    #[error("program failed to link: {0}")]
    LinkFailure(String),

    /// Raw attribute component type that has no known byte size.
    #[error("unknown attribute type 0x{0:04X}")]
    UnknownAttributeType(u32),

    /// Raw comparison code outside the `Comparison` range.
    #[error("unknown comparison function {0}")]
    UnknownComparison(u32),

    /// Raw primitive code outside the `PrimitiveType` range.
    #[error("unknown primitive type {0}")]
    UnknownPrimitiveType(u32),

    /// A capability-selected operation was called before a strategy was
    /// installed for it.
    #[error("{0} is not available on this context")]
    NotImplemented(&'static str),

    /// The context refused to allocate a native object.
    #[error("failed to allocate {0}")]
    AllocationFailed(&'static str),

    /// `check_framebuffer_status` returned something other than complete.
    #[error("framebuffer incomplete (status 0x{0:04X})")]
    IncompleteFramebuffer(u32),
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

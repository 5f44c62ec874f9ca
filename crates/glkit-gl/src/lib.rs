#![allow(clippy::too_many_arguments)]

//! OpenGL backend for glkit.
//!
//! [`acquire`] wraps the OpenGL context current on the calling thread into a
//! [`glkit_core::Device`]. Function pointers are loaded through `gl_loader`
//! the first time a context is acquired.
//!
//! ### Warning
//!
//! The backend cannot tell whether the context it wraps stays current. Making
//! another context current while a device is alive leads to undefined
//! behavior.

use std::rc::Rc;

use anyhow::{anyhow, bail};
use glkit_core::{ContextConfig, ContextVersion, Device};
use tracing::info;

mod gl_backend;
pub mod validate;
pub mod version;

pub use gl_backend::GlContext;
pub use version::{detect_version, GlApi, GlVersion};

/// Check a `GL_VERSION` string against `config`.
pub fn negotiate_version(config: &ContextConfig, version_string: &str) -> anyhow::Result<ContextVersion> {
    let version = detect_version(version_string)
        .ok_or_else(|| anyhow!("unrecognized GL_VERSION string {version_string:?}"))?;
    if !config.accepts(version) {
        bail!(
            "context {version:?} ({version_string}) rejected: V2 required and V1 fallback disabled"
        );
    }
    Ok(version)
}

/// Build a device over the current OpenGL context.
///
/// Fails when no context is current or its version does not satisfy
/// `config`.
///
/// # Safety
///
/// An OpenGL context must be current on the calling thread and stay current
/// for as long as the returned device or any handle created from it is used.
pub unsafe fn acquire(config: ContextConfig) -> anyhow::Result<Rc<Device>> {
    gl_backend::load_gl();
    let version_string = gl_backend::get_string(gl::VERSION)
        .ok_or_else(|| anyhow!("no OpenGL context is current"))?;
    let version = negotiate_version(&config, &version_string)?;

    let gl = Rc::new(GlContext::current(version, version_string));
    info!(?version, gl_version = gl.version_string(), "OpenGL context acquired");
    Ok(Device::new(gl, config))
}

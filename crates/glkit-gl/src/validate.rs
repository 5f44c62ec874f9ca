//! Validate and reset the live state of a context.

use anyhow::bail;
use gl::types::{GLenum, GLuint};
use glkit_core::{Device, GraphicsContext, VertexArrayStrategy};

/// Texture targets unbound on every unit during a reset.
pub const TEXTURE_TARGETS: [GLenum; 2] = [gl::TEXTURE_2D, gl::TEXTURE_CUBE_MAP];

/// Put the live context back into default binding state and make the
/// device's cache forget everything it knew.
///
/// Use after foreign code has rendered with the same context. `framebuffer`
/// is rebound at the end (`0` for the default framebuffer).
pub fn reset_state(device: &Device, framebuffer: GLuint) {
    let gl = device.gl();
    gl.use_program(0);

    let units = gl
        .get_integer(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS)
        .clamp(0, glkit_core::state::MAX_TEXTURE_UNITS as i32) as u32;
    for &target in TEXTURE_TARGETS.iter() {
        for unit in 0..units {
            gl.active_texture(unit);
            gl.bind_texture(target, 0);
        }
    }
    gl.active_texture(0);

    let strategy = device.state().vertex_array_strategy();
    match strategy {
        Some(VertexArrayStrategy::Native) => gl.bind_vertex_array(0),
        Some(VertexArrayStrategy::Extension) => gl.bind_vertex_array_ext(0),
        None => {}
    }
    gl.bind_buffer(gl::ARRAY_BUFFER, 0);
    gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, 0);
    gl.disable(gl::BLEND);
    gl.blend_func(gl::ONE, gl::ZERO);
    gl.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);

    device.invalidate();
    tracing::debug!(units, framebuffer, "context state reset");
}

/// Fail with the pending GL error, if any. Drains every queued error.
pub fn check_error(gl: &dyn GraphicsContext) -> anyhow::Result<()> {
    let first = gl.get_error();
    if first == gl::NO_ERROR {
        return Ok(());
    }
    let mut extra = 0;
    while gl.get_error() != gl::NO_ERROR && extra < 32 {
        extra += 1;
    }
    bail!("GL error 0x{first:04X} ({}) and {extra} more", error_name(first))
}

fn error_name(code: GLenum) -> &'static str {
    match code {
        gl::INVALID_ENUM => "INVALID_ENUM",
        gl::INVALID_VALUE => "INVALID_VALUE",
        gl::INVALID_OPERATION => "INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "OUT_OF_MEMORY",
        _ => "unknown",
    }
}

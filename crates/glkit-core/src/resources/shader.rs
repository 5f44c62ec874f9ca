use std::rc::Weak;

use gl::types::{GLenum, GLuint};
use tracing::{debug, error};

use crate::device::Device;
use crate::error::{Error, Result};

/// Pipeline stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    pub fn gl_enum(self) -> GLenum {
        match self {
            Self::Vertex => gl::VERTEX_SHADER,
            Self::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

/// One shader object.
///
/// A shader that failed to compile keeps its native id; the caller disposes
/// it (dropping does too).
#[derive(Debug)]
pub struct Shader {
    device: Weak<Device>,
    id: GLuint,
    kind: ShaderKind,
}

impl Shader {
    /// An uninitialized shader of `kind`.
    pub fn new(kind: ShaderKind) -> Self {
        Self {
            device: Weak::new(),
            id: 0,
            kind,
        }
    }

    /// Allocate the shader object, upload `source` and compile it.
    pub fn initialize(&mut self, device: &Weak<Device>, source: &str) -> Result<()> {
        if self.id != 0 {
            return Err(Error::AlreadyInitialized);
        }
        let dev = device.upgrade().ok_or(Error::MissingContext)?;
        let gl = dev.gl();

        let id = gl
            .create_shader(self.kind.gl_enum())
            .ok_or(Error::AllocationFailed("shader"))?;
        self.id = id;
        self.device = Weak::clone(device);

        gl.shader_source(id, source);
        gl.compile_shader(id);
        if !gl.shader_compile_status(id) {
            let log = gl.shader_info_log(id);
            error!(kind = ?self.kind, shader = id, "shader compilation failed:\n{log}");
            return Err(Error::CompileFailure {
                kind: self.kind,
                log,
            });
        }

        debug!(kind = ?self.kind, shader = id, "shader compiled");
        Ok(())
    }

    /// Release the shader object. No-op when not initialized.
    pub fn dispose(&mut self) {
        if self.id == 0 {
            return;
        }
        if let Some(dev) = self.device.upgrade() {
            dev.gl().delete_shader(self.id);
        }
        self.id = 0;
        self.device = Weak::new();
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn is_initialized(&self) -> bool {
        self.id != 0
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.dispose();
    }
}

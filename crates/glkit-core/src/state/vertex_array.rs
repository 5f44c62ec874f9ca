use gl::types::GLuint;

use crate::context::{ContextConfig, ContextVersion, GraphicsContext};
use crate::extensions::Extensions;

/// How vertex array (layout) objects are reached on a context.
///
/// Selected once when the device is created and installed into the state
/// cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexArrayStrategy {
    /// Core entry points (V2 contexts).
    Native,
    /// `OES_vertex_array_object` or a desktop equivalent on a V1 context.
    Extension,
}

impl VertexArrayStrategy {
    /// Pick a strategy for a context, or `None` when layout objects are
    /// unavailable or disabled by configuration.
    pub fn select(
        version: ContextVersion,
        extensions: &Extensions,
        config: &ContextConfig,
    ) -> Option<Self> {
        if config.disable_vertex_array_objects {
            return None;
        }
        match version {
            ContextVersion::V2 => Some(Self::Native),
            ContextVersion::V1 if extensions.has_vertex_array_object() => Some(Self::Extension),
            ContextVersion::V1 => None,
        }
    }

    pub(crate) fn create(self, gl: &dyn GraphicsContext) -> Option<GLuint> {
        match self {
            Self::Native => gl.create_vertex_array(),
            Self::Extension => gl.create_vertex_array_ext(),
        }
    }

    pub(crate) fn bind(self, gl: &dyn GraphicsContext, vertex_array: GLuint) {
        match self {
            Self::Native => gl.bind_vertex_array(vertex_array),
            Self::Extension => gl.bind_vertex_array_ext(vertex_array),
        }
    }

    pub(crate) fn delete(self, gl: &dyn GraphicsContext, vertex_array: GLuint) {
        match self {
            Self::Native => gl.delete_vertex_array(vertex_array),
            Self::Extension => gl.delete_vertex_array_ext(vertex_array),
        }
    }
}

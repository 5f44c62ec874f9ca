//! Named optional capabilities advertised by a context.

use std::collections::BTreeSet;

use crate::context::GraphicsContext;

/// WebGL / GLES name of the vertex array object extension.
pub const OES_VERTEX_ARRAY_OBJECT: &str = "OES_vertex_array_object";

/// Every extension name that provides vertex array objects on a V1 context.
pub const VERTEX_ARRAY_OBJECT_EXTENSIONS: [&str; 4] = [
    OES_VERTEX_ARRAY_OBJECT,
    "GL_OES_vertex_array_object",
    "GL_ARB_vertex_array_object",
    "GL_APPLE_vertex_array_object",
];

/// Extension registry snapshot taken when the device is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    names: BTreeSet<String>,
}

impl Extensions {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Query the context once.
    pub fn query(gl: &dyn GraphicsContext) -> Self {
        Self::from_names(gl.supported_extensions())
    }

    /// Look up an extension by its exact name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// First of `candidates` that is advertised.
    pub fn find_any<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|name| self.has(name))
    }

    pub fn has_vertex_array_object(&self) -> bool {
        self.find_any(&VERTEX_ARRAY_OBJECT_EXTENSIONS).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

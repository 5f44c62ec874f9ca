//! The graphics context collaborator and its acquisition options.
//!
//! [`GraphicsContext`] is the only place native calls happen. Every method is
//! a thin, safe mirror of one GL entry point; implementations are expected to
//! forward directly to the driver (see `glkit-gl`) or to record the call (see
//! [`crate::testing::RecordingContext`]).
//!
//! State-changing methods on this trait bypass the state cache. Call them
//! through [`crate::DeviceStateCache`] unless you are the cache.

use gl::types::{GLenum, GLint, GLsizei, GLuint};

/// API generation of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContextVersion {
    /// OpenGL ES 2.0 / WebGL 1 class. Vertex array objects only via extension.
    V1,
    /// OpenGL ES 3.0 / WebGL 2 class. Vertex array objects are core.
    V2,
}

/// Power preference forwarded to the surface provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerPreference {
    #[default]
    Default,
    LowPower,
    HighPerformance,
}

/// Options used when acquiring a context for a drawable surface.
///
/// Only the version fields and `disable_vertex_array_objects` are read by
/// glkit. The surface fields from `alpha` to `preserve_drawing_buffer` are
/// requests for whatever creates the drawable; glkit wraps a context that
/// already exists and keeps them available through
/// [`crate::Device::config`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    /// Try the V2 API first.
    pub prefer_v2: bool,
    /// Accept a V1 context when V2 is not available.
    pub allow_v1_fallback: bool,
    /// Surface attribute: drawing buffer has an alpha channel.
    pub alpha: bool,
    pub depth: bool,
    pub stencil: bool,
    pub antialias: bool,
    pub power_preference: PowerPreference,
    pub premultiplied_alpha: bool,
    pub preserve_drawing_buffer: bool,
    /// Never use vertex array objects, even when the context supports them.
    pub disable_vertex_array_objects: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            prefer_v2: true,
            allow_v1_fallback: true,
            alpha: true,
            depth: true,
            stencil: false,
            antialias: true,
            power_preference: PowerPreference::Default,
            premultiplied_alpha: true,
            preserve_drawing_buffer: false,
            disable_vertex_array_objects: false,
        }
    }
}

impl ContextConfig {
    /// Whether a context of `version` satisfies this configuration.
    pub fn accepts(&self, version: ContextVersion) -> bool {
        match version {
            ContextVersion::V2 => true,
            ContextVersion::V1 => !self.prefer_v2 || self.allow_v1_fallback,
        }
    }
}

/// Immediate-mode graphics context.
///
/// Object creation returns `None` when the context cannot allocate (lost
/// context, out of names). Object id `0` is never a valid object.
pub trait GraphicsContext {
    // ---------------------------------------------------------------------
    // Capabilities and queries
    // ---------------------------------------------------------------------

    fn version(&self) -> ContextVersion;

    /// Names of every extension the context advertises.
    fn supported_extensions(&self) -> Vec<String>;

    fn get_integer(&self, pname: GLenum) -> GLint;

    fn get_error(&self) -> GLenum;

    // ---------------------------------------------------------------------
    // Shaders and programs
    // ---------------------------------------------------------------------

    fn create_shader(&self, kind: GLenum) -> Option<GLuint>;
    fn shader_source(&self, shader: GLuint, source: &str);
    fn compile_shader(&self, shader: GLuint);
    fn shader_compile_status(&self, shader: GLuint) -> bool;
    fn shader_info_log(&self, shader: GLuint) -> String;
    fn delete_shader(&self, shader: GLuint);

    fn create_program(&self) -> Option<GLuint>;
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn bind_attrib_location(&self, program: GLuint, index: GLuint, name: &str);
    fn link_program(&self, program: GLuint);
    fn program_link_status(&self, program: GLuint) -> bool;
    fn program_info_log(&self, program: GLuint) -> String;
    fn get_attrib_location(&self, program: GLuint, name: &str) -> Option<GLuint>;
    fn get_uniform_location(&self, program: GLuint, name: &str) -> Option<GLint>;
    fn use_program(&self, program: GLuint);
    fn delete_program(&self, program: GLuint);

    // ---------------------------------------------------------------------
    // Buffers
    // ---------------------------------------------------------------------

    fn create_buffer(&self) -> Option<GLuint>;
    fn bind_buffer(&self, target: GLenum, buffer: GLuint);
    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum);
    fn buffer_sub_data(&self, target: GLenum, offset: usize, data: &[u8]);
    fn delete_buffer(&self, buffer: GLuint);

    // ---------------------------------------------------------------------
    // Textures
    // ---------------------------------------------------------------------

    fn create_texture(&self) -> Option<GLuint>;
    /// `unit` is zero based; implementations add `TEXTURE0`.
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: GLenum, texture: GLuint);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: Option<&[u8]>,
    );
    fn tex_parameter(&self, target: GLenum, pname: GLenum, value: GLint);
    fn generate_mipmap(&self, target: GLenum);
    fn delete_texture(&self, texture: GLuint);

    // ---------------------------------------------------------------------
    // Framebuffers
    // ---------------------------------------------------------------------

    fn create_framebuffer(&self) -> Option<GLuint>;
    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint);
    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        tex_target: GLenum,
        texture: GLuint,
        level: GLint,
    );
    fn check_framebuffer_status(&self, target: GLenum) -> GLenum;
    fn delete_framebuffer(&self, framebuffer: GLuint);

    // ---------------------------------------------------------------------
    // Fixed-function state
    // ---------------------------------------------------------------------

    fn enable(&self, cap: GLenum);
    fn disable(&self, cap: GLenum);
    fn cull_face(&self, mode: GLenum);
    fn depth_func(&self, func: GLenum);
    fn depth_mask(&self, flag: bool);
    fn blend_func(&self, src: GLenum, dst: GLenum);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear_depth(&self, depth: f32);
    fn clear_stencil(&self, stencil: GLint);
    fn clear(&self, mask: GLenum);
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);

    // ---------------------------------------------------------------------
    // Vertex attributes and layout objects
    // ---------------------------------------------------------------------

    fn enable_vertex_attrib_array(&self, index: GLuint);
    fn disable_vertex_attrib_array(&self, index: GLuint);
    #[allow(clippy::too_many_arguments)]
    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    );

    /// Core vertex array objects (V2 contexts).
    fn create_vertex_array(&self) -> Option<GLuint>;
    fn bind_vertex_array(&self, vertex_array: GLuint);
    fn delete_vertex_array(&self, vertex_array: GLuint);

    /// Extension-provided vertex array objects (`OES_vertex_array_object` and
    /// its desktop equivalents) for V1 contexts.
    fn create_vertex_array_ext(&self) -> Option<GLuint>;
    fn bind_vertex_array_ext(&self, vertex_array: GLuint);
    fn delete_vertex_array_ext(&self, vertex_array: GLuint);

    // ---------------------------------------------------------------------
    // Draws
    // ---------------------------------------------------------------------

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    /// `offset` is a byte offset into the bound element array buffer.
    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize);
}

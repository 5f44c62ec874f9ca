//! [`GraphicsContext`] over the current OpenGL context.

use std::ffi::{c_void, CStr, CString};
use std::marker::PhantomData;
use std::ptr;
use std::sync::Once;

use gl::types::{GLboolean, GLchar, GLenum, GLint, GLsizei, GLsizeiptr, GLuint};
use glkit_core::{ContextVersion, GraphicsContext};
use tracing::{debug, warn};

pub(crate) static GL_INIT_ONCE: Once = Once::new();

/// Load GL function pointers exactly once via `gl_loader`.
pub(crate) fn load_gl() {
    GL_INIT_ONCE.call_once(|| {
        gl_loader::init_gl();
        gl::load_with(|s| gl_loader::get_proc_address(s).cast());
    });
}

type GenVertexArrays = unsafe extern "system" fn(GLsizei, *mut GLuint);
type BindVertexArray = unsafe extern "system" fn(GLuint);
type DeleteVertexArrays = unsafe extern "system" fn(GLsizei, *const GLuint);

/// Suffixed vertex array entry points of `OES_vertex_array_object` or
/// `APPLE_vertex_array_object`.
#[derive(Clone, Copy)]
struct VertexArrayExt {
    gen: GenVertexArrays,
    bind: BindVertexArray,
    delete: DeleteVertexArrays,
}

impl VertexArrayExt {
    fn load() -> Option<Self> {
        ["OES", "APPLE"].into_iter().find_map(|suffix| {
            let gen = gl_loader::get_proc_address(&format!("glGenVertexArrays{suffix}")).cast::<c_void>();
            let bind = gl_loader::get_proc_address(&format!("glBindVertexArray{suffix}")).cast::<c_void>();
            let delete =
                gl_loader::get_proc_address(&format!("glDeleteVertexArrays{suffix}")).cast::<c_void>();
            if gen.is_null() || bind.is_null() || delete.is_null() {
                return None;
            }
            debug!(suffix, "loaded vertex array extension entry points");
            // SAFETY: non-null pointers returned for these names have the
            // signatures published in the Khronos extension registry.
            unsafe {
                Some(Self {
                    gen: std::mem::transmute::<*const c_void, GenVertexArrays>(gen),
                    bind: std::mem::transmute::<*const c_void, BindVertexArray>(bind),
                    delete: std::mem::transmute::<*const c_void, DeleteVertexArrays>(delete),
                })
            }
        })
    }
}

/// The OpenGL context current on this thread.
///
/// Not `Send`: a context is current on exactly one thread.
pub struct GlContext {
    version: ContextVersion,
    version_string: String,
    vertex_array_ext: Option<VertexArrayExt>,
    _not_send: PhantomData<*const ()>,
}

impl std::fmt::Debug for GlContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlContext")
            .field("version", &self.version)
            .field("version_string", &self.version_string)
            .field("vertex_array_ext", &self.vertex_array_ext.is_some())
            .finish()
    }
}

impl GlContext {
    /// Wrap the current context, loading function pointers on first use.
    ///
    /// # Safety
    ///
    /// An OpenGL context must be current on the calling thread and stay current
    /// for as long as the returned value (or any `Device` built on it) is used.
    pub unsafe fn current(version: ContextVersion, version_string: String) -> Self {
        load_gl();
        Self {
            version,
            version_string,
            vertex_array_ext: VertexArrayExt::load(),
            _not_send: PhantomData,
        }
    }

    /// `GL_VERSION` as reported by the driver.
    pub fn version_string(&self) -> &str {
        &self.version_string
    }
}

/// Read a driver string, `None` when no context is current.
///
/// # Safety
///
/// Function pointers must be loaded.
pub(crate) unsafe fn get_string(name: GLenum) -> Option<String> {
    let raw = gl::GetString(name);
    if raw.is_null() {
        return None;
    }
    Some(CStr::from_ptr(raw.cast()).to_string_lossy().into_owned())
}

fn c_name(name: &str) -> Option<CString> {
    CString::new(name).ok()
}

fn gl_bool(value: bool) -> GLboolean {
    if value {
        gl::TRUE
    } else {
        gl::FALSE
    }
}

// All calls below rely on the contract of `GlContext::current`.
impl GraphicsContext for GlContext {
    fn version(&self) -> ContextVersion {
        self.version
    }

    fn supported_extensions(&self) -> Vec<String> {
        unsafe {
            let mut count = 0;
            if gl::GetStringi::is_loaded() {
                gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut count);
            }
            if count > 0 {
                return (0..count as GLuint)
                    .filter_map(|i| {
                        let raw = gl::GetStringi(gl::EXTENSIONS, i);
                        (!raw.is_null())
                            .then(|| CStr::from_ptr(raw.cast()).to_string_lossy().into_owned())
                    })
                    .collect();
            }
            get_string(gl::EXTENSIONS)
                .map(|all| all.split_whitespace().map(str::to_owned).collect())
                .unwrap_or_default()
        }
    }

    fn get_integer(&self, pname: GLenum) -> GLint {
        let mut value = 0;
        unsafe { gl::GetIntegerv(pname, &mut value) };
        value
    }

    fn get_error(&self) -> GLenum {
        unsafe { gl::GetError() }
    }

    // ---------------------------------------------------------------------
    // Shaders and programs
    // ---------------------------------------------------------------------

    fn create_shader(&self, kind: GLenum) -> Option<GLuint> {
        let id = unsafe { gl::CreateShader(kind) };
        (id != 0).then_some(id)
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        let ptr = source.as_ptr().cast::<GLchar>();
        let len = source.len() as GLint;
        unsafe { gl::ShaderSource(shader, 1, &ptr, &len) };
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) };
    }

    fn shader_compile_status(&self, shader: GLuint) -> bool {
        let mut status = 0;
        unsafe { gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status) };
        status == gl::TRUE as GLint
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        unsafe {
            let mut len = 0;
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            let mut written = 0;
            gl::GetShaderInfoLog(shader, buf.len() as GLsizei, &mut written, buf.as_mut_ptr().cast());
            buf.truncate(written.max(0) as usize);
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) };
    }

    fn create_program(&self) -> Option<GLuint> {
        let id = unsafe { gl::CreateProgram() };
        (id != 0).then_some(id)
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) };
    }

    fn bind_attrib_location(&self, program: GLuint, index: GLuint, name: &str) {
        match c_name(name) {
            Some(name) => unsafe { gl::BindAttribLocation(program, index, name.as_ptr()) },
            None => warn!(name, "attribute name contains a NUL byte"),
        }
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) };
    }

    fn program_link_status(&self, program: GLuint) -> bool {
        let mut status = 0;
        unsafe { gl::GetProgramiv(program, gl::LINK_STATUS, &mut status) };
        status == gl::TRUE as GLint
    }

    fn program_info_log(&self, program: GLuint) -> String {
        unsafe {
            let mut len = 0;
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            let mut written = 0;
            gl::GetProgramInfoLog(program, buf.len() as GLsizei, &mut written, buf.as_mut_ptr().cast());
            buf.truncate(written.max(0) as usize);
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    fn get_attrib_location(&self, program: GLuint, name: &str) -> Option<GLuint> {
        let name = c_name(name)?;
        let location = unsafe { gl::GetAttribLocation(program, name.as_ptr()) };
        GLuint::try_from(location).ok()
    }

    fn get_uniform_location(&self, program: GLuint, name: &str) -> Option<GLint> {
        let name = c_name(name)?;
        let location = unsafe { gl::GetUniformLocation(program, name.as_ptr()) };
        (location >= 0).then_some(location)
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) };
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) };
    }

    // ---------------------------------------------------------------------
    // Buffers
    // ---------------------------------------------------------------------

    fn create_buffer(&self) -> Option<GLuint> {
        let mut id = 0;
        unsafe { gl::GenBuffers(1, &mut id) };
        (id != 0).then_some(id)
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        unsafe { gl::BindBuffer(target, buffer) };
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        unsafe {
            gl::BufferData(
                target,
                data.len() as GLsizeiptr,
                data.as_ptr().cast(),
                usage,
            )
        };
    }

    fn buffer_sub_data(&self, target: GLenum, offset: usize, data: &[u8]) {
        unsafe {
            gl::BufferSubData(
                target,
                offset as isize,
                data.len() as GLsizeiptr,
                data.as_ptr().cast(),
            )
        };
    }

    fn delete_buffer(&self, buffer: GLuint) {
        unsafe { gl::DeleteBuffers(1, &buffer) };
    }

    // ---------------------------------------------------------------------
    // Textures and framebuffers
    // ---------------------------------------------------------------------

    fn create_texture(&self) -> Option<GLuint> {
        let mut id = 0;
        unsafe { gl::GenTextures(1, &mut id) };
        (id != 0).then_some(id)
    }

    fn active_texture(&self, unit: u32) {
        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) };
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        unsafe { gl::BindTexture(target, texture) };
    }

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
    ) {
        let data: *const c_void = pixels.map_or(ptr::null(), |p| p.as_ptr().cast());
        unsafe {
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexImage2D(target, level, internal_format, width, height, 0, format, ty, data);
        }
    }

    fn tex_parameter(&self, target: GLenum, pname: GLenum, value: GLint) {
        unsafe { gl::TexParameteri(target, pname, value) };
    }

    fn generate_mipmap(&self, target: GLenum) {
        unsafe { gl::GenerateMipmap(target) };
    }

    fn delete_texture(&self, texture: GLuint) {
        unsafe { gl::DeleteTextures(1, &texture) };
    }

    fn create_framebuffer(&self) -> Option<GLuint> {
        let mut id = 0;
        unsafe { gl::GenFramebuffers(1, &mut id) };
        (id != 0).then_some(id)
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint) {
        unsafe { gl::BindFramebuffer(target, framebuffer) };
    }

    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        tex_target: GLenum,
        texture: GLuint,
        level: GLint,
    ) {
        unsafe { gl::FramebufferTexture2D(target, attachment, tex_target, texture, level) };
    }

    fn check_framebuffer_status(&self, target: GLenum) -> GLenum {
        unsafe { gl::CheckFramebufferStatus(target) }
    }

    fn delete_framebuffer(&self, framebuffer: GLuint) {
        unsafe { gl::DeleteFramebuffers(1, &framebuffer) };
    }

    // ---------------------------------------------------------------------
    // Fixed-function state
    // ---------------------------------------------------------------------

    fn enable(&self, cap: GLenum) {
        unsafe { gl::Enable(cap) };
    }

    fn disable(&self, cap: GLenum) {
        unsafe { gl::Disable(cap) };
    }

    fn cull_face(&self, mode: GLenum) {
        unsafe { gl::CullFace(mode) };
    }

    fn depth_func(&self, func: GLenum) {
        unsafe { gl::DepthFunc(func) };
    }

    fn depth_mask(&self, flag: bool) {
        unsafe { gl::DepthMask(gl_bool(flag)) };
    }

    fn blend_func(&self, src: GLenum, dst: GLenum) {
        unsafe { gl::BlendFunc(src, dst) };
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { gl::ClearColor(r, g, b, a) };
    }

    fn clear_depth(&self, depth: f32) {
        unsafe { gl::ClearDepth(f64::from(depth)) };
    }

    fn clear_stencil(&self, stencil: GLint) {
        unsafe { gl::ClearStencil(stencil) };
    }

    fn clear(&self, mask: GLenum) {
        unsafe { gl::Clear(mask) };
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        unsafe { gl::Viewport(x, y, width, height) };
    }

    // ---------------------------------------------------------------------
    // Vertex attributes and vertex arrays
    // ---------------------------------------------------------------------

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        unsafe { gl::EnableVertexAttribArray(index) };
    }

    fn disable_vertex_attrib_array(&self, index: GLuint) {
        unsafe { gl::DisableVertexAttribArray(index) };
    }

    fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        unsafe {
            gl::VertexAttribPointer(index, size, ty, gl_bool(normalized), stride, offset as *const c_void)
        };
    }

    fn create_vertex_array(&self) -> Option<GLuint> {
        let mut id = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        (id != 0).then_some(id)
    }

    fn bind_vertex_array(&self, vertex_array: GLuint) {
        unsafe { gl::BindVertexArray(vertex_array) };
    }

    fn delete_vertex_array(&self, vertex_array: GLuint) {
        unsafe { gl::DeleteVertexArrays(1, &vertex_array) };
    }

    // Desktop contexts expose ARB_vertex_array_object through the core names.

    fn create_vertex_array_ext(&self) -> Option<GLuint> {
        let Some(ext) = self.vertex_array_ext else {
            return self.create_vertex_array();
        };
        let mut id = 0;
        unsafe { (ext.gen)(1, &mut id) };
        (id != 0).then_some(id)
    }

    fn bind_vertex_array_ext(&self, vertex_array: GLuint) {
        match self.vertex_array_ext {
            Some(ext) => unsafe { (ext.bind)(vertex_array) },
            None => self.bind_vertex_array(vertex_array),
        }
    }

    fn delete_vertex_array_ext(&self, vertex_array: GLuint) {
        match self.vertex_array_ext {
            Some(ext) => unsafe { (ext.delete)(1, &vertex_array) },
            None => self.delete_vertex_array(vertex_array),
        }
    }

    // ---------------------------------------------------------------------
    // Draws
    // ---------------------------------------------------------------------

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        unsafe { gl::DrawArrays(mode, first, count) };
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize) {
        unsafe { gl::DrawElements(mode, count, ty, offset as *const c_void) };
    }
}

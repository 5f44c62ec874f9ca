//! A [`GraphicsContext`] that records every state-changing call.
//!
//! Used by the unit tests in this crate and, through the `testing` feature,
//! by downstream integration tests. Object creation hands out increasing ids
//! starting at 1; queries answer from configurable knobs.

use std::cell::{Cell, RefCell};

use gl::types::{GLenum, GLint, GLsizei, GLuint};

use crate::context::{ContextVersion, GraphicsContext};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader { kind: GLenum, id: GLuint },
    ShaderSource(GLuint),
    CompileShader(GLuint),
    DeleteShader(GLuint),

    CreateProgram(GLuint),
    AttachShader(GLuint, GLuint),
    BindAttribLocation(GLuint, GLuint, String),
    LinkProgram(GLuint),
    UseProgram(GLuint),
    DeleteProgram(GLuint),

    CreateBuffer(GLuint),
    BindBuffer(GLenum, GLuint),
    BufferData { target: GLenum, len: usize, usage: GLenum },
    BufferSubData { target: GLenum, offset: usize, len: usize },
    DeleteBuffer(GLuint),

    CreateTexture(GLuint),
    ActiveTexture(u32),
    BindTexture(GLenum, GLuint),
    TexImage2d { target: GLenum, width: GLsizei, height: GLsizei, has_pixels: bool },
    TexParameter(GLenum, GLenum, GLint),
    GenerateMipmap(GLenum),
    DeleteTexture(GLuint),

    CreateFramebuffer(GLuint),
    BindFramebuffer(GLenum, GLuint),
    FramebufferTexture2d { attachment: GLenum, texture: GLuint },
    DeleteFramebuffer(GLuint),

    Enable(GLenum),
    Disable(GLenum),
    CullFace(GLenum),
    DepthFunc(GLenum),
    DepthMask(bool),
    BlendFunc(GLenum, GLenum),
    ClearColor([f32; 4]),
    ClearDepth(f32),
    ClearStencil(GLint),
    Clear(GLenum),
    Viewport([GLint; 4]),

    EnableVertexAttribArray(GLuint),
    DisableVertexAttribArray(GLuint),
    VertexAttribPointer {
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    },

    CreateVertexArray(GLuint),
    BindVertexArray(GLuint),
    DeleteVertexArray(GLuint),
    CreateVertexArrayExt(GLuint),
    BindVertexArrayExt(GLuint),
    DeleteVertexArrayExt(GLuint),

    DrawArrays { mode: GLenum, first: GLint, count: GLsizei },
    DrawElements { mode: GLenum, count: GLsizei, ty: GLenum, offset: usize },
}

/// Recording context with scriptable failures.
#[derive(Debug)]
pub struct RecordingContext {
    version: ContextVersion,
    extensions: Vec<String>,
    max_vertex_attribs: GLint,
    next_id: Cell<GLuint>,
    fail_compile: Cell<bool>,
    fail_link: Cell<bool>,
    fail_allocation: Cell<bool>,
    framebuffer_status: Cell<GLenum>,
    calls: RefCell<Vec<Call>>,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContext {
    /// A V2 context with no extensions and 16 attribute slots.
    pub fn new() -> Self {
        Self {
            version: ContextVersion::V2,
            extensions: Vec::new(),
            max_vertex_attribs: 16,
            next_id: Cell::new(1),
            fail_compile: Cell::new(false),
            fail_link: Cell::new(false),
            fail_allocation: Cell::new(false),
            framebuffer_status: Cell::new(gl::FRAMEBUFFER_COMPLETE),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_version(mut self, version: ContextVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_extensions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_vertex_attribs(mut self, max: GLint) -> Self {
        self.max_vertex_attribs = max;
        self
    }

    /// Make every following compile report failure.
    pub fn fail_compile(&self, fail: bool) {
        self.fail_compile.set(fail);
    }

    pub fn fail_link(&self, fail: bool) {
        self.fail_link.set(fail);
    }

    /// Make every following `create_*` return `None`.
    pub fn fail_allocation(&self, fail: bool) {
        self.fail_allocation.set(fail);
    }

    pub fn set_framebuffer_status(&self, status: GLenum) {
        self.framebuffer_status.set(status);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Return and forget the recorded calls.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate(&self, make: impl FnOnce(GLuint) -> Call) -> Option<GLuint> {
        if self.fail_allocation.get() {
            return None;
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.record(make(id));
        Some(id)
    }
}

impl GraphicsContext for RecordingContext {
    fn version(&self) -> ContextVersion {
        self.version
    }

    fn supported_extensions(&self) -> Vec<String> {
        self.extensions.clone()
    }

    fn get_integer(&self, pname: GLenum) -> GLint {
        match pname {
            gl::MAX_VERTEX_ATTRIBS => self.max_vertex_attribs,
            gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS => 32,
            _ => 0,
        }
    }

    fn get_error(&self) -> GLenum {
        gl::NO_ERROR
    }

    fn create_shader(&self, kind: GLenum) -> Option<GLuint> {
        self.allocate(|id| Call::CreateShader { kind, id })
    }

    fn shader_source(&self, shader: GLuint, _source: &str) {
        self.record(Call::ShaderSource(shader));
    }

    fn compile_shader(&self, shader: GLuint) {
        self.record(Call::CompileShader(shader));
    }

    fn shader_compile_status(&self, _shader: GLuint) -> bool {
        !self.fail_compile.get()
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        if self.fail_compile.get() {
            format!("ERROR: 0:1: shader {shader} syntax error")
        } else {
            String::new()
        }
    }

    fn delete_shader(&self, shader: GLuint) {
        self.record(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> Option<GLuint> {
        self.allocate(Call::CreateProgram)
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        self.record(Call::AttachShader(program, shader));
    }

    fn bind_attrib_location(&self, program: GLuint, index: GLuint, name: &str) {
        self.record(Call::BindAttribLocation(program, index, name.to_owned()));
    }

    fn link_program(&self, program: GLuint) {
        self.record(Call::LinkProgram(program));
    }

    fn program_link_status(&self, _program: GLuint) -> bool {
        !self.fail_link.get()
    }

    fn program_info_log(&self, program: GLuint) -> String {
        if self.fail_link.get() {
            format!("program {program}: varying mismatch")
        } else {
            String::new()
        }
    }

    fn get_attrib_location(&self, _program: GLuint, name: &str) -> Option<GLuint> {
        match name {
            "position" => Some(0),
            "uv" => Some(1),
            _ => None,
        }
    }

    fn get_uniform_location(&self, _program: GLuint, name: &str) -> Option<GLint> {
        (!name.is_empty()).then_some(0)
    }

    fn use_program(&self, program: GLuint) {
        self.record(Call::UseProgram(program));
    }

    fn delete_program(&self, program: GLuint) {
        self.record(Call::DeleteProgram(program));
    }

    fn create_buffer(&self) -> Option<GLuint> {
        self.allocate(Call::CreateBuffer)
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        self.record(Call::BindBuffer(target, buffer));
    }

    fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) {
        self.record(Call::BufferData {
            target,
            len: data.len(),
            usage,
        });
    }

    fn buffer_sub_data(&self, target: GLenum, offset: usize, data: &[u8]) {
        self.record(Call::BufferSubData {
            target,
            offset,
            len: data.len(),
        });
    }

    fn delete_buffer(&self, buffer: GLuint) {
        self.record(Call::DeleteBuffer(buffer));
    }

    fn create_texture(&self) -> Option<GLuint> {
        self.allocate(Call::CreateTexture)
    }

    fn active_texture(&self, unit: u32) {
        self.record(Call::ActiveTexture(unit));
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        self.record(Call::BindTexture(target, texture));
    }

    fn tex_image_2d(
        &self,
        target: GLenum,
        _level: GLint,
        _internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        _format: GLenum,
        _ty: GLenum,
        pixels: Option<&[u8]>,
    ) {
        self.record(Call::TexImage2d {
            target,
            width,
            height,
            has_pixels: pixels.is_some(),
        });
    }

    fn tex_parameter(&self, target: GLenum, pname: GLenum, value: GLint) {
        self.record(Call::TexParameter(target, pname, value));
    }

    fn generate_mipmap(&self, target: GLenum) {
        self.record(Call::GenerateMipmap(target));
    }

    fn delete_texture(&self, texture: GLuint) {
        self.record(Call::DeleteTexture(texture));
    }

    fn create_framebuffer(&self) -> Option<GLuint> {
        self.allocate(Call::CreateFramebuffer)
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint) {
        self.record(Call::BindFramebuffer(target, framebuffer));
    }

    fn framebuffer_texture_2d(
        &self,
        _target: GLenum,
        attachment: GLenum,
        _tex_target: GLenum,
        texture: GLuint,
        _level: GLint,
    ) {
        self.record(Call::FramebufferTexture2d {
            attachment,
            texture,
        });
    }

    fn check_framebuffer_status(&self, _target: GLenum) -> GLenum {
        self.framebuffer_status.get()
    }

    fn delete_framebuffer(&self, framebuffer: GLuint) {
        self.record(Call::DeleteFramebuffer(framebuffer));
    }

    fn enable(&self, cap: GLenum) {
        self.record(Call::Enable(cap));
    }

    fn disable(&self, cap: GLenum) {
        self.record(Call::Disable(cap));
    }

    fn cull_face(&self, mode: GLenum) {
        self.record(Call::CullFace(mode));
    }

    fn depth_func(&self, func: GLenum) {
        self.record(Call::DepthFunc(func));
    }

    fn depth_mask(&self, flag: bool) {
        self.record(Call::DepthMask(flag));
    }

    fn blend_func(&self, src: GLenum, dst: GLenum) {
        self.record(Call::BlendFunc(src, dst));
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(Call::ClearColor([r, g, b, a]));
    }

    fn clear_depth(&self, depth: f32) {
        self.record(Call::ClearDepth(depth));
    }

    fn clear_stencil(&self, stencil: GLint) {
        self.record(Call::ClearStencil(stencil));
    }

    fn clear(&self, mask: GLenum) {
        self.record(Call::Clear(mask));
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.record(Call::Viewport([x, y, width, height]));
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        self.record(Call::EnableVertexAttribArray(index));
    }

    fn disable_vertex_attrib_array(&self, index: GLuint) {
        self.record(Call::DisableVertexAttribArray(index));
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
        self.record(Call::VertexAttribPointer {
            index,
            size,
            ty,
            normalized,
            stride,
            offset,
        });
    }

    fn create_vertex_array(&self) -> Option<GLuint> {
        self.allocate(Call::CreateVertexArray)
    }

    fn bind_vertex_array(&self, vertex_array: GLuint) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: GLuint) {
        self.record(Call::DeleteVertexArray(vertex_array));
    }

    fn create_vertex_array_ext(&self) -> Option<GLuint> {
        self.allocate(Call::CreateVertexArrayExt)
    }

    fn bind_vertex_array_ext(&self, vertex_array: GLuint) {
        self.record(Call::BindVertexArrayExt(vertex_array));
    }

    fn delete_vertex_array_ext(&self, vertex_array: GLuint) {
        self.record(Call::DeleteVertexArrayExt(vertex_array));
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.record(Call::DrawArrays { mode, first, count });
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize) {
        self.record(Call::DrawElements {
            mode,
            count,
            ty,
            offset,
        });
    }
}

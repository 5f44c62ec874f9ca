//! Device state cache.
//!
//! Mirrors the binding state of one context and suppresses driver calls that
//! would not change it. Every tracked cell follows one rule: the driver call
//! is issued only when the cell is unset or the requested value differs from
//! the cached one.
//!
//! The cache is only correct if it is the sole path through which tracked
//! state changes. Code that binds directly on the context must call
//! [`DeviceStateCache::invalidate`] afterwards.

mod cell;
mod vertex_array;

use std::fmt;
use std::rc::Rc;

use gl::types::{GLenum, GLint, GLsizei, GLuint};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use tracing::trace;

use crate::attributes::{AttributeBuffer, AttributeBufferId, AttributeDescriptor};
use crate::context::GraphicsContext;
use crate::error::{Error, Result};

pub use cell::StateCell;
pub use vertex_array::VertexArrayStrategy;

/// Number of texture units tracked by the cache.
pub const MAX_TEXTURE_UNITS: u32 = 32;

/// Used when the context reports no `MAX_VERTEX_ATTRIBS`.
const FALLBACK_MAX_VERTEX_ATTRIBS: u32 = 16;

/// Depth comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum Comparison {
    Never = 0,
    Less = 1,
    Equal = 2,
    NotEqual = 3,
    LessEqual = 4,
    Greater = 5,
    GreaterEqual = 6,
    Always = 7,
}

impl Comparison {
    /// Decode a raw comparison code (`0..=7`).
    pub fn from_code(code: u32) -> Result<Self> {
        Self::from_u32(code).ok_or(Error::UnknownComparison(code))
    }

    pub fn gl_enum(self) -> GLenum {
        match self {
            Self::Never => gl::NEVER,
            Self::Less => gl::LESS,
            Self::Equal => gl::EQUAL,
            Self::NotEqual => gl::NOTEQUAL,
            Self::LessEqual => gl::LEQUAL,
            Self::Greater => gl::GREATER,
            Self::GreaterEqual => gl::GEQUAL,
            Self::Always => gl::ALWAYS,
        }
    }
}

/// Faces discarded when culling is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullFace {
    Front,
    Back,
    FrontAndBack,
}

impl CullFace {
    pub fn gl_enum(self) -> GLenum {
        match self {
            Self::Front => gl::FRONT,
            Self::Back => gl::BACK,
            Self::FrontAndBack => gl::FRONT_AND_BACK,
        }
    }
}

/// What one texture unit has bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    pub target: GLenum,
    pub texture: GLuint,
}

/// Cached binding state of one context.
pub struct DeviceStateCache {
    gl: Rc<dyn GraphicsContext>,
    vertex_arrays: Option<VertexArrayStrategy>,
    max_vertex_attribs: u32,

    program: StateCell<GLuint>,
    framebuffer: StateCell<GLuint>,
    array_buffer: StateCell<GLuint>,
    element_array_buffer: StateCell<GLuint>,
    active_texture: StateCell<u32>,
    texture_units: [StateCell<TextureBinding>; MAX_TEXTURE_UNITS as usize],

    depth_test: StateCell<bool>,
    depth_func: StateCell<GLenum>,
    depth_write: StateCell<bool>,
    cull_enabled: StateCell<bool>,
    cull_mode: StateCell<GLenum>,
    blend_enabled: StateCell<bool>,
    blend_func: StateCell<(GLenum, GLenum)>,
    clear_color: [StateCell<f32>; 4],
    clear_depth: StateCell<f32>,
    clear_stencil: StateCell<GLint>,
    viewport: StateCell<[GLint; 4]>,

    vertex_array: StateCell<GLuint>,
    /// Enabled attribute slots in the currently bound vertex array.
    enabled_attributes: usize,
    /// Enabled attribute slots of the default vertex array while a layout
    /// object is bound.
    default_enabled_attributes: usize,
    attributes: StateCell<AttributeBufferId>,
}

impl fmt::Debug for DeviceStateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceStateCache")
            .field("vertex_arrays", &self.vertex_arrays)
            .field("program", &self.program.get())
            .field("framebuffer", &self.framebuffer.get())
            .field("array_buffer", &self.array_buffer.get())
            .field("element_array_buffer", &self.element_array_buffer.get())
            .field("vertex_array", &self.vertex_array.get())
            .field("enabled_attributes", &self.enabled_attributes)
            .finish_non_exhaustive()
    }
}

impl DeviceStateCache {
    /// Create an empty cache. No vertex array strategy is installed yet.
    pub fn new(gl: Rc<dyn GraphicsContext>) -> Self {
        let max_vertex_attribs = match gl.get_integer(gl::MAX_VERTEX_ATTRIBS) {
            n if n > 0 => n as u32,
            _ => FALLBACK_MAX_VERTEX_ATTRIBS,
        };

        Self {
            gl,
            vertex_arrays: None,
            max_vertex_attribs,
            program: StateCell::default(),
            framebuffer: StateCell::default(),
            array_buffer: StateCell::default(),
            element_array_buffer: StateCell::default(),
            active_texture: StateCell::default(),
            texture_units: [StateCell::default(); MAX_TEXTURE_UNITS as usize],
            depth_test: StateCell::default(),
            depth_func: StateCell::default(),
            depth_write: StateCell::default(),
            cull_enabled: StateCell::default(),
            cull_mode: StateCell::default(),
            blend_enabled: StateCell::default(),
            blend_func: StateCell::default(),
            clear_color: [StateCell::default(); 4],
            clear_depth: StateCell::default(),
            clear_stencil: StateCell::default(),
            viewport: StateCell::default(),
            vertex_array: StateCell::default(),
            enabled_attributes: 0,
            default_enabled_attributes: 0,
            attributes: StateCell::default(),
        }
    }

    /// Install the vertex array strategy chosen for this context.
    pub fn install_vertex_arrays(&mut self, strategy: Option<VertexArrayStrategy>) {
        self.vertex_arrays = strategy;
    }

    pub fn vertex_array_strategy(&self) -> Option<VertexArrayStrategy> {
        self.vertex_arrays
    }

    pub fn supports_vertex_arrays(&self) -> bool {
        self.vertex_arrays.is_some()
    }

    pub fn max_vertex_attribs(&self) -> u32 {
        self.max_vertex_attribs
    }

    // ---------------------------------------------------------------------
    // Object bindings
    // ---------------------------------------------------------------------

    pub fn use_program(&mut self, program: GLuint) -> bool {
        if !self.program.set_if_changed(program) {
            return false;
        }
        trace!(program, "use program");
        self.gl.use_program(program);
        true
    }

    pub fn bind_array_buffer(&mut self, buffer: GLuint) -> bool {
        if !self.array_buffer.set_if_changed(buffer) {
            return false;
        }
        trace!(buffer, "bind array buffer");
        self.gl.bind_buffer(gl::ARRAY_BUFFER, buffer);
        true
    }

    pub fn bind_element_array_buffer(&mut self, buffer: GLuint) -> bool {
        if !self.element_array_buffer.set_if_changed(buffer) {
            return false;
        }
        trace!(buffer, "bind element array buffer");
        self.gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, buffer);
        true
    }

    /// Bind `buffer` to whichever of the two buffer targets `target` names.
    pub fn bind_buffer(&mut self, target: GLenum, buffer: GLuint) -> Result<bool> {
        match target {
            gl::ARRAY_BUFFER => Ok(self.bind_array_buffer(buffer)),
            gl::ELEMENT_ARRAY_BUFFER => Ok(self.bind_element_array_buffer(buffer)),
            other => Err(Error::InvalidArgument(format!(
                "unsupported buffer target 0x{other:04X}"
            ))),
        }
    }

    pub fn bind_framebuffer(&mut self, framebuffer: GLuint) -> bool {
        if !self.framebuffer.set_if_changed(framebuffer) {
            return false;
        }
        trace!(framebuffer, "bind framebuffer");
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
        true
    }

    pub fn bind_texture_2d(&mut self, unit: u32, texture: GLuint) -> Result<bool> {
        self.bind_texture(unit, gl::TEXTURE_2D, texture)
    }

    pub fn bind_texture_cube(&mut self, unit: u32, texture: GLuint) -> Result<bool> {
        self.bind_texture(unit, gl::TEXTURE_CUBE_MAP, texture)
    }

    /// Bind `texture` on `unit`. Rebinds when either the target or the
    /// texture differ from what the unit has cached.
    pub fn bind_texture(&mut self, unit: u32, target: GLenum, texture: GLuint) -> Result<bool> {
        if unit >= MAX_TEXTURE_UNITS {
            return Err(Error::InvalidArgument(format!(
                "texture unit {unit} out of range (max {MAX_TEXTURE_UNITS})"
            )));
        }
        let binding = TextureBinding { target, texture };
        if !self.texture_units[unit as usize].set_if_changed(binding) {
            return Ok(false);
        }
        self.activate_texture_unit(unit);
        trace!(unit, target, texture, "bind texture");
        self.gl.bind_texture(target, texture);
        Ok(true)
    }

    /// Select the texture unit that subsequent texture calls affect.
    pub fn activate_texture_unit(&mut self, unit: u32) -> bool {
        if !self.active_texture.set_if_changed(unit) {
            return false;
        }
        self.gl.active_texture(unit);
        true
    }

    // ---------------------------------------------------------------------
    // Fixed-function state
    // ---------------------------------------------------------------------

    /// `mode: None` leaves the cached cull mode untouched.
    pub fn set_cull_mode(&mut self, enabled: bool, mode: Option<CullFace>) -> bool {
        let mut issued = false;
        if self.cull_enabled.set_if_changed(enabled) {
            self.toggle(gl::CULL_FACE, enabled);
            issued = true;
        }
        if let Some(mode) = mode.map(CullFace::gl_enum) {
            if self.cull_mode.set_if_changed(mode) {
                self.gl.cull_face(mode);
                issued = true;
            }
        }
        issued
    }

    pub fn set_depth_test(&mut self, enabled: bool, compare: Comparison) -> bool {
        self.set_depth_test_native(enabled, compare.gl_enum())
    }

    /// Enable flag and compare function are cached independently.
    pub fn set_depth_test_native(&mut self, enabled: bool, func: GLenum) -> bool {
        let mut issued = false;
        if self.depth_test.set_if_changed(enabled) {
            self.toggle(gl::DEPTH_TEST, enabled);
            issued = true;
        }
        if self.depth_func.set_if_changed(func) {
            self.gl.depth_func(func);
            issued = true;
        }
        issued
    }

    pub fn set_depth_write(&mut self, enabled: bool) -> bool {
        if !self.depth_write.set_if_changed(enabled) {
            return false;
        }
        self.gl.depth_mask(enabled);
        true
    }

    /// `func: None` leaves the cached blend factors untouched.
    pub fn set_blend(&mut self, enabled: bool, func: Option<(GLenum, GLenum)>) -> bool {
        let mut issued = false;
        if self.blend_enabled.set_if_changed(enabled) {
            self.toggle(gl::BLEND, enabled);
            issued = true;
        }
        if let Some((src, dst)) = func {
            if self.blend_func.set_if_changed((src, dst)) {
                self.gl.blend_func(src, dst);
                issued = true;
            }
        }
        issued
    }

    /// Channels are compared one by one; any difference re-issues the full
    /// color.
    pub fn set_clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) -> bool {
        let [cr, cg, cb, ca] = &mut self.clear_color;
        let changed = cr.set_if_changed(r)
            | cg.set_if_changed(g)
            | cb.set_if_changed(b)
            | ca.set_if_changed(a);
        if changed {
            self.gl.clear_color(r, g, b, a);
        }
        changed
    }

    pub fn set_clear_depth(&mut self, depth: f32) -> bool {
        if !self.clear_depth.set_if_changed(depth) {
            return false;
        }
        self.gl.clear_depth(depth);
        true
    }

    pub fn set_clear_stencil(&mut self, stencil: GLint) -> bool {
        if !self.clear_stencil.set_if_changed(stencil) {
            return false;
        }
        self.gl.clear_stencil(stencil);
        true
    }

    pub fn set_viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) -> bool {
        if !self.viewport.set_if_changed([x, y, width, height]) {
            return false;
        }
        self.gl.viewport(x, y, width, height);
        true
    }

    fn toggle(&self, cap: GLenum, enabled: bool) {
        if enabled {
            self.gl.enable(cap);
        } else {
            self.gl.disable(cap);
        }
    }

    // ---------------------------------------------------------------------
    // Vertex attributes
    // ---------------------------------------------------------------------

    /// Reconcile the enabled attribute slots with `attributes` and configure
    /// every slot it describes.
    ///
    /// Slots `[new, old)` are disabled, `[old, new)` enabled. Slot 0 is never
    /// disabled. Pointer configuration is issued for every slot on every call.
    pub fn enable_attributes(&mut self, attributes: &AttributeBuffer) {
        self.enable_attributes_with(attributes, attributes.descriptors());
    }

    /// Like [`Self::enable_attributes`], but configures pointers from
    /// `descriptors` instead of the layout's registered ones.
    ///
    /// Registered layouts ignore offsets, so a vertex buffer whose offsets
    /// differ from the first registrant's passes its own descriptors here.
    /// `descriptors` must match `attributes`.
    pub fn enable_attributes_with(
        &mut self,
        attributes: &AttributeBuffer,
        descriptors: &[AttributeDescriptor],
    ) {
        debug_assert!(attributes.matches(descriptors));
        let old = self.enabled_attributes;
        let new = descriptors.len();

        if new < old {
            for slot in new.max(1)..old {
                self.gl.disable_vertex_attrib_array(slot as GLuint);
            }
        } else {
            for slot in old..new {
                self.gl.enable_vertex_attrib_array(slot as GLuint);
            }
        }

        for (index, descriptor) in descriptors.iter().enumerate() {
            descriptor.apply(self.gl.as_ref(), index);
        }

        trace!(old, new, layout = %attributes.id(), "enable attributes");
        self.enabled_attributes = new;
        self.attributes.set_if_changed(attributes.id());
    }

    /// Bind a vertex array object through the installed strategy.
    pub fn bind_vertex_array(&mut self, vertex_array: GLuint) -> Result<bool> {
        let strategy = self
            .vertex_arrays
            .ok_or(Error::NotImplemented("bind_vertex_array"))?;

        let previous = self.vertex_array.get().unwrap_or(0);
        if !self.vertex_array.set_if_changed(vertex_array) {
            return Ok(false);
        }
        trace!(vertex_array, "bind vertex array");
        strategy.bind(self.gl.as_ref(), vertex_array);

        // Enabled slots and the element array binding live in the vertex
        // array object.
        if previous == 0 {
            self.default_enabled_attributes = self.enabled_attributes;
        }
        self.enabled_attributes = if vertex_array == 0 {
            self.default_enabled_attributes
        } else {
            0
        };
        self.element_array_buffer.invalidate();
        self.attributes.invalidate();
        Ok(true)
    }

    pub fn create_vertex_array(&mut self) -> Result<GLuint> {
        let strategy = self
            .vertex_arrays
            .ok_or(Error::NotImplemented("create_vertex_array"))?;
        strategy
            .create(self.gl.as_ref())
            .ok_or(Error::AllocationFailed("vertex array"))
    }

    /// Delete a vertex array object. Deleting the bound one reverts the
    /// binding to the default vertex array.
    pub fn delete_vertex_array(&mut self, vertex_array: GLuint) {
        let Some(strategy) = self.vertex_arrays else {
            return;
        };
        if vertex_array == 0 {
            return;
        }
        strategy.delete(self.gl.as_ref(), vertex_array);
        if self.vertex_array.get() == Some(vertex_array) {
            self.vertex_array.invalidate();
            self.vertex_array.set_if_changed(0);
            self.enabled_attributes = self.default_enabled_attributes;
            self.element_array_buffer.invalidate();
            self.attributes.invalidate();
        }
    }

    // ---------------------------------------------------------------------
    // Forgetting released objects
    // ---------------------------------------------------------------------

    pub fn forget_program(&mut self, program: GLuint) {
        self.program.forget(program);
    }

    pub fn forget_buffer(&mut self, buffer: GLuint) {
        self.array_buffer.forget(buffer);
        self.element_array_buffer.forget(buffer);
    }

    pub fn forget_framebuffer(&mut self, framebuffer: GLuint) {
        self.framebuffer.forget(framebuffer);
    }

    pub fn forget_texture(&mut self, texture: GLuint) {
        for unit in &mut self.texture_units {
            if unit.get().is_some_and(|b| b.texture == texture) {
                unit.invalidate();
            }
        }
    }

    // ---------------------------------------------------------------------
    // Invalidation
    // ---------------------------------------------------------------------

    /// Forget everything. The next call to every setter issues its driver
    /// call. Attribute slots above 0 are disabled on the live context.
    pub fn invalidate(&mut self) {
        self.program.invalidate();
        self.framebuffer.invalidate();
        self.array_buffer.invalidate();
        self.element_array_buffer.invalidate();
        self.active_texture.invalidate();
        for unit in &mut self.texture_units {
            unit.invalidate();
        }
        self.depth_test.invalidate();
        self.depth_func.invalidate();
        self.depth_write.invalidate();
        self.cull_enabled.invalidate();
        self.cull_mode.invalidate();
        self.blend_enabled.invalidate();
        self.blend_func.invalidate();
        for channel in &mut self.clear_color {
            channel.invalidate();
        }
        self.clear_depth.invalidate();
        self.clear_stencil.invalidate();
        self.viewport.invalidate();
        self.vertex_array.invalidate();
        self.attributes.invalidate();

        for slot in 1..self.max_vertex_attribs {
            self.gl.disable_vertex_attrib_array(slot);
        }
        self.enabled_attributes = 0;
        self.default_enabled_attributes = 0;
        tracing::debug!("state cache invalidated");
    }

    // ---------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------

    pub fn program(&self) -> Option<GLuint> {
        self.program.get()
    }

    pub fn framebuffer(&self) -> Option<GLuint> {
        self.framebuffer.get()
    }

    pub fn array_buffer(&self) -> Option<GLuint> {
        self.array_buffer.get()
    }

    pub fn element_array_buffer(&self) -> Option<GLuint> {
        self.element_array_buffer.get()
    }

    pub fn texture_binding(&self, unit: u32) -> Option<TextureBinding> {
        self.texture_units.get(unit as usize).and_then(StateCell::get)
    }

    pub fn active_texture_unit(&self) -> Option<u32> {
        self.active_texture.get()
    }

    pub fn depth_test(&self) -> Option<bool> {
        self.depth_test.get()
    }

    pub fn depth_func(&self) -> Option<GLenum> {
        self.depth_func.get()
    }

    pub fn depth_write(&self) -> Option<bool> {
        self.depth_write.get()
    }

    pub fn cull_mode(&self) -> (Option<bool>, Option<GLenum>) {
        (self.cull_enabled.get(), self.cull_mode.get())
    }

    pub fn vertex_array(&self) -> Option<GLuint> {
        self.vertex_array.get()
    }

    pub fn enabled_attributes(&self) -> usize {
        self.enabled_attributes
    }

    /// Identity of the last layout passed to [`Self::enable_attributes`].
    pub fn bound_attributes(&self) -> Option<AttributeBufferId> {
        self.attributes.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeDescriptor, AttributeRegistry, AttributeType};
    use crate::testing::{Call, RecordingContext};

    fn cache() -> (Rc<RecordingContext>, DeviceStateCache) {
        let gl = Rc::new(RecordingContext::new());
        let cache = DeviceStateCache::new(gl.clone());
        (gl, cache)
    }

    fn layout(registry: &mut AttributeRegistry, slots: usize) -> Rc<AttributeBuffer> {
        let descriptors: Vec<_> = (0..slots)
            .map(|i| AttributeDescriptor::new(4, AttributeType::Float, 16 * slots as u32, 16 * i as u32))
            .collect();
        registry.create(&descriptors).unwrap()
    }

    #[test]
    fn use_program_fires_once_per_run() {
        let (gl, mut cache) = cache();
        for id in [1, 1, 2, 2, 2, 1, 3, 3] {
            cache.use_program(id);
        }
        let binds: Vec<_> = gl
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::UseProgram(id) => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(binds, vec![1, 2, 1, 3]);
    }

    #[test]
    fn use_program_reports_change() {
        let (_gl, mut cache) = cache();
        assert!(cache.use_program(4));
        assert!(!cache.use_program(4));
        assert!(cache.use_program(0));
    }

    #[test]
    fn buffer_targets_are_independent() {
        let (gl, mut cache) = cache();
        assert!(cache.bind_array_buffer(5));
        assert!(cache.bind_element_array_buffer(5));
        assert!(!cache.bind_array_buffer(5));
        assert_eq!(
            gl.calls(),
            vec![
                Call::BindBuffer(gl::ARRAY_BUFFER, 5),
                Call::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, 5),
            ]
        );
        assert!(cache.bind_buffer(gl::TEXTURE_2D, 1).is_err());
    }

    #[test]
    fn texture_unit_rebinds_only_on_change() {
        let (gl, mut cache) = cache();
        assert!(cache.bind_texture_2d(3, 10).unwrap());
        assert!(!cache.bind_texture_2d(3, 10).unwrap());
        assert_eq!(gl.count(|c| matches!(c, Call::BindTexture(..))), 1);

        assert!(cache.bind_texture_2d(3, 11).unwrap());
        assert_eq!(gl.count(|c| matches!(c, Call::BindTexture(..))), 2);
        assert_eq!(
            cache.texture_binding(3),
            Some(TextureBinding {
                target: gl::TEXTURE_2D,
                texture: 11
            })
        );
        // Unit 3 was already active for the second bind.
        assert_eq!(gl.count(|c| matches!(c, Call::ActiveTexture(_))), 1);
    }

    #[test]
    fn texture_target_change_rebinds() {
        let (gl, mut cache) = cache();
        cache.bind_texture_2d(0, 7).unwrap();
        assert!(cache.bind_texture_cube(0, 7).unwrap());
        assert_eq!(
            gl.calls().last(),
            Some(&Call::BindTexture(gl::TEXTURE_CUBE_MAP, 7))
        );
    }

    #[test]
    fn texture_unit_out_of_range() {
        let (gl, mut cache) = cache();
        assert!(matches!(
            cache.bind_texture_2d(MAX_TEXTURE_UNITS, 1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(cache.bind_texture_2d(MAX_TEXTURE_UNITS - 1, 1).unwrap());
        assert!(!gl.calls().is_empty());
    }

    #[test]
    fn depth_test_is_sticky_per_cell() {
        let (gl, mut cache) = cache();
        assert!(cache.set_depth_test(true, Comparison::Less));
        assert!(!cache.set_depth_test(true, Comparison::Less));
        assert_eq!(
            gl.calls(),
            vec![Call::Enable(gl::DEPTH_TEST), Call::DepthFunc(gl::LESS)]
        );

        gl.clear();
        assert!(cache.set_depth_test(true, Comparison::GreaterEqual));
        assert_eq!(gl.calls(), vec![Call::DepthFunc(gl::GEQUAL)]);
    }

    #[test]
    fn comparison_codes() {
        assert_eq!(Comparison::from_code(0), Ok(Comparison::Never));
        assert_eq!(Comparison::from_code(4), Ok(Comparison::LessEqual));
        assert_eq!(Comparison::from_code(7).map(Comparison::gl_enum), Ok(gl::ALWAYS));
        assert_eq!(Comparison::from_code(8), Err(Error::UnknownComparison(8)));
    }

    #[test]
    fn cull_mode_absent_keeps_cached_mode() {
        let (gl, mut cache) = cache();
        cache.set_cull_mode(true, Some(CullFace::Back));
        gl.clear();

        assert!(cache.set_cull_mode(false, None));
        assert_eq!(gl.calls(), vec![Call::Disable(gl::CULL_FACE)]);
        assert_eq!(cache.cull_mode(), (Some(false), Some(gl::BACK)));

        gl.clear();
        assert!(cache.set_cull_mode(true, Some(CullFace::Back)));
        assert_eq!(gl.calls(), vec![Call::Enable(gl::CULL_FACE)]);
    }

    #[test]
    fn depth_write_toggles_on_change() {
        let (gl, mut cache) = cache();
        cache.set_depth_write(false);
        cache.set_depth_write(false);
        cache.set_depth_write(true);
        assert_eq!(gl.calls(), vec![Call::DepthMask(false), Call::DepthMask(true)]);
    }

    #[test]
    fn clear_color_reissues_full_tuple() {
        let (gl, mut cache) = cache();
        assert!(cache.set_clear_color(0.0, 0.0, 0.0, 1.0));
        assert!(!cache.set_clear_color(0.0, 0.0, 0.0, 1.0));
        assert!(cache.set_clear_color(0.0, 0.5, 0.0, 1.0));
        assert_eq!(
            gl.calls(),
            vec![
                Call::ClearColor([0.0, 0.0, 0.0, 1.0]),
                Call::ClearColor([0.0, 0.5, 0.0, 1.0]),
            ]
        );
    }

    #[test]
    fn clear_depth_and_stencil_are_sticky() {
        let (gl, mut cache) = cache();
        cache.set_clear_depth(1.0);
        cache.set_clear_depth(1.0);
        cache.set_clear_stencil(0);
        cache.set_clear_stencil(0);
        assert_eq!(gl.calls(), vec![Call::ClearDepth(1.0), Call::ClearStencil(0)]);
    }

    #[test]
    fn shrinking_layout_disables_tail_slots() {
        let (gl, mut cache) = cache();
        let mut registry = AttributeRegistry::new();
        let five = layout(&mut registry, 5);
        let two = layout(&mut registry, 2);

        cache.enable_attributes(&five);
        assert_eq!(
            gl.count(|c| matches!(c, Call::EnableVertexAttribArray(_))),
            5
        );
        gl.clear();

        cache.enable_attributes(&two);
        let disabled: Vec<_> = gl
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DisableVertexAttribArray(slot) => Some(slot),
                _ => None,
            })
            .collect();
        assert_eq!(disabled, vec![2, 3, 4]);
        assert_eq!(gl.count(|c| matches!(c, Call::EnableVertexAttribArray(_))), 0);
        assert_eq!(gl.count(|c| matches!(c, Call::VertexAttribPointer { .. })), 2);
        assert_eq!(cache.enabled_attributes(), 2);
        assert_eq!(cache.bound_attributes(), Some(two.id()));
    }

    #[test]
    fn growing_layout_enables_new_slots_only() {
        let (gl, mut cache) = cache();
        let mut registry = AttributeRegistry::new();
        cache.enable_attributes(&layout(&mut registry, 2));
        gl.clear();

        cache.enable_attributes(&layout(&mut registry, 4));
        let enabled: Vec<_> = gl
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::EnableVertexAttribArray(slot) => Some(slot),
                _ => None,
            })
            .collect();
        assert_eq!(enabled, vec![2, 3]);
        assert_eq!(gl.count(|c| matches!(c, Call::VertexAttribPointer { .. })), 4);
    }

    #[test]
    fn same_layout_still_reconfigures_pointers() {
        let (gl, mut cache) = cache();
        let mut registry = AttributeRegistry::new();
        let three = layout(&mut registry, 3);
        cache.enable_attributes(&three);
        gl.clear();
        cache.enable_attributes(&three);
        assert_eq!(
            gl.calls(),
            (0..3)
                .map(|i| Call::VertexAttribPointer {
                    index: i,
                    size: 4,
                    ty: gl::FLOAT,
                    normalized: false,
                    stride: 48,
                    offset: 16 * i as usize,
                })
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn caller_descriptors_supply_pointer_offsets() {
        let (gl, mut cache) = cache();
        let mut registry = AttributeRegistry::new();
        let shared = layout(&mut registry, 2);
        let shifted: Vec<_> = shared
            .descriptors()
            .iter()
            .map(|d| AttributeDescriptor { offset: d.offset + 96, ..*d })
            .collect();

        cache.enable_attributes_with(&shared, &shifted);
        let offsets: Vec<_> = gl
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::VertexAttribPointer { offset, .. } => Some(offset),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![96, 112]);
        assert_eq!(cache.bound_attributes(), Some(shared.id()));
        assert_eq!(cache.enabled_attributes(), 2);
    }

    #[test]
    fn invalidate_forces_next_call() {
        let (gl, mut cache) = cache();
        cache.bind_array_buffer(9);
        cache.set_depth_test(true, Comparison::Less);
        cache.invalidate();
        gl.clear();

        assert!(cache.bind_array_buffer(9));
        assert!(cache.set_depth_test(true, Comparison::Less));
        assert_eq!(
            gl.calls(),
            vec![
                Call::BindBuffer(gl::ARRAY_BUFFER, 9),
                Call::Enable(gl::DEPTH_TEST),
                Call::DepthFunc(gl::LESS),
            ]
        );
    }

    #[test]
    fn invalidate_disables_slots_above_zero() {
        let (gl, mut cache) = cache();
        let mut registry = AttributeRegistry::new();
        cache.enable_attributes(&layout(&mut registry, 3));
        cache.bind_texture_2d(2, 4).unwrap();
        gl.clear();

        cache.invalidate();
        let disabled: Vec<_> = gl
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DisableVertexAttribArray(slot) => Some(slot),
                _ => None,
            })
            .collect();
        assert_eq!(disabled, (1..cache.max_vertex_attribs()).collect::<Vec<_>>());
        assert_eq!(cache.enabled_attributes(), 0);
        assert_eq!(cache.texture_binding(2), None);
        assert_eq!(cache.program(), None);
    }

    #[test]
    fn vertex_array_requires_strategy() {
        let (_gl, mut cache) = cache();
        assert_eq!(
            cache.bind_vertex_array(1),
            Err(Error::NotImplemented("bind_vertex_array"))
        );
    }

    #[test]
    fn vertex_array_binding_is_sticky() {
        let (gl, mut cache) = cache();
        cache.install_vertex_arrays(Some(VertexArrayStrategy::Extension));
        assert_eq!(cache.bind_vertex_array(2), Ok(true));
        assert_eq!(cache.bind_vertex_array(2), Ok(false));
        assert_eq!(gl.calls(), vec![Call::BindVertexArrayExt(2)]);
    }

    #[test]
    fn layout_object_tracks_its_own_slots() {
        let (gl, mut cache) = cache();
        cache.install_vertex_arrays(Some(VertexArrayStrategy::Native));
        let mut registry = AttributeRegistry::new();
        cache.enable_attributes(&layout(&mut registry, 3));

        let vao = cache.create_vertex_array().unwrap();
        cache.bind_vertex_array(vao).unwrap();
        assert_eq!(cache.enabled_attributes(), 0);
        gl.clear();

        // A fresh layout object has nothing enabled; every slot is enabled.
        cache.enable_attributes(&layout(&mut registry, 2));
        assert_eq!(gl.count(|c| matches!(c, Call::EnableVertexAttribArray(_))), 2);

        cache.bind_vertex_array(0).unwrap();
        assert_eq!(cache.enabled_attributes(), 3);
    }

    #[test]
    fn deleting_bound_vertex_array_reverts_to_default() {
        let (_gl, mut cache) = cache();
        cache.install_vertex_arrays(Some(VertexArrayStrategy::Native));
        let vao = cache.create_vertex_array().unwrap();
        cache.bind_vertex_array(vao).unwrap();
        cache.delete_vertex_array(vao);
        assert_eq!(cache.vertex_array(), Some(0));
        assert_eq!(cache.bind_vertex_array(0), Ok(false));
    }

    #[test]
    fn forgetting_released_objects() {
        let (gl, mut cache) = cache();
        cache.use_program(3);
        cache.bind_array_buffer(4);
        cache.bind_texture_2d(1, 5).unwrap();
        cache.forget_program(3);
        cache.forget_buffer(4);
        cache.forget_texture(5);
        gl.clear();

        assert!(cache.use_program(3));
        assert!(cache.bind_array_buffer(4));
        assert!(cache.bind_texture_2d(1, 5).unwrap());
        assert_eq!(gl.count(|c| !matches!(c, Call::ActiveTexture(_))), 3);
    }

    #[test]
    fn viewport_and_blend_are_sticky() {
        let (gl, mut cache) = cache();
        cache.set_viewport(0, 0, 640, 480);
        cache.set_viewport(0, 0, 640, 480);
        cache.set_blend(true, Some((gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA)));
        cache.set_blend(true, None);
        assert_eq!(
            gl.calls(),
            vec![
                Call::Viewport([0, 0, 640, 480]),
                Call::Enable(gl::BLEND),
                Call::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA),
            ]
        );
    }
}

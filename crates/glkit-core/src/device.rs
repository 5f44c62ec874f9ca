//! The per-context façade.
//!
//! A [`Device`] owns everything that must exist exactly once per context: the
//! state cache, the attribute registry, the extension set and the draw
//! statistics. It is shared through `Rc`; resource handles keep a `Weak` to it
//! so that a handle outliving its device degrades to a no-op on dispose.

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use gl::types::{GLint, GLsizei};
use tracing::{debug, info, warn};

use crate::attributes::{AttributeBuffer, AttributeDescriptor, AttributeRegistry};
use crate::context::{ContextConfig, ContextVersion, GraphicsContext};
use crate::draw::{DrawStats, FrameStats, PrimitiveType, INDEX_SIZE, INDEX_TYPE};
use crate::error::Result;
use crate::extensions::Extensions;
use crate::geometry::GeometryBuffer;
use crate::resources::{
    Buffer, BufferKind, BufferUsage, FrameBuffer, Program, ProgramSource, Shader, ShaderKind,
    Texture, TextureDesc,
};
use crate::state::{DeviceStateCache, VertexArrayStrategy};

pub struct Device {
    gl: Rc<dyn GraphicsContext>,
    config: ContextConfig,
    version: ContextVersion,
    extensions: Extensions,
    state: RefCell<DeviceStateCache>,
    attributes: RefCell<AttributeRegistry>,
    stats: RefCell<FrameStats>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("version", &self.version)
            .field("extensions", &self.extensions.len())
            .field("vertex_arrays", &self.state.borrow().vertex_array_strategy())
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Wrap `gl`, query its capabilities and pick the vertex array strategy.
    pub fn new(gl: Rc<dyn GraphicsContext>, config: ContextConfig) -> Rc<Self> {
        let version = gl.version();
        let extensions = Extensions::query(gl.as_ref());
        let strategy = VertexArrayStrategy::select(version, &extensions, &config);

        let mut state = DeviceStateCache::new(Rc::clone(&gl));
        state.install_vertex_arrays(strategy);

        match strategy {
            Some(strategy) => debug!(?strategy, "vertex array objects enabled"),
            None if config.disable_vertex_array_objects => {
                info!("vertex array objects disabled by configuration")
            }
            None => warn!(?version, "vertex array objects unavailable, using per-draw attribute setup"),
        }

        Rc::new(Self {
            gl,
            config,
            version,
            extensions,
            state: RefCell::new(state),
            attributes: RefCell::new(AttributeRegistry::new()),
            stats: RefCell::new(FrameStats::default()),
        })
    }

    pub fn gl(&self) -> &dyn GraphicsContext {
        self.gl.as_ref()
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn version(&self) -> ContextVersion {
        self.version
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Borrow the state cache. Do not hold the guard across calls into
    /// resource handles; they borrow it too.
    pub fn state(&self) -> RefMut<'_, DeviceStateCache> {
        self.state.borrow_mut()
    }

    pub fn supports_vertex_arrays(&self) -> bool {
        self.state.borrow().supports_vertex_arrays()
    }

    // ---------------------------------------------------------------------
    // Attribute layouts
    // ---------------------------------------------------------------------

    /// Canonical layout for `descriptors`, registering it on first use.
    pub fn create_attribute_buffer(
        &self,
        descriptors: &[AttributeDescriptor],
    ) -> Result<Rc<AttributeBuffer>> {
        self.attributes.borrow_mut().create(descriptors)
    }

    pub fn lookup_attribute_buffer(
        &self,
        descriptors: &[AttributeDescriptor],
    ) -> Option<Rc<AttributeBuffer>> {
        self.attributes.borrow().lookup(descriptors)
    }

    pub fn attribute_buffer_count(&self) -> usize {
        self.attributes.borrow().len()
    }

    // ---------------------------------------------------------------------
    // Frame
    // ---------------------------------------------------------------------

    /// Forget all cached state, e.g. after foreign code touched the context.
    pub fn invalidate(&self) {
        self.state().invalidate();
    }

    /// Clear the bound framebuffer with the cached clear values.
    pub fn clear(&self, color: bool, depth: bool, stencil: bool) {
        let mut mask = 0;
        if color {
            mask |= gl::COLOR_BUFFER_BIT;
        }
        if depth {
            mask |= gl::DEPTH_BUFFER_BIT;
        }
        if stencil {
            mask |= gl::STENCIL_BUFFER_BIT;
        }
        if mask != 0 {
            self.gl.clear(mask);
        }
    }

    /// Draw `primitive_count` primitives from the bound vertex input,
    /// starting at `start_vertex`.
    pub fn draw_primitive(&self, kind: PrimitiveType, start_vertex: u32, primitive_count: u32) {
        let count = kind.vertex_count(primitive_count);
        self.gl
            .draw_arrays(kind.gl_mode(), start_vertex as GLint, count as GLsizei);
        self.stats.borrow_mut().record(kind, primitive_count);
    }

    /// Draw from the bound element array buffer. Indices are 16-bit;
    /// `start_index` counts indices, not bytes.
    pub fn draw_indexed_primitive(&self, kind: PrimitiveType, primitive_count: u32, start_index: u32) {
        let count = kind.vertex_count(primitive_count);
        self.gl.draw_elements(
            kind.gl_mode(),
            count as GLsizei,
            INDEX_TYPE,
            start_index as usize * INDEX_SIZE,
        );
        self.stats.borrow_mut().record(kind, primitive_count);
    }

    /// Close the current frame's statistics and return them.
    pub fn end_frame(&self) -> DrawStats {
        self.stats.borrow_mut().end_frame()
    }

    /// Statistics of the last completed frame.
    pub fn frame_stats(&self) -> DrawStats {
        self.stats.borrow().previous()
    }

    pub fn current_stats(&self) -> DrawStats {
        self.stats.borrow().current()
    }

    // ---------------------------------------------------------------------
    // Resource factories
    // ---------------------------------------------------------------------

    pub fn create_shader(self: &Rc<Self>, kind: ShaderKind, source: &str) -> Result<Shader> {
        let mut shader = Shader::new(kind);
        shader.initialize(&Rc::downgrade(self), source)?;
        Ok(shader)
    }

    pub fn create_program(self: &Rc<Self>, source: &ProgramSource<'_>) -> Result<Program> {
        let mut program = Program::new();
        program.initialize(&Rc::downgrade(self), source)?;
        Ok(program)
    }

    pub fn create_buffer(
        self: &Rc<Self>,
        kind: BufferKind,
        usage: BufferUsage,
        data: Option<&[u8]>,
    ) -> Result<Buffer> {
        let mut buffer = Buffer::new(kind, usage);
        buffer.initialize(&Rc::downgrade(self), data)?;
        Ok(buffer)
    }

    pub fn create_texture(self: &Rc<Self>, desc: TextureDesc, pixels: Option<&[u8]>) -> Result<Texture> {
        let mut texture = Texture::new();
        texture.initialize(&Rc::downgrade(self), desc, pixels)?;
        Ok(texture)
    }

    pub fn create_framebuffer(self: &Rc<Self>) -> Result<FrameBuffer> {
        let mut framebuffer = FrameBuffer::new();
        framebuffer.initialize(&Rc::downgrade(self))?;
        Ok(framebuffer)
    }

    pub fn create_geometry(
        self: &Rc<Self>,
        descriptors: &[AttributeDescriptor],
        vertices: &[u8],
        usage: BufferUsage,
    ) -> Result<GeometryBuffer> {
        let mut geometry = GeometryBuffer::new();
        geometry.initialize(&Rc::downgrade(self), descriptors, vertices, usage)?;
        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeType;
    use crate::extensions::OES_VERTEX_ARRAY_OBJECT;
    use crate::testing::{Call, RecordingContext};
    use crate::Error;

    #[test]
    fn selects_vertex_array_strategy() {
        let v2 = Device::new(Rc::new(RecordingContext::new()), ContextConfig::default());
        assert_eq!(
            v2.state().vertex_array_strategy(),
            Some(VertexArrayStrategy::Native)
        );

        let v1 = Device::new(
            Rc::new(RecordingContext::new().with_version(ContextVersion::V1)),
            ContextConfig::default(),
        );
        assert!(!v1.supports_vertex_arrays());

        let v1_ext = Device::new(
            Rc::new(
                RecordingContext::new()
                    .with_version(ContextVersion::V1)
                    .with_extensions([OES_VERTEX_ARRAY_OBJECT]),
            ),
            ContextConfig::default(),
        );
        assert_eq!(
            v1_ext.state().vertex_array_strategy(),
            Some(VertexArrayStrategy::Extension)
        );

        let disabled = Device::new(
            Rc::new(RecordingContext::new()),
            ContextConfig {
                disable_vertex_array_objects: true,
                ..Default::default()
            },
        );
        assert!(!disabled.supports_vertex_arrays());
        assert_eq!(
            disabled.state().bind_vertex_array(1),
            Err(Error::NotImplemented("bind_vertex_array"))
        );
    }

    #[test]
    fn draw_counts_and_statistics() {
        let gl = Rc::new(RecordingContext::new());
        let device = Device::new(gl.clone(), ContextConfig::default());

        device.draw_primitive(PrimitiveType::TriangleStrip, 4, 2);
        device.draw_indexed_primitive(PrimitiveType::TriangleList, 10, 6);
        device.draw_primitive(PrimitiveType::LineList, 0, 3);

        assert_eq!(
            gl.calls(),
            vec![
                Call::DrawArrays { mode: gl::TRIANGLE_STRIP, first: 4, count: 4 },
                Call::DrawElements {
                    mode: gl::TRIANGLES,
                    count: 30,
                    ty: gl::UNSIGNED_SHORT,
                    offset: 12,
                },
                Call::DrawArrays { mode: gl::LINES, first: 0, count: 6 },
            ]
        );

        assert_eq!(device.current_stats().draw_calls, 3);
        let frame = device.end_frame();
        assert_eq!(frame.primitives_of(PrimitiveType::TriangleList), 10);
        assert_eq!(device.frame_stats(), frame);
        assert_eq!(device.current_stats(), DrawStats::default());
    }

    #[test]
    fn registry_is_per_device() {
        let layout = [AttributeDescriptor::new(4, AttributeType::UnsignedByte, 4, 0).normalized()];
        let a = Device::new(Rc::new(RecordingContext::new()), ContextConfig::default());
        let b = Device::new(Rc::new(RecordingContext::new()), ContextConfig::default());

        let first = a.create_attribute_buffer(&layout).unwrap();
        assert_eq!(a.create_attribute_buffer(&layout).unwrap().id(), first.id());
        assert_eq!(a.attribute_buffer_count(), 1);
        assert!(b.lookup_attribute_buffer(&layout).is_none());
    }

    #[test]
    fn surface_options_pass_through_untouched() {
        use crate::context::PowerPreference;

        let config = ContextConfig {
            alpha: false,
            depth: false,
            stencil: true,
            antialias: false,
            power_preference: PowerPreference::HighPerformance,
            premultiplied_alpha: false,
            preserve_drawing_buffer: true,
            ..Default::default()
        };
        let gl = Rc::new(RecordingContext::new());
        let device = Device::new(gl.clone(), config.clone());

        assert_eq!(device.config(), &config);
        assert_eq!(
            device.state().vertex_array_strategy(),
            Some(VertexArrayStrategy::Native)
        );
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn handles_outliving_device_dispose_quietly() {
        let gl = Rc::new(RecordingContext::new());
        let device = Device::new(gl.clone(), ContextConfig::default());
        let mut buffer = device
            .create_buffer(BufferKind::Array, BufferUsage::Static, Some(&[0u8; 4]))
            .unwrap();
        drop(device);

        assert_eq!(buffer.bind(), Err(Error::MissingContext));
        buffer.dispose();
        assert!(!buffer.is_initialized());
        assert_eq!(gl.count(|c| matches!(c, Call::DeleteBuffer(_))), 0);
    }

    #[test]
    fn clear_builds_mask() {
        let gl = Rc::new(RecordingContext::new());
        let device = Device::new(gl.clone(), ContextConfig::default());
        device.clear(true, true, false);
        device.clear(false, false, false);
        assert_eq!(
            gl.take_calls(),
            vec![Call::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT)]
        );
    }
}

//! A vertex buffer paired with its attribute layout.
//!
//! When the context supports vertex array objects the layout is recorded once
//! at initialization and [`GeometryBuffer::bind`] is a single vertex array
//! bind. Without them, `bind` rebinds the array buffer and reconfigures every
//! attribute slot through the state cache before each draw.

use std::rc::{Rc, Weak};

use gl::types::GLuint;
use tracing::{debug, trace};

use crate::attributes::{AttributeBuffer, AttributeDescriptor};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::resources::{Buffer, BufferUsage};

#[derive(Debug)]
pub struct GeometryBuffer {
    device: Weak<Device>,
    array: Buffer,
    attributes: Option<Rc<AttributeBuffer>>,
    /// This buffer's own descriptors. The registry entry only gives identity;
    /// its offsets belong to whichever geometry registered it first.
    descriptors: Vec<AttributeDescriptor>,
    vertex_array: GLuint,
}

impl GeometryBuffer {
    pub fn new() -> Self {
        Self {
            device: Weak::new(),
            array: Buffer::array(BufferUsage::Static),
            attributes: None,
            descriptors: Vec::new(),
            vertex_array: 0,
        }
    }

    /// Allocate the array buffer, upload `vertices` and record the layout.
    pub fn initialize(
        &mut self,
        device: &Weak<Device>,
        descriptors: &[AttributeDescriptor],
        vertices: &[u8],
        usage: BufferUsage,
    ) -> Result<()> {
        if self.is_initialized() {
            return Err(Error::AlreadyInitialized);
        }
        let dev = device
            .upgrade()
            .ok_or_else(|| Error::InvalidArgument("geometry requires a live device".into()))?;
        if descriptors.is_empty() {
            return Err(Error::InvalidArgument(
                "geometry requires at least one attribute descriptor".into(),
            ));
        }

        let attributes = dev.create_attribute_buffer(descriptors)?;
        self.device = Weak::clone(device);
        self.array = Buffer::array(usage);
        self.descriptors = descriptors.to_vec();

        if let Err(err) = self.allocate(&dev, &attributes, vertices) {
            self.dispose();
            return Err(err);
        }
        debug!(
            buffer = self.array.id(),
            vertex_array = self.vertex_array,
            layout = %attributes.id(),
            "geometry created"
        );
        self.attributes = Some(attributes);
        Ok(())
    }

    fn allocate(
        &mut self,
        dev: &Rc<Device>,
        attributes: &AttributeBuffer,
        vertices: &[u8],
    ) -> Result<()> {
        self.array.initialize(&self.device, None)?;

        if !dev.supports_vertex_arrays() {
            return self.array.upload(vertices);
        }

        self.vertex_array = dev.state().create_vertex_array()?;
        dev.state().bind_vertex_array(self.vertex_array)?;
        self.array.upload(vertices)?;
        dev.state()
            .enable_attributes_with(attributes, &self.descriptors);
        dev.state().bind_vertex_array(0)?;
        Ok(())
    }

    /// Make this geometry the input of the next draw.
    pub fn bind(&self) -> Result<()> {
        let attributes = self
            .attributes
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("geometry is not initialized".into()))?;
        let dev = self.device.upgrade().ok_or(Error::MissingContext)?;

        if self.vertex_array != 0 {
            dev.state().bind_vertex_array(self.vertex_array)?;
            return Ok(());
        }

        trace!(buffer = self.array.id(), "binding geometry without vertex array");
        self.array.bind()?;
        dev.state()
            .enable_attributes_with(attributes, &self.descriptors);
        Ok(())
    }

    /// Replace the vertex data. The attribute layout is unchanged.
    pub fn upload(&mut self, vertices: &[u8]) -> Result<()> {
        self.array.upload(vertices)
    }

    /// Overwrite part of the vertex data.
    pub fn update(&self, offset: usize, vertices: &[u8]) -> Result<()> {
        self.array.update(offset, vertices)
    }

    /// Release the vertex array and the array buffer. The registry keeps its
    /// layout entry.
    pub fn dispose(&mut self) {
        if self.vertex_array != 0 {
            if let Some(dev) = self.device.upgrade() {
                dev.state().delete_vertex_array(self.vertex_array);
            }
            self.vertex_array = 0;
        }
        self.array.dispose();
        if self.attributes.take().is_some() {
            debug!("geometry disposed");
        }
        self.descriptors.clear();
        self.device = Weak::new();
    }

    pub fn array_buffer(&self) -> &Buffer {
        &self.array
    }

    pub fn attributes(&self) -> Option<&Rc<AttributeBuffer>> {
        self.attributes.as_ref()
    }

    /// Descriptors this geometry configures, offsets included.
    pub fn descriptors(&self) -> &[AttributeDescriptor] {
        &self.descriptors
    }

    /// Native id of the vertex array object, `0` on the fallback path.
    pub fn vertex_array(&self) -> GLuint {
        self.vertex_array
    }

    pub fn is_initialized(&self) -> bool {
        self.attributes.is_some()
    }
}

impl Default for GeometryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GeometryBuffer {
    fn drop(&mut self) {
        self.dispose();
    }
}

use std::rc::Weak;

use gl::types::{GLenum, GLuint};
use tracing::debug;

use crate::device::Device;
use crate::error::{Error, Result};

/// Binding target of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Vertex data.
    Array,
    /// 16-bit index data.
    ElementArray,
}

impl BufferKind {
    pub fn gl_target(self) -> GLenum {
        match self {
            Self::Array => gl::ARRAY_BUFFER,
            Self::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// Draw-usage hint passed with every upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    #[default]
    Static,
    Dynamic,
    Stream,
}

impl BufferUsage {
    pub fn gl_enum(self) -> GLenum {
        match self {
            Self::Static => gl::STATIC_DRAW,
            Self::Dynamic => gl::DYNAMIC_DRAW,
            Self::Stream => gl::STREAM_DRAW,
        }
    }
}

/// A vertex or index buffer object.
#[derive(Debug)]
pub struct Buffer {
    device: Weak<Device>,
    id: GLuint,
    kind: BufferKind,
    usage: BufferUsage,
    size: usize,
}

impl Buffer {
    pub fn new(kind: BufferKind, usage: BufferUsage) -> Self {
        Self {
            device: Weak::new(),
            id: 0,
            kind,
            usage,
            size: 0,
        }
    }

    pub fn array(usage: BufferUsage) -> Self {
        Self::new(BufferKind::Array, usage)
    }

    pub fn element_array(usage: BufferUsage) -> Self {
        Self::new(BufferKind::ElementArray, usage)
    }

    /// Allocate the buffer object and, when `data` is given, upload it.
    pub fn initialize(&mut self, device: &Weak<Device>, data: Option<&[u8]>) -> Result<()> {
        if self.id != 0 {
            return Err(Error::AlreadyInitialized);
        }
        let dev = device.upgrade().ok_or(Error::MissingContext)?;
        self.id = dev
            .gl()
            .create_buffer()
            .ok_or(Error::AllocationFailed("buffer"))?;
        self.device = Weak::clone(device);
        debug!(buffer = self.id, kind = ?self.kind, "buffer created");

        if let Some(data) = data {
            self.upload(data)?;
        }
        Ok(())
    }

    /// Bind to this buffer's target through the state cache.
    pub fn bind(&self) -> Result<bool> {
        let dev = self.live_device()?;
        let changed = dev.state().bind_buffer(self.kind.gl_target(), self.id)?;
        Ok(changed)
    }

    /// Replace the whole data store.
    pub fn upload(&mut self, data: &[u8]) -> Result<()> {
        let dev = self.live_device()?;
        dev.state().bind_buffer(self.kind.gl_target(), self.id)?;
        dev.gl()
            .buffer_data(self.kind.gl_target(), data, self.usage.gl_enum());
        self.size = data.len();
        Ok(())
    }

    /// Overwrite `data.len()` bytes starting at `offset`.
    pub fn update(&self, offset: usize, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len());
        if end.map_or(true, |end| end > self.size) {
            return Err(Error::InvalidArgument(format!(
                "update of {} bytes at {offset} exceeds buffer size {}",
                data.len(),
                self.size
            )));
        }
        let dev = self.live_device()?;
        dev.state().bind_buffer(self.kind.gl_target(), self.id)?;
        dev.gl().buffer_sub_data(self.kind.gl_target(), offset, data);
        Ok(())
    }

    /// Release the buffer object. No-op when not initialized.
    pub fn dispose(&mut self) {
        if self.id == 0 {
            return;
        }
        if let Some(dev) = self.device.upgrade() {
            dev.gl().delete_buffer(self.id);
            dev.state().forget_buffer(self.id);
        }
        debug!(buffer = self.id, "buffer disposed");
        self.id = 0;
        self.size = 0;
        self.device = Weak::new();
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Size in bytes of the last upload.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_initialized(&self) -> bool {
        self.id != 0
    }

    fn live_device(&self) -> Result<std::rc::Rc<Device>> {
        if self.id == 0 {
            return Err(Error::InvalidArgument("buffer is not initialized".into()));
        }
        self.device.upgrade().ok_or(Error::MissingContext)
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.dispose();
    }
}

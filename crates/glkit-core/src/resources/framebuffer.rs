use std::rc::{Rc, Weak};

use gl::types::{GLenum, GLuint};
use tracing::{debug, warn};

use super::texture::{Texture, TextureKind};
use crate::device::Device;
use crate::error::{Error, Result};

/// An offscreen render target with a single color attachment.
#[derive(Debug)]
pub struct FrameBuffer {
    device: Weak<Device>,
    id: GLuint,
    color: GLuint,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            device: Weak::new(),
            id: 0,
            color: 0,
        }
    }

    pub fn initialize(&mut self, device: &Weak<Device>) -> Result<()> {
        if self.id != 0 {
            return Err(Error::AlreadyInitialized);
        }
        let dev = device.upgrade().ok_or(Error::MissingContext)?;
        self.id = dev
            .gl()
            .create_framebuffer()
            .ok_or(Error::AllocationFailed("framebuffer"))?;
        self.device = Weak::clone(device);
        debug!(framebuffer = self.id, "framebuffer created");
        Ok(())
    }

    /// Attach level 0 of a 2D texture as color attachment 0.
    ///
    /// Leaves this framebuffer bound.
    pub fn attach_color(&mut self, texture: &Texture) -> Result<()> {
        let dev = self.live_device()?;
        if !texture.is_initialized() {
            return Err(Error::InvalidArgument("texture is not initialized".into()));
        }
        if texture.desc().kind != TextureKind::Texture2d {
            return Err(Error::InvalidArgument(
                "only 2D textures can be color attachments".into(),
            ));
        }
        dev.state().bind_framebuffer(self.id);
        dev.gl().framebuffer_texture_2d(
            gl::FRAMEBUFFER,
            gl::COLOR_ATTACHMENT0,
            gl::TEXTURE_2D,
            texture.id(),
            0,
        );
        self.color = texture.id();
        Ok(())
    }

    /// Query completeness of this framebuffer.
    pub fn check_status(&self) -> Result<()> {
        let dev = self.live_device()?;
        dev.state().bind_framebuffer(self.id);
        let status: GLenum = dev.gl().check_framebuffer_status(gl::FRAMEBUFFER);
        if status != gl::FRAMEBUFFER_COMPLETE {
            warn!(framebuffer = self.id, status, "framebuffer incomplete");
            return Err(Error::IncompleteFramebuffer(status));
        }
        Ok(())
    }

    pub fn bind(&self) -> Result<bool> {
        let dev = self.live_device()?;
        let changed = dev.state().bind_framebuffer(self.id);
        Ok(changed)
    }

    /// Rebind the default framebuffer.
    pub fn unbind(&self) -> Result<bool> {
        let dev = self.device.upgrade().ok_or(Error::MissingContext)?;
        let changed = dev.state().bind_framebuffer(0);
        Ok(changed)
    }

    /// Release the framebuffer object. The attached texture is not touched.
    pub fn dispose(&mut self) {
        if self.id == 0 {
            return;
        }
        if let Some(dev) = self.device.upgrade() {
            dev.gl().delete_framebuffer(self.id);
            dev.state().forget_framebuffer(self.id);
        }
        debug!(framebuffer = self.id, "framebuffer disposed");
        self.id = 0;
        self.color = 0;
        self.device = Weak::new();
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    /// Native id of the attached color texture, `0` when none.
    pub fn color_attachment(&self) -> GLuint {
        self.color
    }

    pub fn is_initialized(&self) -> bool {
        self.id != 0
    }

    fn live_device(&self) -> Result<Rc<Device>> {
        if self.id == 0 {
            return Err(Error::InvalidArgument(
                "framebuffer is not initialized".into(),
            ));
        }
        self.device.upgrade().ok_or(Error::MissingContext)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        self.dispose();
    }
}

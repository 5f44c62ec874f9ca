use std::rc::{Rc, Weak};

use gl::types::{GLenum, GLint, GLsizei, GLuint};
use tracing::debug;

use crate::device::Device;
use crate::error::{Error, Result};

/// Single-channel luminance format of GLES 2 class contexts. Absent from the
/// core profile bindings.
pub const LUMINANCE: GLenum = 0x1909;

/// Texture target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureKind {
    #[default]
    Texture2d,
    /// Six faces uploaded in `+X, -X, +Y, -Y, +Z, -Z` order.
    CubeMap,
}

impl TextureKind {
    pub fn gl_target(self) -> GLenum {
        match self {
            Self::Texture2d => gl::TEXTURE_2D,
            Self::CubeMap => gl::TEXTURE_CUBE_MAP,
        }
    }

    fn upload_targets(self) -> &'static [GLenum] {
        const FACES: [GLenum; 6] = [
            gl::TEXTURE_CUBE_MAP_POSITIVE_X,
            gl::TEXTURE_CUBE_MAP_NEGATIVE_X,
            gl::TEXTURE_CUBE_MAP_POSITIVE_Y,
            gl::TEXTURE_CUBE_MAP_NEGATIVE_Y,
            gl::TEXTURE_CUBE_MAP_POSITIVE_Z,
            gl::TEXTURE_CUBE_MAP_NEGATIVE_Z,
        ];
        match self {
            Self::Texture2d => &[gl::TEXTURE_2D],
            Self::CubeMap => &FACES,
        }
    }
}

/// Pixel format of the texture's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    #[default]
    Rgba8,
    Rgb8,
    Luminance8,
    Alpha8,
}

impl TextureFormat {
    fn gl_format(self) -> GLenum {
        match self {
            Self::Rgba8 => gl::RGBA,
            Self::Rgb8 => gl::RGB,
            Self::Luminance8 => LUMINANCE,
            Self::Alpha8 => gl::ALPHA,
        }
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb8 => 3,
            Self::Luminance8 | Self::Alpha8 => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

impl TextureWrap {
    fn gl_enum(self) -> GLenum {
        match self {
            Self::ClampToEdge => gl::CLAMP_TO_EDGE,
            Self::Repeat => gl::REPEAT,
            Self::MirroredRepeat => gl::MIRRORED_REPEAT,
        }
    }
}

/// Storage description of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureDesc {
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    pub mipmaps: bool,
}

impl TextureDesc {
    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            ..Default::default()
        }
    }

    /// Bytes of pixel data one face occupies.
    pub fn face_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    fn min_filter(&self) -> GLenum {
        match (self.filter, self.mipmaps) {
            (TextureFilter::Nearest, false) => gl::NEAREST,
            (TextureFilter::Linear, false) => gl::LINEAR,
            (TextureFilter::Nearest, true) => gl::NEAREST_MIPMAP_NEAREST,
            (TextureFilter::Linear, true) => gl::LINEAR_MIPMAP_LINEAR,
        }
    }

    /// Fail unless `pixels` covers every face exactly.
    fn check_pixels(&self, pixels: Option<&[u8]>) -> Result<()> {
        let expected = self.face_size() * self.kind.upload_targets().len();
        match pixels {
            Some(pixels) if pixels.len() != expected => Err(Error::InvalidArgument(format!(
                "expected {expected} bytes of pixel data, got {}",
                pixels.len()
            ))),
            _ => Ok(()),
        }
    }

    fn mag_filter(&self) -> GLenum {
        match self.filter {
            TextureFilter::Nearest => gl::NEAREST,
            TextureFilter::Linear => gl::LINEAR,
        }
    }
}

/// A 2D or cube map texture object.
///
/// Setup and uploads go through texture unit 0.
#[derive(Debug)]
pub struct Texture {
    device: Weak<Device>,
    id: GLuint,
    desc: TextureDesc,
}

impl Texture {
    pub fn new() -> Self {
        Self {
            device: Weak::new(),
            id: 0,
            desc: TextureDesc::default(),
        }
    }

    /// Allocate storage for `desc`, set sampling parameters and upload
    /// `pixels` when given (all six faces back to back for cube maps).
    pub fn initialize(
        &mut self,
        device: &Weak<Device>,
        desc: TextureDesc,
        pixels: Option<&[u8]>,
    ) -> Result<()> {
        if self.id != 0 {
            return Err(Error::AlreadyInitialized);
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidArgument(format!(
                "texture dimensions {}x{} are empty",
                desc.width, desc.height
            )));
        }
        desc.check_pixels(pixels)?;
        let dev = device.upgrade().ok_or(Error::MissingContext)?;
        self.id = dev
            .gl()
            .create_texture()
            .ok_or(Error::AllocationFailed("texture"))?;
        self.device = Weak::clone(device);
        self.desc = desc;

        if let Err(err) = self.setup(&dev, pixels) {
            self.dispose();
            return Err(err);
        }
        debug!(texture = self.id, ?desc, "texture created");
        Ok(())
    }

    fn setup(&self, dev: &Rc<Device>, pixels: Option<&[u8]>) -> Result<()> {
        let target = self.desc.kind.gl_target();
        self.select(dev)?;
        let gl = dev.gl();
        gl.tex_parameter(target, gl::TEXTURE_MIN_FILTER, self.desc.min_filter() as GLint);
        gl.tex_parameter(target, gl::TEXTURE_MAG_FILTER, self.desc.mag_filter() as GLint);
        gl.tex_parameter(target, gl::TEXTURE_WRAP_S, self.desc.wrap.gl_enum() as GLint);
        gl.tex_parameter(target, gl::TEXTURE_WRAP_T, self.desc.wrap.gl_enum() as GLint);
        self.write_faces(dev, pixels)
    }

    /// Make this texture the target of unit 0 and unit 0 the active unit.
    ///
    /// The unit cell can already hold this texture while another unit is
    /// active, so activation is issued separately from the bind.
    fn select(&self, dev: &Rc<Device>) -> Result<()> {
        let mut state = dev.state();
        state.activate_texture_unit(0);
        state.bind_texture(0, self.desc.kind.gl_target(), self.id)?;
        Ok(())
    }

    /// Replace the pixel data of every face.
    pub fn upload(&self, pixels: &[u8]) -> Result<()> {
        let dev = self.live_device()?;
        self.desc.check_pixels(Some(pixels))?;
        self.select(&dev)?;
        self.write_faces(&dev, Some(pixels))
    }

    fn write_faces(&self, dev: &Rc<Device>, pixels: Option<&[u8]>) -> Result<()> {
        let faces = self.desc.kind.upload_targets();
        let face_size = self.desc.face_size();
        self.desc.check_pixels(pixels)?;

        let format = self.desc.format.gl_format();
        for (i, &face) in faces.iter().enumerate() {
            let data = pixels.map(|p| &p[i * face_size..(i + 1) * face_size]);
            dev.gl().tex_image_2d(
                face,
                0,
                format as GLint,
                self.desc.width as GLsizei,
                self.desc.height as GLsizei,
                format,
                gl::UNSIGNED_BYTE,
                data,
            );
        }
        if self.desc.mipmaps && pixels.is_some() {
            dev.gl().generate_mipmap(self.desc.kind.gl_target());
        }
        Ok(())
    }

    /// Bind on `unit` through the state cache.
    pub fn bind(&self, unit: u32) -> Result<bool> {
        let dev = self.live_device()?;
        let changed = dev
            .state()
            .bind_texture(unit, self.desc.kind.gl_target(), self.id)?;
        Ok(changed)
    }

    /// Release the texture object. No-op when not initialized.
    pub fn dispose(&mut self) {
        if self.id == 0 {
            return;
        }
        if let Some(dev) = self.device.upgrade() {
            dev.gl().delete_texture(self.id);
            dev.state().forget_texture(self.id);
        }
        debug!(texture = self.id, "texture disposed");
        self.id = 0;
        self.device = Weak::new();
    }

    pub fn id(&self) -> GLuint {
        self.id
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn is_initialized(&self) -> bool {
        self.id != 0
    }

    fn live_device(&self) -> Result<Rc<Device>> {
        if self.id == 0 {
            return Err(Error::InvalidArgument("texture is not initialized".into()));
        }
        self.device.upgrade().ok_or(Error::MissingContext)
    }
}

impl Default for Texture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.dispose();
    }
}

//! Vertex attribute layouts and the registry that canonicalizes them.
//!
//! An [`AttributeBuffer`] is referenced by identity downstream (the state
//! cache records the id of the last layout it configured), so two equal
//! layouts only share an identity when they are both obtained through the
//! same [`AttributeRegistry`].

use std::fmt;
use std::rc::Rc;

use gl::types::{GLenum, GLint, GLsizei, GLuint};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::error::{Error, Result};

/// Non-standard half float enum used by `OES_texture_half_float` contexts.
pub const HALF_FLOAT_OES: GLenum = 0x8D61;

/// Component type of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u32)]
pub enum AttributeType {
    Byte = gl::BYTE,
    UnsignedByte = gl::UNSIGNED_BYTE,
    Short = gl::SHORT,
    UnsignedShort = gl::UNSIGNED_SHORT,
    Float = gl::FLOAT,
    HalfFloat = gl::HALF_FLOAT,
}

impl AttributeType {
    /// Decode a raw GL component type.
    pub fn from_gl(raw: GLenum) -> Result<Self> {
        if raw == HALF_FLOAT_OES {
            return Ok(Self::HalfFloat);
        }
        Self::from_u32(raw).ok_or(Error::UnknownAttributeType(raw))
    }

    pub fn gl_enum(self) -> GLenum {
        self as GLenum
    }

    /// Size in bytes of one component.
    pub fn byte_size(self) -> u32 {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort | Self::HalfFloat => 2,
            Self::Float => 4,
        }
    }
}

/// Byte size of a raw GL attribute type.
///
/// Accepts scalar component types as well as the float vector types reported
/// by attribute reflection.
pub fn attribute_type_size(raw: GLenum) -> Result<u32> {
    match raw {
        gl::FLOAT_VEC2 => Ok(8),
        gl::FLOAT_VEC3 => Ok(12),
        gl::FLOAT_VEC4 => Ok(16),
        other => AttributeType::from_gl(other).map(AttributeType::byte_size),
    }
}

/// How one vertex attribute's bytes are laid out inside a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeDescriptor {
    /// Component count (1..=4).
    pub size: u8,
    pub ty: AttributeType,
    pub normalized: bool,
    /// Byte distance between consecutive vertices. `0` means tightly packed.
    pub stride: u32,
    /// Byte offset of the first component.
    pub offset: u32,
    /// Explicit attribute location. When absent the descriptor's position in
    /// its layout is used.
    pub location: Option<u32>,
}

impl AttributeDescriptor {
    pub fn new(size: u8, ty: AttributeType, stride: u32, offset: u32) -> Self {
        Self {
            size,
            ty,
            normalized: false,
            stride,
            offset,
            location: None,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    pub fn at_location(mut self, location: u32) -> Self {
        self.location = Some(location);
        self
    }

    /// Layout equality used for deduplication. Offset and location do not
    /// take part.
    pub fn same_layout(&self, other: &Self) -> bool {
        self.size == other.size
            && self.ty == other.ty
            && self.normalized == other.normalized
            && self.stride == other.stride
    }

    /// Bytes occupied by one element of this attribute.
    pub fn byte_size(&self) -> u32 {
        u32::from(self.size) * self.ty.byte_size()
    }

    /// Slot this descriptor configures when it sits at `index` in a layout.
    pub fn slot(&self, index: usize) -> GLuint {
        self.location.unwrap_or(index as GLuint)
    }

    pub(crate) fn apply(&self, gl: &dyn crate::GraphicsContext, index: usize) {
        gl.vertex_attrib_pointer(
            self.slot(index),
            GLint::from(self.size),
            self.ty.gl_enum(),
            self.normalized,
            self.stride as GLsizei,
            self.offset as usize,
        );
    }
}

/// Identity of a registered layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeBufferId(u32);

impl AttributeBufferId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AttributeBufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layout#{}", self.0)
    }
}

/// A canonical, ordered set of attribute descriptors.
#[derive(Debug, PartialEq, Eq)]
pub struct AttributeBuffer {
    id: AttributeBufferId,
    descriptors: Vec<AttributeDescriptor>,
}

impl AttributeBuffer {
    pub fn id(&self) -> AttributeBufferId {
        self.id
    }

    pub fn descriptors(&self) -> &[AttributeDescriptor] {
        &self.descriptors
    }

    /// Number of attribute slots this layout occupies.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Whether `descriptors` describes the same layout, position by position.
    pub fn matches(&self, descriptors: &[AttributeDescriptor]) -> bool {
        self.descriptors.len() == descriptors.len()
            && self
                .descriptors
                .iter()
                .zip(descriptors)
                .all(|(a, b)| a.same_layout(b))
    }
}

/// Memoizing registry of attribute layouts.
///
/// Entries are never evicted; the registry lives as long as the device that
/// owns it.
#[derive(Debug, Default)]
pub struct AttributeRegistry {
    entries: Vec<Rc<AttributeBuffer>>,
    next_id: u32,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the registered layout equal to `descriptors`, registering a new
    /// one when there is none.
    pub fn create(&mut self, descriptors: &[AttributeDescriptor]) -> Result<Rc<AttributeBuffer>> {
        if descriptors.is_empty() {
            return Err(Error::InvalidArgument(
                "attribute descriptor list is empty".into(),
            ));
        }
        check_slots(descriptors)?;
        if let Some(existing) = self.lookup(descriptors) {
            return Ok(existing);
        }

        let entry = Rc::new(AttributeBuffer {
            id: AttributeBufferId(self.next_id),
            descriptors: descriptors.to_vec(),
        });
        self.next_id += 1;
        tracing::debug!(id = %entry.id, slots = entry.len(), "registered attribute layout");
        self.entries.push(Rc::clone(&entry));
        Ok(entry)
    }

    /// First registered layout equal to `descriptors`.
    pub fn lookup(&self, descriptors: &[AttributeDescriptor]) -> Option<Rc<AttributeBuffer>> {
        self.entries
            .iter()
            .find(|entry| entry.matches(descriptors))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The enable protocol only ever enables slots `[0, len)`, so explicit
/// locations must cover exactly those slots.
fn check_slots(descriptors: &[AttributeDescriptor]) -> Result<()> {
    let mut seen = vec![false; descriptors.len()];
    for (index, descriptor) in descriptors.iter().enumerate() {
        let slot = descriptor.slot(index) as usize;
        match seen.get_mut(slot) {
            Some(taken) if !*taken => *taken = true,
            Some(_) => {
                return Err(Error::InvalidArgument(format!(
                    "attribute slot {slot} is used twice"
                )))
            }
            None => {
                return Err(Error::InvalidArgument(format!(
                    "attribute location {slot} is outside a {}-slot layout",
                    descriptors.len()
                )))
            }
        }
    }
    Ok(())
}

//! Byte views of vertex and index data for buffer uploads.

/// Plain-old-data element that can be uploaded to a buffer as raw bytes.
///
/// # Safety
///
/// Only implement on `#[repr(C)]` structs (or primitives) whose fields are all
/// plain numeric types with no padding, pointers or references.
///
/// # Example
///
/// ```rust,ignore
/// #[repr(C)]
/// #[derive(Clone, Copy)]
/// struct Vertex {
///     position: [f32; 3],
///     uv: [f32; 2],
/// }
///
/// unsafe impl AsBytes for Vertex {}
///
/// let geometry = device.create_geometry(&layout, as_byte_slice(&vertices), BufferUsage::Static)?;
/// ```
pub unsafe trait AsBytes: Sized + Copy {
    /// View `self` as a byte slice of length `size_of::<Self>()`.
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: implementors guarantee a padding-free POD layout.
        unsafe { std::slice::from_raw_parts(self as *const Self as *const u8, std::mem::size_of::<Self>()) }
    }
}

/// View a slice of elements as one contiguous byte slice.
pub fn as_byte_slice<T: AsBytes>(items: &[T]) -> &[u8] {
    // SAFETY: `T: AsBytes` is padding-free POD and the slice is contiguous.
    unsafe { std::slice::from_raw_parts(items.as_ptr() as *const u8, std::mem::size_of_val(items)) }
}

unsafe impl AsBytes for u8 {}
unsafe impl AsBytes for u16 {}
unsafe impl AsBytes for u32 {}
unsafe impl AsBytes for i8 {}
unsafe impl AsBytes for i16 {}
unsafe impl AsBytes for i32 {}
unsafe impl AsBytes for f32 {}
unsafe impl<T: AsBytes, const N: usize> AsBytes for [T; N] {}

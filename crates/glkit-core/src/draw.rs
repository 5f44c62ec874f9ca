//! Primitive kinds, vertex-count arithmetic and per-frame draw statistics.

use gl::types::GLenum;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::error::{Error, Result};

/// Element type of every index buffer drawn through
/// [`Device::draw_indexed_primitive`](crate::Device::draw_indexed_primitive).
///
/// Indices are always 16 bits; meshes with more than 65536 vertices must be
/// split.
pub const INDEX_TYPE: GLenum = gl::UNSIGNED_SHORT;

/// Byte size of one index of [`INDEX_TYPE`].
pub const INDEX_SIZE: usize = 2;

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum PrimitiveType {
    PointList = 0,
    LineList = 1,
    LineStrip = 2,
    TriangleList = 3,
    TriangleStrip = 4,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 5] = [
        Self::PointList,
        Self::LineList,
        Self::LineStrip,
        Self::TriangleList,
        Self::TriangleStrip,
    ];

    /// Decode a raw primitive code (`0..=4`).
    pub fn from_code(code: u32) -> Result<Self> {
        <Self as FromPrimitive>::from_u32(code).ok_or(Error::UnknownPrimitiveType(code))
    }

    pub fn gl_mode(self) -> GLenum {
        match self {
            Self::PointList => gl::POINTS,
            Self::LineList => gl::LINES,
            Self::LineStrip => gl::LINE_STRIP,
            Self::TriangleList => gl::TRIANGLES,
            Self::TriangleStrip => gl::TRIANGLE_STRIP,
        }
    }

    /// Number of vertices (or indices) `primitives` primitives consume.
    ///
    /// Strips of zero primitives still report their seed vertices.
    pub fn vertex_count(self, primitives: u32) -> u32 {
        match self {
            Self::PointList => primitives,
            Self::LineList => primitives * 2,
            Self::LineStrip => primitives + 1,
            Self::TriangleList => primitives * 3,
            Self::TriangleStrip => primitives + 2,
        }
    }
}

/// Counters for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawStats {
    pub draw_calls: u64,
    /// Primitive totals indexed by `PrimitiveType as usize`.
    pub primitives: [u64; 5],
}

impl DrawStats {
    pub fn record(&mut self, kind: PrimitiveType, primitives: u32) {
        self.draw_calls += 1;
        self.primitives[kind as usize] += u64::from(primitives);
    }

    pub fn primitives_of(&self, kind: PrimitiveType) -> u64 {
        self.primitives[kind as usize]
    }

    pub fn total_primitives(&self) -> u64 {
        self.primitives.iter().sum()
    }
}

/// Double-buffered statistics: the frame being recorded and the last
/// completed one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    current: DrawStats,
    previous: DrawStats,
}

impl FrameStats {
    pub fn record(&mut self, kind: PrimitiveType, primitives: u32) {
        self.current.record(kind, primitives);
    }

    /// Move the current counters to the previous slot and start a fresh frame.
    pub fn end_frame(&mut self) -> DrawStats {
        self.previous = std::mem::take(&mut self.current);
        self.previous
    }

    pub fn current(&self) -> DrawStats {
        self.current
    }

    pub fn previous(&self) -> DrawStats {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_counts() {
        assert_eq!(PrimitiveType::PointList.vertex_count(7), 7);
        assert_eq!(PrimitiveType::LineList.vertex_count(3), 6);
        assert_eq!(PrimitiveType::LineStrip.vertex_count(3), 4);
        assert_eq!(PrimitiveType::TriangleList.vertex_count(4), 12);
        assert_eq!(PrimitiveType::TriangleStrip.vertex_count(2), 4);
        assert_eq!(PrimitiveType::TriangleStrip.vertex_count(0), 2);
    }

    #[test]
    fn decodes_codes() {
        for kind in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_code(kind as u32), Ok(kind));
        }
        assert_eq!(
            PrimitiveType::from_code(5),
            Err(Error::UnknownPrimitiveType(5))
        );
    }

    #[test]
    fn end_frame_rotates_counters() {
        let mut stats = FrameStats::default();
        stats.record(PrimitiveType::TriangleList, 10);
        stats.record(PrimitiveType::TriangleList, 2);
        stats.record(PrimitiveType::LineStrip, 1);

        let finished = stats.end_frame();
        assert_eq!(finished.draw_calls, 3);
        assert_eq!(finished.primitives_of(PrimitiveType::TriangleList), 12);
        assert_eq!(finished.total_primitives(), 13);
        assert_eq!(stats.previous(), finished);
        assert_eq!(stats.current(), DrawStats::default());

        stats.end_frame();
        assert_eq!(stats.previous(), DrawStats::default());
    }
}

use core::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::ChunkCoord;

/// Absolute block coordinate in the world grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Block containing a continuous world-space point.
    #[inline]
    pub fn containing(p: [f32; 3]) -> Self {
        Self::new(p[0].floor() as i32, p[1].floor() as i32, p[2].floor() as i32)
    }
}

impl Add for BlockPos {
    type Output = BlockPos;
    #[inline]
    fn add(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for BlockPos {
    type Output = BlockPos;
    #[inline]
    fn sub(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from(v: (i32, i32, i32)) -> Self {
        Self::new(v.0, v.1, v.2)
    }
}

/// Horizontal edge length and vertical height of every chunk in a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkDims {
    pub size: i32,
    pub height: i32,
}

impl Default for ChunkDims {
    fn default() -> Self {
        Self {
            size: 16,
            height: 100,
        }
    }
}

impl ChunkDims {
    #[inline]
    pub const fn new(size: i32, height: i32) -> Self {
        Self { size, height }
    }

    #[inline]
    pub fn volume(self) -> usize {
        (self.size as usize) * (self.height as usize) * (self.size as usize)
    }

    /// Minimum corner of a chunk in world block coordinates. Saturates for
    /// chunks outside the representable world.
    #[inline]
    pub fn origin(self, c: ChunkCoord) -> BlockPos {
        BlockPos::new(
            c.cx.saturating_mul(self.size),
            c.cy.saturating_mul(self.height),
            c.cz.saturating_mul(self.size),
        )
    }

    /// Pulls `c` inward until every chunk within `margin` of it has both
    /// corners inside the i32 block range.
    pub fn clamp_chunk(self, c: ChunkCoord, margin: i32) -> ChunkCoord {
        let margin = margin.max(0);
        let lim_xz = (i32::MAX / self.size.max(1) - 1 - margin).max(0);
        let lim_y = (i32::MAX / self.height.max(1) - 1 - margin).max(0);
        ChunkCoord::new(
            c.cx.clamp(-lim_xz, lim_xz),
            c.cy.clamp(-lim_y, lim_y),
            c.cz.clamp(-lim_xz, lim_xz),
        )
    }

    /// Chunk containing a world block; floors toward negative infinity.
    #[inline]
    pub fn chunk_of(self, p: BlockPos) -> ChunkCoord {
        ChunkCoord::new(
            p.x.div_euclid(self.size),
            p.y.div_euclid(self.height),
            p.z.div_euclid(self.size),
        )
    }

    /// Chunk containing a continuous world-space point.
    #[inline]
    pub fn chunk_of_point(self, p: [f32; 3]) -> ChunkCoord {
        self.chunk_of(BlockPos::containing(p))
    }

    /// Position inside its chunk, each axis in `[0, size)` / `[0, height)`.
    #[inline]
    pub fn local_of(self, p: BlockPos) -> (i32, i32, i32) {
        (
            p.x.rem_euclid(self.size),
            p.y.rem_euclid(self.height),
            p.z.rem_euclid(self.size),
        )
    }

    #[inline]
    pub fn contains_local(self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && y >= 0 && z >= 0 && x < self.size && y < self.height && z < self.size
    }

    #[inline]
    pub fn is_aligned(self, p: BlockPos) -> bool {
        p.x.rem_euclid(self.size) == 0
            && p.y.rem_euclid(self.height) == 0
            && p.z.rem_euclid(self.size) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_floor() {
        let d = ChunkDims::new(16, 100);
        assert_eq!(d.chunk_of(BlockPos::new(-1, 0, 0)), ChunkCoord::new(-1, 0, 0));
        assert_eq!(d.chunk_of(BlockPos::new(-16, -1, 15)), ChunkCoord::new(-1, -1, 0));
        assert_eq!(d.local_of(BlockPos::new(-1, -1, -17)), (15, 99, 15));
    }

    #[test]
    fn origin_is_aligned_min_corner() {
        let d = ChunkDims::new(16, 100);
        let o = d.origin(ChunkCoord::new(-2, 0, 3));
        assert_eq!(o, BlockPos::new(-32, 0, 48));
        assert!(d.is_aligned(o));
        assert!(!d.is_aligned(BlockPos::new(1, 0, 0)));
    }

    #[test]
    fn far_chunks_clamp_inside_block_range() {
        let d = ChunkDims::new(16, 100);
        let far = d.chunk_of_point([3.0e9, 64.0, -3.0e9]);
        let c = d.clamp_chunk(far, 4);
        assert!(c.cx < far.cx && c.cz > far.cz);
        assert_eq!(c.cy, 0);
        let edge = d.origin(c.offset(4, 0, 0));
        assert!(edge.x.checked_add(d.size).is_some());
        assert!(d.origin(c.offset(0, 0, -4)).z.checked_sub(d.size).is_some());
        let near = ChunkCoord::new(-3, 0, 12);
        assert_eq!(d.clamp_chunk(near, 4), near);
        assert_eq!(d.origin(ChunkCoord::new(i32::MAX, 0, i32::MIN)).x, i32::MAX);
    }

    #[test]
    fn point_maps_through_floor() {
        let d = ChunkDims::new(16, 100);
        assert_eq!(d.chunk_of_point([-0.5, 10.0, 15.9]), ChunkCoord::new(-1, 0, 0));
        assert_eq!(d.chunk_of_point([16.0, 99.9, 0.0]), ChunkCoord::new(1, 0, 0));
    }
}

use strata_blocks::BlockKind;
use strata_world::{BlockPos, ChunkCoord, ChunkDims};
use thiserror::Error;

use crate::BlockLookup;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkDataError {
    #[error("block array has {actual} entries, expected {expected}")]
    WrongLength { expected: usize, actual: usize },
    #[error("chunk position ({x}, {y}, {z}) is not aligned to the chunk grid")]
    Misaligned { x: i32, y: i32, z: i32 },
}

/// Leaf placements recorded during generation, in chunk-local coordinates
/// that may point outside the chunk. Written into the world in a later pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeData {
    pub leaves: Vec<[i32; 3]>,
}

/// One chunk column worth of blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkData {
    pub coord: ChunkCoord,
    pub dims: ChunkDims,
    pub origin: BlockPos,
    blocks: Vec<BlockKind>,
    pub modified_by_player: bool,
    pub trees: TreeData,
}

impl ChunkData {
    pub fn new_empty(coord: ChunkCoord, dims: ChunkDims) -> Self {
        Self {
            coord,
            dims,
            origin: dims.origin(coord),
            blocks: vec![BlockKind::Nothing; dims.volume()],
            modified_by_player: false,
            trees: TreeData::default(),
        }
    }

    pub fn from_blocks(
        coord: ChunkCoord,
        dims: ChunkDims,
        blocks: Vec<BlockKind>,
    ) -> Result<Self, ChunkDataError> {
        let expected = dims.volume();
        if blocks.len() != expected {
            return Err(ChunkDataError::WrongLength {
                expected,
                actual: blocks.len(),
            });
        }
        Ok(Self {
            coord,
            dims,
            origin: dims.origin(coord),
            blocks,
            modified_by_player: false,
            trees: TreeData::default(),
        })
    }

    /// Like `from_blocks`, keyed by the chunk's world-space min corner.
    pub fn from_origin(
        origin: BlockPos,
        dims: ChunkDims,
        blocks: Vec<BlockKind>,
    ) -> Result<Self, ChunkDataError> {
        if !dims.is_aligned(origin) {
            return Err(ChunkDataError::Misaligned {
                x: origin.x,
                y: origin.y,
                z: origin.z,
            });
        }
        Self::from_blocks(dims.chunk_of(origin), dims, blocks)
    }

    /// `x + size*y + size*height*z`; caller guarantees in-bounds.
    #[inline]
    pub fn index(&self, x: i32, y: i32, z: i32) -> usize {
        debug_assert!(self.dims.contains_local(x, y, z));
        let s = self.dims.size as usize;
        let h = self.dims.height as usize;
        x as usize + s * y as usize + s * h * z as usize
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        self.dims.contains_local(x, y, z)
    }

    #[inline]
    pub fn blocks(&self) -> &[BlockKind] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<BlockKind> {
        self.blocks
    }

    #[inline]
    pub fn get_local(&self, x: i32, y: i32, z: i32) -> Option<BlockKind> {
        if self.in_bounds(x, y, z) {
            Some(self.blocks[self.index(x, y, z)])
        } else {
            None
        }
    }

    /// Reads a local coordinate, delegating anything outside this chunk to `world`.
    #[inline]
    pub fn block(&self, world: &impl BlockLookup, x: i32, y: i32, z: i32) -> BlockKind {
        match self.get_local(x, y, z) {
            Some(b) => b,
            None => world.block_at(self.local_to_world(x, y, z)),
        }
    }

    /// In-bounds write; returns false and leaves the chunk untouched otherwise.
    #[inline]
    pub fn set_local(&mut self, x: i32, y: i32, z: i32, kind: BlockKind) -> bool {
        if !self.in_bounds(x, y, z) {
            return false;
        }
        let i = self.index(x, y, z);
        self.blocks[i] = kind;
        true
    }

    #[inline]
    pub fn local_to_world(&self, x: i32, y: i32, z: i32) -> BlockPos {
        BlockPos::new(self.origin.x + x, self.origin.y + y, self.origin.z + z)
    }

    #[inline]
    pub fn world_to_local(&self, p: BlockPos) -> (i32, i32, i32) {
        (p.x - self.origin.x, p.y - self.origin.y, p.z - self.origin.z)
    }

    #[inline]
    pub fn contains_world(&self, p: BlockPos) -> bool {
        let (x, y, z) = self.world_to_local(p);
        self.in_bounds(x, y, z)
    }

    /// True when `p` lies in this chunk and touches one of its six faces.
    pub fn is_on_edge(&self, p: BlockPos) -> bool {
        let (x, y, z) = self.world_to_local(p);
        if !self.in_bounds(x, y, z) {
            return false;
        }
        let s = self.dims.size - 1;
        let h = self.dims.height - 1;
        x == 0 || x == s || y == 0 || y == h || z == 0 || z == s
    }

    /// Chunks sharing a face with the block at `p`, whether loaded or not.
    /// Corner blocks yield up to three; a one-block-wide chunk yields both sides.
    pub fn edge_neighbor_coords(&self, p: BlockPos) -> Vec<ChunkCoord> {
        let (x, y, z) = self.world_to_local(p);
        let mut out = Vec::new();
        if !self.in_bounds(x, y, z) {
            return out;
        }
        let c = self.coord;
        let s = self.dims.size - 1;
        let h = self.dims.height - 1;
        if x == 0 {
            out.push(c.offset(-1, 0, 0));
        }
        if x == s {
            out.push(c.offset(1, 0, 0));
        }
        if y == 0 {
            out.push(c.offset(0, -1, 0));
        }
        if y == h {
            out.push(c.offset(0, 1, 0));
        }
        if z == 0 {
            out.push(c.offset(0, 0, -1));
        }
        if z == s {
            out.push(c.offset(0, 0, 1));
        }
        out
    }

    pub fn iter_local(&self) -> LocalIter {
        LocalIter::new(self.dims)
    }

    pub fn is_all_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.is_empty())
    }
}

/// Every local coordinate exactly once: x fastest, then y, then z.
/// The i-th item is the coordinate whose index is i.
#[derive(Clone, Debug)]
pub struct LocalIter {
    dims: ChunkDims,
    x: i32,
    y: i32,
    z: i32,
}

impl LocalIter {
    pub fn new(dims: ChunkDims) -> Self {
        Self {
            dims,
            x: 0,
            y: 0,
            z: 0,
        }
    }
}

impl Iterator for LocalIter {
    type Item = (i32, i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.dims.size <= 0 || self.dims.height <= 0 || self.z >= self.dims.size {
            return None;
        }
        let out = (self.x, self.y, self.z);
        self.x += 1;
        if self.x == self.dims.size {
            self.x = 0;
            self.y += 1;
            if self.y == self.dims.height {
                self.y = 0;
                self.z += 1;
            }
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.dims.size <= 0 || self.dims.height <= 0 || self.z >= self.dims.size {
            return (0, Some(0));
        }
        let s = self.dims.size as usize;
        let h = self.dims.height as usize;
        let done = self.x as usize + s * self.y as usize + s * h * self.z as usize;
        let left = self.dims.volume() - done;
        (left, Some(left))
    }
}

impl ExactSizeIterator for LocalIter {}

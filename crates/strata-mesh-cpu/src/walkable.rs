use strata_blocks::BlockCatalog;
use strata_chunk::{BlockLookup, ChunkData};
use strata_geom::Vec3;

use crate::Face;

/// Upward quads over every standable block, handed to navigation baking.
#[derive(Clone, Debug, Default)]
pub struct WalkableSurface {
    pub pos: Vec<Vec3>,
    pub idx: Vec<u32>,
}

impl WalkableSurface {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.idx.len() / 6
    }
}

/// One quad at `y + 1` for each solid block with empty space directly above.
pub fn build_walkable_surface(chunk: &ChunkData, world: &impl BlockLookup, cat: &BlockCatalog) -> WalkableSurface {
    let mut out = WalkableSurface::default();
    for (x, y, z) in chunk.iter_local() {
        let kind = chunk.blocks()[chunk.index(x, y, z)];
        if !cat.is_solid(kind) {
            continue;
        }
        if !chunk.block(world, x, y + 1, z).is_empty() {
            continue;
        }
        let base = out.pos.len() as u32;
        out.pos
            .extend_from_slice(&Face::PosY.corners(x as f32, y as f32, z as f32));
        out.idx
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    out
}

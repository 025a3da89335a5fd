use strata_blocks::BlockKind;
use strata_world::BlockPos;

/// Total world-space block query. Unloaded space answers `Nothing`.
pub trait BlockLookup {
    fn block_at(&self, p: BlockPos) -> BlockKind;
}

/// A lookup with no world behind it; everything outside a chunk is empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoNeighbors;

impl BlockLookup for NoNeighbors {
    #[inline]
    fn block_at(&self, _p: BlockPos) -> BlockKind {
        BlockKind::Nothing
    }
}

impl<T: BlockLookup + ?Sized> BlockLookup for &T {
    #[inline]
    fn block_at(&self, p: BlockPos) -> BlockKind {
        (**self).block_at(p)
    }
}

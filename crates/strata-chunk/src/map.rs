use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use strata_blocks::BlockKind;
use strata_world::{BlockPos, ChunkCoord, ChunkDims};

use crate::{BlockLookup, ChunkData};

/// Loaded chunk payloads keyed by grid coordinate.
///
/// Payloads are shared; a clone of the map is a cheap snapshot that later
/// edits never reach, since every write goes through `Arc::make_mut`.
///
/// Each chunk keeps its tree leaf records for as long as it is loaded. The
/// map remembers which `(source, target)` pairs have already been patched,
/// and forgets a pair as soon as either side leaves the map, so a target
/// that is evicted and generated again receives the same leaves again.
#[derive(Clone, Debug)]
pub struct ChunkMap {
    dims: ChunkDims,
    chunks: HashMap<ChunkCoord, Arc<ChunkData>>,
    leaf_links: HashSet<(ChunkCoord, ChunkCoord)>,
}

impl ChunkMap {
    pub fn new(dims: ChunkDims) -> Self {
        Self {
            dims,
            chunks: HashMap::new(),
            leaf_links: HashSet::new(),
        }
    }

    #[inline]
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn contains(&self, c: ChunkCoord) -> bool {
        self.chunks.contains_key(&c)
    }

    #[inline]
    pub fn get(&self, c: ChunkCoord) -> Option<&Arc<ChunkData>> {
        self.chunks.get(&c)
    }

    /// Mutable access; clones the payload first if a snapshot still shares it.
    pub fn get_mut(&mut self, c: ChunkCoord) -> Option<&mut ChunkData> {
        self.chunks.get_mut(&c).map(Arc::make_mut)
    }

    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChunkCoord, &Arc<ChunkData>)> {
        self.chunks.iter()
    }

    /// Adds a chunk unless one already exists there. Existing entries win.
    pub fn insert_if_absent(&mut self, chunk: Arc<ChunkData>) -> bool {
        match self.chunks.entry(chunk.coord) {
            hashbrown::hash_map::Entry::Occupied(_) => false,
            hashbrown::hash_map::Entry::Vacant(v) => {
                v.insert(chunk);
                true
            }
        }
    }

    /// Adds or replaces a chunk. A replaced chunk starts a new residency.
    pub fn insert(&mut self, chunk: ChunkData) -> Option<Arc<ChunkData>> {
        let c = chunk.coord;
        let old = self.chunks.insert(c, Arc::new(chunk));
        if old.is_some() {
            self.forget_leaf_links(c);
        }
        old
    }

    pub fn remove(&mut self, c: ChunkCoord) -> Option<Arc<ChunkData>> {
        let old = self.chunks.remove(&c);
        if old.is_some() {
            self.forget_leaf_links(c);
        }
        old
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.leaf_links.clear();
    }

    fn forget_leaf_links(&mut self, c: ChunkCoord) {
        self.leaf_links.retain(|(src, dst)| *src != c && *dst != c);
    }

    /// Targets that already hold the leaves recorded by `src`, sorted.
    pub fn leaf_targets(&self, src: ChunkCoord) -> Vec<ChunkCoord> {
        let mut out: Vec<ChunkCoord> = self
            .leaf_links
            .iter()
            .filter(|(s, _)| *s == src)
            .map(|(_, t)| *t)
            .collect();
        out.sort();
        out
    }

    /// Records that `src`'s leaves are already present in `dst`, for chunks
    /// restored with their leaves in place. Ignored unless both are loaded.
    pub fn mark_leaves_applied(&mut self, src: ChunkCoord, dst: ChunkCoord) -> bool {
        if !self.chunks.contains_key(&src) || !self.chunks.contains_key(&dst) {
            return false;
        }
        self.leaf_links.insert((src, dst))
    }

    /// True while `c` still maps to exactly the payload `seen`.
    #[inline]
    pub fn same_entry(&self, c: ChunkCoord, seen: Option<&Arc<ChunkData>>) -> bool {
        match (self.chunks.get(&c), seen) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    #[inline]
    pub fn chunk_at(&self, p: BlockPos) -> Option<&Arc<ChunkData>> {
        self.chunks.get(&self.dims.chunk_of(p))
    }

    /// Writes a world block. Returns the owning chunk, or `None` when it is not loaded.
    pub fn set_block(&mut self, p: BlockPos, kind: BlockKind) -> Option<ChunkCoord> {
        let c = self.dims.chunk_of(p);
        let chunk = self.get_mut(c)?;
        let (x, y, z) = chunk.world_to_local(p);
        chunk.set_local(x, y, z, kind);
        Some(c)
    }

    /// Writes a chunk-local coordinate, resolving out-of-range positions to
    /// the neighbour that owns them.
    pub fn set_local(&mut self, c: ChunkCoord, x: i32, y: i32, z: i32, kind: BlockKind) -> Option<ChunkCoord> {
        let p = self.dims.origin(c) + BlockPos::new(x, y, z);
        self.set_block(p, kind)
    }

    /// Loaded chunks that share a face with the block at `p`.
    pub fn edge_neighbors(&self, c: ChunkCoord, p: BlockPos) -> Vec<&Arc<ChunkData>> {
        let Some(chunk) = self.chunks.get(&c) else {
            return Vec::new();
        };
        chunk
            .edge_neighbor_coords(p)
            .into_iter()
            .filter_map(|n| self.chunks.get(&n))
            .collect()
    }

    /// Writes recorded leaves into every loaded chunk that has not received
    /// them yet during the current residency of both chunks.
    ///
    /// Leaves only replace empty blocks. Records aimed at unloaded chunks
    /// wait for a later pass; records outside the source's vertical span are
    /// skipped. Returns every chunk whose blocks changed.
    pub fn patch_tree_leaves(&mut self) -> Vec<ChunkCoord> {
        let sources: Vec<ChunkCoord> = self
            .chunks
            .iter()
            .filter(|(_, c)| !c.trees.leaves.is_empty())
            .map(|(k, _)| *k)
            .collect();
        let mut changed: HashSet<ChunkCoord> = HashSet::new();
        for src in sources {
            let Some(chunk) = self.chunks.get(&src) else {
                continue;
            };
            let origin = chunk.origin;
            let records = chunk.trees.leaves.clone();
            let mut reached: HashSet<ChunkCoord> = HashSet::new();
            for l in &records {
                let p = origin + BlockPos::new(l[0], l[1], l[2]);
                if p.y < origin.y || p.y >= origin.y + self.dims.height {
                    continue;
                }
                let target = self.dims.chunk_of(p);
                if !self.chunks.contains_key(&target) || self.leaf_links.contains(&(src, target)) {
                    continue;
                }
                reached.insert(target);
                if self.block_at(p).is_empty() && self.set_block(p, BlockKind::TreeLeavesSolid).is_some() {
                    changed.insert(target);
                }
            }
            for target in reached {
                self.leaf_links.insert((src, target));
            }
        }
        let mut out: Vec<ChunkCoord> = changed.into_iter().collect();
        out.sort();
        if !out.is_empty() {
            log::trace!(target: "pipeline", "leaf patch touched {} chunks", out.len());
        }
        out
    }
}

impl BlockLookup for ChunkMap {
    #[inline]
    fn block_at(&self, p: BlockPos) -> BlockKind {
        match self.chunk_at(p) {
            Some(c) => {
                let (x, y, z) = c.world_to_local(p);
                c.get_local(x, y, z).unwrap_or(BlockKind::Nothing)
            }
            None => BlockKind::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> ChunkDims {
        ChunkDims::new(4, 8)
    }

    #[test]
    fn snapshot_survives_later_edits() {
        let mut map = ChunkMap::new(dims());
        map.insert(ChunkData::new_empty(ChunkCoord::new(0, 0, 0), dims()));
        let snap = map.clone();
        assert!(map.same_entry(ChunkCoord::new(0, 0, 0), snap.get(ChunkCoord::new(0, 0, 0))));
        map.set_block(BlockPos::new(1, 1, 1), BlockKind::Stone);
        assert_eq!(map.block_at(BlockPos::new(1, 1, 1)), BlockKind::Stone);
        assert_eq!(snap.block_at(BlockPos::new(1, 1, 1)), BlockKind::Nothing);
        assert!(!map.same_entry(ChunkCoord::new(0, 0, 0), snap.get(ChunkCoord::new(0, 0, 0))));
    }

    #[test]
    fn insert_if_absent_keeps_existing() {
        let mut map = ChunkMap::new(dims());
        let c = ChunkCoord::new(2, 0, -1);
        let mut first = ChunkData::new_empty(c, dims());
        first.set_local(0, 0, 0, BlockKind::Dirt);
        assert!(map.insert_if_absent(Arc::new(first)));
        assert!(!map.insert_if_absent(Arc::new(ChunkData::new_empty(c, dims()))));
        assert_eq!(map.len(), 1);
        assert_eq!(map.block_at(dims().origin(c)), BlockKind::Dirt);
    }

    #[test]
    fn set_local_resolves_neighbour() {
        let mut map = ChunkMap::new(dims());
        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(1, 0, 0);
        map.insert(ChunkData::new_empty(a, dims()));
        map.insert(ChunkData::new_empty(b, dims()));
        assert_eq!(map.set_local(a, 4, 2, 1, BlockKind::Stone), Some(b));
        assert_eq!(map.get(b).and_then(|c| c.get_local(0, 2, 1)), Some(BlockKind::Stone));
        assert_eq!(map.set_local(a, -1, 2, 1, BlockKind::Stone), None);
    }

    #[test]
    fn leaves_wait_for_their_target_chunk() {
        let mut map = ChunkMap::new(dims());
        let a = ChunkCoord::new(0, 0, 0);
        let mut src = ChunkData::new_empty(a, dims());
        src.trees.leaves = vec![[1, 5, 1], [5, 5, 1], [1, 9, 1]];
        src.set_local(1, 6, 1, BlockKind::Stone);
        map.insert(src);

        assert_eq!(map.patch_tree_leaves(), vec![a]);
        assert_eq!(map.block_at(BlockPos::new(1, 5, 1)), BlockKind::TreeLeavesSolid);
        assert_eq!(map.leaf_targets(a), vec![a]);
        // Records stay with their source for its whole residency.
        assert_eq!(map.get(a).map(|c| c.trees.leaves.len()), Some(3));

        let b = ChunkCoord::new(1, 0, 0);
        map.insert(ChunkData::new_empty(b, dims()));
        assert_eq!(map.patch_tree_leaves(), vec![b]);
        assert_eq!(map.block_at(BlockPos::new(5, 5, 1)), BlockKind::TreeLeavesSolid);
        assert_eq!(map.leaf_targets(a), vec![a, b]);
        assert!(map.patch_tree_leaves().is_empty());
    }

    #[test]
    fn regenerated_neighbour_receives_its_leaves_again() {
        let mut map = ChunkMap::new(dims());
        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(1, 0, 0);
        let mut src = ChunkData::new_empty(a, dims());
        src.trees.leaves = vec![[3, 4, 2], [4, 4, 2], [5, 4, 2]];
        map.insert(src);
        map.insert(ChunkData::new_empty(b, dims()));
        map.patch_tree_leaves();
        let first = map.get(b).cloned().expect("b loaded");

        map.remove(b);
        assert_eq!(map.leaf_targets(a), vec![a]);
        map.insert_if_absent(Arc::new(ChunkData::new_empty(b, dims())));
        assert_eq!(map.patch_tree_leaves(), vec![b]);
        assert_eq!(map.get(b).map(|c| c.blocks().to_vec()), Some(first.blocks().to_vec()));
    }

    #[test]
    fn carved_leaves_stay_carved_while_both_chunks_stay() {
        let mut map = ChunkMap::new(dims());
        let a = ChunkCoord::new(0, 0, 0);
        let mut src = ChunkData::new_empty(a, dims());
        src.trees.leaves = vec![[2, 4, 2]];
        map.insert(src);
        map.patch_tree_leaves();
        map.set_block(BlockPos::new(2, 4, 2), BlockKind::Air);
        assert!(map.patch_tree_leaves().is_empty());
        assert_eq!(map.block_at(BlockPos::new(2, 4, 2)), BlockKind::Air);
    }

    #[test]
    fn restored_links_only_between_loaded_chunks() {
        let mut map = ChunkMap::new(dims());
        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(0, 0, 1);
        let mut src = ChunkData::new_empty(a, dims());
        src.trees.leaves = vec![[1, 2, 5]];
        map.insert(src);
        assert!(!map.mark_leaves_applied(a, b));
        map.insert(ChunkData::new_empty(b, dims()));
        assert!(map.mark_leaves_applied(a, b));
        assert!(map.patch_tree_leaves().is_empty());
        assert_eq!(map.block_at(BlockPos::new(1, 2, 5)), BlockKind::Nothing);
    }

    #[test]
    fn leaves_never_replace_solid_blocks() {
        let mut map = ChunkMap::new(dims());
        let a = ChunkCoord::new(0, 0, 0);
        let mut src = ChunkData::new_empty(a, dims());
        src.set_local(2, 3, 2, BlockKind::TreeTrunk);
        src.trees.leaves = vec![[2, 3, 2]];
        map.insert(src);
        assert!(map.patch_tree_leaves().is_empty());
        assert_eq!(map.block_at(BlockPos::new(2, 3, 2)), BlockKind::TreeTrunk);
        assert!(map.patch_tree_leaves().is_empty());
    }
}

use strata_blocks::BlockKind;
use strata_world::{ChunkCoord, GenCtx, TerrainGenerator};

use crate::ChunkData;

/// Produces one chunk's terrain. Trunks are written directly; leaves are
/// only recorded, since their footprint may reach chunks that do not exist yet.
pub fn generate_chunk_data(terrain: &TerrainGenerator, ctx: &mut GenCtx, coord: ChunkCoord) -> ChunkData {
    let dims = terrain.dims;
    let mut chunk = ChunkData::new_empty(coord, dims);
    let origin = chunk.origin;
    terrain.fill_columns(ctx, origin);
    let s = dims.size;

    for (x, y, z) in chunk.iter_local() {
        let col = &ctx.columns[(x + z * s) as usize];
        let kind = terrain.column_block(col, origin.y + y);
        if kind != BlockKind::Nothing {
            chunk.set_local(x, y, z, kind);
        }
    }

    let leaf_offsets = terrain.leaf_offsets();
    for z in 0..s {
        for x in 0..s {
            let col = &ctx.columns[(x + z * s) as usize];
            let Some(site) = terrain.tree_in_column(origin.x + x, origin.z + z, col) else {
                continue;
            };
            for wy in site.base_y..=site.top_y() {
                chunk.set_local(x, wy - origin.y, z, BlockKind::TreeTrunk);
            }
            let top = site.top_y() - origin.y;
            for &(dx, dy, dz) in &leaf_offsets {
                chunk.trees.leaves.push([x + dx, top + dy, z + dz]);
            }
        }
    }
    chunk
}

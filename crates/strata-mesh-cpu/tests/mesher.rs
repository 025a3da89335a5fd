use hashbrown::HashSet;
use proptest::prelude::*;
use strata_blocks::{BlockCatalog, BlockKind};
use strata_chunk::{ChunkData, ChunkMap, NoNeighbors};
use strata_geom::Vec3;
use strata_mesh_cpu::{build_chunk_mesh, build_walkable_surface};
use strata_world::{BlockPos, ChunkCoord, ChunkDims};

fn dims() -> ChunkDims {
    ChunkDims::new(4, 6)
}

fn chunk_with(blocks: &[((i32, i32, i32), BlockKind)]) -> ChunkData {
    let mut c = ChunkData::new_empty(ChunkCoord::new(0, 0, 0), dims());
    for &((x, y, z), k) in blocks {
        assert!(c.set_local(x, y, z, k));
    }
    c
}

fn opaque_faces(c: &ChunkData) -> usize {
    let cat = BlockCatalog::new();
    build_chunk_mesh(c, &NoNeighbors, &cat).opaque.idx.len() / 6
}

#[test]
fn empty_chunk_yields_empty_buffers() {
    let cat = BlockCatalog::new();
    let c = ChunkData::new_empty(ChunkCoord::new(0, 0, 0), dims());
    let m = build_chunk_mesh(&c, &NoNeighbors, &cat);
    assert!(m.is_empty());
    assert!(m.opaque.pos.is_empty() && m.water.pos.is_empty() && m.collider.pos.is_empty());
    assert!(m.is_consistent());
}

#[test]
fn lone_cube_emits_six_faces_and_eight_collider_vertices() {
    let cat = BlockCatalog::new();
    let c = chunk_with(&[((1, 2, 1), BlockKind::Stone)]);
    let m = build_chunk_mesh(&c, &NoNeighbors, &cat);
    assert_eq!(m.opaque.vertex_count(), 24);
    assert_eq!(m.opaque.idx.len(), 36);
    assert_eq!(m.opaque.uv.len(), 48);
    assert_eq!(m.collider.pos.len(), 8);
    assert_eq!(m.collider.idx.len(), 36);
    assert_eq!(m.bbox.min, Vec3::new(1.0, 2.0, 1.0));
    assert_eq!(m.bbox.max, Vec3::new(2.0, 3.0, 2.0));
    assert!(m.is_consistent());
}

#[test]
fn touching_cubes_hide_shared_face() {
    let c = chunk_with(&[((1, 2, 1), BlockKind::Stone), ((2, 2, 1), BlockKind::Dirt)]);
    assert_eq!(opaque_faces(&c), 10);
    let cat = BlockCatalog::new();
    let m = build_chunk_mesh(&c, &NoNeighbors, &cat);
    assert_eq!(m.collider.pos.len(), 12);
}

#[test]
fn transparent_leaves_cull_only_against_themselves() {
    let leaves = BlockKind::TreeLeavesTransparent;
    let pair = chunk_with(&[((1, 2, 1), leaves), ((2, 2, 1), leaves)]);
    assert_eq!(opaque_faces(&pair), 10);
    // Stone shows its face toward the leaves; the leaves hide theirs.
    let mixed = chunk_with(&[((1, 2, 1), leaves), ((2, 2, 1), BlockKind::Stone)]);
    assert_eq!(opaque_faces(&mixed), 11);
}

#[test]
fn water_surfaces_follow_water_rules() {
    let cat = BlockCatalog::new();
    let pool = chunk_with(&[
        ((1, 1, 1), BlockKind::Stone),
        ((1, 2, 1), BlockKind::Water),
        ((1, 3, 1), BlockKind::Water),
    ]);
    let m = build_chunk_mesh(&pool, &NoNeighbors, &cat);
    // Upper water: top + 4 sides; lower water: 4 sides. No face between the two,
    // none toward the stone, and nothing in the collider.
    assert_eq!(m.water.idx.len() / 6, 9);
    assert_eq!(m.collider.pos.len(), 8);
    assert_eq!(m.opaque.idx.len() / 6, 6);

    let capped = chunk_with(&[((1, 2, 1), BlockKind::Water), ((1, 3, 1), BlockKind::Stone)]);
    let m = build_chunk_mesh(&capped, &NoNeighbors, &cat);
    // Top is drawn even under stone; bottom and sides face emptiness.
    assert_eq!(m.water.idx.len() / 6, 6);
}

#[test]
fn air_and_nothing_are_both_empty_neighbours() {
    let c = chunk_with(&[((1, 2, 1), BlockKind::Grass), ((1, 3, 1), BlockKind::Air)]);
    assert_eq!(opaque_faces(&c), 6);
}

#[test]
fn border_faces_follow_neighbour_chunk() {
    let cat = BlockCatalog::new();
    let d = dims();
    let a = ChunkCoord::new(0, 0, 0);
    let b = ChunkCoord::new(1, 0, 0);
    let mut map = ChunkMap::new(d);
    map.insert(ChunkData::new_empty(a, d));
    map.insert(ChunkData::new_empty(b, d));
    map.set_block(BlockPos::new(3, 2, 1), BlockKind::Stone);
    map.set_block(BlockPos::new(4, 2, 1), BlockKind::Stone);

    let before = build_chunk_mesh(map.get(a).expect("a"), &map, &cat);
    assert_eq!(before.opaque.idx.len() / 6, 5);

    map.set_block(BlockPos::new(4, 2, 1), BlockKind::Air);
    let after = build_chunk_mesh(map.get(a).expect("a"), &map, &cat);
    assert_eq!(after.opaque.idx.len() / 6, 6);
}

#[test]
fn walkable_surface_tops_exposed_solids() {
    let cat = BlockCatalog::new();
    let c = chunk_with(&[
        ((1, 1, 1), BlockKind::Stone),
        ((1, 2, 1), BlockKind::Grass),
        ((2, 1, 2), BlockKind::Water),
        ((3, 5, 3), BlockKind::Dirt),
    ]);
    let w = build_walkable_surface(&c, &NoNeighbors, &cat);
    assert_eq!(w.quad_count(), 2);
    assert!(w.pos.iter().any(|p| *p == Vec3::new(1.0, 3.0, 1.0)));
    // Top layer block: the space above belongs to an unloaded chunk.
    assert!(w.pos.iter().any(|p| *p == Vec3::new(3.0, 6.0, 3.0)));
    assert!(build_walkable_surface(&ChunkData::new_empty(ChunkCoord::new(0, 0, 0), dims()), &NoNeighbors, &cat).is_empty());
}

fn arb_chunk() -> impl Strategy<Value = ChunkData> {
    let volume = dims().volume();
    prop::collection::vec(0u8..BlockKind::COUNT as u8, volume).prop_map(|ids| {
        let blocks = ids
            .into_iter()
            .map(|i| BlockKind::from_id(i).unwrap_or_default())
            .collect();
        ChunkData::from_blocks(ChunkCoord::new(0, 0, 0), dims(), blocks).unwrap_or_else(|_| ChunkData::new_empty(ChunkCoord::new(0, 0, 0), dims()))
    })
}

proptest! {
    // Every index in every buffer addresses an existing vertex
    #[test]
    fn indices_always_in_range(c in arb_chunk()) {
        let cat = BlockCatalog::new();
        let m = build_chunk_mesh(&c, &NoNeighbors, &cat);
        prop_assert!(m.is_consistent());
        prop_assert_eq!(m.opaque.idx.len() % 6, 0);
        prop_assert_eq!(m.water.idx.len() % 6, 0);
    }

    // Welded collider holds each position once and never a NaN
    #[test]
    fn collider_is_welded(c in arb_chunk()) {
        let cat = BlockCatalog::new();
        let m = build_chunk_mesh(&c, &NoNeighbors, &cat);
        let mut seen = HashSet::new();
        for v in &m.collider.pos {
            prop_assert!(!v.has_nan());
            prop_assert!(seen.insert(v.bits_key()));
        }
    }

    // Face count matches a direct neighbour scan
    #[test]
    fn face_count_matches_brute_force(c in arb_chunk()) {
        let cat = BlockCatalog::new();
        let mut expected = 0usize;
        for (x, y, z) in c.iter_local() {
            let k = c.get_local(x, y, z).unwrap_or_default();
            if !cat.is_solid(k) {
                continue;
            }
            for (dx, dy, dz) in [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)] {
                let nb = c.get_local(x + dx, y + dy, z + dz).unwrap_or(BlockKind::Nothing);
                if !cat.is_opaque(nb) && nb != k {
                    expected += 1;
                }
            }
        }
        prop_assert_eq!(opaque_faces(&c), expected);
    }
}

use proptest::prelude::*;
use strata_blocks::{BlockCatalog, BlockKind, FaceRole, Tile};

#[test]
fn ids_are_dense_and_stable() {
    for (i, k) in BlockKind::ALL.iter().enumerate() {
        assert_eq!(k.id() as usize, i);
        assert_eq!(BlockKind::from_id(k.id()), Some(*k));
    }
    assert_eq!(BlockKind::from_id(BlockKind::COUNT as u8), None);
    assert_eq!(BlockKind::default(), BlockKind::Nothing);
}

#[test]
fn toml_override_replaces_tiles_only() {
    let src = r#"
        [atlas]
        tile_size = 0.125
        offset = 0.0

        [[blocks]]
        kind = "stone"
        all = [1, 2]

        [[blocks]]
        kind = "grass"
        top = [7, 7]
    "#;
    let cat = BlockCatalog::from_toml_str(src).expect("catalog");
    assert_eq!(cat.atlas.tiles_per_row(), 8);
    assert_eq!(cat.props(BlockKind::Stone).texture.side, Tile(1, 2));
    assert_eq!(cat.props(BlockKind::Grass).texture.top, Tile(7, 7));
    assert!(cat.is_solid(BlockKind::Stone));
    let uv = cat.uv_for(BlockKind::Stone, FaceRole::Top);
    assert_eq!(uv[0], [0.125, 0.25]);
    assert_eq!(uv[2], [0.25, 0.375]);
}

#[test]
fn toml_rejects_tile_outside_atlas() {
    let src = r#"
        [[blocks]]
        kind = "dirt"
        side = [10, 0]
    "#;
    assert!(BlockCatalog::from_toml_str(src).is_err());
}

#[test]
fn toml_rejects_unknown_kind() {
    let src = r#"
        [[blocks]]
        kind = "lava"
        all = [0, 0]
    "#;
    assert!(BlockCatalog::from_toml_str(src).is_err());
}

proptest! {
    // Inset UVs stay strictly inside the tile they address
    #[test]
    fn uvs_stay_inside_tile(ki in 0usize..BlockKind::COUNT, role in 0u8..3) {
        let cat = BlockCatalog::new();
        let kind = BlockKind::ALL[ki];
        let role = match role { 0 => FaceRole::Top, 1 => FaceRole::Bottom, _ => FaceRole::Side };
        let tile = cat.props(kind).texture.tile(role);
        let ts = cat.atlas.tile_size;
        let lo_u = tile.0 as f32 * ts;
        let lo_v = tile.1 as f32 * ts;
        for [u, v] in cat.uv_for(kind, role) {
            prop_assert!(u > lo_u && u < lo_u + ts);
            prop_assert!(v > lo_v && v < lo_v + ts);
        }
    }
}

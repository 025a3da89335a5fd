use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::types::{BlockKind, FaceRole};

/// Column/row of a tile inside the texture atlas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Tile(pub u8, pub u8);

/// Atlas tiles for the three face roles of a block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TextureRegion {
    pub top: Tile,
    pub bottom: Tile,
    pub side: Tile,
}

impl TextureRegion {
    pub const fn uniform(t: Tile) -> Self {
        Self {
            top: t,
            bottom: t,
            side: t,
        }
    }

    #[inline]
    pub fn tile(&self, role: FaceRole) -> Tile {
        match role {
            FaceRole::Top => self.top,
            FaceRole::Bottom => self.bottom,
            FaceRole::Side => self.side,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockProps {
    pub solid: bool,
    pub opaque: bool,
    pub generates_collider: bool,
    pub texture: TextureRegion,
}

/// Square atlas addressed in normalized UV space.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct AtlasLayout {
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    /// Inset applied on every tile edge so sampling never bleeds into neighbours.
    #[serde(default = "default_offset")]
    pub offset: f32,
}

fn default_tile_size() -> f32 {
    0.1
}
fn default_offset() -> f32 {
    0.001
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self {
            tile_size: default_tile_size(),
            offset: default_offset(),
        }
    }
}

impl AtlasLayout {
    #[inline]
    pub fn tiles_per_row(&self) -> u32 {
        (1.0 / self.tile_size).round() as u32
    }

    /// UVs of a tile, counter-clockwise from the bottom-left corner.
    pub fn uv_corners(&self, tile: Tile) -> [[f32; 2]; 4] {
        let ts = self.tile_size;
        let u0 = ts * tile.0 as f32 + self.offset;
        let v0 = ts * tile.1 as f32 + self.offset;
        let u1 = ts * tile.0 as f32 + ts - self.offset;
        let v1 = ts * tile.1 as f32 + ts - self.offset;
        [[u0, v0], [u1, v0], [u1, v1], [u0, v1]]
    }
}

const fn solid(texture: TextureRegion) -> BlockProps {
    BlockProps {
        solid: true,
        opaque: true,
        generates_collider: true,
        texture,
    }
}

const EMPTY: BlockProps = BlockProps {
    solid: false,
    opaque: false,
    generates_collider: false,
    texture: TextureRegion::uniform(Tile(0, 0)),
};

/// Immutable kind -> properties table plus the atlas it samples from.
#[derive(Clone, Debug)]
pub struct BlockCatalog {
    props: [BlockProps; BlockKind::COUNT],
    pub atlas: AtlasLayout,
}

impl Default for BlockCatalog {
    fn default() -> Self {
        let props = [
            // Nothing
            EMPTY,
            // Air
            EMPTY,
            // Grass
            solid(TextureRegion {
                top: Tile(1, 9),
                bottom: Tile(2, 9),
                side: Tile(0, 9),
            }),
            // Dirt
            solid(TextureRegion::uniform(Tile(2, 9))),
            // Stone
            solid(TextureRegion::uniform(Tile(3, 9))),
            // Water
            BlockProps {
                solid: false,
                opaque: false,
                generates_collider: false,
                texture: TextureRegion::uniform(Tile(4, 9)),
            },
            // TreeTrunk
            solid(TextureRegion {
                top: Tile(6, 9),
                bottom: Tile(6, 9),
                side: Tile(5, 9),
            }),
            // TreeLeavesTransparent
            BlockProps {
                solid: true,
                opaque: false,
                generates_collider: true,
                texture: TextureRegion::uniform(Tile(7, 9)),
            },
            // TreeLeavesSolid
            solid(TextureRegion::uniform(Tile(8, 9))),
        ];
        Self {
            props,
            atlas: AtlasLayout::default(),
        }
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    atlas: AtlasLayout,
    #[serde(default)]
    blocks: Vec<TextureOverride>,
}

#[derive(Deserialize)]
struct TextureOverride {
    kind: BlockKind,
    all: Option<Tile>,
    top: Option<Tile>,
    bottom: Option<Tile>,
    side: Option<Tile>,
}

impl BlockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn props(&self, kind: BlockKind) -> &BlockProps {
        &self.props[kind as usize]
    }

    #[inline]
    pub fn is_solid(&self, kind: BlockKind) -> bool {
        self.props(kind).solid
    }

    #[inline]
    pub fn is_opaque(&self, kind: BlockKind) -> bool {
        self.props(kind).opaque
    }

    #[inline]
    pub fn generates_collider(&self, kind: BlockKind) -> bool {
        self.props(kind).generates_collider
    }

    pub fn uv_for(&self, kind: BlockKind, role: FaceRole) -> [[f32; 2]; 4] {
        self.atlas.uv_corners(self.props(kind).texture.tile(role))
    }

    /// Builds the default catalog with atlas layout and per-kind tiles
    /// overridden from TOML. Solidity and opacity are not configurable.
    pub fn from_toml_str(src: &str) -> Result<Self, Box<dyn Error>> {
        let file: CatalogFile = toml::from_str(src)?;
        if !(file.atlas.tile_size > 0.0 && file.atlas.tile_size <= 1.0) {
            return Err(format!("atlas tile_size {} out of (0, 1]", file.atlas.tile_size).into());
        }
        if file.atlas.offset < 0.0 || file.atlas.offset * 2.0 >= file.atlas.tile_size {
            return Err(format!("atlas offset {} too large for tile", file.atlas.offset).into());
        }
        let mut cat = Self::default();
        cat.atlas = file.atlas;
        let per_row = cat.atlas.tiles_per_row();
        for ov in file.blocks {
            let tex = &mut cat.props[ov.kind as usize].texture;
            if let Some(t) = ov.all {
                *tex = TextureRegion::uniform(t);
            }
            if let Some(t) = ov.top {
                tex.top = t;
            }
            if let Some(t) = ov.bottom {
                tex.bottom = t;
            }
            if let Some(t) = ov.side {
                tex.side = t;
            }
            for t in [tex.top, tex.bottom, tex.side] {
                if t.0 as u32 >= per_row || t.1 as u32 >= per_row {
                    return Err(format!(
                        "tile ({}, {}) for '{}' outside {}x{} atlas",
                        t.0,
                        t.1,
                        ov.kind.name(),
                        per_row,
                        per_row
                    )
                    .into());
                }
            }
        }
        Ok(cat)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

use serde::{Deserialize, Serialize};

/// Every block kind the world can hold.
///
/// `Nothing` is generated emptiness and the answer for unloaded space;
/// `Air` is emptiness left behind by an edit. Both emit no geometry.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    #[default]
    Nothing = 0,
    Air = 1,
    Grass = 2,
    Dirt = 3,
    Stone = 4,
    Water = 5,
    TreeTrunk = 6,
    TreeLeavesTransparent = 7,
    TreeLeavesSolid = 8,
}

impl BlockKind {
    pub const COUNT: usize = 9;

    pub const ALL: [BlockKind; Self::COUNT] = [
        BlockKind::Nothing,
        BlockKind::Air,
        BlockKind::Grass,
        BlockKind::Dirt,
        BlockKind::Stone,
        BlockKind::Water,
        BlockKind::TreeTrunk,
        BlockKind::TreeLeavesTransparent,
        BlockKind::TreeLeavesSolid,
    ];

    #[inline]
    pub const fn id(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_id(id: u8) -> Option<BlockKind> {
        Self::ALL.get(id as usize).copied()
    }

    /// True for both flavours of emptiness.
    #[inline]
    pub const fn is_empty(self) -> bool {
        matches!(self, BlockKind::Nothing | BlockKind::Air)
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockKind::Nothing => "nothing",
            BlockKind::Air => "air",
            BlockKind::Grass => "grass",
            BlockKind::Dirt => "dirt",
            BlockKind::Stone => "stone",
            BlockKind::Water => "water",
            BlockKind::TreeTrunk => "tree_trunk",
            BlockKind::TreeLeavesTransparent => "tree_leaves_transparent",
            BlockKind::TreeLeavesSolid => "tree_leaves_solid",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceRole {
    Top,
    Bottom,
    Side,
}

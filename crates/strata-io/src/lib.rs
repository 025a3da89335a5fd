//! Save files: chunk payloads, player position and world seed as JSON.
#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_blocks::BlockKind;
use strata_chunk::{ChunkData, ChunkDataError, ChunkMap};
use strata_world::{BlockPos, ChunkCoord, ChunkDims};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("save file json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("chunk at ({x}, {y}, {z}): {source}")]
    Chunk {
        x: i32,
        y: i32,
        z: i32,
        #[source]
        source: ChunkDataError,
    },
    #[error("save uses {saved_size}x{saved_height} chunks, world uses {size}x{height}")]
    DimsMismatch {
        saved_size: i32,
        saved_height: i32,
        size: i32,
        height: i32,
    },
    #[error("chunk at ({x}, {y}, {z}) holds unknown block id {id}")]
    UnknownBlock { x: i32, y: i32, z: i32, id: u8 },
}

/// One persisted chunk, keyed by its world-space min corner.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkEntry {
    pub position: [i32; 3],
    pub blocks: Vec<u8>,
    #[serde(default)]
    pub modified_by_player: bool,
    /// Leaf records of the trees rooted in this chunk, chunk-local.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tree_leaves: Vec<[i32; 3]>,
    /// Min corners of the chunks that already hold those leaves.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leaves_applied_to: Vec<[i32; 3]>,
}

impl ChunkEntry {
    pub fn from_chunk(chunk: &ChunkData) -> Self {
        Self {
            position: [chunk.origin.x, chunk.origin.y, chunk.origin.z],
            blocks: chunk.blocks().iter().map(|b| b.id()).collect(),
            modified_by_player: chunk.modified_by_player,
            tree_leaves: chunk.trees.leaves.clone(),
            leaves_applied_to: Vec::new(),
        }
    }

    /// Rebuilds the chunk. Fails on unknown ids, wrong array length or an
    /// unaligned position.
    pub fn to_chunk(&self, dims: ChunkDims) -> Result<ChunkData, SaveError> {
        let [x, y, z] = self.position;
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for &id in &self.blocks {
            match BlockKind::from_id(id) {
                Some(kind) => blocks.push(kind),
                None => return Err(SaveError::UnknownBlock { x, y, z, id }),
            }
        }
        let mut chunk = ChunkData::from_origin(BlockPos::new(x, y, z), dims, blocks)
            .map_err(|source| SaveError::Chunk { x, y, z, source })?;
        chunk.modified_by_player = self.modified_by_player;
        chunk.trees.leaves = self.tree_leaves.clone();
        Ok(chunk)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SaveData {
    pub player_position: [f32; 3],
    pub world_seed: i32,
    pub chunk_size: i32,
    pub chunk_height: i32,
    pub chunks: Vec<ChunkEntry>,
}

impl SaveData {
    /// Captures chunks in a stable order so identical worlds produce identical files.
    pub fn capture<'a>(
        player_position: [f32; 3],
        world_seed: i32,
        dims: ChunkDims,
        chunks: impl IntoIterator<Item = &'a ChunkData>,
    ) -> Self {
        let mut chunks: Vec<ChunkEntry> = chunks.into_iter().map(ChunkEntry::from_chunk).collect();
        chunks.sort_by_key(|e| e.position);
        Self {
            player_position,
            world_seed,
            chunk_size: dims.size,
            chunk_height: dims.height,
            chunks,
        }
    }

    /// Like `capture`, and also records which chunks already hold each
    /// source's tree leaves, so a restore does not patch them twice.
    pub fn capture_map(player_position: [f32; 3], world_seed: i32, map: &ChunkMap) -> Self {
        let dims = map.dims();
        let mut data = Self::capture(player_position, world_seed, dims, map.iter().map(|(_, c)| c.as_ref()));
        for entry in &mut data.chunks {
            let [x, y, z] = entry.position;
            entry.leaves_applied_to = map
                .leaf_targets(dims.chunk_of(BlockPos::new(x, y, z)))
                .into_iter()
                .map(|t| {
                    let o = dims.origin(t);
                    [o.x, o.y, o.z]
                })
                .collect();
        }
        data
    }

    /// `(source, target)` chunk pairs whose leaves the save already contains.
    pub fn leaf_links(&self) -> Vec<(ChunkCoord, ChunkCoord)> {
        let dims = self.dims();
        let at = |[x, y, z]: [i32; 3]| dims.chunk_of(BlockPos::new(x, y, z));
        self.chunks
            .iter()
            .flat_map(|e| {
                let src = at(e.position);
                e.leaves_applied_to.iter().map(move |t| (src, at(*t)))
            })
            .collect()
    }

    pub fn dims(&self) -> ChunkDims {
        ChunkDims::new(self.chunk_size, self.chunk_height)
    }

    /// Every chunk of the save, or the first error. Nothing is partially restored.
    pub fn restore_chunks(&self, dims: ChunkDims) -> Result<Vec<ChunkData>, SaveError> {
        if self.dims() != dims {
            return Err(SaveError::DimsMismatch {
                saved_size: self.chunk_size,
                saved_height: self.chunk_height,
                size: dims.size,
                height: dims.height,
            });
        }
        self.chunks.iter().map(|e| e.to_chunk(dims)).collect()
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(src: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(src)?)
    }
}

/// Writes through a sibling temp file so a crash never leaves a truncated save.
pub fn save_to_path(data: &SaveData, path: &Path) -> Result<(), SaveError> {
    let json = data.to_json()?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    log::info!(
        target: "io",
        "saved {} chunks (seed {}) to {}",
        data.chunks.len(),
        data.world_seed,
        path.display()
    );
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<SaveData, SaveError> {
    let raw = fs::read_to_string(path)?;
    let data = SaveData::from_json(&raw)?;
    log::info!(
        target: "io",
        "loaded {} chunks (seed {}) from {}",
        data.chunks.len(),
        data.world_seed,
        path.display()
    );
    Ok(data)
}

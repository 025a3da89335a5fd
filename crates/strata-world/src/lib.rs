//! World coordinates, configuration, seeds, and terrain sampling.
#![forbid(unsafe_code)]

mod biome;
mod chunk_coord;
pub mod config;
mod coords;
mod gen_ctx;
mod seed;
pub mod terrain;

pub use biome::{ColumnSample, select_biome};
pub use chunk_coord::{ChunkCoord, FACE_NEIGHBORS};
pub use config::{
    BiomeDef, BiomeParams, StreamingParams, TerrainParams, TreeParams, WorldConfig,
    load_config_from_path,
};
pub use coords::{BlockPos, ChunkDims};
pub use gen_ctx::GenCtx;
pub use seed::WorldSeed;
pub use terrain::{TerrainGenerator, TreeSite};

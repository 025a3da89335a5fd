//! Chunk block storage, cross-chunk lookup, and chunk generation.
#![forbid(unsafe_code)]

mod data;
mod generate;
mod lookup;
mod map;

pub use data::{ChunkData, ChunkDataError, LocalIter, TreeData};
pub use generate::generate_chunk_data;
pub use lookup::{BlockLookup, NoNeighbors};
pub use map::ChunkMap;

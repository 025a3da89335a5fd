//! Chunked voxel world: streaming around an observer, background terrain
//! and meshing, block edits and saves.
#![forbid(unsafe_code)]

mod coordinator;
mod event;
mod plan;
mod render;
mod streaming;

pub use coordinator::{EditOutcome, LoadError, WorldCoordinator, WorldPhase};
pub use event::{EventBus, Listener, WorldEvent};
pub use plan::{WorldGenerationPlan, needed_square};
pub use render::{ChunkRenderObject, NullSink, RenderSink};
pub use streaming::{StreamRequest, StreamingTrigger};

pub use strata_blocks::{BlockCatalog, BlockKind};
pub use strata_geom::Vec3;
pub use strata_io::{SaveData, SaveError};
pub use strata_runtime::RuntimeError;
pub use strata_world::{BlockPos, ChunkCoord, ChunkDims, WorldConfig, WorldSeed};

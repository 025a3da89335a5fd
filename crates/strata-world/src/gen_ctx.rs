use std::sync::Arc;

use fastnoise_lite::FastNoiseLite;

use crate::ColumnSample;
use crate::config::TerrainParams;

/// Per-worker sampling state. Cheap to reuse, not cheap to build.
pub struct GenCtx {
    pub height: FastNoiseLite,
    pub temperature: FastNoiseLite,
    pub moisture: FastNoiseLite,
    pub params: Arc<TerrainParams>,
    /// Scratch columns for one chunk, `size * size` entries, x fastest.
    pub columns: Vec<ColumnSample>,
}

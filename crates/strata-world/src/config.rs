use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;
use strata_blocks::BlockKind;

use crate::ChunkDims;

/// World-start configuration; immutable for the lifetime of one world.
#[derive(Clone, Debug, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i32,
    #[serde(default = "default_chunk_height")]
    pub chunk_height: i32,
    #[serde(default = "default_draw_radius")]
    pub draw_radius: i32,
    #[serde(default = "default_data_radius")]
    pub data_radius: i32,
    #[serde(default)]
    pub seed: Option<i32>,
    #[serde(default)]
    pub terrain: TerrainParams,
    #[serde(default)]
    pub trees: TreeParams,
    #[serde(default)]
    pub streaming: StreamingParams,
    #[serde(default)]
    pub biomes: BiomeParams,
}

fn default_chunk_size() -> i32 {
    16
}
fn default_chunk_height() -> i32 {
    100
}
fn default_draw_radius() -> i32 {
    8
}
fn default_data_radius() -> i32 {
    9
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_height: default_chunk_height(),
            draw_radius: default_draw_radius(),
            data_radius: default_data_radius(),
            seed: None,
            terrain: TerrainParams::default(),
            trees: TreeParams::default(),
            streaming: StreamingParams::default(),
            biomes: BiomeParams::default(),
        }
    }
}

impl WorldConfig {
    #[inline]
    pub fn dims(&self) -> ChunkDims {
        ChunkDims::new(self.chunk_size, self.chunk_height)
    }

    /// Data radius never falls below the draw radius, so every visible
    /// chunk has neighbour data for face culling.
    #[inline]
    pub fn effective_data_radius(&self) -> i32 {
        self.data_radius.max(self.draw_radius)
    }

    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.chunk_size <= 0 || self.chunk_height <= 1 {
            return Err(format!(
                "chunk dimensions must be positive (size={}, height={})",
                self.chunk_size, self.chunk_height
            )
            .into());
        }
        if self.draw_radius < 0 || self.data_radius < 0 {
            return Err("radii must not be negative".into());
        }
        let t = &self.terrain;
        if t.min_height > t.max_height {
            return Err(format!(
                "terrain.min_height {} exceeds max_height {}",
                t.min_height, t.max_height
            )
            .into());
        }
        if t.octaves < 1 {
            return Err("terrain.octaves must be at least 1".into());
        }
        let tr = &self.trees;
        if tr.trunk_min < 1 || tr.trunk_min > tr.trunk_max {
            return Err(format!(
                "trees.trunk_min {} / trunk_max {} out of order",
                tr.trunk_min, tr.trunk_max
            )
            .into());
        }
        if tr.leaf_radius < 1 {
            return Err("trees.leaf_radius must be at least 1".into());
        }
        if self.streaming.apply_per_tick == 0 {
            return Err("streaming.apply_per_tick must be at least 1".into());
        }
        self.biomes.validate()
    }

    pub fn from_toml_str(src: &str) -> Result<WorldConfig, Box<dyn Error>> {
        let cfg: WorldConfig = toml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

pub fn load_config_from_path(path: &Path) -> Result<WorldConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    WorldConfig::from_toml_str(&s)
}

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainParams {
    #[serde(default = "default_water_level")]
    pub water_level: i32,
    #[serde(default = "default_min_height")]
    pub min_height: i32,
    #[serde(default = "default_max_height")]
    pub max_height: i32,
    #[serde(default = "default_noise_frequency")]
    pub noise_frequency: f32,
    #[serde(default = "default_octaves")]
    pub octaves: i32,
    #[serde(default = "default_dirt_depth")]
    pub dirt_depth: i32,
}
fn default_water_level() -> i32 {
    20
}
fn default_min_height() -> i32 {
    10
}
fn default_max_height() -> i32 {
    60
}
fn default_noise_frequency() -> f32 {
    0.01
}
fn default_octaves() -> i32 {
    4
}
fn default_dirt_depth() -> i32 {
    3
}
impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            water_level: default_water_level(),
            min_height: default_min_height(),
            max_height: default_max_height(),
            noise_frequency: default_noise_frequency(),
            octaves: default_octaves(),
            dirt_depth: default_dirt_depth(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TreeParams {
    #[serde(default = "default_tree_density")]
    pub density: f32,
    #[serde(default = "default_trunk_min")]
    pub trunk_min: i32,
    #[serde(default = "default_trunk_max")]
    pub trunk_max: i32,
    #[serde(default = "default_leaf_radius")]
    pub leaf_radius: i32,
    /// Columns this close to a chunk's horizontal border never grow trees.
    #[serde(default)]
    pub edge_margin: i32,
}
fn default_tree_density() -> f32 {
    0.012
}
fn default_trunk_min() -> i32 {
    4
}
fn default_trunk_max() -> i32 {
    6
}
fn default_leaf_radius() -> i32 {
    2
}
impl Default for TreeParams {
    fn default() -> Self {
        Self {
            density: default_tree_density(),
            trunk_min: default_trunk_min(),
            trunk_max: default_trunk_max(),
            leaf_radius: default_leaf_radius(),
            edge_margin: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct StreamingParams {
    #[serde(default = "default_detection_interval_ms")]
    pub detection_interval_ms: u64,
    #[serde(default = "default_apply_per_tick")]
    pub apply_per_tick: usize,
}
fn default_detection_interval_ms() -> u64 {
    1000
}
fn default_apply_per_tick() -> usize {
    1
}
impl Default for StreamingParams {
    fn default() -> Self {
        Self {
            detection_interval_ms: default_detection_interval_ms(),
            apply_per_tick: default_apply_per_tick(),
        }
    }
}

/// Climate-driven biome selection. Two low-frequency noise channels
/// (temperature, moisture) pick a biome per column; the biome shapes the
/// height curve, the surface block and how many trees grow.
#[derive(Clone, Debug, Deserialize)]
pub struct BiomeParams {
    #[serde(default = "default_biomes_enable")]
    pub enable: bool,
    #[serde(default = "default_climate_frequency")]
    pub climate_frequency: f32,
    /// Spacing of the 3x3 samples averaged for the height curve; 0 disables blending.
    #[serde(default = "default_blend")]
    pub blend: i32,
    #[serde(default = "default_biome_defs")]
    pub defs: Vec<BiomeDef>,
}
fn default_biomes_enable() -> bool {
    true
}
fn default_climate_frequency() -> f32 {
    0.004
}
fn default_blend() -> i32 {
    4
}
impl Default for BiomeParams {
    fn default() -> Self {
        Self {
            enable: default_biomes_enable(),
            climate_frequency: default_climate_frequency(),
            blend: default_blend(),
            defs: default_biome_defs(),
        }
    }
}

impl BiomeParams {
    /// One flat grassland everywhere: plain `[terrain]`/`[trees]` behaviour.
    pub fn disabled() -> Self {
        Self {
            enable: false,
            defs: Vec::new(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.blend < 0 {
            return Err("biomes.blend must not be negative".into());
        }
        if self.enable && self.climate_frequency <= 0.0 {
            return Err("biomes.climate_frequency must be positive".into());
        }
        for d in &self.defs {
            if d.temp_min > d.temp_max || d.moisture_min > d.moisture_max {
                return Err(format!("biome '{}' has an inverted climate range", d.name).into());
            }
            if d.height_scale < 0.0 || d.tree_density_scale < 0.0 {
                return Err(format!("biome '{}' scales must not be negative", d.name).into());
            }
            if !matches!(d.surface, BlockKind::Grass | BlockKind::Dirt | BlockKind::Stone) {
                return Err(format!(
                    "biome '{}' surface must be grass, dirt or stone, not {}",
                    d.name,
                    d.surface.name()
                )
                .into());
            }
        }
        Ok(())
    }
}

/// One `[[biomes.defs]]` entry. Climate bounds are half-open, except that an
/// upper bound of 1.0 also admits 1.0.
#[derive(Clone, Debug, Deserialize)]
pub struct BiomeDef {
    pub name: String,
    #[serde(default)]
    pub temp_min: f32,
    #[serde(default = "d_one")]
    pub temp_max: f32,
    #[serde(default)]
    pub moisture_min: f32,
    #[serde(default = "d_one")]
    pub moisture_max: f32,
    /// Raises the column floor above `terrain.min_height`.
    #[serde(default)]
    pub height_offset: i32,
    /// Multiplies the `terrain` height span.
    #[serde(default = "d_one")]
    pub height_scale: f32,
    #[serde(default = "default_surface")]
    pub surface: BlockKind,
    /// Multiplies `trees.density`.
    #[serde(default = "d_one")]
    pub tree_density_scale: f32,
}
fn d_one() -> f32 {
    1.0
}
fn default_surface() -> BlockKind {
    BlockKind::Grass
}

fn biome(
    name: &str,
    temp: (f32, f32),
    moisture: (f32, f32),
    height_offset: i32,
    height_scale: f32,
    surface: BlockKind,
    tree_density_scale: f32,
) -> BiomeDef {
    BiomeDef {
        name: name.to_string(),
        temp_min: temp.0,
        temp_max: temp.1,
        moisture_min: moisture.0,
        moisture_max: moisture.1,
        height_offset,
        height_scale,
        surface,
        tree_density_scale,
    }
}

fn default_biome_defs() -> Vec<BiomeDef> {
    vec![
        biome("forest", (0.0, 1.0), (0.62, 1.0), 4, 0.8, BlockKind::Grass, 3.0),
        biome("plains", (0.0, 1.0), (0.38, 0.62), 2, 0.5, BlockKind::Grass, 1.0),
        biome("highlands", (0.0, 0.5), (0.0, 0.38), 10, 1.3, BlockKind::Stone, 0.0),
        biome("badlands", (0.5, 1.0), (0.0, 0.38), 0, 0.7, BlockKind::Dirt, 0.0),
    ]
}

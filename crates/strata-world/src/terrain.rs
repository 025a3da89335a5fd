use std::sync::Arc;

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use strata_blocks::BlockKind;

use crate::biome::height_shape;
use crate::config::{BiomeDef, BiomeParams, TerrainParams, TreeParams, WorldConfig};
use crate::{BlockPos, ChunkDims, ColumnSample, GenCtx, WorldSeed, select_biome};

/// A tree rooted on one column: trunk occupies `base_y .. base_y + trunk_height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeSite {
    pub base_y: i32,
    pub trunk_height: i32,
}

impl TreeSite {
    #[inline]
    pub fn top_y(&self) -> i32 {
        self.base_y + self.trunk_height - 1
    }
}

/// Deterministic column sampler: output depends only on seed, params and
/// the world coordinates asked for.
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    pub seed: WorldSeed,
    pub dims: ChunkDims,
    pub terrain: Arc<TerrainParams>,
    pub trees: TreeParams,
    pub biomes: Arc<BiomeParams>,
}

impl TerrainGenerator {
    /// A generator without biomes; every column is grassland.
    pub fn new(seed: WorldSeed, dims: ChunkDims, terrain: TerrainParams, trees: TreeParams) -> Self {
        Self {
            seed,
            dims,
            terrain: Arc::new(terrain),
            trees,
            biomes: Arc::new(BiomeParams::disabled()),
        }
    }

    pub fn with_biomes(mut self, biomes: BiomeParams) -> Self {
        self.biomes = Arc::new(biomes);
        self
    }

    pub fn from_config(cfg: &WorldConfig, seed: WorldSeed) -> Self {
        Self::new(seed, cfg.dims(), cfg.terrain.clone(), cfg.trees.clone()).with_biomes(cfg.biomes.clone())
    }

    pub fn make_gen_ctx(&self) -> GenCtx {
        let p = &self.terrain;
        let mut height = FastNoiseLite::with_seed(self.seed.seed);
        height.set_noise_type(Some(NoiseType::OpenSimplex2));
        height.set_frequency(Some(p.noise_frequency));
        height.set_fractal_type(Some(FractalType::FBm));
        height.set_fractal_octaves(Some(p.octaves));
        let climate = |salt: i32| {
            let mut n = FastNoiseLite::with_seed(self.seed.seed.wrapping_add(salt));
            n.set_noise_type(Some(NoiseType::OpenSimplex2));
            n.set_frequency(Some(self.biomes.climate_frequency));
            n
        };
        let cols = (self.dims.size as usize) * (self.dims.size as usize);
        GenCtx {
            height,
            temperature: climate(0x7E3F),
            moisture: climate(0x3015),
            params: Arc::clone(&self.terrain),
            columns: Vec::with_capacity(cols),
        }
    }

    /// Noise-domain position of a column. Computed in f64 so columns near
    /// the edge of the i32 range shift without overflowing.
    #[inline]
    fn noise_xz(&self, wx: i32, wz: i32) -> (f32, f32) {
        let (ox, oz) = self.seed.offset;
        ((wx as f64 + ox as f64) as f32, (wz as f64 + oz as f64) as f32)
    }

    /// `(temperature, moisture)` at a column, each in `[0, 1]`.
    pub fn climate(&self, ctx: &GenCtx, wx: i32, wz: i32) -> (f32, f32) {
        let (x, z) = self.noise_xz(wx, wz);
        let t = ((ctx.temperature.get_noise_2d(x, z) + 1.0) * 0.5).clamp(0.0, 1.0);
        let m = ((ctx.moisture.get_noise_2d(x, z) + 1.0) * 0.5).clamp(0.0, 1.0);
        (t, m)
    }

    pub fn biome_at(&self, ctx: &GenCtx, wx: i32, wz: i32) -> Option<usize> {
        if !self.biomes.enable {
            return None;
        }
        let (t, m) = self.climate(ctx, wx, wz);
        select_biome(&self.biomes, t, m)
    }

    pub fn biome_def(&self, biome: Option<usize>) -> Option<&BiomeDef> {
        biome.and_then(|i| self.biomes.defs.get(i))
    }

    /// Height shape averaged over a 3x3 grid of climate samples, so biome
    /// borders become slopes instead of cliffs.
    fn blended_shape(&self, ctx: &GenCtx, wx: i32, wz: i32, center: Option<usize>) -> (f32, f32) {
        let b = self.biomes.blend;
        if !self.biomes.enable || b == 0 {
            return height_shape(self.biome_def(center));
        }
        let (mut offset, mut scale) = (0.0, 0.0);
        for dz in -1..=1 {
            for dx in -1..=1 {
                let biome = if dx == 0 && dz == 0 {
                    center
                } else {
                    self.biome_at(ctx, wx.saturating_add(dx * b), wz.saturating_add(dz * b))
                };
                let (o, s) = height_shape(self.biome_def(biome));
                offset += o;
                scale += s;
            }
        }
        (offset / 9.0, scale / 9.0)
    }

    /// Height, surface block and tree density of column `(wx, wz)`.
    pub fn sample_column(&self, ctx: &GenCtx, wx: i32, wz: i32) -> ColumnSample {
        let biome = self.biome_at(ctx, wx, wz);
        let (offset, scale) = self.blended_shape(ctx, wx, wz, biome);
        let (x, z) = self.noise_xz(wx, wz);
        let n = ctx.height.get_noise_2d(x, z);
        let p = &ctx.params;
        let span = (p.max_height - p.min_height) as f32;
        let h = (p.min_height as f32 + offset + (n + 1.0) * 0.5 * span * scale).floor() as i32;
        let def = self.biome_def(biome);
        ColumnSample {
            height: h.clamp(1, self.dims.height - 1),
            surface: def.map_or(BlockKind::Grass, |d| d.surface),
            tree_density_scale: def.map_or(1.0, |d| d.tree_density_scale),
            biome,
        }
    }

    /// Number of filled blocks in column `(wx, wz)`; the surface sits at `h - 1`.
    pub fn surface_height(&self, ctx: &GenCtx, wx: i32, wz: i32) -> i32 {
        self.sample_column(ctx, wx, wz).height
    }

    /// Fills `ctx.columns` for the chunk whose min corner is `origin`.
    pub fn fill_columns(&self, ctx: &mut GenCtx, origin: BlockPos) {
        let s = self.dims.size;
        ctx.columns.clear();
        for z in 0..s {
            for x in 0..s {
                let col = self.sample_column(ctx, origin.x + x, origin.z + z);
                ctx.columns.push(col);
            }
        }
    }

    /// Block at world height `y` in `col`. Stone-capped columns skip the dirt band.
    pub fn column_block(&self, col: &ColumnSample, y: i32) -> BlockKind {
        let p = &self.terrain;
        let h = col.height;
        if y < h - 1 - p.dirt_depth {
            BlockKind::Stone
        } else if y < h - 1 {
            if col.surface == BlockKind::Stone {
                BlockKind::Stone
            } else {
                BlockKind::Dirt
            }
        } else if y == h - 1 {
            col.surface
        } else if y < p.water_level {
            BlockKind::Water
        } else {
            BlockKind::Nothing
        }
    }

    /// Tree rooted on a plain grass column of height `h`.
    pub fn tree_at(&self, wx: i32, wz: i32, h: i32) -> Option<TreeSite> {
        self.tree_in_column(wx, wz, &ColumnSample::plain(h))
    }

    /// Tree rooted on the surface of column `(wx, wz)`, if one grows there.
    /// Only grass above water grows trees.
    pub fn tree_in_column(&self, wx: i32, wz: i32, col: &ColumnSample) -> Option<TreeSite> {
        let t = &self.trees;
        let density = t.density * col.tree_density_scale;
        let h = col.height;
        if density <= 0.0 || col.surface != BlockKind::Grass || h < self.terrain.water_level {
            return None;
        }
        let lx = wx.rem_euclid(self.dims.size);
        let lz = wz.rem_euclid(self.dims.size);
        let m = t.edge_margin;
        if lx < m || lz < m || lx >= self.dims.size - m || lz >= self.dims.size - m {
            return None;
        }
        let seed = self.seed.seed as u32;
        if rand01(seed, wx, wz, 0x5EED_7EE5) >= density {
            return None;
        }
        let span = (t.trunk_max - t.trunk_min + 1).max(1) as u32;
        let trunk_height = t.trunk_min + (hash2(wx, wz, seed ^ 0x7A11_7A11) % span) as i32;
        // Highest leaf layer sits one above the trunk top.
        if h + trunk_height >= self.dims.height {
            return None;
        }
        Some(TreeSite {
            base_y: h,
            trunk_height,
        })
    }

    /// Leaf offsets relative to the trunk top: three diamond layers, the
    /// uppermost one narrower, never overlapping the trunk itself.
    pub fn leaf_offsets(&self) -> Vec<(i32, i32, i32)> {
        let r = self.trees.leaf_radius;
        let mut out = Vec::new();
        for dy in -1..=1 {
            let rad = if dy == 1 { (r - 1).max(0) } else { r };
            for dz in -rad..=rad {
                for dx in -rad..=rad {
                    if dx.abs() + dz.abs() > rad {
                        continue;
                    }
                    if dx == 0 && dz == 0 && dy <= 0 {
                        continue;
                    }
                    out.push((dx, dy, dz));
                }
            }
        }
        out
    }
}

fn hash2(ix: i32, iz: i32, seed: u32) -> u32 {
    let mut h = (ix as u32).wrapping_mul(0x85eb_ca6b)
        ^ (iz as u32).wrapping_mul(0xc2b2_ae35)
        ^ seed.wrapping_mul(0x27d4_eb2d);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    h
}

fn rand01(world_seed: u32, ix: i32, iz: i32, salt: u32) -> f32 {
    let h = hash2(ix, iz, (world_seed ^ salt).wrapping_add(0x9E37_79B9));
    ((h & 0x00FF_FFFF) as f32) / 16_777_216.0
}

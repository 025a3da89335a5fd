use strata_blocks::BlockKind;

use crate::config::{BiomeDef, BiomeParams};

/// One terrain column after biome selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSample {
    /// Filled blocks in the column; the surface block sits at `height - 1`.
    pub height: i32,
    pub surface: BlockKind,
    pub tree_density_scale: f32,
    /// Index into `BiomeParams::defs`; `None` where no biome claims the climate.
    pub biome: Option<usize>,
}

impl ColumnSample {
    /// Grass column with the unscaled tree density.
    pub fn plain(height: i32) -> Self {
        Self {
            height,
            surface: BlockKind::Grass,
            tree_density_scale: 1.0,
            biome: None,
        }
    }
}

/// First biome whose climate box holds `(temp, moisture)`.
pub fn select_biome(params: &BiomeParams, temp: f32, moisture: f32) -> Option<usize> {
    if !params.enable {
        return None;
    }
    params.defs.iter().position(|d| {
        within(temp, d.temp_min, d.temp_max) && within(moisture, d.moisture_min, d.moisture_max)
    })
}

#[inline]
fn within(v: f32, lo: f32, hi: f32) -> bool {
    v >= lo && (v < hi || (hi >= 1.0 && v <= hi))
}

/// `(height offset, span scale)` a biome applies to the base height curve.
#[inline]
pub(crate) fn height_shape(def: Option<&BiomeDef>) -> (f32, f32) {
    def.map_or((0.0, 1.0), |d| (d.height_offset as f32, d.height_scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_the_whole_climate_square() {
        let params = BiomeParams::default();
        for ti in 0..=20 {
            for mi in 0..=20 {
                let (t, m) = (ti as f32 / 20.0, mi as f32 / 20.0);
                assert!(select_biome(&params, t, m).is_some(), "no biome at ({t}, {m})");
            }
        }
    }

    #[test]
    fn disabled_table_selects_nothing() {
        assert_eq!(select_biome(&BiomeParams::disabled(), 0.5, 0.5), None);
        let mut off = BiomeParams::default();
        off.enable = false;
        assert_eq!(select_biome(&off, 0.5, 0.5), None);
    }

    #[test]
    fn upper_bound_is_exclusive_below_one() {
        let params = BiomeParams::default();
        let forest = params.defs.iter().position(|d| d.name == "forest");
        let plains = params.defs.iter().position(|d| d.name == "plains");
        assert_eq!(select_biome(&params, 0.2, 0.62), forest);
        assert_eq!(select_biome(&params, 0.2, 0.6199), plains);
        assert_eq!(select_biome(&params, 1.0, 1.0), forest);
    }
}

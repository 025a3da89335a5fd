use hashbrown::HashMap;
use strata_geom::{Vec3, VertexKey};

use crate::ColliderBuild;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeldStats {
    /// Vertices carrying a NaN component, moved to the origin.
    pub repaired: usize,
    /// Vertices folded into an earlier identical position.
    pub merged: usize,
}

/// Deduplicates collider vertices by exact position and remaps indices.
///
/// NaN vertices are replaced with the origin before keys are taken, so a
/// degenerate vertex welds onto any real vertex at the origin instead of
/// poisoning the buffer. First occurrence order is kept.
pub fn weld_collider(col: &mut ColliderBuild) -> WeldStats {
    let mut stats = WeldStats::default();
    let mut first: HashMap<VertexKey, u32> = HashMap::with_capacity(col.pos.len());
    let mut remap: Vec<u32> = Vec::with_capacity(col.pos.len());
    let mut out: Vec<Vec3> = Vec::with_capacity(col.pos.len());
    for v in &col.pos {
        if v.has_nan() {
            stats.repaired += 1;
        }
        let v = v.sanitized();
        let v = Vec3::new(v.x + 0.0, v.y + 0.0, v.z + 0.0);
        let next = out.len() as u32;
        let slot = *first.entry(v.bits_key()).or_insert(next);
        if slot == next {
            out.push(v);
        } else {
            stats.merged += 1;
        }
        remap.push(slot);
    }
    for i in col.idx.iter_mut() {
        // Indices past the source buffer collapse onto vertex 0 rather than dangle.
        *i = remap.get(*i as usize).copied().unwrap_or(0);
    }
    if out.is_empty() {
        col.idx.clear();
    }
    col.pos = out;
    if stats.repaired > 0 {
        log::warn!(target: "mesh", "collider weld repaired {} NaN vertices", stats.repaired);
    }
    stats
}

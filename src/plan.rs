use hashbrown::HashSet;
use strata_world::ChunkCoord;

/// Every position of one horizontal layer within `radius` chunks of `center`
/// (a square, not a disc).
pub fn needed_square(center: ChunkCoord, radius: i32) -> HashSet<ChunkCoord> {
    let r = radius.max(0);
    let mut out = HashSet::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
    for dz in -r..=r {
        for dx in -r..=r {
            out.insert(ChunkCoord::new(center.cx + dx, 0, center.cz + dz));
        }
    }
    out
}

/// The diff between what a position needs and what currently exists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldGenerationPlan {
    pub center: ChunkCoord,
    pub data_to_create: HashSet<ChunkCoord>,
    pub render_to_create: HashSet<ChunkCoord>,
    pub data_to_evict: HashSet<ChunkCoord>,
    pub render_to_evict: HashSet<ChunkCoord>,
}

impl WorldGenerationPlan {
    pub fn compute(
        center: ChunkCoord,
        data_radius: i32,
        draw_radius: i32,
        data_present: impl IntoIterator<Item = ChunkCoord>,
        render_present: impl IntoIterator<Item = ChunkCoord>,
    ) -> Self {
        let center = center.with_y(0);
        let need_data = needed_square(center, data_radius.max(draw_radius));
        let need_render = needed_square(center, draw_radius);
        let data_present: HashSet<ChunkCoord> = data_present.into_iter().collect();
        let render_present: HashSet<ChunkCoord> = render_present.into_iter().collect();
        Self {
            center,
            data_to_create: need_data.difference(&data_present).copied().collect(),
            render_to_create: need_render.difference(&render_present).copied().collect(),
            data_to_evict: data_present.difference(&need_data).copied().collect(),
            render_to_evict: render_present.difference(&need_render).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data_to_create.is_empty()
            && self.render_to_create.is_empty()
            && self.data_to_evict.is_empty()
            && self.render_to_evict.is_empty()
    }

    /// Positions to create, nearest to the center first.
    pub fn data_creation_order(&self) -> Vec<ChunkCoord> {
        sorted_by_distance(self.center, &self.data_to_create)
    }

    pub fn render_creation_order(&self) -> Vec<ChunkCoord> {
        sorted_by_distance(self.center, &self.render_to_create)
    }
}

fn sorted_by_distance(center: ChunkCoord, set: &HashSet<ChunkCoord>) -> Vec<ChunkCoord> {
    let mut v: Vec<ChunkCoord> = set.iter().copied().collect();
    v.sort_by_key(|c| (c.ring_distance_xz(center), *c));
    v
}

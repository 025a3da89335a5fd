use strata_geom::Vec3;

/// Render buffers for one sub-mesh: interleaved positions/normals, uvs, and
/// triangle indices (two per quad).
#[derive(Default, Clone, Debug)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u32>,
}

impl MeshBuild {
    /// Appends a quad whose corners are already counter-clockwise from outside.
    pub fn add_quad(&mut self, corners: [Vec3; 4], n: Vec3, uvs: [[f32; 2]; 4]) {
        let base = self.vertex_count() as u32;
        for (v, uv) in corners.iter().zip(uvs.iter()) {
            self.pos.extend_from_slice(&[v.x, v.y, v.z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            self.uv.extend_from_slice(uv);
        }
        self.idx
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.idx.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    /// Returns a slice of interleaved vertex positions (x,y,z per vertex).
    pub fn positions(&self) -> &[f32] {
        &self.pos
    }
    /// Returns a slice of interleaved vertex normals (x,y,z per vertex).
    pub fn normals(&self) -> &[f32] {
        &self.norm
    }

    pub fn vertex(&self, i: usize) -> Vec3 {
        Vec3::new(self.pos[3 * i], self.pos[3 * i + 1], self.pos[3 * i + 2])
    }

    /// Every index addresses an existing vertex.
    pub fn indices_in_range(&self) -> bool {
        let n = self.vertex_count() as u32;
        self.idx.iter().all(|&i| i < n)
    }
}

/// Collision geometry: positions only, welded after the build.
#[derive(Default, Clone, Debug)]
pub struct ColliderBuild {
    pub pos: Vec<Vec3>,
    pub idx: Vec<u32>,
}

impl ColliderBuild {
    pub fn add_quad(&mut self, corners: [Vec3; 4]) {
        let base = self.pos.len() as u32;
        self.pos.extend_from_slice(&corners);
        self.idx
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    pub fn indices_in_range(&self) -> bool {
        let n = self.pos.len() as u32;
        self.idx.iter().all(|&i| i < n)
    }
}

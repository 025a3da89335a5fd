use strata_blocks::{BlockCatalog, BlockKind};
use strata_chunk::{BlockLookup, ChunkData};
use strata_geom::{Aabb, Vec3};
use strata_world::ChunkCoord;

use crate::{ColliderBuild, Face, MeshBuild, WeldStats, weld_collider};

/// Output of meshing one chunk, in chunk-local coordinates.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub coord: ChunkCoord,
    pub opaque: MeshBuild,
    pub water: MeshBuild,
    pub collider: ColliderBuild,
    pub bbox: Aabb,
    pub weld: WeldStats,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.water.is_empty() && self.collider.is_empty()
    }

    /// Index consistency across all three buffers.
    pub fn is_consistent(&self) -> bool {
        self.opaque.indices_in_range()
            && self.water.indices_in_range()
            && self.collider.indices_in_range()
    }
}

/// Whether a face of a solid `kind` facing `neighbor` must be drawn.
#[inline]
pub fn solid_face_visible(cat: &BlockCatalog, kind: BlockKind, neighbor: BlockKind) -> bool {
    !cat.is_opaque(neighbor) && neighbor != kind
}

/// Whether a face of a water block facing `neighbor` must be drawn.
/// Tops show unless more water sits above; other faces show only against emptiness.
#[inline]
pub fn water_face_visible(face: Face, neighbor: BlockKind) -> bool {
    match face {
        Face::PosY => neighbor != BlockKind::Water,
        _ => neighbor.is_empty(),
    }
}

/// Builds render, water and collider geometry for `chunk`, reading across
/// its borders through `world`.
pub fn build_chunk_mesh(chunk: &ChunkData, world: &impl BlockLookup, cat: &BlockCatalog) -> MeshData {
    let mut opaque = MeshBuild::default();
    let mut water = MeshBuild::default();
    let mut collider = ColliderBuild::default();
    let mut bbox = Aabb::EMPTY;

    for (x, y, z) in chunk.iter_local() {
        let kind = chunk.blocks()[chunk.index(x, y, z)];
        if kind.is_empty() {
            continue;
        }
        let is_water = kind == BlockKind::Water;
        if !is_water && !cat.is_solid(kind) {
            continue;
        }
        let (fx, fy, fz) = (x as f32, y as f32, z as f32);
        for face in Face::ALL {
            let (dx, dy, dz) = face.delta();
            let nb = chunk.block(world, x + dx, y + dy, z + dz);
            let corners = face.corners(fx, fy, fz);
            let uvs = cat.uv_for(kind, face.role());
            if is_water {
                if water_face_visible(face, nb) {
                    water.add_quad(corners, face.normal(), uvs);
                    corners.iter().for_each(|c| bbox.include(*c));
                }
                continue;
            }
            if !solid_face_visible(cat, kind, nb) {
                continue;
            }
            opaque.add_quad(corners, face.normal(), uvs);
            corners.iter().for_each(|c| bbox.include(*c));
            if cat.generates_collider(kind) {
                collider.add_quad(corners);
            }
        }
    }

    let weld = weld_collider(&mut collider);
    let bbox = if bbox.is_empty() {
        Aabb::new(Vec3::ZERO, Vec3::ZERO)
    } else {
        bbox
    };
    MeshData {
        coord: chunk.coord,
        opaque,
        water,
        collider,
        bbox,
        weld,
    }
}

//! CPU meshing crate: per-face culling mesher, collider welding, walkable surfaces.
#![forbid(unsafe_code)]

mod build;
mod face;
mod mesh_build;
mod walkable;
mod weld;

pub use build::{MeshData, build_chunk_mesh, solid_face_visible, water_face_visible};
pub use face::Face;
pub use mesh_build::{ColliderBuild, MeshBuild};
pub use walkable::{WalkableSurface, build_walkable_surface};
pub use weld::{WeldStats, weld_collider};

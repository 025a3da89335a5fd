use strata_blocks::BlockCatalog;
use strata_chunk::{BlockLookup, ChunkData};
use strata_mesh_cpu::{MeshData, WalkableSurface, build_walkable_surface};
use strata_world::ChunkCoord;

/// External binder for render buffers, colliders and navigation input.
/// Called only from the thread that owns the `WorldCoordinator`.
pub trait RenderSink {
    fn upload(&mut self, coord: ChunkCoord, mesh: &MeshData);
    fn upload_walkable(&mut self, coord: ChunkCoord, surface: &WalkableSurface);
    fn destroy(&mut self, coord: ChunkCoord);
}

/// Discards everything. Used by the headless driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn upload(&mut self, _coord: ChunkCoord, _mesh: &MeshData) {}
    fn upload_walkable(&mut self, _coord: ChunkCoord, _surface: &WalkableSurface) {}
    fn destroy(&mut self, _coord: ChunkCoord) {}
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn upload(&mut self, coord: ChunkCoord, mesh: &MeshData) {
        (**self).upload(coord, mesh);
    }
    fn upload_walkable(&mut self, coord: ChunkCoord, surface: &WalkableSurface) {
        (**self).upload_walkable(coord, surface);
    }
    fn destroy(&mut self, coord: ChunkCoord) {
        (**self).destroy(coord);
    }
}

/// The in-world object bound to one chunk's data.
#[derive(Clone, Debug)]
pub struct ChunkRenderObject {
    pub coord: ChunkCoord,
    pub mesh: MeshData,
    pub walkable: WalkableSurface,
    /// Number of times this object has been rebuilt after creation.
    pub rebuilds: u32,
}

impl ChunkRenderObject {
    pub fn new(mesh: MeshData, sink: &mut impl RenderSink) -> Self {
        sink.upload(mesh.coord, &mesh);
        Self {
            coord: mesh.coord,
            mesh,
            walkable: WalkableSurface::default(),
            rebuilds: 0,
        }
    }

    pub fn rebuild(&mut self, mesh: MeshData, sink: &mut impl RenderSink) {
        sink.upload(self.coord, &mesh);
        self.mesh = mesh;
        self.rebuilds += 1;
    }

    /// Empty surfaces are kept but never handed to the sink.
    pub fn derive_walkable(
        &mut self,
        chunk: &ChunkData,
        world: &impl BlockLookup,
        catalog: &BlockCatalog,
        sink: &mut impl RenderSink,
    ) {
        self.walkable = build_walkable_surface(chunk, world, catalog);
        if !self.walkable.is_empty() {
            sink.upload_walkable(self.coord, &self.walkable);
        }
    }
}

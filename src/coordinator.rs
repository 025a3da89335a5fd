use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hashbrown::{HashMap, HashSet};
use strata_blocks::{BlockCatalog, BlockKind};
use strata_chunk::{BlockLookup, ChunkData, ChunkMap};
use strata_geom::Vec3;
use strata_io::{SaveData, SaveError};
use strata_mesh_cpu::{MeshData, build_chunk_mesh};
use strata_runtime::{CancelToken, JobOut, MeshJob, Runtime, RuntimeError, TerrainJob};
use strata_world::{BlockPos, ChunkCoord, TerrainGenerator, WorldConfig, WorldSeed};
use thiserror::Error;

use crate::event::{EventBus, WorldEvent};
use crate::plan::WorldGenerationPlan;
use crate::render::{ChunkRenderObject, RenderSink};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("save lists chunk ({x}, {y}, {z}) more than once")]
    DuplicateChunk { x: i32, y: i32, z: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldPhase {
    Uninitialized,
    Generating { initial: bool },
    Ready,
    Disposed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// No chunk is loaded at the position; nothing changed.
    NotLoaded,
    /// Chunks whose render objects were re-meshed before returning.
    Applied { rebuilt: Vec<ChunkCoord> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Terrain,
    Mesh,
    Apply,
}

struct Cycle {
    id: u64,
    token: CancelToken,
    stage: Stage,
    render_targets: Vec<ChunkCoord>,
    data_created: usize,
    render_created: usize,
    started: Instant,
}

struct PendingMesh {
    snapshot: Arc<ChunkMap>,
    mesh: MeshData,
}

/// Owns the chunk-data and render maps and drives the generation pipeline.
///
/// All structural mutation happens on the thread that calls `generate`,
/// `update` and `set_block`. Workers only see immutable snapshots.
pub struct WorldCoordinator<S: RenderSink> {
    config: WorldConfig,
    seed: WorldSeed,
    catalog: Arc<BlockCatalog>,
    runtime: Runtime,
    chunks: ChunkMap,
    renders: HashMap<ChunkCoord, ChunkRenderObject>,
    sink: S,
    events: EventBus,
    phase: WorldPhase,
    cycle: Option<Cycle>,
    next_cycle: u64,
    apply_queue: VecDeque<PendingMesh>,
    /// Rendered chunks whose bound mesh no longer matches the data around
    /// them. Survives cancellation; drained by the next mesh pass.
    dirty_renders: HashSet<ChunkCoord>,
    world_created: bool,
}

impl<S: RenderSink> WorldCoordinator<S> {
    /// Uses the configured seed, or a random one when none is set.
    pub fn new(config: WorldConfig, sink: S) -> Result<Self, RuntimeError> {
        let seed = config
            .seed
            .map(WorldSeed::from_seed)
            .unwrap_or_else(WorldSeed::random);
        Self::with_seed(config, Arc::new(BlockCatalog::new()), seed, sink)
    }

    pub fn with_seed(
        config: WorldConfig,
        catalog: Arc<BlockCatalog>,
        seed: WorldSeed,
        sink: S,
    ) -> Result<Self, RuntimeError> {
        let terrain = Arc::new(TerrainGenerator::from_config(&config, seed));
        let runtime = Runtime::new(terrain, Arc::clone(&catalog))?;
        log::info!(
            target: "pipeline",
            "world seed {} (offset {:?}), {}x{} chunks, draw radius {}, data radius {}",
            seed.seed,
            seed.offset,
            config.chunk_size,
            config.chunk_height,
            config.draw_radius,
            config.effective_data_radius()
        );
        Ok(Self {
            chunks: ChunkMap::new(config.dims()),
            config,
            seed,
            catalog,
            runtime,
            renders: HashMap::new(),
            sink,
            events: EventBus::new(),
            phase: WorldPhase::Uninitialized,
            cycle: None,
            next_cycle: 0,
            apply_queue: VecDeque::new(),
            dirty_renders: HashSet::new(),
            world_created: false,
        })
    }

    /// Restores every chunk of `save` or fails without building a world.
    pub fn from_save(config: WorldConfig, save: &SaveData, sink: S) -> Result<Self, LoadError> {
        let dims = config.dims();
        let restored = save.restore_chunks(dims)?;
        let mut map = ChunkMap::new(dims);
        for chunk in restored {
            let o = chunk.origin;
            if !map.insert_if_absent(Arc::new(chunk)) {
                return Err(LoadError::DuplicateChunk {
                    x: o.x,
                    y: o.y,
                    z: o.z,
                });
            }
        }
        let mut links = 0;
        for (src, dst) in save.leaf_links() {
            if map.mark_leaves_applied(src, dst) {
                links += 1;
            }
        }
        let seed = WorldSeed::from_seed(save.world_seed);
        let mut world = Self::with_seed(config, Arc::new(BlockCatalog::new()), seed, sink)?;
        log::info!(
            target: "io",
            "restored {} chunks, {} leaf links (seed {})",
            map.len(),
            links,
            seed.seed
        );
        world.chunks = map;
        Ok(world)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&WorldEvent) + Send + 'static) {
        self.events.subscribe(Box::new(listener));
    }

    /// Plans the world around `observer`, applies evictions immediately and
    /// starts a new generation cycle. Any cycle still in flight is cancelled.
    pub fn generate(&mut self, observer: Vec3) -> WorldGenerationPlan {
        if self.phase == WorldPhase::Disposed {
            log::debug!(target: "pipeline", "generate ignored: world disposed");
            return WorldGenerationPlan::default();
        }
        self.cancel_cycle();

        let dims = self.config.dims();
        let center = dims.clamp_chunk(
            self.chunk_coord_of(observer),
            self.config.effective_data_radius() + 2,
        );
        let plan = WorldGenerationPlan::compute(
            center,
            self.config.effective_data_radius(),
            self.config.draw_radius,
            self.chunks.coords(),
            self.renders.keys().copied(),
        );

        let mut evict_render: Vec<ChunkCoord> = plan.render_to_evict.iter().copied().collect();
        evict_render.sort();
        for c in evict_render {
            self.dirty_renders.remove(&c);
            if self.renders.remove(&c).is_some() {
                self.sink.destroy(c);
                self.events.emit(WorldEvent::ChunkRenderEvicted(c));
            }
        }
        let mut evict_data: Vec<ChunkCoord> = plan.data_to_evict.iter().copied().collect();
        evict_data.sort();
        for c in evict_data {
            self.dirty_renders.remove(&c);
            if self.renders.remove(&c).is_some() {
                self.sink.destroy(c);
                self.events.emit(WorldEvent::ChunkRenderEvicted(c));
            }
            if self.chunks.remove(c).is_some() {
                self.events.emit(WorldEvent::ChunkDataEvicted(c));
                self.mark_dirty_around(c);
            }
        }

        self.next_cycle += 1;
        let id = self.next_cycle;
        self.phase = WorldPhase::Generating {
            initial: !self.world_created,
        };
        log::info!(
            target: "pipeline",
            "[cycle {}] plan around {:?}: +{} data, +{} render, -{} data, -{} render",
            id,
            plan.center,
            plan.data_to_create.len(),
            plan.render_to_create.len(),
            plan.data_to_evict.len(),
            plan.render_to_evict.len()
        );

        let token = CancelToken::new();
        self.cycle = Some(Cycle {
            id,
            token: token.clone(),
            stage: Stage::Terrain,
            render_targets: plan.render_creation_order(),
            data_created: 0,
            render_created: 0,
            started: Instant::now(),
        });
        let to_create = plan.data_creation_order();
        if to_create.is_empty() {
            self.begin_meshing();
        } else {
            self.runtime.submit_terrain(TerrainJob {
                cycle: id,
                coords: to_create,
                token,
            });
        }
        plan
    }

    /// Re-plans around `observer` after `from_save`. Chunks restored from the
    /// save are already present, so only missing terrain is generated.
    pub fn regenerate_from_save(&mut self, observer: Vec3) -> WorldGenerationPlan {
        log::info!(
            target: "io",
            "regenerating render state around ({:.1},{:.1},{:.1}) from {} saved chunks",
            observer.x,
            observer.y,
            observer.z,
            self.chunks.len()
        );
        self.generate(observer)
    }

    /// One main-loop tick: merges finished work and applies at most
    /// `apply_per_tick` meshes.
    pub fn update(&mut self) {
        if self.phase == WorldPhase::Disposed {
            return;
        }
        for out in self.runtime.drain_results() {
            self.handle_result(out);
        }
        self.apply_pending(self.config.streaming.apply_per_tick.max(1));
        self.try_finish_cycle();
    }

    /// Calls `update` until the current cycle completes or `timeout` passes.
    pub fn run_until_ready(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.update();
            match self.phase {
                WorldPhase::Ready => return true,
                WorldPhase::Generating { .. } => {}
                WorldPhase::Uninitialized | WorldPhase::Disposed => return false,
            }
            if Instant::now() >= deadline {
                return false;
            }
            if self.apply_queue.is_empty() {
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    /// Writes one block and re-meshes every rendered chunk whose faces it touches.
    pub fn set_block(&mut self, p: BlockPos, kind: BlockKind) -> EditOutcome {
        if self.phase == WorldPhase::Disposed {
            return EditOutcome::NotLoaded;
        }
        let Some(c) = self.chunks.set_block(p, kind) else {
            log::trace!(target: "edit", "set ({},{},{}) ignored: chunk not loaded", p.x, p.y, p.z);
            return EditOutcome::NotLoaded;
        };
        let neighbors = match self.chunks.get_mut(c) {
            Some(chunk) => {
                chunk.modified_by_player = true;
                chunk.edge_neighbor_coords(p)
            }
            None => Vec::new(),
        };
        let mut rebuilt = Vec::new();
        for coord in std::iter::once(c).chain(neighbors) {
            if self.renders.contains_key(&coord) && self.rebuild_now(coord) {
                rebuilt.push(coord);
            }
        }
        log::info!(
            target: "edit",
            "set ({},{},{}) = {} in {:?}; rebuilt {:?}",
            p.x,
            p.y,
            p.z,
            kind.name(),
            c,
            rebuilt
        );
        EditOutcome::Applied { rebuilt }
    }

    /// Total: unloaded positions read as `Nothing`.
    #[inline]
    pub fn block_at(&self, p: BlockPos) -> BlockKind {
        self.chunks.block_at(p)
    }

    #[inline]
    pub fn chunk_coord_of(&self, p: Vec3) -> ChunkCoord {
        self.config.dims().chunk_of_point([p.x, p.y, p.z])
    }

    /// Cancels in-flight work and tears down every chunk and render object.
    pub fn dispose(&mut self) {
        if self.phase == WorldPhase::Disposed {
            return;
        }
        self.cancel_cycle();
        self.dirty_renders.clear();
        let mut renders: Vec<ChunkCoord> = self.renders.keys().copied().collect();
        renders.sort();
        for c in renders {
            self.renders.remove(&c);
            self.sink.destroy(c);
            self.events.emit(WorldEvent::ChunkRenderEvicted(c));
        }
        let mut data: Vec<ChunkCoord> = self.chunks.coords().collect();
        data.sort();
        self.chunks.clear();
        for c in data {
            self.events.emit(WorldEvent::ChunkDataEvicted(c));
        }
        self.phase = WorldPhase::Disposed;
        log::info!(target: "pipeline", "world disposed");
    }

    pub fn save_data(&self, player_position: Vec3) -> SaveData {
        SaveData::capture_map(
            [player_position.x, player_position.y, player_position.z],
            self.seed.seed,
            &self.chunks,
        )
    }

    pub fn phase(&self) -> WorldPhase {
        self.phase
    }

    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    pub fn chunks(&self) -> &ChunkMap {
        &self.chunks
    }

    pub fn render_object(&self, c: ChunkCoord) -> Option<&ChunkRenderObject> {
        self.renders.get(&c)
    }

    pub fn render_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.renders.keys().copied()
    }

    pub fn render_count(&self) -> usize {
        self.renders.len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn current_cycle(&self) -> Option<u64> {
        self.cycle.as_ref().map(|c| c.id)
    }

    /// No cycle in flight and no mesh waiting to be applied.
    pub fn is_idle(&self) -> bool {
        self.cycle.is_none() && self.apply_queue.is_empty()
    }

    pub fn pending_applies(&self) -> usize {
        self.apply_queue.len()
    }

    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        self.runtime.queue_debug_counts()
    }

    fn cancel_cycle(&mut self) {
        if let Some(cycle) = self.cycle.take() {
            cycle.token.cancel();
            log::debug!(
                target: "pipeline",
                "[cycle {}] superseded during {:?} stage; no-op, try again",
                cycle.id,
                cycle.stage
            );
            self.events.emit(WorldEvent::CycleCancelled { cycle: cycle.id });
        }
        self.apply_queue.clear();
    }

    fn handle_result(&mut self, out: JobOut) {
        let live = self
            .cycle
            .as_ref()
            .is_some_and(|c| c.id == out.cycle() && !c.token.is_cancelled());
        if !live {
            log::debug!(target: "pipeline", "[cycle {}] dropping result of superseded cycle", out.cycle());
            return;
        }
        match out {
            JobOut::Terrain {
                cycle,
                result: Ok(chunks),
                t_ms,
            } => {
                let total = chunks.len();
                let mut created = 0;
                for chunk in chunks {
                    let c = chunk.coord;
                    if self.chunks.insert_if_absent(Arc::new(chunk)) {
                        created += 1;
                        self.events.emit(WorldEvent::ChunkDataCreated(c));
                        self.mark_dirty_around(c);
                    }
                }
                if let Some(cy) = self.cycle.as_mut() {
                    cy.data_created += created;
                }
                log::debug!(
                    target: "pipeline",
                    "[cycle {}] terrain: {} chunks in {} ms, {} merged",
                    cycle,
                    total,
                    t_ms,
                    created
                );
                self.begin_meshing();
            }
            JobOut::Mesh {
                cycle,
                snapshot,
                result: Ok(meshes),
                t_ms,
            } => {
                log::debug!(
                    target: "pipeline",
                    "[cycle {}] mesh: {} chunks in {} ms",
                    cycle,
                    meshes.len(),
                    t_ms
                );
                for mesh in meshes {
                    self.apply_queue.push_back(PendingMesh {
                        snapshot: Arc::clone(&snapshot),
                        mesh,
                    });
                }
                if let Some(cy) = self.cycle.as_mut() {
                    cy.stage = Stage::Apply;
                }
            }
            JobOut::Terrain { cycle, result: Err(_), .. } | JobOut::Mesh { cycle, result: Err(_), .. } => {
                log::debug!(target: "pipeline", "[cycle {}] batch cancelled; no-op", cycle);
            }
        }
    }

    /// Marks `c` and its face neighbours for re-meshing where they are rendered.
    fn mark_dirty_around(&mut self, c: ChunkCoord) {
        for n in std::iter::once(c).chain(c.face_neighbors()) {
            if self.renders.contains_key(&n) {
                self.dirty_renders.insert(n);
            }
        }
    }

    /// Patches deferred leaves, then meshes the cycle's render targets plus
    /// every dirty rendered chunk, including ones left over from a
    /// cancelled cycle.
    fn begin_meshing(&mut self) {
        for c in self.chunks.patch_tree_leaves() {
            self.mark_dirty_around(c);
        }
        let Some(cycle) = self.cycle.as_mut() else {
            return;
        };
        let mut targets: Vec<ChunkCoord> = cycle
            .render_targets
            .iter()
            .copied()
            .filter(|c| self.chunks.contains(*c))
            .collect();
        let mut seen: HashSet<ChunkCoord> = targets.iter().copied().collect();
        let mut dirty: Vec<ChunkCoord> = self
            .dirty_renders
            .iter()
            .copied()
            .filter(|c| self.renders.contains_key(c) && self.chunks.contains(*c))
            .collect();
        dirty.sort();
        for c in dirty {
            if seen.insert(c) {
                targets.push(c);
            }
        }
        if targets.is_empty() {
            cycle.stage = Stage::Apply;
            return;
        }
        cycle.stage = Stage::Mesh;
        log::debug!(target: "pipeline", "[cycle {}] meshing {} chunks", cycle.id, targets.len());
        self.runtime.submit_mesh(MeshJob {
            cycle: cycle.id,
            coords: targets,
            snapshot: Arc::new(self.chunks.clone()),
            token: cycle.token.clone(),
        });
    }

    fn apply_pending(&mut self, budget: usize) {
        let mut applied = 0;
        while applied < budget {
            let Some(pending) = self.apply_queue.pop_front() else {
                break;
            };
            if self.apply_mesh(pending) {
                applied += 1;
            }
        }
    }

    /// Binds a worker mesh, or re-meshes against the live map when the chunk
    /// or one of its face neighbours changed since the snapshot was taken.
    fn apply_mesh(&mut self, pending: PendingMesh) -> bool {
        let PendingMesh { snapshot, mesh } = pending;
        let coord = mesh.coord;
        let Some(live) = self.chunks.get(coord).cloned() else {
            log::trace!(target: "pipeline", "skip mesh for {:?}: data evicted", coord);
            return false;
        };
        let fresh = self.chunks.same_entry(coord, snapshot.get(coord))
            && coord
                .face_neighbors()
                .all(|n| self.chunks.same_entry(n, snapshot.get(n)));
        let mesh = if fresh {
            mesh
        } else {
            log::debug!(target: "pipeline", "{:?} changed while meshing; rebuilding", coord);
            build_chunk_mesh(&live, &self.chunks, &self.catalog)
        };
        self.bind_mesh(&live, mesh);
        true
    }

    fn rebuild_now(&mut self, coord: ChunkCoord) -> bool {
        let Some(live) = self.chunks.get(coord).cloned() else {
            return false;
        };
        let mesh = build_chunk_mesh(&live, &self.chunks, &self.catalog);
        self.bind_mesh(&live, mesh);
        true
    }

    fn bind_mesh(&mut self, chunk: &ChunkData, mesh: MeshData) {
        let coord = chunk.coord;
        self.dirty_renders.remove(&coord);
        match self.renders.get_mut(&coord) {
            Some(obj) => {
                obj.rebuild(mesh, &mut self.sink);
                obj.derive_walkable(chunk, &self.chunks, &self.catalog, &mut self.sink);
                self.events.emit(WorldEvent::ChunkRebuilt(coord));
            }
            None => {
                let mut obj = ChunkRenderObject::new(mesh, &mut self.sink);
                obj.derive_walkable(chunk, &self.chunks, &self.catalog, &mut self.sink);
                self.renders.insert(coord, obj);
                if let Some(cycle) = self.cycle.as_mut() {
                    cycle.render_created += 1;
                }
                self.events.emit(WorldEvent::ChunkRenderCreated(coord));
            }
        }
        log::trace!(target: "pipeline", "applied mesh for {:?}", coord);
    }

    fn try_finish_cycle(&mut self) {
        let done = self
            .cycle
            .as_ref()
            .is_some_and(|c| c.stage == Stage::Apply && self.apply_queue.is_empty());
        if !done {
            return;
        }
        let Some(cycle) = self.cycle.take() else {
            return;
        };
        self.phase = WorldPhase::Ready;
        log::info!(
            target: "pipeline",
            "[cycle {}] complete in {} ms: +{} data, +{} render; {} chunks, {} render objects loaded",
            cycle.id,
            cycle.started.elapsed().as_millis(),
            cycle.data_created,
            cycle.render_created,
            self.chunks.len(),
            self.renders.len()
        );
        self.events.emit(WorldEvent::NewChunksGenerated {
            cycle: cycle.id,
            data_created: cycle.data_created,
            render_created: cycle.render_created,
        });
        if !self.world_created {
            self.world_created = true;
            self.events.emit(WorldEvent::WorldCreated);
        }
    }
}

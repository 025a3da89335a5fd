//! Background terrain and mesh workers with per-cycle cancellation.
#![forbid(unsafe_code)]

mod cancel;
mod gen_ctx_pool;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use strata_blocks::BlockCatalog;
use strata_chunk::{ChunkData, ChunkMap, generate_chunk_data};
use strata_mesh_cpu::{MeshData, build_chunk_mesh};
use strata_world::{ChunkCoord, TerrainGenerator};
use thiserror::Error;

pub use cancel::{CancelToken, Cancelled};
pub use gen_ctx_pool::{GenCtxPool, PooledGenCtx};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to spawn dispatcher thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Generate terrain for every coordinate of one cycle.
#[derive(Clone, Debug)]
pub struct TerrainJob {
    pub cycle: u64,
    pub coords: Vec<ChunkCoord>,
    pub token: CancelToken,
}

/// Mesh every coordinate against a frozen view of the chunk map.
#[derive(Clone, Debug)]
pub struct MeshJob {
    pub cycle: u64,
    pub coords: Vec<ChunkCoord>,
    pub snapshot: Arc<ChunkMap>,
    pub token: CancelToken,
}

pub enum JobOut {
    Terrain {
        cycle: u64,
        result: Result<Vec<ChunkData>, Cancelled>,
        t_ms: u32,
    },
    Mesh {
        cycle: u64,
        snapshot: Arc<ChunkMap>,
        result: Result<Vec<MeshData>, Cancelled>,
        t_ms: u32,
    },
}

impl JobOut {
    pub fn cycle(&self) -> u64 {
        match self {
            JobOut::Terrain { cycle, .. } | JobOut::Mesh { cycle, .. } => *cycle,
        }
    }
}

fn elapsed_ms(t0: Instant) -> u32 {
    t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

/// Runs one terrain batch. A cancellation observed at any chunk boundary,
/// or after the batch, discards the whole batch.
pub fn run_terrain_job(job: &TerrainJob, ctx_pool: &GenCtxPool) -> Result<Vec<ChunkData>, Cancelled> {
    let out = job
        .coords
        .par_iter()
        .map(|&c| {
            job.token.check()?;
            let mut ctx = ctx_pool.take();
            Ok(generate_chunk_data(ctx_pool.terrain(), &mut ctx, c))
        })
        .collect::<Result<Vec<_>, Cancelled>>()?;
    job.token.check()?;
    Ok(out)
}

/// Runs one mesh batch; coordinates missing from the snapshot are skipped.
pub fn run_mesh_job(job: &MeshJob, catalog: &BlockCatalog) -> Result<Vec<MeshData>, Cancelled> {
    let snapshot = job.snapshot.as_ref();
    let out = job
        .coords
        .par_iter()
        .map(|&c| {
            job.token.check()?;
            Ok(snapshot
                .get(c)
                .map(|chunk| build_chunk_mesh(chunk, snapshot, catalog)))
        })
        .collect::<Result<Vec<Option<MeshData>>, Cancelled>>()?;
    job.token.check()?;
    Ok(out.into_iter().flatten().collect())
}

enum Job {
    Terrain(TerrainJob),
    Mesh(MeshJob),
}

pub struct Runtime {
    terrain_tx: Sender<Job>,
    mesh_tx: Sender<Job>,
    res_rx: Receiver<JobOut>,
    pool: Arc<ThreadPool>,
    q_terrain: Arc<AtomicUsize>,
    q_mesh: Arc<AtomicUsize>,
    inflight_terrain: Arc<AtomicUsize>,
    inflight_mesh: Arc<AtomicUsize>,
    pub workers: usize,
    ctx_pool: Arc<GenCtxPool>,
}

struct Lane {
    rx: Receiver<Job>,
    tx: Sender<JobOut>,
    pool: Arc<ThreadPool>,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    catalog: Arc<BlockCatalog>,
    ctx_pool: Arc<GenCtxPool>,
}

impl Lane {
    fn run(self) {
        while let Ok(job) = self.rx.recv() {
            self.inflight.fetch_add(1, Ordering::AcqRel);
            self.queued.fetch_sub(1, Ordering::AcqRel);
            let t0 = Instant::now();
            let out = match job {
                Job::Terrain(job) => {
                    let result = self
                        .pool
                        .install(|| run_terrain_job(&job, &self.ctx_pool));
                    JobOut::Terrain {
                        cycle: job.cycle,
                        result,
                        t_ms: elapsed_ms(t0),
                    }
                }
                Job::Mesh(job) => {
                    let result = self.pool.install(|| run_mesh_job(&job, &self.catalog));
                    JobOut::Mesh {
                        cycle: job.cycle,
                        snapshot: job.snapshot,
                        result,
                        t_ms: elapsed_ms(t0),
                    }
                }
            };
            // Result is visible before the lane reports idle.
            let sent = self.tx.send(out).is_ok();
            self.inflight.fetch_sub(1, Ordering::AcqRel);
            if !sent {
                break;
            }
        }
    }
}

impl Runtime {
    pub fn new(terrain: Arc<TerrainGenerator>, catalog: Arc<BlockCatalog>) -> Result<Self, RuntimeError> {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .max(1);
        Self::with_workers(terrain, catalog, workers)
    }

    pub fn with_workers(
        terrain: Arc<TerrainGenerator>,
        catalog: Arc<BlockCatalog>,
        workers: usize,
    ) -> Result<Self, RuntimeError> {
        let workers = workers.max(1);
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("strata-worker-{i}"))
                .build()?,
        );
        let ctx_pool = GenCtxPool::for_workers(terrain, workers);
        let (terrain_tx, terrain_rx) = unbounded::<Job>();
        let (mesh_tx, mesh_rx) = unbounded::<Job>();
        let (res_tx, res_rx) = unbounded::<JobOut>();

        let q_terrain = Arc::new(AtomicUsize::new(0));
        let q_mesh = Arc::new(AtomicUsize::new(0));
        let inflight_terrain = Arc::new(AtomicUsize::new(0));
        let inflight_mesh = Arc::new(AtomicUsize::new(0));

        for (name, rx, queued, inflight) in [
            ("strata-terrain", terrain_rx, &q_terrain, &inflight_terrain),
            ("strata-mesh", mesh_rx, &q_mesh, &inflight_mesh),
        ] {
            let lane = Lane {
                rx,
                tx: res_tx.clone(),
                pool: Arc::clone(&pool),
                queued: Arc::clone(queued),
                inflight: Arc::clone(inflight),
                catalog: Arc::clone(&catalog),
                ctx_pool: Arc::clone(&ctx_pool),
            };
            thread::Builder::new()
                .name(name.to_string())
                .spawn(move || lane.run())?;
        }
        log::debug!(target: "pipeline", "runtime started with {} workers", workers);

        Ok(Self {
            terrain_tx,
            mesh_tx,
            res_rx,
            pool,
            q_terrain,
            q_mesh,
            inflight_terrain,
            inflight_mesh,
            workers,
            ctx_pool,
        })
    }

    pub fn submit_terrain(&self, job: TerrainJob) {
        self.q_terrain.fetch_add(1, Ordering::AcqRel);
        if self.terrain_tx.send(Job::Terrain(job)).is_err() {
            self.q_terrain.fetch_sub(1, Ordering::AcqRel);
        }
    }

    pub fn submit_mesh(&self, job: MeshJob) {
        self.q_mesh.fetch_add(1, Ordering::AcqRel);
        if self.mesh_tx.send(Job::Mesh(job)).is_err() {
            self.q_mesh.fetch_sub(1, Ordering::AcqRel);
        }
    }

    pub fn drain_results(&self) -> Vec<JobOut> {
        self.res_rx.try_iter().collect()
    }

    /// Blocks until one result arrives or every lane has shut down.
    pub fn recv_result(&self) -> Option<JobOut> {
        self.res_rx.recv().ok()
    }

    /// Work still queued or running on any lane.
    pub fn is_idle(&self) -> bool {
        let (a, b, c, d) = self.queue_debug_counts();
        a + b + c + d == 0
    }

    /// `(terrain queued, terrain in flight, mesh queued, mesh in flight)`.
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.q_terrain.load(Ordering::Acquire),
            self.inflight_terrain.load(Ordering::Acquire),
            self.q_mesh.load(Ordering::Acquire),
            self.inflight_mesh.load(Ordering::Acquire),
        )
    }

    /// Runs `f` on the worker pool from the calling thread.
    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        self.pool.install(f)
    }

    pub fn gen_ctx_pool(&self) -> &Arc<GenCtxPool> {
        &self.ctx_pool
    }
}

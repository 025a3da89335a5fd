use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use strata_world::{GenCtx, TerrainGenerator};

/// Bounded set of terrain contexts recycled between chunks. Building the
/// noise state is the costly part of a context, so at most `cap` are ever made.
pub struct GenCtxPool {
    terrain: Arc<TerrainGenerator>,
    idle_tx: Sender<GenCtx>,
    idle_rx: Receiver<GenCtx>,
    built: AtomicUsize,
    reused: AtomicUsize,
    cap: usize,
}

impl GenCtxPool {
    pub fn new(terrain: Arc<TerrainGenerator>, cap: usize) -> Self {
        let cap = cap.max(1);
        let (idle_tx, idle_rx) = bounded(cap);
        Self {
            terrain,
            idle_tx,
            idle_rx,
            built: AtomicUsize::new(0),
            reused: AtomicUsize::new(0),
            cap,
        }
    }

    /// Two contexts per worker.
    pub fn for_workers(terrain: Arc<TerrainGenerator>, workers: usize) -> Arc<Self> {
        Arc::new(Self::new(terrain, workers.max(1) * 2))
    }

    pub fn terrain(&self) -> &TerrainGenerator {
        &self.terrain
    }

    /// An idle context, a new one while under `cap`, or else waits for a release.
    pub fn take(&self) -> PooledGenCtx<'_> {
        let ctx = match self.idle_rx.try_recv() {
            Ok(ctx) => self.recycle(ctx),
            Err(_) => match self.try_build() {
                Some(ctx) => ctx,
                None => match self.idle_rx.recv() {
                    Ok(ctx) => self.recycle(ctx),
                    // Only reachable while the pool itself is being dropped.
                    Err(_) => self.terrain.make_gen_ctx(),
                },
            },
        };
        PooledGenCtx {
            ctx: Some(ctx),
            home: self,
        }
    }

    /// `(contexts built, takes served from the idle set)`.
    pub fn stats(&self) -> (usize, usize) {
        (
            self.built.load(Ordering::Acquire),
            self.reused.load(Ordering::Acquire),
        )
    }

    fn try_build(&self) -> Option<GenCtx> {
        self.built
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < self.cap).then_some(n + 1))
            .ok()
            .map(|_| self.terrain.make_gen_ctx())
    }

    fn recycle(&self, mut ctx: GenCtx) -> GenCtx {
        ctx.columns.clear();
        self.reused.fetch_add(1, Ordering::Relaxed);
        ctx
    }
}

/// Returns its context to the pool on drop.
pub struct PooledGenCtx<'pool> {
    ctx: Option<GenCtx>,
    home: &'pool GenCtxPool,
}

impl Deref for PooledGenCtx<'_> {
    type Target = GenCtx;

    fn deref(&self) -> &GenCtx {
        match &self.ctx {
            Some(ctx) => ctx,
            None => unreachable!("context is only taken in drop"),
        }
    }
}

impl DerefMut for PooledGenCtx<'_> {
    fn deref_mut(&mut self) -> &mut GenCtx {
        match &mut self.ctx {
            Some(ctx) => ctx,
            None => unreachable!("context is only taken in drop"),
        }
    }
}

impl Drop for PooledGenCtx<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            let _ = self.home.idle_tx.try_send(ctx);
        }
    }
}

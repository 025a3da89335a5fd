use strata_world::ChunkCoord;

/// Notifications about world lifecycle, delivered synchronously on the
/// coordinator's thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    ChunkDataCreated(ChunkCoord),
    ChunkDataEvicted(ChunkCoord),
    ChunkRenderCreated(ChunkCoord),
    ChunkRenderEvicted(ChunkCoord),
    ChunkRebuilt(ChunkCoord),
    /// The first generation cycle finished. Fires once per world.
    WorldCreated,
    NewChunksGenerated {
        cycle: u64,
        data_created: usize,
        render_created: usize,
    },
    CycleCancelled {
        cycle: u64,
    },
}

pub type Listener = Box<dyn FnMut(&WorldEvent) + Send>;

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn emit(&mut self, event: WorldEvent) {
        log::trace!(target: "events", "{:?}", event);
        for l in self.listeners.iter_mut() {
            l(&event);
        }
    }
}

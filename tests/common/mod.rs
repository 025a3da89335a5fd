#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hashbrown::{HashMap, HashSet};
use strata::{ChunkCoord, RenderSink, Vec3, WorldConfig, WorldCoordinator, WorldEvent};
use strata_mesh_cpu::{MeshData, WalkableSurface};

pub const SETTLE: Duration = Duration::from_secs(60);

/// Tracks which chunks currently have uploaded geometry.
#[derive(Default, Debug)]
pub struct RecordingSink {
    pub live: HashSet<ChunkCoord>,
    pub uploads: HashMap<ChunkCoord, u32>,
    pub walkable: HashMap<ChunkCoord, usize>,
    pub destroyed: Vec<ChunkCoord>,
    pub orphan_destroys: usize,
}

impl RenderSink for RecordingSink {
    fn upload(&mut self, coord: ChunkCoord, mesh: &MeshData) {
        assert_eq!(coord, mesh.coord);
        assert!(mesh.is_consistent());
        self.live.insert(coord);
        *self.uploads.entry(coord).or_insert(0) += 1;
    }

    fn upload_walkable(&mut self, coord: ChunkCoord, surface: &WalkableSurface) {
        assert!(!surface.is_empty());
        self.walkable.insert(coord, surface.quad_count());
    }

    fn destroy(&mut self, coord: ChunkCoord) {
        if !self.live.remove(&coord) {
            self.orphan_destroys += 1;
        }
        self.destroyed.push(coord);
    }
}

pub fn small_config(seed: i32) -> WorldConfig {
    WorldConfig {
        draw_radius: 1,
        data_radius: 2,
        seed: Some(seed),
        ..WorldConfig::default()
    }
}

pub fn spawn() -> Vec3 {
    Vec3::new(8.0, 64.0, 8.0)
}

pub type EventLog = Arc<Mutex<Vec<WorldEvent>>>;

pub fn world_with_log(cfg: WorldConfig) -> (WorldCoordinator<RecordingSink>, EventLog) {
    let mut world = WorldCoordinator::new(cfg, RecordingSink::default()).expect("runtime");
    let log = record_events(&mut world);
    (world, log)
}

pub fn record_events(world: &mut WorldCoordinator<RecordingSink>) -> EventLog {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    world.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
    log
}

pub fn count(log: &EventLog, pred: impl Fn(&WorldEvent) -> bool) -> usize {
    log.lock().unwrap().iter().filter(|e| pred(e)).count()
}

/// Maps and sink agree: every render object has data, and the sink holds
/// exactly the render objects.
pub fn assert_consistent(world: &WorldCoordinator<RecordingSink>) {
    for c in world.render_coords() {
        assert!(world.chunks().contains(c), "render {c:?} without data");
    }
    let renders: HashSet<ChunkCoord> = world.render_coords().collect();
    assert_eq!(renders, world.sink().live);
    assert_eq!(world.sink().orphan_destroys, 0);
}

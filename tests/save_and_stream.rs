mod common;

use std::time::{Duration, Instant};

use common::*;
use proptest::prelude::*;
use proptest::test_runner::{Config, TestRunner};
use strata::{
    BlockKind, BlockPos, ChunkCoord, ChunkDims, LoadError, SaveError, StreamingTrigger, Vec3,
    WorldCoordinator, WorldEvent, needed_square,
};
use strata_chunk::ChunkDataError;
use strata_io::{ChunkEntry, load_from_path, save_to_path};
use tempfile::TempDir;

#[test]
fn walking_two_chunks_north_requests_exactly_one_reload() {
    let interval = Duration::from_millis(100);
    let mut trig = StreamingTrigger::new(ChunkDims::default(), interval);
    let t0 = Instant::now();
    trig.reset(Vec3::new(8.0, 0.0, 8.0), t0);

    // One poll per 10 ms frame while walking 8 -> 40 over 320 frames.
    let mut requests = Vec::new();
    for frame in 1..=400u32 {
        let z = (8.0 + frame as f32 * 0.1).min(40.0);
        let now = t0 + Duration::from_millis(u64::from(frame) * 10);
        if let Some(req) = trig.poll(Vec3::new(8.0, 0.0, z), now) {
            requests.push(req);
        }
    }
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].chunk.cx, 0);
    assert!(requests[0].observer.z > 24.0);
}

#[test]
fn jump_to_far_position_fires_once_then_settles() {
    let interval = Duration::from_secs(1);
    let mut trig = StreamingTrigger::new(ChunkDims::default(), interval);
    let t0 = Instant::now();
    trig.reset(Vec3::new(8.0, 0.0, 8.0), t0);
    let there = Vec3::new(8.0, 0.0, 40.0);
    let hits = (1..=10u64)
        .filter_map(|s| trig.poll(there, t0 + Duration::from_secs(s)))
        .count();
    assert_eq!(hits, 1);
}

#[test]
fn save_then_load_restores_edits_without_regenerating_terrain() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("world.json");
    let cfg = small_config(8080);

    let (mut world, _log) = world_with_log(cfg.clone());
    world.generate(spawn());
    assert!(world.run_until_ready(SETTLE));
    let edited = BlockPos::new(3, 7, 3);
    world.set_block(edited, BlockKind::Water);
    let reference: Vec<(BlockPos, BlockKind)> = (0..16)
        .flat_map(|x| (0..100).map(move |y| BlockPos::new(x, y, 9)))
        .map(|p| (p, world.block_at(p)))
        .collect();
    save_to_path(&world.save_data(spawn()), &path).expect("save");
    world.dispose();

    let save = load_from_path(&path).expect("load");
    assert_eq!(save.world_seed, 8080);
    assert_eq!(save.chunks.len(), 25);
    let mut restored =
        WorldCoordinator::from_save(cfg, &save, RecordingSink::default()).expect("restore");
    let log = record_events(&mut restored);
    assert_eq!(restored.seed().seed, 8080);
    assert_eq!(restored.block_at(edited), BlockKind::Water);
    assert!(restored
        .chunks()
        .get(restored.chunk_coord_of(Vec3::new(3.0, 7.0, 3.0)))
        .is_some_and(|c| c.modified_by_player));
    for (p, k) in &reference {
        assert_eq!(restored.block_at(*p), *k);
    }

    let plan = restored.regenerate_from_save(spawn());
    assert!(plan.data_to_create.is_empty());
    assert_eq!(plan.render_to_create.len(), 9);
    assert!(restored.run_until_ready(SETTLE));
    assert_eq!(count(&log, |e| matches!(e, WorldEvent::ChunkDataCreated(_))), 0);
    assert_eq!(count(&log, |e| *e == WorldEvent::WorldCreated), 1);
    assert_eq!(restored.render_count(), 9);
    assert_consistent(&restored);
}

#[test]
fn carved_leaves_stay_carved_across_save_and_load() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("world.json");
    let mut cfg = small_config(5150);
    cfg.trees.density = 0.08;
    cfg.biomes.enable = false;

    let (mut world, _log) = world_with_log(cfg.clone());
    world.generate(spawn());
    assert!(world.run_until_ready(SETTLE));
    let leaves_in_view = |w: &WorldCoordinator<RecordingSink>| -> Vec<BlockPos> {
        let mut out = Vec::new();
        for c in needed_square(ChunkCoord::new(0, 0, 0), 1) {
            let chunk = w.chunks().get(c).expect("loaded");
            let o = chunk.origin;
            for y in 0..chunk.dims.height {
                for z in 0..chunk.dims.size {
                    for x in 0..chunk.dims.size {
                        if chunk.get_local(x, y, z) == Some(BlockKind::TreeLeavesSolid) {
                            out.push(BlockPos::new(o.x + x, o.y + y, o.z + z));
                        }
                    }
                }
            }
        }
        out
    };
    let carved = leaves_in_view(&world);
    assert!(!carved.is_empty());
    for p in &carved {
        world.set_block(*p, BlockKind::Air);
    }
    let save = world.save_data(spawn());
    assert!(save.chunks.iter().any(|e| !e.leaves_applied_to.is_empty()));
    save_to_path(&save, &path).expect("save");
    world.dispose();

    let save = load_from_path(&path).expect("load");
    let mut restored =
        WorldCoordinator::from_save(cfg, &save, RecordingSink::default()).expect("restore");
    restored.regenerate_from_save(spawn());
    assert!(restored.run_until_ready(SETTLE));
    assert!(leaves_in_view(&restored).is_empty());
    for p in &carved {
        assert_eq!(restored.block_at(*p), BlockKind::Air);
    }
    assert_consistent(&restored);
}

#[test]
fn wrong_length_chunk_fails_the_whole_load() {
    let cfg = small_config(1);
    let dims = cfg.dims();
    let mut save = strata_io::SaveData::capture([0.0; 3], 1, dims, std::iter::empty());
    save.chunks.push(ChunkEntry {
        position: [0, 0, 0],
        blocks: vec![BlockKind::Stone.id(); dims.volume()],
        modified_by_player: false,
        ..ChunkEntry::default()
    });
    save.chunks.push(ChunkEntry {
        position: [16, 0, 0],
        blocks: vec![BlockKind::Stone.id(); dims.volume() - 1],
        modified_by_player: false,
        ..ChunkEntry::default()
    });
    match WorldCoordinator::from_save(cfg.clone(), &save, RecordingSink::default()) {
        Err(LoadError::Save(SaveError::Chunk {
            x: 16,
            source: ChunkDataError::WrongLength { .. },
            ..
        })) => {}
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("corrupt save accepted"),
    }

    save.chunks.pop();
    save.chunks.push(save.chunks[0].clone());
    assert!(matches!(
        WorldCoordinator::from_save(cfg, &save, RecordingSink::default()),
        Err(LoadError::DuplicateChunk { x: 0, y: 0, z: 0 })
    ));
}

#[test]
fn block_lookup_is_total() {
    let (mut world, _log) = world_with_log(small_config(606));
    world.generate(spawn());
    assert!(world.run_until_ready(SETTLE));

    let mut runner = TestRunner::new(Config::with_cases(512));
    runner
        .run(
            &(-200i32..200, -300i32..300, -200i32..200),
            |(x, y, z)| {
                let p = BlockPos::new(x, y, z);
                let k = world.block_at(p);
                prop_assert!(BlockKind::ALL.contains(&k));
                if !world.chunks().contains(world.config().dims().chunk_of(p)) {
                    prop_assert_eq!(k, BlockKind::Nothing);
                }
                Ok(())
            },
        )
        .expect("lookup never fails");
    assert_eq!(world.block_at(BlockPos::new(i32::MAX, i32::MIN, i32::MAX)), BlockKind::Nothing);
}

use std::time::{Duration, Instant};

use strata_geom::Vec3;
use strata_world::{ChunkCoord, ChunkDims};

/// The observer drifted far enough from its anchor that the world should be re-planned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamRequest {
    pub observer: Vec3,
    pub chunk: ChunkCoord,
}

/// Fixed-interval displacement check with hysteresis around the anchor cell.
#[derive(Clone, Debug)]
pub struct StreamingTrigger {
    dims: ChunkDims,
    interval: Duration,
    center: Vec3,
    anchor_y: f32,
    next_check: Option<Instant>,
}

impl StreamingTrigger {
    pub fn new(dims: ChunkDims, interval: Duration) -> Self {
        Self {
            dims,
            interval,
            center: Vec3::ZERO,
            anchor_y: 0.0,
            next_check: None,
        }
    }

    /// Anchors to the chunk containing `observer`; the first check runs one interval later.
    pub fn reset(&mut self, observer: Vec3, now: Instant) {
        let c = self.dims.chunk_of_point([observer.x, observer.y, observer.z]);
        let origin = self.dims.origin(c);
        let half = self.dims.size as f32 * 0.5;
        self.center = Vec3::new(origin.x as f32 + half, observer.y, origin.z as f32 + half);
        self.anchor_y = observer.y;
        self.next_check = Some(now + self.interval);
    }

    pub fn is_armed(&self) -> bool {
        self.next_check.is_some()
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Returns a request at most once per interval, and only when the observer
    /// left the anchor cell by more than a chunk.
    pub fn poll(&mut self, observer: Vec3, now: Instant) -> Option<StreamRequest> {
        let due = self.next_check?;
        if now < due {
            return None;
        }
        self.next_check = Some(now + self.interval);
        let size = self.dims.size as f32;
        let height = self.dims.height as f32;
        let moved = (self.center.x - observer.x).abs() > size
            || (self.center.z - observer.z).abs() > size
            || (self.anchor_y - observer.y).abs() > height;
        if !moved {
            return None;
        }
        let chunk = self.dims.chunk_of_point([observer.x, observer.y, observer.z]);
        log::info!(
            target: "stream",
            "observer at ({:.1},{:.1},{:.1}) left anchor ({:.1},{:.1}); reloading around {:?}",
            observer.x,
            observer.y,
            observer.z,
            self.center.x,
            self.center.z,
            chunk
        );
        self.reset(observer, now);
        Some(StreamRequest { observer, chunk })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_until_armed_and_between_checks() {
        let t0 = Instant::now();
        let mut trig = StreamingTrigger::new(ChunkDims::default(), Duration::from_secs(1));
        let far = Vec3::new(500.0, 0.0, 500.0);
        assert_eq!(trig.poll(far, t0), None);
        trig.reset(Vec3::new(8.0, 0.0, 8.0), t0);
        assert_eq!(trig.poll(far, t0 + Duration::from_millis(999)), None);
        assert!(trig.poll(far, t0 + Duration::from_secs(1)).is_some());
    }

    #[test]
    fn vertical_drift_beyond_height_fires() {
        let t0 = Instant::now();
        let mut trig = StreamingTrigger::new(ChunkDims::new(16, 10), Duration::from_millis(10));
        trig.reset(Vec3::new(8.0, 5.0, 8.0), t0);
        let t1 = t0 + Duration::from_millis(10);
        assert_eq!(trig.poll(Vec3::new(8.0, 15.0, 8.0), t1), None);
        let t2 = t1 + Duration::from_millis(10);
        assert!(trig.poll(Vec3::new(8.0, 15.5, 8.0), t2).is_some());
    }
}

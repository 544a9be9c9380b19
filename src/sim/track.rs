//! Procedural obstacle generation
//!
//! Two flavours: a forward-scrolling tunnel of gap segments (canyon run)
//! and countdown-driven spawn events (asteroid dodge). Both draw from a
//! seeded [`GameRng`] and ramp difficulty monotonically.

use serde::{Deserialize, Serialize};

use super::rng::GameRng;
use crate::tuning::TrackTuning;

/// One slice of scrolling terrain with a vertical safe gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: u32,
    /// Left edge in percent of field width; decreases as the world scrolls
    pub x: f32,
    /// Vertical center of the gap
    pub center: f32,
    /// Gap height
    pub gap: f32,
    /// Flipped exactly once, when the segment's right edge is behind the ship
    pub passed: bool,
}

impl Segment {
    pub fn right_edge(&self, width: f32) -> f32 {
        self.x + width
    }

    /// Top of the open gap
    pub fn gap_top(&self) -> f32 {
        self.center - self.gap / 2.0
    }

    /// Bottom of the open gap
    pub fn gap_bottom(&self) -> f32 {
        self.center + self.gap / 2.0
    }
}

/// World-speed multiplier for a travelled distance
///
/// Monotonic in `distance` and saturating at `1 + ramp_cap`.
pub fn speed_scale(distance: f32, tuning: &TrackTuning) -> f32 {
    1.0 + (distance.max(0.0) / tuning.ramp_distance).min(tuning.ramp_cap)
}

/// Maintains the lookahead buffer of tunnel segments
#[derive(Debug, Clone)]
pub struct TrackGenerator {
    tuning: TrackTuning,
    segments: Vec<Segment>,
}

impl TrackGenerator {
    pub fn new(tuning: TrackTuning) -> Self {
        Self {
            tuning,
            segments: Vec::new(),
        }
    }

    pub fn tuning(&self) -> &TrackTuning {
        &self.tuning
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    /// Throw away the current track and lay down the opening batch
    ///
    /// The first `safe_start_segments` are wide and barely wander so the
    /// opening is always flyable.
    pub fn build_initial(&mut self, rng: &mut GameRng) {
        let t = &self.tuning;
        self.segments.clear();
        let mut prev_center = 50.0;
        for i in 0..t.initial_segments {
            let safe_start = i < t.safe_start_segments;
            let gap = if safe_start {
                rng.range(t.safe_min_gap, t.safe_max_gap)
            } else {
                rng.range(t.min_gap, t.max_gap)
            };
            let max_delta = if safe_start {
                t.safe_start_delta
            } else {
                t.initial_delta
            };
            let center = (prev_center + rng.range(-max_delta, max_delta))
                .clamp(t.safe_center_min, t.safe_center_max);
            self.segments.push(Segment {
                index: i,
                x: i as f32 * t.segment_width,
                center,
                gap,
                passed: false,
            });
            prev_center = center;
        }
        log::debug!("Built {} initial segments", self.segments.len());
    }

    /// Scroll every segment left by `world_speed * dt`, drop the ones fully
    /// off-screen and top the buffer back up.
    pub fn advance(&mut self, world_speed: f32, dt: f32, distance: f32, rng: &mut GameRng) {
        let shift = world_speed * dt;
        for segment in &mut self.segments {
            segment.x -= shift;
        }
        let width = self.tuning.segment_width;
        self.segments.retain(|s| s.x > -width);
        self.extend(distance, rng);
    }

    /// Append segments until the lookahead buffer is full
    pub fn extend(&mut self, distance: f32, rng: &mut GameRng) {
        while self.segments.len() < self.tuning.min_buffer() {
            let segment = self.next_segment(distance, rng);
            self.segments.push(segment);
        }
    }

    fn next_segment(&self, distance: f32, rng: &mut GameRng) -> Segment {
        let t = &self.tuning;
        let last = self.segments.last();
        let prev_center = last.map_or(50.0, |s| s.center);
        let early_game = distance < t.early_game_distance;
        let gap = if early_game {
            rng.range(t.safe_min_gap, t.safe_max_gap)
        } else {
            rng.range(t.min_gap, t.max_gap)
        };
        let max_delta = lateral_delta(distance, t);
        let center = (prev_center + rng.range(-max_delta, max_delta)).clamp(t.center_min, t.center_max);
        Segment {
            index: last.map_or(0, |s| s.index + 1),
            x: last.map_or(0.0, |s| s.x + t.segment_width),
            center,
            gap,
            passed: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_segments(&mut self, segments: Vec<Segment>) {
        self.segments = segments;
    }
}

/// Largest lateral wander allowed between consecutive segments
pub fn lateral_delta(distance: f32, tuning: &TrackTuning) -> f32 {
    if distance < tuning.early_game_distance {
        tuning.early_delta
    } else {
        tuning.late_delta_base + (distance / tuning.late_delta_distance).min(tuning.late_delta_cap)
    }
}

/// Countdown that fires spawn events, reseeded from `base_rate / difficulty`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnTimer {
    pub base_rate: f32,
    remaining: f32,
}

impl SpawnTimer {
    /// Timer that fires on the first tick
    pub fn new(base_rate: f32) -> Self {
        Self {
            base_rate,
            remaining: 0.0,
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Count down by `dt`. Returns true when a spawn is due, after which the
    /// countdown restarts at `base_rate / difficulty`.
    pub fn tick(&mut self, dt: f32, difficulty: f32) -> bool {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = self.base_rate / difficulty.max(f32::EPSILON);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> (TrackGenerator, GameRng) {
        let mut track = TrackGenerator::new(TrackTuning::default());
        let mut rng = GameRng::new(2024);
        track.build_initial(&mut rng);
        (track, rng)
    }

    #[test]
    fn initial_batch_is_safe() {
        let (track, _) = generator();
        let t = TrackTuning::default();
        assert_eq!(track.segments().len(), t.initial_segments as usize);
        for s in &track.segments()[..t.safe_start_segments as usize] {
            assert!(s.gap >= t.safe_min_gap && s.gap <= t.safe_max_gap);
            assert!(s.center >= t.safe_center_min && s.center <= t.safe_center_max);
        }
    }

    #[test]
    fn initial_batch_uses_its_own_delta() {
        let t = TrackTuning::default();
        let (track, _) = generator();
        for pair in track.segments()[t.safe_start_segments as usize - 1..].windows(2) {
            assert!((pair[1].center - pair[0].center).abs() <= t.initial_delta + 1e-4);
        }

        // Zero delta freezes the centers after the safe start
        let flat = TrackTuning {
            initial_delta: 0.0,
            ..TrackTuning::default()
        };
        let mut track = TrackGenerator::new(flat);
        track.build_initial(&mut GameRng::new(7));
        let tail = &track.segments()[t.safe_start_segments as usize - 1..];
        assert!(tail.iter().all(|s| s.center == tail[0].center));
    }

    #[test]
    fn advancing_keeps_buffer_and_order() {
        let (mut track, mut rng) = generator();
        let mut distance = 0.0;
        for _ in 0..5_000 {
            distance += 14.0 * 0.05;
            track.advance(14.0, 0.05, distance, &mut rng);
            let segs = track.segments();
            assert!(segs.len() >= TrackTuning::default().min_buffer());
            for pair in segs.windows(2) {
                assert_eq!(pair[1].index, pair[0].index + 1);
                assert!(pair[1].x > pair[0].x);
            }
            for s in segs {
                assert!(s.center >= 16.0 && s.center <= 84.0);
                assert!(s.x > -22.0);
            }
        }
    }

    #[test]
    fn speed_ramp_is_monotonic_and_saturates() {
        let t = TrackTuning::default();
        assert_eq!(speed_scale(0.0, &t), 1.0);
        assert!(speed_scale(1_000.0, &t) > speed_scale(500.0, &t));
        assert!((speed_scale(1.0e9, &t) - 1.9).abs() < 1e-5);
    }

    #[test]
    fn lateral_delta_grows_after_early_game() {
        let t = TrackTuning::default();
        assert_eq!(lateral_delta(100.0, &t), 5.0);
        assert!(lateral_delta(1_000.0, &t) > lateral_delta(400.0, &t));
        assert_eq!(lateral_delta(1.0e9, &t), 18.0);
    }

    #[test]
    fn spawn_timer_fires_faster_with_difficulty() {
        let mut timer = SpawnTimer::new(1.5);
        assert!(timer.tick(0.0, 1.0));
        assert!((timer.remaining() - 1.5).abs() < 1e-6);

        let mut fired = 0;
        for _ in 0..100 {
            if timer.tick(0.05, 3.0) {
                fired += 1;
            }
        }
        // 5 seconds at 0.5s per spawn once the first 1.5s countdown runs out
        assert!(fired >= 7 && fired <= 8, "fired {fired}");
    }
}

//! Simulation clock
//!
//! Turns host frame timestamps into bounded simulation steps. Every `dt`
//! handed to a game is at most `dt_cap`, no matter how long the tab was
//! suspended between two frames.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_DT_CAP, MAX_SUBSTEPS};

/// How raw frame time is split into simulation steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepMode {
    /// One step per frame, `dt = min(raw, dt_cap)`
    Variable,
    /// Accumulate raw time and emit whole `fixed_dt` slices
    Fixed { fixed_dt: f32 },
}

/// Steps produced for a single host frame
///
/// Iterates `count` times, yielding the same `dt` each time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSteps {
    pub dt: f32,
    pub count: u32,
}

impl FrameSteps {
    /// Total simulated time covered by this frame
    pub fn total(&self) -> f32 {
        self.dt * self.count as f32
    }
}

impl Iterator for FrameSteps {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.count == 0 {
            return None;
        }
        self.count -= 1;
        Some(self.dt)
    }
}

/// Bounded-delta clock driven by host timestamps (milliseconds)
#[derive(Debug, Clone)]
pub struct SimClock {
    mode: StepMode,
    dt_cap: f32,
    max_substeps: u32,
    last_ms: Option<f64>,
    accumulator: f32,
    /// Simulated seconds handed out since the last reset
    pub elapsed: f32,
    /// Frames seen since the last reset
    pub frames: u64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::variable(DEFAULT_DT_CAP)
    }
}

impl SimClock {
    /// Variable-step clock capped at `dt_cap` seconds
    pub fn variable(dt_cap: f32) -> Self {
        Self {
            mode: StepMode::Variable,
            dt_cap: sanitize_cap(dt_cap),
            max_substeps: 1,
            last_ms: None,
            accumulator: 0.0,
            elapsed: 0.0,
            frames: 0,
        }
    }

    /// Fixed-step clock. The fixed step never exceeds `dt_cap`.
    pub fn fixed(fixed_dt: f32, dt_cap: f32) -> Self {
        let dt_cap = sanitize_cap(dt_cap);
        let fixed_dt = if fixed_dt.is_finite() && fixed_dt > 0.0 {
            fixed_dt.min(dt_cap)
        } else {
            dt_cap
        };
        Self {
            mode: StepMode::Fixed { fixed_dt },
            dt_cap,
            max_substeps: MAX_SUBSTEPS,
            last_ms: None,
            accumulator: 0.0,
            elapsed: 0.0,
            frames: 0,
        }
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    pub fn dt_cap(&self) -> f32 {
        self.dt_cap
    }

    /// Forget the previous timestamp (session start / restart)
    pub fn reset(&mut self) {
        self.last_ms = None;
        self.accumulator = 0.0;
        self.elapsed = 0.0;
        self.frames = 0;
    }

    /// Consume a host timestamp and return the steps to run for it
    pub fn frame(&mut self, now_ms: f64) -> FrameSteps {
        self.frames += 1;
        let raw = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            // First frame after reset: nothing integrates before the first render
            None => 0.0,
        };
        if now_ms.is_finite() {
            self.last_ms = Some(now_ms);
        }
        let raw = if raw.is_finite() && raw > 0.0 { raw } else { 0.0 };

        let steps = match self.mode {
            StepMode::Variable => FrameSteps {
                dt: raw.min(self.dt_cap),
                count: 1,
            },
            StepMode::Fixed { fixed_dt } => {
                // Spiral-of-death cap: drop time we could never catch up on
                let budget = self.dt_cap * self.max_substeps as f32;
                self.accumulator = (self.accumulator + raw).min(budget);
                let mut count = 0;
                while self.accumulator >= fixed_dt && count < self.max_substeps {
                    self.accumulator -= fixed_dt;
                    count += 1;
                }
                FrameSteps {
                    dt: fixed_dt,
                    count,
                }
            }
        };

        if raw > self.dt_cap * self.max_substeps as f32 {
            log::debug!(
                "Frame gap of {:.1}ms clamped to {:.1}ms",
                raw * 1000.0,
                steps.total() * 1000.0
            );
        }
        self.elapsed += steps.total();
        steps
    }
}

fn sanitize_cap(dt_cap: f32) -> f32 {
    if dt_cap.is_finite() && dt_cap > 0.0 {
        dt_cap
    } else {
        DEFAULT_DT_CAP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_is_zero_length() {
        let mut clock = SimClock::variable(0.05);
        let steps = clock.frame(1_000.0);
        assert_eq!(steps.count, 1);
        assert_eq!(steps.dt, 0.0);
    }

    #[test]
    fn variable_step_caps_long_gaps() {
        let mut clock = SimClock::variable(0.05);
        clock.frame(0.0);
        let steps = clock.frame(16.0);
        assert!((steps.dt - 0.016).abs() < 1e-6);

        // Tab was suspended for a minute
        let steps = clock.frame(60_016.0);
        assert_eq!(steps.dt, 0.05);
        assert_eq!(steps.count, 1);
    }

    #[test]
    fn backwards_or_nan_time_is_a_zero_step() {
        let mut clock = SimClock::variable(0.05);
        clock.frame(500.0);
        assert_eq!(clock.frame(400.0).dt, 0.0);
        assert_eq!(clock.frame(f64::NAN).dt, 0.0);
        // A NaN timestamp must not poison the next delta
        let steps = clock.frame(420.0);
        assert!((steps.dt - 0.02).abs() < 1e-6);
    }

    #[test]
    fn fixed_step_accumulates_and_limits_substeps() {
        let mut clock = SimClock::fixed(1.0 / 120.0, 0.05);
        clock.frame(0.0);
        let steps = clock.frame(30.0);
        assert_eq!(steps.count, 3);
        assert!(steps.dt <= 0.05);

        let steps = clock.frame(10_000.0);
        assert!(steps.count <= MAX_SUBSTEPS);
        assert!(steps.total() <= 0.05 * MAX_SUBSTEPS as f32 + 1e-4);
    }

    #[test]
    fn fixed_step_never_exceeds_cap() {
        let clock = SimClock::fixed(0.5, 0.05);
        assert_eq!(clock.mode(), StepMode::Fixed { fixed_dt: 0.05 });
    }

    #[test]
    fn reset_forgets_last_timestamp() {
        let mut clock = SimClock::variable(0.05);
        clock.frame(0.0);
        clock.frame(30.0);
        clock.reset();
        assert_eq!(clock.frame(5_000.0).dt, 0.0);
        assert_eq!(clock.elapsed, 0.0);
    }
}

//! Data-driven game balance
//!
//! Every feel-tuned number lives here as a named value with a default.
//! Hosts may override them from JSON. Only the difficulty-ramp and
//! safe-bounds relationships checked by `validate` are contractual; the
//! individual magnitudes are not.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// Continuous-control ship physics for the canyon run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipTuning {
    /// Downward acceleration, percent/s²
    pub gravity: f32,
    /// Upward acceleration while thrusting, percent/s²
    pub thrust: f32,
    /// Most negative (upward) vertical speed
    pub max_rise_speed: f32,
    /// Most positive (downward) vertical speed
    pub max_fall_speed: f32,
    pub start_fuel: f32,
    pub fuel_burn_per_sec: f32,
    pub fuel_recover_per_sec: f32,
    /// Fixed horizontal position of the ship
    pub ship_x: f32,
    pub ship_radius: f32,
    pub start_y: f32,
    /// Crossing above this is a crash
    pub ceiling: f32,
    /// Crossing below this is a crash
    pub floor: f32,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            gravity: 30.0,
            thrust: 55.0,
            max_rise_speed: -28.0,
            max_fall_speed: 34.0,
            start_fuel: 100.0,
            fuel_burn_per_sec: 12.0,
            fuel_recover_per_sec: 8.0,
            ship_x: 22.0,
            ship_radius: 2.8,
            start_y: 50.0,
            ceiling: 2.0,
            floor: 98.0,
        }
    }
}

/// Procedural tunnel generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackTuning {
    /// World scroll speed at difficulty 1, percent/s
    pub horizontal_speed: f32,
    pub segment_width: f32,
    pub initial_segments: u32,
    /// Lookahead kept beyond the visible field
    pub spawn_ahead: u32,
    pub safe_start_segments: u32,
    pub safe_min_gap: f32,
    pub safe_max_gap: f32,
    pub min_gap: f32,
    pub max_gap: f32,
    pub safe_start_delta: f32,
    /// Lateral delta for the initial batch past the safe start
    pub initial_delta: f32,
    pub early_delta: f32,
    pub late_delta_base: f32,
    pub late_delta_cap: f32,
    pub late_delta_distance: f32,
    /// Distance below which new segments stay generous
    pub early_game_distance: f32,
    pub safe_center_min: f32,
    pub safe_center_max: f32,
    pub center_min: f32,
    pub center_max: f32,
    /// `speed_scale = 1 + min(ramp_cap, distance / ramp_distance)`
    pub ramp_cap: f32,
    pub ramp_distance: f32,
    /// No collision checks before this distance
    pub grace_distance: f32,
}

impl Default for TrackTuning {
    fn default() -> Self {
        Self {
            horizontal_speed: 14.0,
            segment_width: 22.0,
            initial_segments: 18,
            spawn_ahead: 7,
            safe_start_segments: 10,
            safe_min_gap: 38.0,
            safe_max_gap: 46.0,
            min_gap: 32.0,
            max_gap: 44.0,
            safe_start_delta: 4.0,
            initial_delta: 11.0,
            early_delta: 5.0,
            late_delta_base: 10.0,
            late_delta_cap: 8.0,
            late_delta_distance: 550.0,
            early_game_distance: 380.0,
            safe_center_min: 22.0,
            safe_center_max: 78.0,
            center_min: 16.0,
            center_max: 84.0,
            ramp_cap: 0.9,
            ramp_distance: 2200.0,
            grace_distance: 120.0,
        }
    }
}

impl TrackTuning {
    /// Segments the generator keeps alive at all times
    pub fn min_buffer(&self) -> usize {
        (self.spawn_ahead + 8) as usize
    }
}

/// Pass, combo and perfect-chain scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboTuning {
    pub pass_base_score: u64,
    /// Rolling window refreshed by each pass
    pub window_sec: f32,
    /// Passes per multiplier tier
    pub passes_per_tier: u32,
    pub max_tiers: u32,
    pub tier_bonus: f32,
    /// Fraction of gap width that still counts as centered
    pub perfect_window: f32,
    pub perfect_base_score: u64,
    pub perfect_window_extend: f32,
    pub max_window_sec: f32,
    /// Required clearance from the gap edges
    pub gap_margin: f32,
}

impl Default for ComboTuning {
    fn default() -> Self {
        Self {
            pass_base_score: 10,
            window_sec: 2.6,
            passes_per_tier: 3,
            max_tiers: 3,
            tier_bonus: 0.5,
            perfect_window: 0.14,
            perfect_base_score: 12,
            perfect_window_extend: 0.35,
            max_window_sec: 4.2,
            gap_margin: 0.9,
        }
    }
}

/// Credits awarded at the end of every session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTuning {
    pub credit_rate: f32,
    pub min_credits: u64,
    /// Final-score thresholds for the top three grades, best first
    pub grade_thresholds: [u64; 3],
}

impl Default for RewardTuning {
    fn default() -> Self {
        Self {
            credit_rate: 0.35,
            min_credits: 5,
            grade_thresholds: [600, 300, 120],
        }
    }
}

impl RewardTuning {
    fn validate(&self) -> Result<(), TuningError> {
        if !(self.credit_rate >= 0.0 && self.credit_rate.is_finite()) {
            return Err(TuningError::invalid("reward.credit_rate", "must be a finite value >= 0"));
        }
        let [a, b, c] = self.grade_thresholds;
        if !(a >= b && b >= c) {
            return Err(TuningError::invalid("reward.grade_thresholds", "must be descending"));
        }
        Ok(())
    }

    pub fn credits_for(&self, score: u64) -> u64 {
        let earned = (score as f64 * self.credit_rate as f64).round() as u64;
        earned.max(self.min_credits)
    }
}

/// Canyon run: everything the run game reads
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunTuning {
    pub ship: ShipTuning,
    pub track: TrackTuning,
    pub combo: ComboTuning,
    pub reward: RewardTuning,
}

impl RunTuning {
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check the relationships the generator and physics rely on
    pub fn validate(&self) -> Result<(), TuningError> {
        let s = &self.ship;
        let t = &self.track;
        let c = &self.combo;
        if !(s.ceiling >= 0.0 && s.ceiling < s.floor && s.floor <= 100.0) {
            return Err(TuningError::invalid(
                "ship.ceiling",
                format!("need 0 <= ceiling < floor <= 100, got {}..{}", s.ceiling, s.floor),
            ));
        }
        if !(s.max_rise_speed < 0.0 && s.max_fall_speed > 0.0) {
            return Err(TuningError::invalid(
                "ship.max_rise_speed",
                "rise speed must be negative and fall speed positive",
            ));
        }
        if s.fuel_burn_per_sec < 0.0 || s.fuel_recover_per_sec < 0.0 {
            return Err(TuningError::invalid("ship.fuel_burn_per_sec", "fuel rates must be >= 0"));
        }
        if !(0.0 < t.min_gap && t.min_gap <= t.max_gap && t.max_gap < 100.0) {
            return Err(TuningError::invalid("track.min_gap", "need 0 < min_gap <= max_gap < 100"));
        }
        if !(t.safe_min_gap <= t.safe_max_gap && t.safe_min_gap >= t.min_gap) {
            return Err(TuningError::invalid(
                "track.safe_min_gap",
                "safe-start gaps must be at least as wide as regular gaps",
            ));
        }
        if t.min_gap <= 2.0 * c.gap_margin {
            return Err(TuningError::invalid("combo.gap_margin", "margin swallows the whole gap"));
        }
        // The safe band of a segment centred at either bound must stay inside the field
        let half = t.min_gap / 2.0 - c.gap_margin;
        if !(t.center_min < t.center_max)
            || t.center_min + half <= s.ceiling
            || t.center_max - half >= s.floor
        {
            return Err(TuningError::invalid(
                "track.center_min",
                "segment centers allow gaps that cannot be reached",
            ));
        }
        if !(t.center_min <= t.safe_center_min && t.safe_center_max <= t.center_max) {
            return Err(TuningError::invalid(
                "track.safe_center_min",
                "safe-start centers must sit inside the regular bounds",
            ));
        }
        if !(t.segment_width > 0.0 && t.ramp_distance > 0.0 && t.ramp_cap >= 0.0) {
            return Err(TuningError::invalid("track.ramp_distance", "ramp must be monotonic"));
        }
        if t.initial_segments as usize <= t.min_buffer() {
            return Err(TuningError::invalid(
                "track.initial_segments",
                "initial batch must exceed the lookahead buffer",
            ));
        }
        self.reward.validate()
    }
}

/// Asteroid dodge: falling objects, lanes and lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DodgeTuning {
    pub player_width: f32,
    pub move_step: f32,
    pub start_x: f32,
    pub start_lives: u8,
    pub max_lives: u8,
    /// Seconds between asteroids at difficulty 1
    pub asteroid_spawn_rate: f32,
    pub collectible_spawn_rate: f32,
    /// Fall speed at difficulty 1, percent/s
    pub fall_speed: f32,
    pub difficulty_interval: f32,
    pub difficulty_step: f32,
    pub hit_band_top: f32,
    pub hit_band_bottom: f32,
    pub spawn_y: f32,
    pub despawn_y: f32,
    pub spawn_x_min: f32,
    pub spawn_x_max: f32,
    pub asteroid_min_size: f32,
    pub asteroid_max_size: f32,
    pub collectible_size: f32,
    pub fuel_bonus: u64,
    pub reward: RewardTuning,
}

impl Default for DodgeTuning {
    fn default() -> Self {
        Self {
            player_width: 8.0,
            move_step: 15.0,
            start_x: 50.0,
            start_lives: 3,
            max_lives: 3,
            asteroid_spawn_rate: 1.5,
            collectible_spawn_rate: 4.0,
            fall_speed: 150.0,
            difficulty_interval: 10.0,
            difficulty_step: 0.3,
            hit_band_top: 85.0,
            hit_band_bottom: 95.0,
            spawn_y: -5.0,
            despawn_y: 110.0,
            spawn_x_min: 5.0,
            spawn_x_max: 95.0,
            asteroid_min_size: 40.0,
            asteroid_max_size: 70.0,
            collectible_size: 35.0,
            fuel_bonus: 10,
            reward: RewardTuning {
                grade_thresholds: [150, 80, 30],
                ..RewardTuning::default()
            },
        }
    }
}

impl DodgeTuning {
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.player_width > 0.0 && self.player_width < 100.0) {
            return Err(TuningError::invalid("player_width", "must be within (0, 100)"));
        }
        if self.start_lives == 0 || self.start_lives > self.max_lives {
            return Err(TuningError::invalid("start_lives", "need 1 <= start_lives <= max_lives"));
        }
        if self.asteroid_spawn_rate <= 0.0 || self.collectible_spawn_rate <= 0.0 {
            return Err(TuningError::invalid("asteroid_spawn_rate", "spawn rates must be > 0"));
        }
        if self.difficulty_interval <= 0.0 || self.difficulty_step < 0.0 {
            return Err(TuningError::invalid(
                "difficulty_step",
                "difficulty must ramp monotonically",
            ));
        }
        if !(self.hit_band_top < self.hit_band_bottom && self.hit_band_bottom < self.despawn_y) {
            return Err(TuningError::invalid("hit_band_top", "hit band must sit above despawn line"));
        }
        self.reward.validate()
    }
}

/// Resource collector: click targets against a countdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorTuning {
    pub duration: f32,
    pub max_on_field: usize,
    pub resource_life: f32,
    pub combo_reset_sec: f32,
    pub max_combo: u32,
    pub respawn_delay: f32,
    pub pass_threshold: u64,
    pub spawn_x_min: f32,
    pub spawn_x_max: f32,
    pub spawn_y_min: f32,
    pub spawn_y_max: f32,
    pub reward: RewardTuning,
}

impl Default for CollectorTuning {
    fn default() -> Self {
        Self {
            duration: 30.0,
            max_on_field: 3,
            resource_life: 5.0,
            combo_reset_sec: 2.0,
            max_combo: 5,
            respawn_delay: 0.3,
            pass_threshold: 150,
            spawn_x_min: 10.0,
            spawn_x_max: 90.0,
            spawn_y_min: 10.0,
            spawn_y_max: 80.0,
            reward: RewardTuning {
                grade_thresholds: [300, 200, 150],
                ..RewardTuning::default()
            },
        }
    }
}

impl CollectorTuning {
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.duration <= 0.0 {
            return Err(TuningError::invalid("duration", "must be > 0"));
        }
        if self.max_combo == 0 {
            return Err(TuningError::invalid("max_combo", "must be >= 1"));
        }
        if self.max_on_field == 0 {
            return Err(TuningError::invalid("max_on_field", "must be >= 1"));
        }
        self.reward.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        RunTuning::default().validate().unwrap();
        DodgeTuning::default().validate().unwrap();
        CollectorTuning::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let tuning = RunTuning::from_json(r#"{ "ship": { "gravity": 40.0 } }"#).unwrap();
        assert_eq!(tuning.ship.gravity, 40.0);
        assert_eq!(tuning.ship.thrust, 55.0);
        assert_eq!(tuning.track, TrackTuning::default());
    }

    #[test]
    fn unreachable_centers_are_rejected() {
        let json = r#"{ "track": { "center_min": -20.0 } }"#;
        let err = RunTuning::from_json(json).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "track.center_min", .. }));
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        assert!(matches!(DodgeTuning::from_json("{"), Err(TuningError::Parse(_))));
    }

    #[test]
    fn credits_have_a_floor() {
        let reward = RewardTuning::default();
        assert_eq!(reward.credits_for(0), 5);
        assert_eq!(reward.credits_for(100), 35);
        assert_eq!(reward.credits_for(101), 35);
    }
}

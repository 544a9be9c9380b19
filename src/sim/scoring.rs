//! Collision tests and score bookkeeping
//!
//! Every mutation here is a pure function of the current counters plus the
//! single pass/hit/pickup being resolved. No randomness.

use serde::{Deserialize, Serialize};

use super::track::Segment;
use crate::tuning::ComboTuning;

/// Rolling-window pass combo
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComboTracker {
    pub combo: u32,
    /// Seconds left before the combo lapses
    pub timer: f32,
    /// Best combo reached this session
    pub max_combo: u32,
}

impl ComboTracker {
    /// Run the window down; the combo drops to zero once it is empty
    pub fn decay(&mut self, dt: f32) {
        self.timer = (self.timer - dt).max(0.0);
        if self.timer == 0.0 {
            self.combo = 0;
        }
    }

    /// Count a pass and return the points it earns
    pub fn register_pass(&mut self, tuning: &ComboTuning) -> u64 {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.timer = tuning.window_sec;
        let mult = combo_multiplier(self.combo, tuning);
        (tuning.pass_base_score as f32 * mult).round() as u64
    }

    /// Stretch the window, never past `cap`
    pub fn extend(&mut self, secs: f32, cap: f32) {
        self.timer = (self.timer + secs).min(cap);
    }
}

/// `1 + min(max_tiers, floor(combo / passes_per_tier)) * tier_bonus`
pub fn combo_multiplier(combo: u32, tuning: &ComboTuning) -> f32 {
    let tiers = (combo / tuning.passes_per_tier.max(1)).min(tuning.max_tiers);
    1.0 + tiers as f32 * tuning.tier_bonus
}

/// Tier of the perfect-pass chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChainTier {
    X1,
    X2,
    X3,
    Mega,
}

impl ChainTier {
    /// `[0,2) x1`, `[2,4) x2`, `[4,6) x3`, `[6,∞) MEGA`
    pub fn for_chain(chain: u32) -> Self {
        match chain {
            0..=1 => ChainTier::X1,
            2..=3 => ChainTier::X2,
            4..=5 => ChainTier::X3,
            _ => ChainTier::Mega,
        }
    }

    pub fn multiplier(self) -> u64 {
        match self {
            ChainTier::X1 => 1,
            ChainTier::X2 => 2,
            ChainTier::X3 => 3,
            ChainTier::Mega => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChainTier::X1 => "x1",
            ChainTier::X2 => "x2",
            ChainTier::X3 => "x3",
            ChainTier::Mega => "MEGA",
        }
    }
}

/// Consecutive perfect passes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerfectChain {
    pub chain: u32,
    pub perfect_passes: u32,
    pub bonus_total: u64,
}

impl PerfectChain {
    /// Record a pass. Perfect passes grow the chain and return the tier
    /// and bonus; anything else resets the chain.
    pub fn register(&mut self, perfect: bool, tuning: &ComboTuning) -> Option<(ChainTier, u64)> {
        if !perfect {
            self.chain = 0;
            return None;
        }
        self.chain += 1;
        self.perfect_passes += 1;
        let tier = ChainTier::for_chain(self.chain);
        let bonus = tuning.perfect_base_score * tier.multiplier();
        self.bonus_total += bonus;
        Some((tier, bonus))
    }
}

/// Centered within `window * gap`. Zero offset always qualifies.
pub fn is_perfect(offset: f32, gap: f32, window: f32) -> bool {
    offset.abs() <= (gap * window).abs()
}

/// Points awarded for one segment pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassAward {
    pub segment_index: u32,
    pub base: u64,
    pub perfect: Option<(ChainTier, u64)>,
}

impl PassAward {
    pub fn total(&self) -> u64 {
        self.base + self.perfect.map_or(0, |(_, bonus)| bonus)
    }
}

/// Score a pass: combo first, then the perfect chain
///
/// A perfect pass also stretches the combo window. A non-perfect pass
/// resets only the perfect chain.
pub fn score_pass(
    combo: &mut ComboTracker,
    chain: &mut PerfectChain,
    segment: &Segment,
    ship_y: f32,
    tuning: &ComboTuning,
) -> PassAward {
    let base = combo.register_pass(tuning);
    let perfect = is_perfect(ship_y - segment.center, segment.gap, tuning.perfect_window);
    let perfect = chain.register(perfect, tuning);
    if perfect.is_some() {
        combo.extend(tuning.perfect_window_extend, tuning.max_window_sec);
    }
    PassAward {
        segment_index: segment.index,
        base,
        perfect,
    }
}

/// Result of testing the ship against one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandCheck {
    /// Segment is not under the ship
    NotInColumn,
    /// Under the ship and inside the gap
    Clear,
    /// Under the ship and outside the gap
    Hit,
}

/// Open-interval overlap of `(a_min, a_max)` and `(b_min, b_max)`; touching edges do not overlap
pub fn bands_overlap(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> bool {
    a_max > b_min && a_min < b_max
}

/// Axis-aligned banded test of a ship (`x ± radius`, `y`) against a segment
pub fn check_segment(
    ship_x: f32,
    ship_radius: f32,
    ship_y: f32,
    segment: &Segment,
    segment_width: f32,
    margin: f32,
) -> BandCheck {
    let in_column = bands_overlap(
        ship_x - ship_radius,
        ship_x + ship_radius,
        segment.x,
        segment.right_edge(segment_width),
    );
    if !in_column {
        return BandCheck::NotInColumn;
    }
    let safe = ship_y > segment.gap_top() + margin && ship_y < segment.gap_bottom() - margin;
    if safe { BandCheck::Clear } else { BandCheck::Hit }
}

/// Did an object moving from `prev_y` to `y` touch the band `[top, bottom]`?
///
/// Sweeps the whole step so a large `dt` cannot skip over the band.
pub fn swept_band_hit(prev_y: f32, y: f32, top: f32, bottom: f32) -> bool {
    let (lo, hi) = if prev_y <= y { (prev_y, y) } else { (y, prev_y) };
    hi >= top && lo <= bottom
}

/// Collectible effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    /// Flat score bonus
    Fuel,
    /// One extra life, capped
    Shield,
}

/// Apply a one-shot pickup. Returns the score actually added.
pub fn apply_pickup(kind: PickupKind, score: &mut u64, lives: &mut u8, fuel_bonus: u64, max_lives: u8) -> u64 {
    match kind {
        PickupKind::Fuel => {
            *score += fuel_bonus;
            fuel_bonus
        }
        PickupKind::Shield => {
            *lives = lives.saturating_add(1).min(max_lives);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_bands_do_not_overlap() {
        assert!(!bands_overlap(0.0, 10.0, 10.0, 20.0));
        assert!(!bands_overlap(10.0, 20.0, 0.0, 10.0));
        assert!(bands_overlap(0.0, 10.01, 10.0, 20.0));
    }

    fn segment(center: f32, gap: f32) -> Segment {
        Segment {
            index: 0,
            x: 10.0,
            center,
            gap,
            passed: false,
        }
    }

    #[test]
    fn combo_multiplier_steps() {
        let t = ComboTuning::default();
        assert_eq!(combo_multiplier(0, &t), 1.0);
        assert_eq!(combo_multiplier(2, &t), 1.0);
        assert_eq!(combo_multiplier(3, &t), 1.5);
        assert_eq!(combo_multiplier(6, &t), 2.0);
        assert_eq!(combo_multiplier(9, &t), 2.5);
        assert_eq!(combo_multiplier(300, &t), 2.5);
    }

    #[test]
    fn combo_resets_when_window_lapses() {
        let t = ComboTuning::default();
        let mut combo = ComboTracker::default();
        for _ in 0..5 {
            combo.register_pass(&t);
        }
        assert_eq!(combo.combo, 5);
        combo.decay(t.window_sec + 0.01);
        assert_eq!(combo.combo, 0);
        assert_eq!(combo.register_pass(&t), t.pass_base_score);
        assert_eq!(combo.max_combo, 5);
    }

    #[test]
    fn chain_tiers() {
        assert_eq!(ChainTier::for_chain(0), ChainTier::X1);
        assert_eq!(ChainTier::for_chain(1), ChainTier::X1);
        assert_eq!(ChainTier::for_chain(2), ChainTier::X2);
        assert_eq!(ChainTier::for_chain(3), ChainTier::X2);
        assert_eq!(ChainTier::for_chain(4), ChainTier::X3);
        assert_eq!(ChainTier::for_chain(5), ChainTier::X3);
        assert_eq!(ChainTier::for_chain(6), ChainTier::Mega);
        assert_eq!(ChainTier::for_chain(60), ChainTier::Mega);
    }

    #[test]
    fn non_perfect_pass_resets_chain_but_not_combo() {
        let t = ComboTuning::default();
        let mut combo = ComboTracker::default();
        let mut chain = PerfectChain::default();
        let seg = segment(50.0, 40.0);

        score_pass(&mut combo, &mut chain, &seg, 50.0, &t);
        score_pass(&mut combo, &mut chain, &seg, 50.0, &t);
        assert_eq!(chain.chain, 2);

        let award = score_pass(&mut combo, &mut chain, &seg, 65.0, &t);
        assert!(award.perfect.is_none());
        assert_eq!(chain.chain, 0);
        assert_eq!(combo.combo, 3);
    }

    #[test]
    fn perfect_bonus_scales_with_chain() {
        let t = ComboTuning::default();
        let mut combo = ComboTracker::default();
        let mut chain = PerfectChain::default();
        let seg = segment(40.0, 36.0);
        let bonuses: Vec<u64> = (0..7)
            .map(|_| score_pass(&mut combo, &mut chain, &seg, 40.0, &t).perfect.unwrap().1)
            .collect();
        assert_eq!(bonuses, vec![12, 24, 24, 36, 36, 48, 48]);
        assert_eq!(chain.bonus_total, bonuses.iter().sum::<u64>());
    }

    #[test]
    fn perfect_extends_window_up_to_cap() {
        let t = ComboTuning::default();
        let mut combo = ComboTracker::default();
        let mut chain = PerfectChain::default();
        let seg = segment(50.0, 40.0);
        score_pass(&mut combo, &mut chain, &seg, 50.0, &t);
        assert!((combo.timer - (t.window_sec + t.perfect_window_extend)).abs() < 1e-6);
        combo.extend(10.0, t.max_window_sec);
        assert_eq!(combo.timer, t.max_window_sec);
    }

    #[test]
    fn centered_is_always_perfect() {
        for gap in [0.0, 0.5, 10.0, 99.0] {
            assert!(is_perfect(0.0, gap, 0.14));
        }
        assert!(!is_perfect(6.0, 40.0, 0.14));
    }

    #[test]
    fn segment_band_checks() {
        let seg = segment(50.0, 40.0);
        assert_eq!(check_segment(22.0, 2.8, 50.0, &seg, 22.0, 0.9), BandCheck::Clear);
        assert_eq!(check_segment(22.0, 2.8, 30.5, &seg, 22.0, 0.9), BandCheck::Hit);
        assert_eq!(check_segment(22.0, 2.8, 69.5, &seg, 22.0, 0.9), BandCheck::Hit);
        let far = Segment { x: 60.0, ..seg };
        assert_eq!(check_segment(22.0, 2.8, 0.0, &far, 22.0, 0.9), BandCheck::NotInColumn);
    }

    #[test]
    fn sweep_catches_tunnelling() {
        assert!(swept_band_hit(80.0, 100.0, 85.0, 95.0));
        assert!(swept_band_hit(86.0, 87.0, 85.0, 95.0));
        assert!(!swept_band_hit(60.0, 84.0, 85.0, 95.0));
        assert!(!swept_band_hit(96.0, 105.0, 85.0, 95.0));
    }

    #[test]
    fn shield_is_capped() {
        let mut score = 0;
        let mut lives = 3;
        apply_pickup(PickupKind::Shield, &mut score, &mut lives, 10, 3);
        assert_eq!(lives, 3);
        lives = 1;
        apply_pickup(PickupKind::Shield, &mut score, &mut lives, 10, 3);
        assert_eq!(lives, 2);
        assert_eq!(apply_pickup(PickupKind::Fuel, &mut score, &mut lives, 10, 3), 10);
        assert_eq!(score, 10);
    }
}

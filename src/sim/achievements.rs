//! One-shot achievements
//!
//! Each game declares a static table of [`AchievementDef`]s. After every
//! step the tracker checks them against the already-updated
//! [`SessionStats`]; an id unlocks at most once per session.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Cumulative statistics the predicates look at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Canyon distance travelled
    pub distance: f32,
    /// Seconds in a row without thrust
    pub no_thrust_secs: f32,
    /// Current perfect-pass chain
    pub perfect_chain: u32,
    /// Seconds survived
    pub survival_secs: f32,
    /// Asteroids that fell past without a hit
    pub dodged: u32,
    /// Resources or collectibles picked up
    pub collected: u32,
    /// Best combo so far
    pub max_combo: u32,
}

/// Threshold predicate over [`SessionStats`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Threshold {
    DistanceAtLeast(f32),
    NoThrustFor(f32),
    PerfectChainAtLeast(u32),
    SurvivedFor(f32),
    DodgedAtLeast(u32),
    CollectedAtLeast(u32),
    ComboAtLeast(u32),
}

impl Threshold {
    pub fn is_met(&self, stats: &SessionStats) -> bool {
        match *self {
            Threshold::DistanceAtLeast(d) => stats.distance >= d,
            Threshold::NoThrustFor(s) => stats.no_thrust_secs >= s,
            Threshold::PerfectChainAtLeast(n) => stats.perfect_chain >= n,
            Threshold::SurvivedFor(s) => stats.survival_secs >= s,
            Threshold::DodgedAtLeast(n) => stats.dodged >= n,
            Threshold::CollectedAtLeast(n) => stats.collected >= n,
            Threshold::ComboAtLeast(n) => stats.max_combo >= n,
        }
    }
}

/// Static achievement definition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub bonus: u64,
    pub threshold: Threshold,
}

/// Display record for one achievement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementRecord {
    pub id: &'static str,
    pub title: &'static str,
    pub unlocked: bool,
}

/// Emitted the one time an achievement unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unlock {
    pub id: &'static str,
    pub title: &'static str,
    pub bonus: u64,
}

/// Per-session unlock set
#[derive(Debug, Clone, Default)]
pub struct AchievementTracker {
    unlocked: BTreeSet<&'static str>,
}

impl AchievementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    /// Check every definition; return those unlocking on this call
    pub fn evaluate(&mut self, defs: &'static [AchievementDef], stats: &SessionStats) -> Vec<Unlock> {
        let mut fresh = Vec::new();
        for def in defs {
            if self.unlocked.contains(def.id) || !def.threshold.is_met(stats) {
                continue;
            }
            self.unlocked.insert(def.id);
            log::info!("Achievement unlocked: {} (+{})", def.id, def.bonus);
            fresh.push(Unlock {
                id: def.id,
                title: def.title,
                bonus: def.bonus,
            });
        }
        fresh
    }

    pub fn records(&self, defs: &'static [AchievementDef]) -> Vec<AchievementRecord> {
        defs.iter()
            .map(|def| AchievementRecord {
                id: def.id,
                title: def.title,
                unlocked: self.is_unlocked(def.id),
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.unlocked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static DEFS: &[AchievementDef] = &[
        AchievementDef {
            id: "far",
            title: "Far",
            bonus: 30,
            threshold: Threshold::DistanceAtLeast(300.0),
        },
        AchievementDef {
            id: "calm",
            title: "Calm",
            bonus: 35,
            threshold: Threshold::NoThrustFor(8.0),
        },
    ];

    #[test]
    fn unlocks_once() {
        let mut tracker = AchievementTracker::new();
        let mut stats = SessionStats::default();
        assert!(tracker.evaluate(DEFS, &stats).is_empty());

        stats.distance = 300.0;
        let first = tracker.evaluate(DEFS, &stats);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "far");

        // Predicate still true: nothing new
        assert!(tracker.evaluate(DEFS, &stats).is_empty());
        assert_eq!(tracker.unlocked_count(), 1);
    }

    #[test]
    fn records_reflect_state() {
        let mut tracker = AchievementTracker::new();
        let stats = SessionStats {
            no_thrust_secs: 9.0,
            ..Default::default()
        };
        tracker.evaluate(DEFS, &stats);
        let records = tracker.records(DEFS);
        assert!(!records[0].unlocked);
        assert!(records[1].unlocked);

        tracker.clear();
        assert!(tracker.records(DEFS).iter().all(|r| !r.unlocked));
    }
}

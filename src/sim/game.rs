//! The contract every minigame implements
//!
//! A game owns its session state and advances it one bounded `dt` at a
//! time. It never schedules itself, renders, or persists anything; the
//! session controller does that around it.

use serde::{Deserialize, Serialize};

use super::achievements::Unlock;
use super::scoring::{ChainTier, PickupKind};
use crate::tuning::RewardTuning;
use crate::view::Playfield;

/// Which minigame a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    MarsRun,
    AsteroidNavigator,
    ResourceCollector,
}

impl GameKind {
    /// Stable identifier used for storage keys and completion logs
    pub fn id(&self) -> &'static str {
        match self {
            GameKind::MarsRun => "marsRun",
            GameKind::AsteroidNavigator => "asteroidNavigator",
            GameKind::ResourceCollector => "resourceCollector",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::MarsRun => "Mars Canyon Run",
            GameKind::AsteroidNavigator => "Asteroid Navigator",
            GameKind::ResourceCollector => "Resource Collector",
        }
    }
}

/// Parameters the host passes in at session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub seed: u64,
    /// Base difficulty multiplier, 1.0 = normal
    pub difficulty: f32,
    /// Seconds until the session ends successfully; `None` runs until failure
    pub time_limit: Option<f32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            difficulty: 1.0,
            time_limit: None,
        }
    }
}

impl SessionConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Difficulty with non-finite or non-positive values replaced by 1.0
    pub fn difficulty(&self) -> f32 {
        if self.difficulty.is_finite() && self.difficulty > 0.0 {
            self.difficulty
        } else {
            1.0
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalCause {
    /// Flew into the canyon wall or floor
    OutOfBounds,
    /// Hit a tunnel segment outside its gap
    Obstacle,
    LivesExhausted,
    TimeUp,
}

impl TerminalCause {
    pub fn describe(&self) -> &'static str {
        match self {
            TerminalCause::OutOfBounds => "crashed into the canyon",
            TerminalCause::Obstacle => "flew into the asteroid belt",
            TerminalCause::LivesExhausted => "out of lives",
            TerminalCause::TimeUp => "time is up",
        }
    }
}

/// Terminal outcome raised by a game step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub cause: TerminalCause,
}

impl Outcome {
    pub fn failure(cause: TerminalCause) -> Self {
        Self {
            success: false,
            cause,
        }
    }
}

/// End-of-session rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    TryAgain,
    Good,
    Excellent,
    Legendary,
}

impl Grade {
    /// Rate `score` against descending thresholds `[legendary, excellent, good]`
    pub fn from_score(score: u64, thresholds: [u64; 3]) -> Self {
        let [legendary, excellent, good] = thresholds;
        if score >= legendary {
            Grade::Legendary
        } else if score >= excellent {
            Grade::Excellent
        } else if score >= good {
            Grade::Good
        } else {
            Grade::TryAgain
        }
    }

    pub fn comment(&self) -> &'static str {
        match self {
            Grade::Legendary => "Incredible! A true master of the void.",
            Grade::Excellent => "Excellent work, the base is supplied!",
            Grade::Good => "Good result, the basics are covered.",
            Grade::TryAgain => "Not bad, but you can do better. Try again!",
        }
    }
}

/// Something worth telling the player about, produced during a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    SegmentPassed { index: u32, points: u64 },
    Perfect { tier: ChainTier, bonus: u64 },
    AchievementUnlocked(Unlock),
    /// Lost a life but the session goes on
    Hit { lives_left: u8 },
    Collected { kind: PickupKind, points: u64 },
    ResourcePicked { points: u64, combo: u32 },
    Terminal(Outcome),
}

/// A real-time minigame driven by the session controller
pub trait Minigame {
    /// Input buffer filled by host events and read by the next step
    type Input: Default + Clone;

    fn kind(&self) -> GameKind;

    /// Throw away all session state and build a fresh session
    fn reset(&mut self, config: &SessionConfig);

    /// Advance one step of `dt` seconds. Returns the outcome on the step
    /// the session ends; once ended, further calls do nothing.
    fn step(&mut self, input: &Self::Input, dt: f32, events: &mut Vec<GameEvent>) -> Option<Outcome>;

    fn is_terminal(&self) -> bool;

    /// Live score shown on the HUD
    fn score(&self) -> u64;

    /// Score reported on completion; may fold in end-of-run bonuses
    fn final_score(&self) -> u64 {
        self.score()
    }

    fn reward(&self) -> &RewardTuning;

    fn grade(&self, final_score: u64) -> Grade {
        Grade::from_score(final_score, self.reward().grade_thresholds)
    }

    fn achievements(&self) -> Vec<super::AchievementRecord>;

    fn playfield(&self) -> Playfield;

    /// Clear inputs that should only act once (lateral steps, picks)
    fn clear_one_shot(_input: &mut Self::Input) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_thresholds_are_inclusive() {
        let t = [300, 200, 150];
        assert_eq!(Grade::from_score(300, t), Grade::Legendary);
        assert_eq!(Grade::from_score(299, t), Grade::Excellent);
        assert_eq!(Grade::from_score(150, t), Grade::Good);
        assert_eq!(Grade::from_score(149, t), Grade::TryAgain);
    }

    #[test]
    fn bad_difficulty_falls_back() {
        let mut config = SessionConfig::default();
        config.difficulty = f32::NAN;
        assert_eq!(config.difficulty(), 1.0);
        config.difficulty = -2.0;
        assert_eq!(config.difficulty(), 1.0);
        config.difficulty = 1.5;
        assert_eq!(config.difficulty(), 1.5);
    }

    #[test]
    fn ids_are_stable() {
        assert_eq!(GameKind::MarsRun.id(), "marsRun");
        assert_eq!(GameKind::AsteroidNavigator.id(), "asteroidNavigator");
        assert_eq!(GameKind::ResourceCollector.id(), "resourceCollector");
    }
}

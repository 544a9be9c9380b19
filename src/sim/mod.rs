//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Bounded timestep only (see [`clock`])
//! - Seeded RNG only
//! - Stable iteration order (segments and objects in spawn order)
//! - No rendering, scheduling or storage dependencies

pub mod achievements;
pub mod clock;
pub mod collector;
pub mod dodge;
pub mod game;
pub mod physics;
pub mod rng;
pub mod run;
pub mod scoring;
pub mod track;

pub use achievements::{AchievementDef, AchievementRecord, AchievementTracker, SessionStats, Threshold, Unlock};
pub use clock::{FrameSteps, SimClock, StepMode};
pub use collector::{COLLECTOR_ACHIEVEMENTS, CollectorGame, CollectorInput, RESOURCE_KINDS, Resource, ResourceKind};
pub use dodge::{DODGE_ACHIEVEMENTS, DodgeGame, DodgeInput, FallingKind, FallingObject};
pub use game::{GameEvent, GameKind, Grade, Minigame, Outcome, SessionConfig, TerminalCause};
pub use physics::{IntegrateResult, Lane, ShipBody};
pub use rng::GameRng;
pub use run::{RUN_ACHIEVEMENTS, RunGame, RunInput, RunState};
pub use scoring::{
    BandCheck, ChainTier, ComboTracker, PassAward, PerfectChain, PickupKind, apply_pickup, check_segment,
    combo_multiplier, is_perfect, score_pass, swept_band_hit,
};
pub use track::{Segment, SpawnTimer, TrackGenerator, lateral_delta, speed_scale};

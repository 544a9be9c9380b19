//! Cosmic Arcade - solar-system arcade minigames
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, generators, physics, scoring, games)
//! - `session`: Session lifecycle around a single minigame
//! - `view`: Plain-data frames and the render target port
//! - `platform`: Frame scheduling (requestAnimationFrame or manual)
//! - `persistence`: Key-value storage (LocalStorage or in-memory)
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod view;

pub use error::{SessionError, StorageError, TuningError};
pub use highscores::PersistedBest;
pub use session::{FinalReport, Services, SessionController, SessionPhase, TeardownHandle};
pub use settings::Settings;
pub use sim::{GameKind, Minigame, SessionConfig};

/// Engine-wide constants
pub mod consts {
    /// Largest step the simulation ever integrates, seconds
    pub const DEFAULT_DT_CAP: f32 = 0.05;
    /// Fixed timestep for hosts that opt into fixed stepping (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield bounds; every position is a percentage of the field
    pub const FIELD_MIN: f32 = 0.0;
    pub const FIELD_MAX: f32 = 100.0;

    /// How long a toast stays on screen, milliseconds
    pub const TOAST_MS: f64 = 900.0;
    /// The PERFECT popup is a quick flash
    pub const PERFECT_TOAST_MS: f64 = 420.0;

    /// Storage key for the settings blob
    pub const SETTINGS_KEY: &str = "cosmic_arcade_settings";
}

//! Player preferences
//!
//! Persisted as one JSON blob, separately from per-game scores.

use serde::{Deserialize, Serialize};

use crate::consts::SETTINGS_KEY;
use crate::persistence::KeyValueStore;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Feedback volume (0.0 - 1.0)
    pub volume: f32,
    pub muted: bool,

    // === Visual Effects ===
    /// Screen shake while thrusting
    pub screen_shake: bool,

    // === Accessibility ===
    /// Reduced motion (no shake, no flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: 0.8,
            muted: false,
            screen_shake: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Load settings; anything unreadable falls back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.read(SETTINGS_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(mut settings) => {
                    settings.volume = settings.volume.clamp(0.0, 1.0);
                    log::info!("Loaded settings");
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring corrupt settings: {}", e);
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unavailable, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings; failures are logged and dropped
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not serialize settings: {}", e);
                return;
            }
        };
        match store.write(SETTINGS_KEY, &json) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Settings not saved: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn round_trips_through_store() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            volume: 0.3,
            reduced_motion: true,
            ..Default::default()
        };
        settings.save(&mut store);
        assert_eq!(Settings::load(&store), settings);
        assert!(!Settings::load(&store).effective_screen_shake());
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.write(SETTINGS_KEY, "not json").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let mut store = MemoryStore::new();
        store.write(SETTINGS_KEY, r#"{"muted":true}"#).unwrap();
        let settings = Settings::load(&store);
        assert!(settings.muted);
        assert_eq!(settings.volume, 0.8);
    }
}

//! Best score and credits ledger
//!
//! Two integers per game, stored under `{game_id}_bestScore` and
//! `{game_id}_credits`.

use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;

/// Persisted per-game totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedBest {
    pub best_score: u64,
    pub credits: u64,
}

/// What recording a finished session changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub new_record: bool,
    pub credits_earned: u64,
}

pub fn best_score_key(game_id: &str) -> String {
    format!("{}_bestScore", game_id)
}

pub fn credits_key(game_id: &str) -> String {
    format!("{}_credits", game_id)
}

impl PersistedBest {
    /// Load both values; missing, unparsable or unreadable entries count as 0
    pub fn load(store: &dyn KeyValueStore, game_id: &str) -> Self {
        let best = Self {
            best_score: read_u64(store, &best_score_key(game_id)),
            credits: read_u64(store, &credits_key(game_id)),
        };
        log::info!("Loaded {} best {} credits {}", game_id, best.best_score, best.credits);
        best
    }

    /// Apply a final score: best only moves on a strictly greater score,
    /// credits always grow.
    pub fn record(&mut self, score: u64, credits_earned: u64) -> RecordOutcome {
        let new_record = score > self.best_score;
        if new_record {
            self.best_score = score;
        }
        self.credits = self.credits.saturating_add(credits_earned);
        RecordOutcome {
            new_record,
            credits_earned,
        }
    }

    /// Persist what `record` changed: credits always, the best score only on
    /// a new record. A failed write is logged and skipped.
    pub fn save(&self, store: &mut dyn KeyValueStore, game_id: &str, outcome: RecordOutcome) {
        if outcome.new_record {
            write_u64(store, &best_score_key(game_id), self.best_score);
        }
        write_u64(store, &credits_key(game_id), self.credits);
    }
}

fn write_u64(store: &mut dyn KeyValueStore, key: &str, value: u64) {
    if let Err(e) = store.write(key, &value.to_string()) {
        log::warn!("Dropped write of {}: {}", key, e);
    }
}

fn read_u64(store: &dyn KeyValueStore, key: &str) -> u64 {
    match store.read(key) {
        Ok(Some(raw)) => raw.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0).map_or(0, |v| v as u64),
        Ok(None) => 0,
        Err(e) => {
            log::warn!("Could not read {}: {}", key, e);
            0
        }
    }
}

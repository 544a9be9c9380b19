//! Error types
//!
//! Only precondition and configuration problems surface as errors. A
//! session ending (crash, lives exhausted, time up) is an outcome, not an
//! error, and storage trouble degrades to defaults inside the callers.

use thiserror::Error;

use crate::session::SessionPhase;

/// Failures of the session lifecycle operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The host never mounted a place to render into
    #[error("render target is not mounted; session refuses to start")]
    MissingRenderTarget,
    /// `init`/`restart` after `destroy`
    #[error("session has been destroyed")]
    Destroyed,
    /// `restart` while a run is still going (or before the first one)
    #[error("restart requires a finished session, current phase is {0:?}")]
    NotTerminal(SessionPhase),
}

/// Failures of the durable key-value store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write `{key}`: {reason}")]
    WriteFailed { key: String, reason: String },
}

/// Problems loading or validating tuning values
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl TuningError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        TuningError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

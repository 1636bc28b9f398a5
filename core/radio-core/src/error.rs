//! Error types for radio-core operations.
//!
//! The reconciliation engine itself never fails visibly: toggles and state
//! observations either act or silently no-op. These errors cover the edges
//! around it (registry lookups, configuration).

use radio_protocol::RadioKind;
use std::path::PathBuf;

/// All errors that can occur in radio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum RadioError {
    // ─────────────────────────────────────────────────────────────────────
    // Registry Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Radio not registered: {0}")]
    RadioNotRegistered(RadioKind),

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration path could not be resolved (no home directory)")]
    ConfigPathUnavailable,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Configuration read failed: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using RadioError.
pub type Result<T> = std::result::Result<T, RadioError>;

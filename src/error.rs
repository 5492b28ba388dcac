//! Usage: Error taxonomy for the settings synchronization engine.

use serde::{Deserialize, Serialize};

/// One rejected field, either from local validation or from server-reported
/// field-level detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Remote unreachable or non-2xx on load. The resource stays observable
    /// as load-failed (distinct from still-loading) so the caller can retry.
    #[error("failed to fetch settings `{key}`: {message}")]
    Fetch { key: String, message: String },

    /// Local schema violation. Never reaches the network.
    #[error("settings validation failed: {} field(s) rejected", .violations.len())]
    Validation { violations: Vec<FieldViolation> },

    /// Remote rejected the write because of a concurrent change.
    #[error("settings `{key}` changed on the server: {message}")]
    Conflict { key: String, message: String },

    /// Remote rejected a locally-valid payload. Field-level detail is kept
    /// verbatim when the server provided it; `violations` is empty otherwise.
    #[error("server rejected settings `{key}`: {message}")]
    ServerValidation {
        key: String,
        message: String,
        violations: Vec<FieldViolation>,
    },

    /// Submit request failed to complete.
    #[error("network error while saving settings `{key}`: {message}")]
    Network { key: String, message: String },

    /// A submit for the same resource key is already in flight.
    #[error("a save for settings `{key}` is already in progress")]
    SubmitInFlight { key: String },

    /// Submit attempted before any successful load.
    #[error("settings `{key}` are not loaded")]
    NotLoaded { key: String },

    /// Resource key has no schema in the catalog.
    #[error("unknown settings resource `{0}`")]
    UnknownResource(String),

    /// Resource key fails the key syntax rules.
    #[error("invalid settings resource key `{key}`: {message}")]
    InvalidKey { key: String, message: String },
}

impl SyncError {
    pub fn single_violation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            violations: vec![FieldViolation::new(field, message)],
        }
    }

    /// Field-level detail carried by this error, if any.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Validation { violations } | Self::ServerValidation { violations, .. } => {
                violations
            }
            _ => &[],
        }
    }
}

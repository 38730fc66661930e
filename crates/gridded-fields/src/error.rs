//! Error types for building gridded field sets.

use chrono::{DateTime, Utc};
use reanalysis_common::{TimeWindowError, UnknownVariable};
use thiserror::Error;

/// Errors that can occur while building a field set.
#[derive(Error, Debug)]
pub enum FieldSetError {
    /// A record's parameter name maps to no known variable.
    #[error("unknown variable '{name}' in record valid at {valid_time}")]
    UnknownVariable {
        name: String,
        valid_time: DateTime<Utc>,
        #[source]
        source: UnknownVariable,
    },

    /// A record whose values do not fit its own mesh.
    #[error("malformed '{name}' record valid at {valid_time}: {reason}")]
    MalformedRecord {
        name: String,
        valid_time: DateTime<Utc>,
        reason: String,
    },

    /// The requested time window is invalid.
    #[error("invalid time window: {0}")]
    InvalidWindow(#[from] TimeWindowError),

    /// The record source failed to produce the next record.
    #[error("record source failed: {0}")]
    Source(#[source] anyhow::Error),

    /// The retrieval collaborator failed.
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] anyhow::Error),
}

impl FieldSetError {
    /// Create a MalformedRecord error.
    pub fn malformed(
        name: impl Into<String>,
        valid_time: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedRecord {
            name: name.into(),
            valid_time,
            reason: reason.into(),
        }
    }
}

/// Result type for field set operations.
pub type Result<T> = std::result::Result<T, FieldSetError>;

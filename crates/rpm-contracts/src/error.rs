//! Error taxonomy for the vitals ingestion pipeline.
//!
//! Every fallible pipeline operation returns `PipelineResult<T>`. Variants
//! carry the context needed to log the failure and to decide whether a
//! caller may retry it: transport and store failures say whether they are
//! transient, malformed input never is.

use thiserror::Error;

/// The unified error type for the vitals pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A stream record was malformed or missing a required field.
    ///
    /// Terminal: replaying the same bytes produces the same failure.
    #[error("invalid vital record: {reason}")]
    Validation { reason: String },

    /// The producer could not emit a reading onto the stream.
    #[error("failed to send reading for partition '{partition_key}': {reason}")]
    TransportSend {
        partition_key: String,
        reason: String,
        retryable: bool,
    },

    /// A store rejected or failed a write.
    #[error("{store} write failed: {reason}")]
    Persistence {
        store: String,
        reason: String,
        retryable: bool,
    },

    /// A notification could not be delivered. Never fatal to the pipeline.
    #[error("notification delivery failed: {reason}")]
    Notification { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl PipelineError {
    /// Build a `Validation` error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation { reason: reason.into() }
    }

    /// Build a `Persistence` error for the named store.
    pub fn persistence(store: impl Into<String>, reason: impl Into<String>, retryable: bool) -> Self {
        Self::Persistence {
            store: store.into(),
            reason: reason.into(),
            retryable,
        }
    }

    /// Return true if retrying the failed operation could succeed.
    ///
    /// Only transient transport and store failures are retryable. The
    /// pipeline itself never retries; this is for callers that want to.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransportSend { retryable, .. } | Self::Persistence { retryable, .. } => {
                *retryable
            }
            Self::Validation { .. } | Self::Notification { .. } | Self::Config { .. } => false,
        }
    }
}

/// Convenience alias used throughout the pipeline crates.
pub type PipelineResult<T> = Result<T, PipelineError>;

//! Error types for the Tempest simulation.

use thiserror::Error;

use crate::version::SchemaVersion;

/// Top-level error type for simulation operations.
#[derive(Debug, Error)]
pub enum SimError {
    /// Catalog or parameter-space configuration problems. The engine
    /// degrades (weather cycling pauses) rather than crashing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested goal weather is not reachable from the current
    /// weather under the catalog's constraints. Recovered by retrying
    /// on a later tick.
    #[error("Goal weather '{goal}' unreachable from '{from}'")]
    UnreachableGoal {
        /// Weather the search started from
        from: String,
        /// Requested goal weather
        goal: String,
    },

    /// A mutation entry point was invoked on a non-authoritative
    /// instance. A programming error, not a runtime condition.
    #[error("Authority violation: {0} called on an observer instance")]
    AuthorityViolation(&'static str),

    /// Snapshot encoding/decoding errors
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Snapshot codec errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Magic bytes did not match
    #[error("Invalid snapshot format")]
    InvalidFormat,

    /// Snapshot schema version cannot be read by this build
    #[error("Incompatible snapshot version: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build writes
        expected: SchemaVersion,
        /// Version found in the data
        found: SchemaVersion,
    },

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Payload failed to decode
    #[error("Snapshot corrupted: {0}")]
    Corrupted(String),

    /// Snapshot references a weather tag absent from the catalog
    #[error("Unknown weather tag in snapshot: {0}")]
    UnknownTag(String),
}

/// Result type alias for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

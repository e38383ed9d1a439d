//! Versioned world snapshot codec.
//!
//! A snapshot captures everything an observer needs to reconstruct
//! the environment: clock position, committed weather, goal, the
//! in-flight transition with its rolled values, and the roll-source
//! state. The binary format is four magic bytes followed by a bincode
//! payload whose first field is the schema version.

use serde::{Deserialize, Serialize};

use tempest_common::{MagicBytes, SchemaVersion, SnapshotError, WeatherTag};

use crate::machine::{Transition, WeatherStateMachine};
use crate::rng::SimRng;

/// Serializable state of the whole environment simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Snapshot schema version
    pub version: SchemaVersion,
    /// Elapsed game time in game-seconds
    pub elapsed_seconds: f64,
    /// Committed weather, absent before the first commit
    pub current_weather: Option<WeatherTag>,
    /// Game time the current weather committed
    pub changed_at_seconds: f64,
    /// Rolled lifetime of the current weather in game-minutes
    pub current_lifetime_minutes: f32,
    /// Goal weather being steered toward, if any
    pub goal_weather: Option<WeatherTag>,
    /// In-flight transition with its rolled values, if any
    pub transition: Option<Transition>,
    /// Weather roll-source state
    pub rng: SimRng,
}

impl WorldSnapshot {
    /// Capture a snapshot of the machine plus the clock's position.
    #[must_use]
    pub fn capture(elapsed_seconds: f64, machine: &WeatherStateMachine) -> Self {
        Self {
            version: SchemaVersion::WORLD_SNAPSHOT,
            elapsed_seconds,
            current_weather: machine.current().cloned(),
            changed_at_seconds: machine.changed_at_seconds(),
            current_lifetime_minutes: machine.current_lifetime_minutes(),
            goal_weather: machine.goal().cloned(),
            transition: machine.transition().cloned(),
            rng: machine.rng().clone(),
        }
    }

    /// Serializes to binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&MagicBytes::SNAPSHOT.0);

        let data =
            bincode::serialize(self).map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        buffer.extend(data);

        Ok(buffer)
    }

    /// Deserializes from binary format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        if bytes.len() < 4 || bytes[0..4] != MagicBytes::SNAPSHOT.0 {
            return Err(SnapshotError::InvalidFormat);
        }

        let snapshot: Self = bincode::deserialize(&bytes[4..])
            .map_err(|e| SnapshotError::Corrupted(e.to_string()))?;

        if !SchemaVersion::WORLD_SNAPSHOT.can_read(&snapshot.version) {
            return Err(SnapshotError::VersionMismatch {
                expected: SchemaVersion::WORLD_SNAPSHOT,
                found: snapshot.version,
            });
        }

        Ok(snapshot)
    }
}

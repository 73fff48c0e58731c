//! The persisted version history entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable snapshot of "the version currently in effect".
///
/// One record is appended after every successful `up` or `down` step. Records
/// are never edited or deleted; the most recently inserted one defines the
/// current version.
///
/// Serialized as `{version, timestamp, description, type}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    version: u64,
    timestamp: DateTime<Utc>,
    description: String,
    #[serde(rename = "type")]
    migration_type: String,
}

impl VersionRecord {
    /// Creates a record stamped with the current UTC time.
    pub fn new(version: u64, description: &str, migration_type: &str) -> Self {
        VersionRecord::with_timestamp(version, Utc::now(), description, migration_type)
    }

    /// Creates a record with an explicit timestamp, used by stores that decode
    /// records from their own document format.
    pub fn with_timestamp(
        version: u64,
        timestamp: DateTime<Utc>,
        description: &str,
        migration_type: &str,
    ) -> Self {
        VersionRecord {
            version,
            timestamp,
            description: description.to_string(),
            migration_type: migration_type.to_string(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Classification reported by the handler that caused this record.
    pub fn migration_type(&self) -> &str {
        &self.migration_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_stamps_current_time() {
        let before = Utc::now();
        let record = VersionRecord::new(2, "addIndex", "schema");
        let after = Utc::now();

        assert_eq!(record.version(), 2);
        assert_eq!(record.description(), "addIndex");
        assert_eq!(record.migration_type(), "schema");
        assert!(record.timestamp() >= before && record.timestamp() <= after);
    }

    #[test]
    fn with_timestamp_keeps_given_time() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = VersionRecord::with_timestamp(1, ts, "init", "data");
        assert_eq!(record.timestamp(), ts);
    }
}

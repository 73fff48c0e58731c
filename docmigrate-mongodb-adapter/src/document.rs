use chrono::{DateTime, Utc};
use docmigrate::record::VersionRecord;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

/// BSON shape of a version record: `{_id, version, timestamp, description, type}`.
///
/// The timestamp is stored as a native BSON date, so it is truncated to
/// millisecond precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct VersionDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<ObjectId>,
    pub(crate) version: i64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) description: String,
    #[serde(rename = "type")]
    pub(crate) migration_type: String,
}

impl VersionDocument {
    /// BSON has no unsigned 64 bit integer; versions above `i64::MAX` are
    /// rejected.
    pub(crate) fn from_record(record: &VersionRecord) -> Option<VersionDocument> {
        Some(VersionDocument {
            id: None,
            version: i64::try_from(record.version()).ok()?,
            timestamp: record.timestamp(),
            description: record.description().to_string(),
            migration_type: record.migration_type().to_string(),
        })
    }

    /// Negative versions can only come from documents written by other tools.
    pub(crate) fn into_record(self) -> Option<VersionRecord> {
        let version = u64::try_from(self.version).ok()?;
        Some(VersionRecord::with_timestamp(
            version,
            self.timestamp,
            &self.description,
            &self.migration_type,
        ))
    }
}

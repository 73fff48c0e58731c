use docmigrate::errors::{ErrorKind, MigrateError};
use docmigrate::record::VersionRecord;
use std::error::Error;
use thiserror::Error;

/// Error type for version record encoding and decoding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordCodecError {
    /// Stored bytes could not be turned back into a record
    #[error("Deserialization failed: {0}")]
    DeserializationError(String),
    /// A record could not be serialized
    #[error("Serialization failed: {0}")]
    SerializationError(String),
    /// A partition key is not an 8 byte sequence number
    #[error("Invalid sequence key of {0} bytes")]
    InvalidSequenceKey(usize),
}

impl From<RecordCodecError> for MigrateError {
    fn from(err: RecordCodecError) -> Self {
        MigrateError::new(&err.to_string(), ErrorKind::EncodingError)
    }
}

pub type RecordCodecResult<T> = Result<T, RecordCodecError>;

/// Serializes a record with bincode for storage in a partition.
#[inline]
pub(crate) fn encode_record(record: &VersionRecord) -> RecordCodecResult<Vec<u8>> {
    bincode::serde::encode_to_vec(record, bincode::config::legacy())
        .map_err(|e| RecordCodecError::SerializationError(e.to_string()))
}

#[inline]
pub(crate) fn decode_record(bytes: &[u8]) -> RecordCodecResult<VersionRecord> {
    bincode::serde::decode_from_slice(bytes, bincode::config::legacy())
        .map(|(record, _)| record)
        .map_err(|e| RecordCodecError::DeserializationError(e.to_string()))
}

/// Partition keys are big-endian sequence numbers so that key order is
/// insertion order.
#[inline]
pub(crate) fn encode_sequence(sequence: u64) -> Vec<u8> {
    sequence.to_be_bytes().to_vec()
}

#[inline]
pub(crate) fn decode_sequence(bytes: &[u8]) -> RecordCodecResult<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| RecordCodecError::InvalidSequenceKey(bytes.len()))?;
    Ok(u64::from_be_bytes(raw))
}

/// Converts fjall errors to migration errors.
///
/// Corruption and decompression failures map to `EncodingError`, everything
/// else is a `PersistenceError`.
pub(crate) fn to_migrate_error(error: impl Error) -> MigrateError {
    let error_msg = error.to_string();
    let error_kind = if error_msg.contains("corrupt") || error_msg.contains("ecompress") {
        ErrorKind::EncodingError
    } else {
        ErrorKind::PersistenceError
    };
    MigrateError::new(&format!("Fjall Error: {}", error_msg), error_kind)
}

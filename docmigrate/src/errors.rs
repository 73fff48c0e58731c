use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for migration operations
///
/// Each kind names a category of failure so callers can tell an empty history
/// apart from an unreachable backend, or a failing handler from a rejected write.
///
/// # Examples
///
/// ```rust
/// use docmigrate::errors::{ErrorKind, MigrateError, MigrateResult};
///
/// fn example() -> MigrateResult<()> {
///     Err(MigrateError::new("no version record", ErrorKind::NotFound))
/// }
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::NotFound);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// Backend unreachable, write rejected or collection provisioning failed
    PersistenceError,
    /// No version record exists yet
    NotFound,
    /// A migration's forward or backward logic failed
    HandlerError,
    /// Invalid registry or configuration (duplicate versions, empty names)
    ValidationError,
    /// Could not establish a connection to the backing database
    ConnectionError,
    /// A version record could not be encoded or decoded
    EncodingError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::PersistenceError => write!(f, "Persistence error"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::HandlerError => write!(f, "Handler error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::ConnectionError => write!(f, "Connection error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type shared by the migration engine and every version store.
///
/// `MigrateError` carries a message, an [`ErrorKind`], an optional cause and the
/// backtrace captured where it was created.
///
/// # Examples
///
/// ```rust
/// use docmigrate::errors::{ErrorKind, MigrateError};
///
/// let cause = MigrateError::new("index build failed", ErrorKind::InternalError);
/// let err = MigrateError::new_with_cause("migration 2 failed", ErrorKind::HandlerError, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct MigrateError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<MigrateError>>,
    backtrace: Atomic<Backtrace>,
}

impl MigrateError {
    /// Creates a new `MigrateError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        MigrateError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `MigrateError` that keeps `cause` in its chain.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: MigrateError) -> Self {
        MigrateError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&MigrateError> {
        self.cause.as_deref()
    }

    /// Returns `true` when this error only says that no version record exists.
    pub fn is_not_found(&self) -> bool {
        self.error_kind == ErrorKind::NotFound
    }
}

impl Display for MigrateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for MigrateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for MigrateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrateError>;

impl From<std::io::Error> for MigrateError {
    fn from(err: std::io::Error) -> Self {
        MigrateError::new(&format!("IO error: {}", err), ErrorKind::PersistenceError)
    }
}

impl From<String> for MigrateError {
    fn from(msg: String) -> Self {
        MigrateError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for MigrateError {
    fn from(msg: &str) -> Self {
        MigrateError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_error_new_creates_error() {
        let error = MigrateError::new("write rejected", ErrorKind::PersistenceError);
        assert_eq!(error.message(), "write rejected");
        assert_eq!(error.kind(), &ErrorKind::PersistenceError);
        assert!(error.cause().is_none());
        assert!(error.source().is_none());
    }

    #[test]
    fn migrate_error_new_with_cause_keeps_chain() {
        let cause = MigrateError::new("disk full", ErrorKind::PersistenceError);
        let error = MigrateError::new_with_cause("migration 3 failed", ErrorKind::HandlerError, cause);
        assert_eq!(error.kind(), &ErrorKind::HandlerError);
        assert_eq!(error.cause().map(|c| c.message()), Some("disk full"));
        assert!(error.source().is_some());
    }

    #[test]
    fn display_prints_only_message() {
        let error = MigrateError::new("no version record", ErrorKind::NotFound);
        assert_eq!(format!("{}", error), "no version record");
    }

    #[test]
    fn debug_prints_cause_chain() {
        let cause = MigrateError::new("inner", ErrorKind::InternalError);
        let error = MigrateError::new_with_cause("outer", ErrorKind::HandlerError, cause);
        let debug = format!("{:?}", error);
        assert!(debug.starts_with("outer\nCaused by: inner"));
    }

    #[test]
    fn is_not_found_only_for_not_found_kind() {
        assert!(MigrateError::new("x", ErrorKind::NotFound).is_not_found());
        assert!(!MigrateError::new("x", ErrorKind::PersistenceError).is_not_found());
    }

    #[test]
    fn io_error_maps_to_persistence_error() {
        let error: MigrateError = std::io::Error::other("broken pipe").into();
        assert_eq!(error.kind(), &ErrorKind::PersistenceError);
        assert!(error.message().contains("broken pipe"));
    }

    #[test]
    fn string_conversions_map_to_internal_error() {
        let from_str: MigrateError = "oops".into();
        let from_string: MigrateError = String::from("oops").into();
        assert_eq!(from_str.kind(), &ErrorKind::InternalError);
        assert_eq!(from_string.kind(), &ErrorKind::InternalError);
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::PersistenceError.to_string(), "Persistence error");
        assert_eq!(ErrorKind::NotFound.to_string(), "Not found");
        assert_eq!(ErrorKind::HandlerError.to_string(), "Handler error");
        assert_eq!(ErrorKind::ValidationError.to_string(), "Validation error");
        assert_eq!(ErrorKind::ConnectionError.to_string(), "Connection error");
        assert_eq!(ErrorKind::EncodingError.to_string(), "Encoding error");
        assert_eq!(ErrorKind::InternalError.to_string(), "Internal error");
    }

    #[test]
    fn cloned_error_shares_message_and_kind() {
        let error = MigrateError::new("boom", ErrorKind::HandlerError);
        let cloned = error.clone();
        assert_eq!(cloned.message(), error.message());
        assert_eq!(cloned.kind(), error.kind());
    }
}

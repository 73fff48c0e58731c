use crate::config::MongoConnectionConfig;
use docmigrate::errors::{ErrorKind, MigrateError, MigrateResult};
use mongodb::bson::doc;
use mongodb::sync::{Client, Database};

/// Connects to `uri` and returns a handle to `database`.
///
/// Uses the default 20 second connect timeout. See [`connect_with`] to
/// configure it.
///
/// # Errors
///
/// `ValidationError` for malformed arguments, `ConnectionError` when the
/// server cannot be reached within the timeout.
pub fn connect(uri: &str, database: &str) -> MigrateResult<Database> {
    let config = MongoConnectionConfig::builder()
        .uri(uri)
        .database(database)
        .build()?;
    connect_with(&config)
}

/// Connects using an explicit configuration.
///
/// The server is pinged once so that an unreachable deployment fails here
/// rather than on the first migration.
pub fn connect_with(config: &MongoConnectionConfig) -> MigrateResult<Database> {
    let options = config.client_options().map_err(|err| {
        log::error!("Failed to parse MongoDB connection string: {}", err);
        connection_error(err)
    })?;
    let client = Client::with_options(options).map_err(|err| {
        log::error!("Failed to create MongoDB client: {}", err);
        connection_error(err)
    })?;

    let database = client.database(config.database());
    database
        .run_command(doc! { "ping": 1 }, None)
        .map_err(|err| {
            log::error!(
                "MongoDB did not answer within {:?}: {}",
                config.connect_timeout(),
                err
            );
            connection_error(err)
        })?;

    log::info!("Connected to MongoDB database {}", config.database());
    Ok(database)
}

fn connection_error(err: mongodb::error::Error) -> MigrateError {
    MigrateError::new(
        &format!("Failed to connect to MongoDB: {}", err),
        ErrorKind::ConnectionError,
    )
}

/// Converts driver errors raised by store operations.
///
/// BSON (de)serialization failures map to `EncodingError`, everything else to
/// `PersistenceError`.
pub(crate) fn to_migrate_error(context: &str, err: mongodb::error::Error) -> MigrateError {
    let error_kind = match *err.kind {
        mongodb::error::ErrorKind::BsonDeserialization(_)
        | mongodb::error::ErrorKind::BsonSerialization(_) => ErrorKind::EncodingError,
        _ => ErrorKind::PersistenceError,
    };
    MigrateError::new(&format!("{}: {}", context, err), error_kind)
}

/// Whether `err` is the server's "collection already exists" reply.
pub(crate) fn is_namespace_exists(err: &mongodb::error::Error) -> bool {
    const NAMESPACE_EXISTS: i32 = 48;
    matches!(
        *err.kind,
        mongodb::error::ErrorKind::Command(ref command_error) if command_error.code == NAMESPACE_EXISTS
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_connect_rejects_malformed_arguments() {
        let err = connect("localhost:27017", "app").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);

        let err = connect("mongodb://localhost:27017", "").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_unreachable_server_is_connection_error() {
        let config = MongoConnectionConfig::builder()
            .uri("mongodb://127.0.0.1:1")
            .database("app")
            .connect_timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let err = connect_with(&config).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);
    }

    #[test]
    fn test_configured_timeout_wins_over_uri_options() {
        let config = MongoConnectionConfig::builder()
            .uri("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=8000")
            .database("app")
            .connect_timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let started = Instant::now();
        let err = connect_with(&config).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);
        assert!(!err.message().contains("repeated options"), "{}", err.message());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    #[ignore = "requires a running MongoDB at MONGO_URL"]
    fn test_connect_to_live_server() {
        let uri = std::env::var("MONGO_URL").unwrap_or_else(|_| "mongodb://localhost:27017".into());
        let database = connect(&uri, "docmigrate_test").unwrap();
        assert_eq!(database.name(), "docmigrate_test");
    }
}

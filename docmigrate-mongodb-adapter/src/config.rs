use docmigrate::errors::{ErrorKind, MigrateError, MigrateResult};
use mongodb::options::ClientOptions;
use std::time::Duration;

/// Environment variable holding the MongoDB connection string.
pub const MONGO_URL_ENV: &str = "MONGO_URL";

/// Connect and server selection timeout used when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Where and how to connect to MongoDB.
///
/// # Examples
///
/// ```rust
/// use docmigrate_mongodb_adapter::MongoConnectionConfig;
/// use std::time::Duration;
///
/// # fn main() -> docmigrate::errors::MigrateResult<()> {
/// let config = MongoConnectionConfig::builder()
///     .uri("mongodb://localhost:27017")
///     .database("app")
///     .connect_timeout(Duration::from_secs(5))
///     .build()?;
/// assert_eq!(config.database(), "app");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConnectionConfig {
    uri: String,
    database: String,
    connect_timeout: Duration,
}

impl MongoConnectionConfig {
    pub fn builder() -> MongoConnectionConfigBuilder {
        MongoConnectionConfigBuilder::new()
    }

    /// Reads the connection string from `MONGO_URL`.
    pub fn from_env(database: &str) -> MigrateResult<MongoConnectionConfig> {
        let uri = std::env::var(MONGO_URL_ENV).map_err(|_| {
            MigrateError::new(
                &format!("Environment variable {} is not set", MONGO_URL_ENV),
                ErrorKind::ValidationError,
            )
        })?;
        MongoConnectionConfig::builder()
            .uri(&uri)
            .database(database)
            .build()
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Driver options parsed from the connection string, with the connect
    /// and server selection timeouts replaced by `connect_timeout`.
    pub(crate) fn client_options(&self) -> mongodb::error::Result<ClientOptions> {
        let mut options = ClientOptions::parse(&self.uri)?;
        options.connect_timeout = Some(self.connect_timeout);
        options.server_selection_timeout = Some(self.connect_timeout);
        Ok(options)
    }
}

/// Builder for [`MongoConnectionConfig`]. The first invalid value is reported
/// by `build`.
pub struct MongoConnectionConfigBuilder {
    error: Option<MigrateError>,
    uri: Option<String>,
    database: Option<String>,
    connect_timeout: Duration,
}

impl Default for MongoConnectionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MongoConnectionConfigBuilder {
    pub fn new() -> Self {
        MongoConnectionConfigBuilder {
            error: None,
            uri: None,
            database: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn uri(mut self, uri: &str) -> Self {
        if self.error.is_none() {
            if uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://") {
                self.uri = Some(uri.to_string());
            } else {
                self.error = Some(MigrateError::new(
                    &format!("Invalid MongoDB connection string: {}", uri),
                    ErrorKind::ValidationError,
                ));
            }
        }
        self
    }

    pub fn database(mut self, database: &str) -> Self {
        if self.error.is_none() {
            if database.trim().is_empty() || database.contains(['/', '\\', '.', ' ', '"', '$']) {
                self.error = Some(MigrateError::new(
                    &format!("Invalid MongoDB database name: {:?}", database),
                    ErrorKind::ValidationError,
                ));
            } else {
                self.database = Some(database.to_string());
            }
        }
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        if self.error.is_none() {
            if timeout.is_zero() {
                self.error = Some(MigrateError::new(
                    "Connect timeout must be positive",
                    ErrorKind::ValidationError,
                ));
            } else {
                self.connect_timeout = timeout;
            }
        }
        self
    }

    pub fn build(self) -> MigrateResult<MongoConnectionConfig> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri = self.uri.ok_or_else(|| {
            MigrateError::new("MongoDB connection string is not set", ErrorKind::ValidationError)
        })?;
        let database = self.database.ok_or_else(|| {
            MigrateError::new("MongoDB database name is not set", ErrorKind::ValidationError)
        })?;

        Ok(MongoConnectionConfig {
            uri,
            database,
            connect_timeout: self.connect_timeout,
        })
    }
}

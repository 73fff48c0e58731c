use crate::errors::MigrateResult;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// The schema or data change performed by one migration.
///
/// `up` applies the change, `down` reverts it. `migration_type` is a free-form
/// classification (for example `"schema"` or `"data"`) that ends up in the
/// `type` field of the version record written after each step.
///
/// # Examples
///
/// ```rust
/// use docmigrate::errors::MigrateResult;
/// use docmigrate::migration::MigrationHandler;
///
/// struct CreateUsersIndex;
///
/// impl MigrationHandler for CreateUsersIndex {
///     fn up(&self) -> MigrateResult<()> {
///         // create the index
///         Ok(())
///     }
///
///     fn down(&self) -> MigrateResult<()> {
///         // drop the index
///         Ok(())
///     }
///
///     fn migration_type(&self) -> String {
///         "schema".to_string()
///     }
/// }
/// ```
pub trait MigrationHandler: Send + Sync {
    fn up(&self) -> MigrateResult<()>;

    fn down(&self) -> MigrateResult<()>;

    fn migration_type(&self) -> String;
}

type StepFn = Arc<dyn Fn() -> MigrateResult<()> + Send + Sync>;

/// A [`MigrationHandler`] built from two closures.
///
/// ```rust
/// use docmigrate::migration::{FnHandler, MigrationHandler};
///
/// let handler = FnHandler::new("data", || Ok(()), || Ok(()));
/// assert_eq!(handler.migration_type(), "data");
/// ```
#[derive(Clone)]
pub struct FnHandler {
    migration_type: String,
    up: StepFn,
    down: StepFn,
}

impl FnHandler {
    pub fn new<U, D>(migration_type: &str, up: U, down: D) -> Self
    where
        U: Fn() -> MigrateResult<()> + Send + Sync + 'static,
        D: Fn() -> MigrateResult<()> + Send + Sync + 'static,
    {
        FnHandler {
            migration_type: migration_type.to_string(),
            up: Arc::new(up),
            down: Arc::new(down),
        }
    }
}

impl MigrationHandler for FnHandler {
    fn up(&self) -> MigrateResult<()> {
        (self.up)()
    }

    fn down(&self) -> MigrateResult<()> {
        (self.down)()
    }

    fn migration_type(&self) -> String {
        self.migration_type.clone()
    }
}

impl Debug for FnHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler")
            .field("migration_type", &self.migration_type)
            .finish()
    }
}

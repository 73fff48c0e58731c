use docmigrate::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use docmigrate::errors::{ErrorKind, MigrateError, MigrateResult};
use docmigrate::migration::{Migration, MigrationHandler};
use docmigrate::store::VersionStore;
use std::backtrace::Backtrace;
use std::time::{Duration, Instant};
use std::{env, fs, thread};

/// Runs a test with retry logic and error handling.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> MigrateResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> MigrateResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> MigrateResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx.clone())
                        .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Err(e) => {
                        let _ = after(ctx.clone());
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();

        let (error, backtrace) = match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => (e, bt),
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                (format!("Panic: {}", err_msg), Backtrace::capture().to_string())
            }
        };

        if attempt < MAX_RETRIES {
            eprintln!(
                "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                attempt, MAX_RETRIES, elapsed
            );
            eprintln!("Error: {}", error);
            eprintln!("Retrying in {}ms...\n", 100 * attempt);
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
        last_error = Some(error);
        last_backtrace = Some(backtrace);
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Clone)]
pub struct TestContext {
    path: String,
    store: VersionStore,
    journal: Journal,
}

impl TestContext {
    pub fn new(path: String, store: VersionStore) -> Self {
        Self {
            path,
            store,
            journal: Journal::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn store(&self) -> VersionStore {
        self.store.clone()
    }

    /// Journal shared by the handlers created through [`TestContext::handler`].
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn handler(&self, name: &str, migration_type: &str) -> TrackingHandler {
        TrackingHandler::new(name, migration_type, &self.journal)
    }

    /// `[{1, init, H1}, {2, addIndex, H2}, {3, seed, H3}]`
    pub fn scenario(&self) -> Vec<Migration> {
        vec![
            Migration::new(1, "init", self.handler("H1", "schema")),
            Migration::new(2, "addIndex", self.handler("H2", "index")),
            Migration::new(3, "seed", self.handler("H3", "data")),
        ]
    }
}

pub fn init_logging() {
    let _ = colog::default_builder().is_test(true).try_init();
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    let temp_dir = env::temp_dir();
    temp_dir.join(id.to_string()).to_string_lossy().to_string()
}

#[cfg(all(feature = "fjall", not(feature = "memory")))]
pub fn create_test_context() -> MigrateResult<TestContext> {
    use docmigrate_fjall_adapter::FjallVersionStore;

    init_logging();
    let path = random_path();
    let store = FjallVersionStore::with_config()
        .db_path(&path)
        .low_memory_preset()
        .build()?;
    Ok(TestContext::new(path, VersionStore::new(store)))
}

#[cfg(any(feature = "memory", not(feature = "fjall")))]
pub fn create_test_context() -> MigrateResult<TestContext> {
    use docmigrate::store::memory::InMemoryVersionStore;

    init_logging();
    Ok(TestContext::new(
        random_path(),
        VersionStore::new(InMemoryVersionStore::new()),
    ))
}

pub fn cleanup(ctx: TestContext) -> MigrateResult<()> {
    let path = ctx.path().to_string();
    log::debug!("Cleaning up test context at {}", path);
    drop(ctx);

    let max_retries = 10;
    for retry in 0..max_retries {
        if !std::path::Path::new(&path).exists() {
            return Ok(());
        }
        match fs::remove_dir_all(&path) {
            Ok(_) => return Ok(()),
            Err(e) if retry + 1 == max_retries => {
                eprintln!("Warning: Failed to remove test directory {}: {}", path, e);
            }
            Err(_) => thread::sleep(Duration::from_millis(50 * (retry + 1) as u64)),
        }
    }
    Ok(())
}

/// Ordered log of handler invocations, shared between handlers.
#[derive(Clone)]
pub struct Journal {
    events: Atomic<Vec<String>>,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

impl Journal {
    pub fn new() -> Self {
        Journal {
            events: atomic(Vec::new()),
        }
    }

    pub fn record(&self, event: String) {
        self.events.write_with(|events| events.push(event));
    }

    /// Events such as `"up:H1"` or `"down:H2"`, in call order.
    pub fn events(&self) -> Vec<String> {
        self.events.read_with(|events| events.clone())
    }

    pub fn clear(&self) {
        self.events.write_with(|events| events.clear());
    }
}

/// Handler that records every call in a [`Journal`] and can be told to fail.
pub struct TrackingHandler {
    name: String,
    migration_type: String,
    journal: Journal,
    fail_up: bool,
    fail_down: bool,
}

impl TrackingHandler {
    pub fn new(name: &str, migration_type: &str, journal: &Journal) -> Self {
        TrackingHandler {
            name: name.to_string(),
            migration_type: migration_type.to_string(),
            journal: journal.clone(),
            fail_up: false,
            fail_down: false,
        }
    }

    pub fn failing_up(mut self) -> Self {
        self.fail_up = true;
        self
    }

    pub fn failing_down(mut self) -> Self {
        self.fail_down = true;
        self
    }
}

impl MigrationHandler for TrackingHandler {
    fn up(&self) -> MigrateResult<()> {
        if self.fail_up {
            return Err(MigrateError::new(
                &format!("{} failed to apply", self.name),
                ErrorKind::InternalError,
            ));
        }
        self.journal.record(format!("up:{}", self.name));
        Ok(())
    }

    fn down(&self) -> MigrateResult<()> {
        if self.fail_down {
            return Err(MigrateError::new(
                &format!("{} failed to roll back", self.name),
                ErrorKind::InternalError,
            ));
        }
        self.journal.record(format!("down:{}", self.name));
        Ok(())
    }

    fn migration_type(&self) -> String {
        self.migration_type.clone()
    }
}

/// Name of the collection holding the version history when none is configured.
pub const DEFAULT_MIGRATIONS_COLLECTION: &str = "migrations";

/// Step count meaning "every pending migration" for `up`, or "every applied
/// migration" for `down`. Any value `<= 0` behaves the same way.
pub const ALL_AVAILABLE: i64 = -1;

/// Version reported when no record has been written yet.
pub const INITIAL_VERSION: u64 = 0;

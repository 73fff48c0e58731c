//! Pure helpers used by the migrator to plan a run.

use crate::common::INITIAL_VERSION;
use crate::errors::{ErrorKind, MigrateError, MigrateResult};
use crate::migration::Migration;
use itertools::Itertools;

/// The state a rollback lands on: the version and description of the entry
/// preceding the rolled back one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackTarget {
    pub version: u64,
    pub description: String,
}

impl RollbackTarget {
    /// The implicit state before any migration ran.
    pub fn initial() -> Self {
        RollbackTarget {
            version: INITIAL_VERSION,
            description: String::new(),
        }
    }
}

/// Returns where the current version points after rolling back
/// `sorted[index]`.
///
/// That is the predecessor in sorted order, placeholders included, or
/// [`RollbackTarget::initial`] for the first entry. The `type` of the record
/// written for the rollback is not part of the target; it comes from the
/// handler that was rolled back.
///
/// ```rust
/// use docmigrate::migration::{rollback_target, Migration, RollbackTarget};
///
/// let sorted = vec![Migration::placeholder(1, "init"), Migration::placeholder(4, "seed")];
/// assert_eq!(rollback_target(&sorted, 1).version, 1);
/// assert_eq!(rollback_target(&sorted, 0), RollbackTarget::initial());
/// ```
pub fn rollback_target(sorted: &[Migration], index: usize) -> RollbackTarget {
    match index.checked_sub(1).and_then(|previous| sorted.get(previous)) {
        Some(previous) => RollbackTarget {
            version: previous.version(),
            description: previous.description().to_string(),
        },
        None => RollbackTarget::initial(),
    }
}

/// Turns a requested step count into the number of steps to run.
///
/// `n <= 0` and `n` larger than the registry both mean "all".
pub(crate) fn normalize_steps(n: i64, registry_len: usize) -> usize {
    if n <= 0 {
        return registry_len;
    }
    match usize::try_from(n) {
        Ok(steps) if steps <= registry_len => steps,
        _ => registry_len,
    }
}

/// Sorts ascending by version; equal versions keep their relative order.
pub(crate) fn sort_registry(migrations: &mut [Migration]) {
    migrations.sort_by_key(|migration| migration.version());
}

/// Rejects registries that use a version more than once.
pub(crate) fn validate_unique_versions(migrations: &[Migration]) -> MigrateResult<()> {
    let duplicates: Vec<u64> = migrations
        .iter()
        .map(|migration| migration.version())
        .duplicates()
        .sorted()
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(MigrateError::new(
            &format!(
                "Duplicate migration versions in registry: {}",
                duplicates.iter().join(", ")
            ),
            ErrorKind::ValidationError,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(versions: &[u64]) -> Vec<Migration> {
        versions
            .iter()
            .map(|v| Migration::placeholder(*v, &format!("m{}", v)))
            .collect()
    }

    #[test]
    fn rollback_target_of_first_entry_is_initial_state() {
        let sorted = registry(&[1, 2, 3]);
        let target = rollback_target(&sorted, 0);
        assert_eq!(target.version, 0);
        assert_eq!(target.description, "");
    }

    #[test]
    fn rollback_target_is_predecessor() {
        let sorted = registry(&[1, 5, 9]);
        assert_eq!(
            rollback_target(&sorted, 2),
            RollbackTarget {
                version: 5,
                description: "m5".to_string()
            }
        );
        assert_eq!(rollback_target(&sorted, 1).version, 1);
    }

    #[test]
    fn rollback_target_out_of_range_index_uses_last_entry_as_predecessor() {
        let sorted = registry(&[1, 2]);
        assert_eq!(rollback_target(&sorted, 2).version, 2);
        assert_eq!(rollback_target(&sorted, 10), RollbackTarget::initial());
    }

    #[test]
    fn rollback_target_on_empty_registry() {
        assert_eq!(rollback_target(&[], 0), RollbackTarget::initial());
    }

    #[test]
    fn normalize_steps_non_positive_means_all() {
        assert_eq!(normalize_steps(0, 4), 4);
        assert_eq!(normalize_steps(-1, 4), 4);
        assert_eq!(normalize_steps(i64::MIN, 4), 4);
    }

    #[test]
    fn normalize_steps_caps_at_registry_size() {
        assert_eq!(normalize_steps(10, 4), 4);
        assert_eq!(normalize_steps(i64::MAX, 4), 4);
    }

    #[test]
    fn normalize_steps_keeps_valid_counts() {
        assert_eq!(normalize_steps(1, 4), 1);
        assert_eq!(normalize_steps(4, 4), 4);
    }

    #[test]
    fn normalize_steps_empty_registry() {
        assert_eq!(normalize_steps(3, 0), 0);
        assert_eq!(normalize_steps(-1, 0), 0);
    }

    #[test]
    fn sort_registry_orders_by_version() {
        let mut migrations = registry(&[10, 2, 7, 1]);
        sort_registry(&mut migrations);
        let versions: Vec<u64> = migrations.iter().map(|m| m.version()).collect();
        assert_eq!(versions, vec![1, 2, 7, 10]);
    }

    #[test]
    fn sort_registry_is_stable() {
        let mut migrations = vec![
            Migration::placeholder(2, "first"),
            Migration::placeholder(1, "one"),
            Migration::placeholder(2, "second"),
        ];
        sort_registry(&mut migrations);
        let descriptions: Vec<&str> = migrations.iter().map(|m| m.description()).collect();
        assert_eq!(descriptions, vec!["one", "first", "second"]);
    }

    #[test]
    fn validate_unique_versions_accepts_gaps() {
        assert!(validate_unique_versions(&registry(&[1, 5, 100])).is_ok());
        assert!(validate_unique_versions(&[]).is_ok());
    }

    #[test]
    fn validate_unique_versions_reports_duplicates() {
        let err = validate_unique_versions(&registry(&[3, 1, 3, 2, 1, 3])).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert_eq!(err.message(), "Duplicate migration versions in registry: 1, 3");
    }
}

//! Ordered migration plans.

use std::path::Path;

use crate::error::{MigrationError, MigrationResult};
use crate::key::MigrationKey;
use crate::migration::Migration;
use crate::script;

/// The full, ordered set of migrations known to a runner.
///
/// Construction sorts by key and rejects duplicates, so a plan is always
/// a strict chronological sequence. The runner compares the ledger against
/// this sequence to decide what still needs to run.
pub struct MigrationPlan {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationPlan {
    /// Builds a plan from arbitrary migrations.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::DuplicateKey`] when two migrations share
    /// a key.
    pub fn new(mut migrations: Vec<Box<dyn Migration>>) -> MigrationResult<Self> {
        migrations.sort_by(|a, b| a.key().cmp(b.key()));
        for pair in migrations.windows(2) {
            if pair[0].key() == pair[1].key() {
                return Err(MigrationError::DuplicateKey {
                    key: pair[0].key().clone(),
                });
            }
        }
        Ok(Self { migrations })
    }

    /// Builds a plan from every script in a directory.
    pub fn from_dir(dir: &Path) -> MigrationResult<Self> {
        let scripts = script::load_dir(dir)?;
        Self::new(
            scripts
                .into_iter()
                .map(|s| Box::new(s) as Box<dyn Migration>)
                .collect(),
        )
    }

    /// Number of migrations in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Whether the plan is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Iterates migrations in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(AsRef::as_ref)
    }

    /// Returns the migration with the given key, if the plan knows it.
    #[must_use]
    pub fn get(&self, key: &MigrationKey) -> Option<&dyn Migration> {
        self.migrations
            .iter()
            .find(|m| m.key() == key)
            .map(AsRef::as_ref)
    }

    /// The keys of the plan, in order.
    pub fn keys(&self) -> impl Iterator<Item = &MigrationKey> {
        self.migrations.iter().map(|m| m.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::testing::FakeMigration;

    fn boxed(key: &str) -> Box<dyn Migration> {
        Box::new(FakeMigration::new(key, "c"))
    }

    #[test]
    fn test_plan_sorts_by_key() {
        let plan = MigrationPlan::new(vec![
            boxed("20240202000000_b"),
            boxed("20240101120000_a"),
        ])
        .unwrap();
        let keys: Vec<_> = plan.keys().map(MigrationKey::as_str).collect();
        assert_eq!(keys, ["20240101120000_a", "20240202000000_b"]);
    }

    #[test]
    fn test_plan_rejects_duplicate_keys() {
        let result = MigrationPlan::new(vec![
            boxed("20240101120000_a"),
            boxed("20240101120000_a"),
        ]);
        assert!(matches!(result, Err(MigrationError::DuplicateKey { .. })));
    }

    #[test]
    fn test_get_finds_by_key() {
        let plan = MigrationPlan::new(vec![boxed("20240101120000_a")]).unwrap();
        let key: MigrationKey = "20240101120000_a".parse().unwrap();
        assert!(plan.get(&key).is_some());
        let other: MigrationKey = "20240101120000_b".parse().unwrap();
        assert!(plan.get(&other).is_none());
    }
}

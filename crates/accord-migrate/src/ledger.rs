//! The persistent migration ledger.
//!
//! The ledger lives inside the store it describes, as documents named
//! `ledger.{key}` in the `__accord` system collection. Because migration
//! keys are fixed-width timestamp-prefixed, ascending document-ID order is
//! chronological order and the ledger never needs a separate index.
//!
//! A migration has no ledger entry until a run touches it. The entry is
//! written in the applying state before the first step executes and
//! rewritten as applied after the last one, so a crash mid-apply leaves an
//! applying marker behind as evidence.

use std::fmt;

use accord_store::{ListOptions, Store, SYSTEM_COLLECTION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MigrationResult;
use crate::key::MigrationKey;

/// Document ID prefix for ledger entries within the system collection.
pub const LEDGER_PREFIX: &str = "ledger.";

/// Execution state recorded for a migration.
///
/// A migration with no ledger entry at all is pending; that state is never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    /// The migration started applying and has not finished.
    Applying,
    /// The migration applied completely.
    Applied,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applying => f.write_str("applying"),
            Self::Applied => f.write_str("applied"),
        }
    }
}

/// One persisted ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The migration this entry describes.
    pub key: MigrationKey,
    /// Where execution got to.
    pub state: MigrationState,
    /// Content digest captured when the apply started, if the migration
    /// has one.
    pub checksum: Option<String>,
    /// When the apply completed. `None` while applying.
    pub applied_at: Option<DateTime<Utc>>,
}

/// Read/write access to the ledger within one store.
pub struct Ledger<'a> {
    store: &'a dyn Store,
}

impl<'a> Ledger<'a> {
    /// Opens the ledger over `store`, creating the system collection if
    /// this store has never been migrated.
    pub async fn open(store: &'a dyn Store) -> MigrationResult<Ledger<'a>> {
        store.create_collection(SYSTEM_COLLECTION).await?;
        Ok(Self { store })
    }

    fn doc_id(key: &MigrationKey) -> String {
        format!("{LEDGER_PREFIX}{key}")
    }

    /// Returns all entries in chronological (key) order.
    pub async fn entries(&self) -> MigrationResult<Vec<LedgerEntry>> {
        let docs = self
            .store
            .list(SYSTEM_COLLECTION, ListOptions::default())
            .await?;
        let mut entries = Vec::new();
        for doc in docs {
            if !doc.id.starts_with(LEDGER_PREFIX) {
                continue;
            }
            entries.push(doc.body_as::<LedgerEntry>()?);
        }
        Ok(entries)
    }

    /// Returns the entry for `key`, if any.
    pub async fn get(&self, key: &MigrationKey) -> MigrationResult<Option<LedgerEntry>> {
        let doc = self.store.get(SYSTEM_COLLECTION, &Self::doc_id(key)).await?;
        match doc {
            Some(doc) => Ok(Some(doc.body_as::<LedgerEntry>()?)),
            None => Ok(None),
        }
    }

    /// Records that `key` has started applying.
    pub async fn mark_applying(
        &self,
        key: &MigrationKey,
        checksum: Option<String>,
    ) -> MigrationResult<()> {
        let entry = LedgerEntry {
            key: key.clone(),
            state: MigrationState::Applying,
            checksum,
            applied_at: None,
        };
        self.write(&entry).await
    }

    /// Records that `key` finished applying.
    pub async fn mark_applied(&self, key: &MigrationKey) -> MigrationResult<()> {
        let mut entry = self.get(key).await?.unwrap_or(LedgerEntry {
            key: key.clone(),
            state: MigrationState::Applying,
            checksum: None,
            applied_at: None,
        });
        entry.state = MigrationState::Applied;
        entry.applied_at = Some(Utc::now());
        self.write(&entry).await
    }

    /// Removes the entry for `key`, returning it to pending.
    pub async fn remove(&self, key: &MigrationKey) -> MigrationResult<()> {
        self.store
            .delete(SYSTEM_COLLECTION, &Self::doc_id(key))
            .await?;
        Ok(())
    }

    async fn write(&self, entry: &LedgerEntry) -> MigrationResult<()> {
        let body = serde_json::to_value(entry)?;
        self.store
            .put(SYSTEM_COLLECTION, &Self::doc_id(&entry.key), body)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use accord_store::MemoryStore;

    use super::*;

    fn key(s: &str) -> MigrationKey {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_system_collection() {
        let store = MemoryStore::new();
        Ledger::open(&store).await.unwrap();
        assert!(store
            .collections()
            .await
            .unwrap()
            .contains(&SYSTEM_COLLECTION.to_string()));
    }

    #[tokio::test]
    async fn test_applying_then_applied_lifecycle() {
        let store = MemoryStore::new();
        let ledger = Ledger::open(&store).await.unwrap();
        let k = key("20240101120000_create_notes");

        assert!(ledger.get(&k).await.unwrap().is_none());

        ledger.mark_applying(&k, Some("abc".to_string())).await.unwrap();
        let entry = ledger.get(&k).await.unwrap().unwrap();
        assert_eq!(entry.state, MigrationState::Applying);
        assert_eq!(entry.checksum.as_deref(), Some("abc"));
        assert!(entry.applied_at.is_none());

        ledger.mark_applied(&k).await.unwrap();
        let entry = ledger.get(&k).await.unwrap().unwrap();
        assert_eq!(entry.state, MigrationState::Applied);
        assert_eq!(entry.checksum.as_deref(), Some("abc"));
        assert!(entry.applied_at.is_some());
    }

    #[tokio::test]
    async fn test_remove_returns_migration_to_pending() {
        let store = MemoryStore::new();
        let ledger = Ledger::open(&store).await.unwrap();
        let k = key("20240101120000_create_notes");

        ledger.mark_applying(&k, None).await.unwrap();
        ledger.mark_applied(&k).await.unwrap();
        ledger.remove(&k).await.unwrap();
        assert!(ledger.get(&k).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_come_back_in_key_order() {
        let store = MemoryStore::new();
        let ledger = Ledger::open(&store).await.unwrap();
        let later = key("20240202000000_add_sizes");
        let earlier = key("20240101120000_create_notes");

        ledger.mark_applying(&later, None).await.unwrap();
        ledger.mark_applying(&earlier, None).await.unwrap();

        let entries = ledger.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, earlier);
        assert_eq!(entries[1].key, later);
    }

    #[tokio::test]
    async fn test_entries_ignore_other_system_documents() {
        let store = MemoryStore::new();
        let ledger = Ledger::open(&store).await.unwrap();
        store
            .put(SYSTEM_COLLECTION, "lock", serde_json::json!({"holder": "x"}))
            .await
            .unwrap();
        ledger
            .mark_applying(&key("20240101120000_create_notes"), None)
            .await
            .unwrap();

        assert_eq!(ledger.entries().await.unwrap().len(), 1);
    }
}

//! Script migrations loaded from disk.
//!
//! A script migration is a JSON file named `{key}.json` whose body lists
//! declarative [`Step`]s. The file's raw bytes are digested (SHA-1,
//! base64) at load time; the ledger pins that digest when the migration is
//! applied, so editing an already-applied script is detected instead of
//! silently ignored.

use std::fs;
use std::path::Path;

use accord_store::Store;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::error::{MigrationError, MigrationResult};
use crate::key::MigrationKey;
use crate::migration::{Migration, MigrationFuture};
use crate::steps::{StashSlot, Step};

/// File extension recognized by [`load_dir`].
pub const SCRIPT_EXTENSION: &str = "json";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptFile {
    steps: Vec<Step>,
}

/// A [`Migration`] defined by a JSON step script.
pub struct ScriptMigration {
    key: MigrationKey,
    steps: Vec<Step>,
    checksum: String,
}

impl ScriptMigration {
    /// Parses a script from its JSON source.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Script`] when the JSON does not describe
    /// a step list.
    pub fn from_json_str(key: MigrationKey, source: &str) -> MigrationResult<Self> {
        let file: ScriptFile = serde_json::from_str(source)?;
        Ok(Self {
            key,
            steps: file.steps,
            checksum: digest(source.as_bytes()),
        })
    }

    /// Loads one script file, deriving the key from the file stem.
    pub fn load_file(path: &Path) -> MigrationResult<Self> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let key: MigrationKey = stem.parse()?;
        let source = fs::read_to_string(path)?;
        Self::from_json_str(key, &source)
    }

    /// The steps this script will run, in order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Collection holding this migration's undo records while it is
    /// applied.
    #[must_use]
    pub fn stash_collection(&self) -> String {
        format!("__stash_{}", self.key)
    }
}

impl Migration for ScriptMigration {
    fn key(&self) -> &MigrationKey {
        &self.key
    }

    fn checksum(&self) -> Option<String> {
        Some(self.checksum.clone())
    }

    fn apply<'a>(&'a self, store: &'a dyn Store) -> MigrationFuture<'a> {
        Box::pin(async move {
            let stash = self.stash_collection();
            store.create_collection(&stash).await?;
            for (index, step) in self.steps.iter().enumerate() {
                step.apply(store, StashSlot::new(&stash, index))
                    .await
                    .map_err(|err| MigrationError::StepFailed {
                        key: self.key.clone(),
                        step: index,
                        message: err.to_string(),
                    })?;
            }
            Ok(())
        })
    }

    fn revert<'a>(&'a self, store: &'a dyn Store) -> MigrationFuture<'a> {
        Box::pin(async move {
            let stash = self.stash_collection();
            for (index, step) in self.steps.iter().enumerate().rev() {
                step.revert(store, StashSlot::new(&stash, index))
                    .await
                    .map_err(|err| MigrationError::RevertFailed {
                        key: self.key.clone(),
                        step: index,
                        message: err.to_string(),
                    })?;
            }
            store.drop_collection(&stash).await?;
            Ok(())
        })
    }
}

/// Loads every `*.json` script in a directory, sorted by key.
///
/// Non-script files are skipped; a script whose stem is not a valid key is
/// an error, since silently skipping it would change what "everything
/// applied" means.
pub fn load_dir(dir: &Path) -> MigrationResult<Vec<ScriptMigration>> {
    let mut scripts = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
            continue;
        }
        scripts.push(ScriptMigration::load_file(&path)?);
    }
    scripts.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(scripts)
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    BASE64.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use accord_store::MemoryStore;
    use serde_json::json;

    use super::*;

    const SCRIPT: &str = r#"{
        "steps": [
            { "op": "create_collection", "collection": "notes" },
            { "op": "add_field", "collection": "notes", "field": "size", "default": 0 }
        ]
    }"#;

    fn key(s: &str) -> MigrationKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_parses_steps_in_order() {
        let script =
            ScriptMigration::from_json_str(key("20240101120000_create_notes"), SCRIPT).unwrap();
        assert_eq!(script.steps().len(), 2);
        assert_eq!(script.steps()[0].collection(), "notes");
    }

    #[test]
    fn test_checksum_tracks_content() {
        let k = key("20240101120000_create_notes");
        let a = ScriptMigration::from_json_str(k.clone(), SCRIPT).unwrap();
        let b = ScriptMigration::from_json_str(k.clone(), SCRIPT).unwrap();
        assert_eq!(a.checksum(), b.checksum());

        let edited = SCRIPT.replace("size", "length");
        let c = ScriptMigration::from_json_str(k, &edited).unwrap();
        assert_ne!(a.checksum(), c.checksum());
    }

    #[test]
    fn test_rejects_unknown_top_level_fields() {
        let source = r#"{ "steps": [], "extra": true }"#;
        assert!(ScriptMigration::from_json_str(key("20240101120000_x"), source).is_err());
    }

    #[tokio::test]
    async fn test_apply_then_revert_round_trips() {
        let store = MemoryStore::new();
        let script =
            ScriptMigration::from_json_str(key("20240101120000_create_notes"), SCRIPT).unwrap();

        script.apply(&store).await.unwrap();
        assert!(store.collections().await.unwrap().contains(&"notes".to_string()));

        script.revert(&store).await.unwrap();
        assert!(!store.collections().await.unwrap().contains(&"notes".to_string()));
        // The stash is drained on revert.
        assert!(!store
            .collections()
            .await
            .unwrap()
            .contains(&script.stash_collection()));
    }

    #[tokio::test]
    async fn test_failed_step_reports_its_index() {
        let store = MemoryStore::new();
        // Second step targets a collection that does not exist.
        let source = r#"{
            "steps": [
                { "op": "create_collection", "collection": "notes" },
                { "op": "add_field", "collection": "missing", "field": "x", "default": null }
            ]
        }"#;
        let script =
            ScriptMigration::from_json_str(key("20240101120000_bad"), source).unwrap();
        let err = script.apply(&store).await.unwrap_err();
        match err {
            MigrationError::StepFailed { step, .. } => assert_eq!(step, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_dir_sorts_by_key_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("20240202000000_add_sizes.json"),
            r#"{ "steps": [] }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("20240101120000_create_notes.json"),
            r#"{ "steps": [] }"#,
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "notes").unwrap();

        let scripts = load_dir(dir.path()).unwrap();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].key().as_str(), "20240101120000_create_notes");
        assert_eq!(scripts[1].key().as_str(), "20240202000000_add_sizes");
    }

    #[test]
    fn test_load_dir_rejects_bad_key_stems() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("not-a-key.json"), r#"{ "steps": [] }"#).unwrap();
        assert!(load_dir(dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_destructive_step_round_trip_preserves_data() {
        let store = MemoryStore::new();
        store.create_collection("notes").await.unwrap();
        store
            .insert("notes", "a", json!({"name": "first", "size": 3}))
            .await
            .unwrap();

        let source = r#"{
            "steps": [
                { "op": "remove_field", "collection": "notes", "field": "size" },
                { "op": "rename_field", "collection": "notes", "from": "name", "to": "title" }
            ]
        }"#;
        let script =
            ScriptMigration::from_json_str(key("20240101120000_reshape"), source).unwrap();

        script.apply(&store).await.unwrap();
        let doc = store.get("notes", "a").await.unwrap().unwrap();
        assert_eq!(doc.body["title"], "first");
        assert!(doc.body.get("size").is_none());

        script.revert(&store).await.unwrap();
        let doc = store.get("notes", "a").await.unwrap().unwrap();
        assert_eq!(doc.body["name"], "first");
        assert_eq!(doc.body["size"], 3);
        assert!(doc.body.get("title").is_none());
    }
}

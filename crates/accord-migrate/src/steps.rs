//! Declarative migration steps.
//!
//! A [`Step`] describes one storage change with a derivable inverse.
//! Destructive steps (dropping a collection, removing a field) stash the
//! data they destroy under a per-migration stash collection while the
//! migration is applied, which is what makes `revert(apply(state)) ==
//! state` hold even for them. Reverting a migration drains its stash.
//!
//! Every step records exactly which documents it touched, so its inverse
//! restores only those. A document that already carried a field before an
//! `add_field` ran is untouched in both directions.

use accord_store::{Document, ListOptions, Store, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::MigrationResult;

/// One declarative storage change within a script migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Creates a collection if it does not exist.
    CreateCollection {
        /// Collection to create.
        collection: String,
    },
    /// Drops a collection, stashing its documents for revert.
    DropCollection {
        /// Collection to drop.
        collection: String,
    },
    /// Adds a field with a default value to documents lacking it.
    AddField {
        /// Collection to modify.
        collection: String,
        /// Field name to add.
        field: String,
        /// Value written into documents that lack the field.
        default: Value,
    },
    /// Removes a field, stashing the removed values for revert.
    RemoveField {
        /// Collection to modify.
        collection: String,
        /// Field name to remove.
        field: String,
    },
    /// Renames a field in documents that carry it.
    RenameField {
        /// Collection to modify.
        collection: String,
        /// Current field name.
        from: String,
        /// New field name.
        to: String,
    },
}

/// Where one step keeps its undo records within the migration's stash
/// collection.
///
/// Document IDs are prefixed per step index (`s0.m` for the step's
/// metadata, `s0.d.<id>` for stashed document data), so the steps of one
/// migration share a single stash collection without colliding.
#[derive(Debug, Clone, Copy)]
pub struct StashSlot<'a> {
    collection: &'a str,
    index: usize,
}

impl<'a> StashSlot<'a> {
    /// Creates the slot for step `index` within `collection`.
    #[must_use]
    pub const fn new(collection: &'a str, index: usize) -> Self {
        Self { collection, index }
    }

    fn meta_id(&self) -> String {
        format!("s{}.m", self.index)
    }

    fn data_id(&self, id: &str) -> String {
        format!("s{}.d.{id}", self.index)
    }

    async fn write_meta(&self, store: &dyn Store, meta: Value) -> StoreResult<()> {
        store.put(self.collection, &self.meta_id(), meta).await?;
        Ok(())
    }

    async fn read_meta(&self, store: &dyn Store) -> StoreResult<Option<Value>> {
        Ok(store
            .get(self.collection, &self.meta_id())
            .await?
            .map(|doc| doc.body))
    }
}

impl Step {
    /// Returns the collection this step touches.
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::CreateCollection { collection }
            | Self::DropCollection { collection }
            | Self::AddField { collection, .. }
            | Self::RemoveField { collection, .. }
            | Self::RenameField { collection, .. } => collection,
        }
    }

    /// Applies this step, leaving undo records in `slot`.
    pub async fn apply(&self, store: &dyn Store, slot: StashSlot<'_>) -> MigrationResult<()> {
        match self {
            Self::CreateCollection { collection } => {
                let created = store.create_collection(collection).await?;
                slot.write_meta(store, json!({ "created": created })).await?;
            }
            Self::DropCollection { collection } => {
                let existed = store
                    .collections()
                    .await?
                    .iter()
                    .any(|name| name == collection);
                let mut count = 0u64;
                if existed {
                    for doc in all_documents(store, collection).await? {
                        store
                            .put(
                                slot.collection,
                                &slot.data_id(&doc.id),
                                json!({ "id": doc.id, "body": doc.body }),
                            )
                            .await?;
                        count += 1;
                    }
                    store.drop_collection(collection).await?;
                }
                slot.write_meta(store, json!({ "existed": existed, "count": count }))
                    .await?;
            }
            Self::AddField {
                collection,
                field,
                default,
            } => {
                let mut touched = Vec::new();
                for doc in all_documents(store, collection).await? {
                    let Some(object) = doc.body.as_object() else {
                        continue;
                    };
                    if object.contains_key(field) {
                        continue;
                    }
                    let mut body = object.clone();
                    body.insert(field.clone(), default.clone());
                    store.put(collection, &doc.id, Value::Object(body)).await?;
                    touched.push(doc.id);
                }
                slot.write_meta(store, json!({ "ids": touched })).await?;
            }
            Self::RemoveField { collection, field } => {
                let mut touched = Vec::new();
                for doc in all_documents(store, collection).await? {
                    let Some(object) = doc.body.as_object() else {
                        continue;
                    };
                    let Some(removed) = object.get(field) else {
                        continue;
                    };
                    store
                        .put(
                            slot.collection,
                            &slot.data_id(&doc.id),
                            json!({ "value": removed }),
                        )
                        .await?;
                    let mut body = object.clone();
                    body.remove(field);
                    store.put(collection, &doc.id, Value::Object(body)).await?;
                    touched.push(doc.id);
                }
                slot.write_meta(store, json!({ "ids": touched })).await?;
            }
            Self::RenameField {
                collection,
                from,
                to,
            } => {
                let mut touched = Vec::new();
                for doc in all_documents(store, collection).await? {
                    let Some(object) = doc.body.as_object() else {
                        continue;
                    };
                    if !object.contains_key(from) || object.contains_key(to) {
                        continue;
                    }
                    let mut body = object.clone();
                    if let Some(value) = body.remove(from) {
                        body.insert(to.clone(), value);
                    }
                    store.put(collection, &doc.id, Value::Object(body)).await?;
                    touched.push(doc.id);
                }
                slot.write_meta(store, json!({ "ids": touched })).await?;
            }
        }
        Ok(())
    }

    /// Reverts this step using the undo records left by [`Step::apply`].
    ///
    /// A missing undo record means the step never ran, so there is nothing
    /// to undo.
    pub async fn revert(&self, store: &dyn Store, slot: StashSlot<'_>) -> MigrationResult<()> {
        let Some(meta) = slot.read_meta(store).await? else {
            return Ok(());
        };

        match self {
            Self::CreateCollection { collection } => {
                if meta["created"].as_bool() == Some(true) {
                    store.drop_collection(collection).await?;
                }
            }
            Self::DropCollection { collection } => {
                if meta["existed"].as_bool() == Some(true) {
                    store.create_collection(collection).await?;
                    let prefix = format!("s{}.d.", slot.index);
                    for doc in all_documents(store, slot.collection).await? {
                        if !doc.id.starts_with(&prefix) {
                            continue;
                        }
                        let id = doc.body["id"].as_str().unwrap_or_default().to_string();
                        store
                            .put(collection, &id, doc.body["body"].clone())
                            .await?;
                    }
                }
            }
            Self::AddField {
                collection, field, ..
            } => {
                for id in meta_ids(&meta) {
                    let Some(doc) = store.get(collection, &id).await? else {
                        continue;
                    };
                    let Some(object) = doc.body.as_object() else {
                        continue;
                    };
                    let mut body = object.clone();
                    body.remove(field);
                    store.put(collection, &id, Value::Object(body)).await?;
                }
            }
            Self::RemoveField { collection, field } => {
                for id in meta_ids(&meta) {
                    let Some(stashed) = store.get(slot.collection, &slot.data_id(&id)).await?
                    else {
                        continue;
                    };
                    let Some(doc) = store.get(collection, &id).await? else {
                        continue;
                    };
                    let Some(object) = doc.body.as_object() else {
                        continue;
                    };
                    let mut body = object.clone();
                    body.insert(field.clone(), stashed.body["value"].clone());
                    store.put(collection, &id, Value::Object(body)).await?;
                }
            }
            Self::RenameField {
                collection,
                from,
                to,
            } => {
                for id in meta_ids(&meta) {
                    let Some(doc) = store.get(collection, &id).await? else {
                        continue;
                    };
                    let Some(object) = doc.body.as_object() else {
                        continue;
                    };
                    let mut body = object.clone();
                    if let Some(value) = body.remove(to) {
                        body.insert(from.clone(), value);
                    }
                    store.put(collection, &id, Value::Object(body)).await?;
                }
            }
        }
        Ok(())
    }
}

fn meta_ids(meta: &Value) -> Vec<String> {
    meta["ids"]
        .as_array()
        .map(|ids| {
            ids.iter()
                .filter_map(|id| id.as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
}

async fn all_documents(store: &dyn Store, collection: &str) -> StoreResult<Vec<Document>> {
    store.list(collection, ListOptions::default()).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use accord_store::MemoryStore;

    use super::*;

    const STASH: &str = "__stash_test";

    async fn store_with_notes() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.create_collection("notes").await.unwrap();
        store.create_collection(STASH).await.unwrap();
        store
            .insert("notes", "a", json!({"name": "first"}))
            .await
            .unwrap();
        store
            .insert("notes", "b", json!({"name": "second", "size": 2}))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_add_field_skips_existing_and_round_trips() {
        let store = store_with_notes().await;
        let step = Step::AddField {
            collection: "notes".to_string(),
            field: "size".to_string(),
            default: json!(0),
        };
        let slot = StashSlot::new(STASH, 0);

        step.apply(store.as_ref(), slot).await.unwrap();
        assert_eq!(store.get("notes", "a").await.unwrap().unwrap().body["size"], 0);
        // Pre-existing value untouched.
        assert_eq!(store.get("notes", "b").await.unwrap().unwrap().body["size"], 2);

        step.revert(store.as_ref(), slot).await.unwrap();
        let a = store.get("notes", "a").await.unwrap().unwrap();
        assert!(a.body.get("size").is_none());
        // The untouched document keeps its field through revert.
        assert_eq!(store.get("notes", "b").await.unwrap().unwrap().body["size"], 2);
    }

    #[tokio::test]
    async fn test_remove_field_stashes_and_restores() {
        let store = store_with_notes().await;
        let step = Step::RemoveField {
            collection: "notes".to_string(),
            field: "name".to_string(),
        };
        let slot = StashSlot::new(STASH, 0);

        step.apply(store.as_ref(), slot).await.unwrap();
        assert!(store.get("notes", "a").await.unwrap().unwrap().body.get("name").is_none());

        step.revert(store.as_ref(), slot).await.unwrap();
        assert_eq!(
            store.get("notes", "a").await.unwrap().unwrap().body["name"],
            "first"
        );
        assert_eq!(
            store.get("notes", "b").await.unwrap().unwrap().body["name"],
            "second"
        );
    }

    #[tokio::test]
    async fn test_drop_collection_restores_documents() {
        let store = store_with_notes().await;
        let step = Step::DropCollection {
            collection: "notes".to_string(),
        };
        let slot = StashSlot::new(STASH, 0);

        step.apply(store.as_ref(), slot).await.unwrap();
        assert!(!store.collections().await.unwrap().contains(&"notes".to_string()));

        step.revert(store.as_ref(), slot).await.unwrap();
        let docs = store.list("notes", ListOptions::default()).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].body["name"], "first");
    }

    #[tokio::test]
    async fn test_create_collection_revert_drops_only_when_created() {
        let store = store_with_notes().await;
        let step = Step::CreateCollection {
            collection: "notes".to_string(),
        };
        let slot = StashSlot::new(STASH, 0);

        // Collection pre-existed, so revert must not drop it.
        step.apply(store.as_ref(), slot).await.unwrap();
        step.revert(store.as_ref(), slot).await.unwrap();
        assert!(store.collections().await.unwrap().contains(&"notes".to_string()));

        let step = Step::CreateCollection {
            collection: "tags".to_string(),
        };
        let slot = StashSlot::new(STASH, 1);
        step.apply(store.as_ref(), slot).await.unwrap();
        assert!(store.collections().await.unwrap().contains(&"tags".to_string()));
        step.revert(store.as_ref(), slot).await.unwrap();
        assert!(!store.collections().await.unwrap().contains(&"tags".to_string()));
    }

    #[tokio::test]
    async fn test_rename_field_round_trips() {
        let store = store_with_notes().await;
        let step = Step::RenameField {
            collection: "notes".to_string(),
            from: "name".to_string(),
            to: "title".to_string(),
        };
        let slot = StashSlot::new(STASH, 0);

        step.apply(store.as_ref(), slot).await.unwrap();
        let a = store.get("notes", "a").await.unwrap().unwrap();
        assert_eq!(a.body["title"], "first");
        assert!(a.body.get("name").is_none());

        step.revert(store.as_ref(), slot).await.unwrap();
        let a = store.get("notes", "a").await.unwrap().unwrap();
        assert_eq!(a.body["name"], "first");
        assert!(a.body.get("title").is_none());
    }

    #[test]
    fn test_step_serde_shape() {
        let step = Step::AddField {
            collection: "notes".to_string(),
            field: "size".to_string(),
            default: json!(0),
        };
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["op"], "add_field");
        let back: Step = serde_json::from_value(value).unwrap();
        assert_eq!(back, step);
    }
}

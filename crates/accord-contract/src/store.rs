//! Loading contracts from disk.
//!
//! A service's contract may be a single JSON document or a directory of
//! per-domain documents sharing the same `service` and `version` header.
//! Directory loads are merged: a schema defined identically in two documents
//! de-duplicates silently, while two definitions of the same name with
//! different shapes fail the merge.

use crate::contract::{Contract, ContractDocument};
use crate::error::ContractError;
use std::path::Path;

/// Parses a contract from a JSON string.
pub fn from_json_str(raw: &str) -> Result<Contract, ContractError> {
    let document: ContractDocument = serde_json::from_str(raw)?;
    Contract::from_document(document)
}

/// Loads a contract from a single JSON file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Contract, ContractError> {
    let raw = std::fs::read_to_string(path)?;
    from_json_str(&raw)
}

/// Loads and merges every `*.json` document in a directory.
///
/// Documents are read in file name order so the merged endpoint list is
/// stable across runs.
pub fn load_dir(path: impl AsRef<Path>) -> Result<Contract, ContractError> {
    let mut entries: Vec<_> = std::fs::read_dir(path)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    if entries.is_empty() {
        return Err(ContractError::invalid(
            "directory contains no contract documents",
        ));
    }

    let mut documents = Vec::with_capacity(entries.len());
    for entry in entries {
        let raw = std::fs::read_to_string(&entry)?;
        let document: ContractDocument = serde_json::from_str(&raw)?;
        documents.push(document);
    }

    let merged = merge_documents(documents)?;
    Contract::from_document(merged)
}

/// Loads a contract from a file or a directory of documents.
pub fn load_path(path: impl AsRef<Path>) -> Result<Contract, ContractError> {
    let path = path.as_ref();
    if path.is_dir() {
        load_dir(path)
    } else {
        load_file(path)
    }
}

/// Merges per-domain documents into one.
///
/// All documents must agree on `service` and `version`. Schemas merge under
/// the collision rule; endpoints concatenate (operation uniqueness is checked
/// when the merged contract is built).
pub fn merge_documents(
    documents: Vec<ContractDocument>,
) -> Result<ContractDocument, ContractError> {
    let mut iter = documents.into_iter();
    let Some(mut merged) = iter.next() else {
        return Err(ContractError::invalid("no contract documents to merge"));
    };

    for document in iter {
        if document.service != merged.service {
            return Err(ContractError::invalid(format!(
                "documents disagree on service: '{}' vs '{}'",
                merged.service, document.service
            )));
        }
        if document.version != merged.version {
            return Err(ContractError::invalid(format!(
                "documents disagree on version: '{}' vs '{}'",
                merged.version, document.version
            )));
        }

        for (name, schema) in document.schemas {
            match merged.schemas.get(&name) {
                Some(existing) if *existing == schema => {}
                Some(_) => return Err(ContractError::SchemaCollision { name }),
                None => {
                    merged.schemas.insert(name, schema);
                }
            }
        }

        merged.endpoints.extend(document.endpoints);
    }

    Ok(merged)
}

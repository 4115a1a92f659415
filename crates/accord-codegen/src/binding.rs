//! Generated binding artifacts and their on-disk layout.
//!
//! A [`BindingSet`] is the in-memory result of a generation run: a set of
//! file contents keyed by relative path, plus the [`BindingManifest`] that
//! records which contract produced them. Nothing touches the filesystem
//! until [`BindingSet::write_to`] is called, so a generation failure leaves
//! any previously written bindings untouched.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use accord_contract::{Contract, ContractError};
use serde::{Deserialize, Serialize};

/// File name of the generated Rust source within the output directory.
pub const BINDINGS_FILE: &str = "bindings.rs";

/// File name of the generation manifest within the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// A complete set of generated binding files for one contract.
///
/// Files are keyed by path relative to the output directory. The map is
/// ordered, so iteration (and therefore writing) is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSet {
    files: BTreeMap<String, String>,
    manifest: BindingManifest,
}

impl BindingSet {
    pub(crate) fn new(files: BTreeMap<String, String>, manifest: BindingManifest) -> Self {
        Self { files, manifest }
    }

    /// Returns the content of a generated file by relative path.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Returns the relative paths of all generated files, in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Returns the generated Rust source.
    #[must_use]
    pub fn rust_source(&self) -> &str {
        self.files.get(BINDINGS_FILE).map_or("", String::as_str)
    }

    /// Returns the manifest describing this generation run.
    #[must_use]
    pub const fn manifest(&self) -> &BindingManifest {
        &self.manifest
    }

    /// Writes the binding set to `dir`, replacing any previous contents.
    ///
    /// The set is first written to a staging directory next to the target
    /// and then renamed into place, so readers of `dir` observe either the
    /// old generation or the new one, never a mix. Files present in `dir`
    /// that are not part of this set do not survive the swap.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Io`] if staging or the swap fails. If the
    /// swap itself fails after the old directory was moved aside, the old
    /// contents are restored before the error is returned.
    pub fn write_to(&self, dir: &Path) -> Result<(), ContractError> {
        let parent = dir.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        fs::create_dir_all(&parent)?;

        let staged = parent.join(unique_name(".accord-bindings-staged"));
        if let Err(err) = self.write_tree(&staged) {
            let _ = fs::remove_dir_all(&staged);
            return Err(err);
        }

        if dir.exists() {
            let backup = parent.join(unique_name(".accord-bindings-old"));
            fs::rename(dir, &backup)?;
            if let Err(err) = fs::rename(&staged, dir) {
                let _ = fs::rename(&backup, dir);
                let _ = fs::remove_dir_all(&staged);
                return Err(err.into());
            }
            if let Err(err) = fs::remove_dir_all(&backup) {
                tracing::warn!(
                    path = %backup.display(),
                    error = %err,
                    "failed to remove previous binding generation"
                );
            }
        } else {
            fs::rename(&staged, dir)?;
        }

        tracing::debug!(
            path = %dir.display(),
            files = self.files.len(),
            service = %self.manifest.service,
            version = %self.manifest.contract_version,
            "wrote binding set"
        );
        Ok(())
    }

    fn write_tree(&self, root: &Path) -> Result<(), ContractError> {
        fs::create_dir_all(root)?;
        for (path, content) in &self.files {
            let target = root.join(path);
            if let Some(dir) = target.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(&target, content)?;
        }
        Ok(())
    }
}

fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.subsec_nanos());
    format!("{prefix}-{}-{nanos}", std::process::id())
}

/// Record of one generation run, written alongside the bindings as
/// `manifest.json`.
///
/// The manifest ties generated types back to the contract schemas they were
/// derived from, which is what makes stale-binding detection possible: a
/// type listed here that no longer exists in the contract is an orphan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingManifest {
    /// Service name of the source contract.
    pub service: String,
    /// Version of the source contract.
    pub contract_version: String,
    /// Map from contract schema name to the generated Rust type name.
    pub types: BTreeMap<String, String>,
}

impl BindingManifest {
    /// Loads a manifest from a binding output directory.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Io`] if the manifest file cannot be read and
    /// [`ContractError::Parse`] if it is not valid JSON.
    pub fn load(dir: &Path) -> Result<Self, ContractError> {
        let raw = fs::read_to_string(dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Checks that every generated type still has a backing schema in
    /// `contract`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::UndefinedSchemaRef`] naming the first
    /// orphaned type, in manifest order.
    pub fn verify_against(&self, contract: &Contract) -> Result<(), ContractError> {
        for schema_name in self.types.keys() {
            if contract.schema(schema_name).is_none() {
                return Err(ContractError::UndefinedSchemaRef {
                    name: schema_name.clone(),
                    referenced_by: format!("binding manifest for {}", self.service),
                });
            }
        }
        Ok(())
    }
}

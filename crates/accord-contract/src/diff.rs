//! Contract diffing for review tooling.
//!
//! Bindings are regenerated wholesale on any contract change; the diff exists
//! so reviewers can see what a contract edit actually changed before the
//! regenerated bindings land.

use crate::contract::Contract;
use serde::Serialize;

/// The difference between two contract versions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContractDiff {
    /// Version of the older contract.
    pub from_version: String,
    /// Version of the newer contract.
    pub to_version: String,
    /// Schema names present only in the newer contract.
    pub added_schemas: Vec<String>,
    /// Schema names present only in the older contract.
    pub removed_schemas: Vec<String>,
    /// Schema names whose shape changed.
    pub changed_schemas: Vec<String>,
    /// Operation IDs present only in the newer contract.
    pub added_endpoints: Vec<String>,
    /// Operation IDs present only in the older contract.
    pub removed_endpoints: Vec<String>,
    /// Operation IDs whose definition changed.
    pub changed_endpoints: Vec<String>,
}

impl ContractDiff {
    /// Returns `true` when the two contracts define the same schemas and
    /// endpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added_schemas.is_empty()
            && self.removed_schemas.is_empty()
            && self.changed_schemas.is_empty()
            && self.added_endpoints.is_empty()
            && self.removed_endpoints.is_empty()
            && self.changed_endpoints.is_empty()
    }
}

impl std::fmt::Display for ContractDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} -> {}", self.from_version, self.to_version)?;
        for name in &self.added_schemas {
            writeln!(f, "+ schema {name}")?;
        }
        for name in &self.removed_schemas {
            writeln!(f, "- schema {name}")?;
        }
        for name in &self.changed_schemas {
            writeln!(f, "~ schema {name}")?;
        }
        for name in &self.added_endpoints {
            writeln!(f, "+ endpoint {name}")?;
        }
        for name in &self.removed_endpoints {
            writeln!(f, "- endpoint {name}")?;
        }
        for name in &self.changed_endpoints {
            writeln!(f, "~ endpoint {name}")?;
        }
        if self.is_empty() {
            writeln!(f, "no changes")?;
        }
        Ok(())
    }
}

/// Computes the difference between two contracts.
///
/// Names are reported in the newer contract's declaration order, then the
/// older contract's order for removals.
#[must_use]
pub fn diff(old: &Contract, new: &Contract) -> ContractDiff {
    let mut result = ContractDiff {
        from_version: old.version().to_string(),
        to_version: new.version().to_string(),
        ..ContractDiff::default()
    };

    for (name, schema) in new.schemas() {
        match old.schema(name) {
            None => result.added_schemas.push(name.clone()),
            Some(existing) if existing != schema => result.changed_schemas.push(name.clone()),
            Some(_) => {}
        }
    }
    for name in old.schemas().keys() {
        if new.schema(name).is_none() {
            result.removed_schemas.push(name.clone());
        }
    }

    for endpoint in new.endpoints() {
        let id = endpoint.operation_id();
        match old.endpoint(id) {
            None => result.added_endpoints.push(id.to_string()),
            Some(existing) if existing != endpoint => {
                result.changed_endpoints.push(id.to_string());
            }
            Some(_) => {}
        }
    }
    for endpoint in old.endpoints() {
        if new.endpoint(endpoint.operation_id()).is_none() {
            result
                .removed_endpoints
                .push(endpoint.operation_id().to_string());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Endpoint;
    use crate::schema::Schema;
    use http::Method;

    fn contract(version: &str, with_description: bool) -> Contract {
        let mut note = vec![
            ("id", Schema::string().required()),
            ("name", Schema::string().required()),
        ];
        if with_description {
            note.push(("description", Schema::string()));
        }
        Contract::builder("notes")
            .version(version)
            .schema("Note", Schema::object(note))
            .endpoint(
                Endpoint::builder("getNote")
                    .method(Method::GET)
                    .path("/notes/{noteId}")
                    .response(200, Some("Note"))
                    .build(),
            )
            .build()
            .expect("contract should verify")
    }

    #[test]
    fn test_identical_contracts_diff_empty() {
        let a = contract("1.0.0", false);
        let b = contract("1.0.0", false);
        let d = diff(&a, &b);
        assert!(d.is_empty());
        assert!(d.to_string().contains("no changes"));
    }

    #[test]
    fn test_changed_schema_reported() {
        let old = contract("1.0.0", false);
        let new = contract("1.1.0", true);
        let d = diff(&old, &new);

        assert_eq!(d.changed_schemas, vec!["Note".to_string()]);
        assert!(d.added_schemas.is_empty());
        assert!(d.removed_schemas.is_empty());
        assert_eq!(d.from_version, "1.0.0");
        assert_eq!(d.to_version, "1.1.0");
    }

    #[test]
    fn test_added_and_removed_endpoints() {
        let old = contract("1.0.0", false);
        let new = Contract::builder("notes")
            .version("2.0.0")
            .schema(
                "Note",
                Schema::object(vec![
                    ("id", Schema::string().required()),
                    ("name", Schema::string().required()),
                ]),
            )
            .endpoint(
                Endpoint::builder("listNotes")
                    .method(Method::GET)
                    .path("/notes")
                    .response(200, Some("Note"))
                    .build(),
            )
            .build()
            .expect("contract should verify");

        let d = diff(&old, &new);
        assert_eq!(d.added_endpoints, vec!["listNotes".to_string()]);
        assert_eq!(d.removed_endpoints, vec!["getNote".to_string()]);
        let rendered = d.to_string();
        assert!(rendered.contains("+ endpoint listNotes"));
        assert!(rendered.contains("- endpoint getNote"));
    }
}

//! Contract-to-Rust binding generation.
//!
//! [`generate`] turns a verified [`Contract`] into a [`BindingSet`] without
//! touching the filesystem. The output is a pure function of the contract:
//! generated items are emitted in lexicographic order of their Rust type
//! names, struct fields keep the contract's declaration order, and running
//! the generator twice over the same contract produces byte-identical
//! output.

use std::collections::BTreeMap;

use accord_contract::{Contract, ContractError, Schema, SchemaTable};

use crate::binding::{BindingManifest, BindingSet, BINDINGS_FILE, MANIFEST_FILE};
use crate::naming;

/// Generates Rust bindings for every named schema in `contract`.
///
/// Object schemas become `pub struct` items with serde derives; scalar,
/// array, and reference schemas become `pub type` aliases. Inline object
/// schemas nested inside a named schema are lifted into their own structs,
/// named after the owning type and field (`Note.metadata` becomes
/// `NoteMetadata`).
///
/// # Errors
///
/// Returns [`ContractError::InvalidDocument`] when two contract names
/// collide after conversion to Rust identifiers, either between schemas or
/// between a schema and a lifted inline object. Nothing is written to disk
/// on failure.
pub fn generate(contract: &Contract) -> Result<BindingSet, ContractError> {
    // Sorted view over the contract's schemas. Iteration order here fixes
    // the rendering order, so generation is independent of declaration
    // order in the source documents.
    let named: BTreeMap<&str, &Schema> = contract
        .schemas()
        .iter()
        .map(|(name, schema)| (name.as_str(), schema))
        .collect();

    let mut taken: BTreeMap<String, String> = BTreeMap::new();
    for name in named.keys() {
        let rust = naming::type_name(name);
        if let Some(prior) = taken.get(&rust) {
            return Err(ContractError::invalid(format!(
                "{prior} and schema `{name}` both generate Rust type `{rust}`"
            )));
        }
        taken.insert(rust, format!("schema `{name}`"));
    }

    let mut items: BTreeMap<String, String> = BTreeMap::new();
    let mut manifest_types: BTreeMap<String, String> = BTreeMap::new();
    for (schema_name, schema) in &named {
        let rust = naming::type_name(schema_name);
        let rendered = match schema {
            Schema::Object { properties, required_properties, .. } => render_struct(
                &rust,
                &format!("contract schema `{schema_name}`"),
                properties,
                required_properties,
                &mut items,
                &mut taken,
            )?,
            other => {
                let ty = field_type(&rust, "Item", other, &mut items, &mut taken)?;
                format!("/// Binding for contract schema `{schema_name}`.\npub type {rust} = {ty};\n")
            }
        };
        items.insert(rust.clone(), rendered);
        manifest_types.insert((*schema_name).to_string(), rust);
    }

    let manifest = BindingManifest {
        service: contract.service().to_string(),
        contract_version: contract.version().to_string(),
        types: manifest_types,
    };

    let mut files = BTreeMap::new();
    files.insert(BINDINGS_FILE.to_string(), render_file(contract, &items));
    files.insert(MANIFEST_FILE.to_string(), render_manifest(&manifest)?);
    Ok(BindingSet::new(files, manifest))
}

fn render_file(contract: &Contract, items: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "// @generated by accord-codegen from contract {} v{}.\n",
        contract.service(),
        contract.version()
    ));
    out.push_str("// Do not edit by hand; regenerate instead.\n");
    out.push_str("#![allow(clippy::all, clippy::pedantic)]\n\n");
    out.push_str("use serde::{Deserialize, Serialize};\n");
    for item in items.values() {
        out.push('\n');
        out.push_str(item);
    }
    out
}

fn render_manifest(manifest: &BindingManifest) -> Result<String, ContractError> {
    let mut raw = serde_json::to_string_pretty(manifest)?;
    raw.push('\n');
    Ok(raw)
}

fn render_struct(
    rust_name: &str,
    doc_origin: &str,
    properties: &SchemaTable,
    required_properties: &[String],
    items: &mut BTreeMap<String, String>,
    taken: &mut BTreeMap<String, String>,
) -> Result<String, ContractError> {
    let mut out = String::new();
    out.push_str(&format!("/// Binding for {doc_origin}.\n"));
    out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
    out.push_str(&format!("pub struct {rust_name} {{\n"));

    let mut seen_idents: BTreeMap<String, String> = BTreeMap::new();
    for (wire_name, field_schema) in properties {
        let ident = naming::field_ident(wire_name);
        if let Some(prior) = seen_idents.insert(ident.clone(), wire_name.clone()) {
            return Err(ContractError::invalid(format!(
                "properties `{prior}` and `{wire_name}` on {doc_origin} both generate field `{ident}`"
            )));
        }

        let required = required_properties.iter().any(|name| name == wire_name);
        let base = field_type(rust_name, wire_name, field_schema, items, taken)?;
        let ty = if required { base } else { format!("Option<{base}>") };

        let mut serde_parts = Vec::new();
        if !naming::ident_matches_wire(&ident, wire_name) {
            serde_parts.push(format!("rename = \"{wire_name}\""));
        }
        if !required {
            serde_parts.push("skip_serializing_if = \"Option::is_none\"".to_string());
        }
        if !serde_parts.is_empty() {
            out.push_str(&format!("    #[serde({})]\n", serde_parts.join(", ")));
        }
        out.push_str(&format!("    pub {ident}: {ty},\n"));
    }
    out.push_str("}\n");
    Ok(out)
}

fn field_type(
    owner: &str,
    wire_name: &str,
    schema: &Schema,
    items: &mut BTreeMap<String, String>,
    taken: &mut BTreeMap<String, String>,
) -> Result<String, ContractError> {
    Ok(match schema {
        Schema::String { .. } => "String".to_string(),
        Schema::Integer { .. } => "i64".to_string(),
        Schema::Number { .. } => "f64".to_string(),
        Schema::Boolean { .. } => "bool".to_string(),
        Schema::Any { .. } => "serde_json::Value".to_string(),
        Schema::Null => "()".to_string(),
        Schema::Reference { name, .. } => naming::type_name(name),
        Schema::Array { items: item_schema, .. } => {
            let inner =
                field_type(owner, &format!("{wire_name}Item"), item_schema, items, taken)?;
            format!("Vec<{inner}>")
        }
        Schema::Object { properties, required_properties, .. } => {
            let synth = format!("{owner}{}", naming::type_name(wire_name));
            let origin = format!("the inline object at `{owner}.{wire_name}`");
            if let Some(prior) = taken.get(&synth) {
                return Err(ContractError::invalid(format!(
                    "{prior} and {origin} both generate Rust type `{synth}`"
                )));
            }
            taken.insert(synth.clone(), origin.clone());
            let rendered =
                render_struct(&synth, &origin, properties, required_properties, items, taken)?;
            items.insert(synth.clone(), rendered);
            synth
        }
    })
}

//! The `accord bindings` subcommands.

use std::path::{Path, PathBuf};

use accord_codegen::{generate, BindingManifest};
use accord_contract::store::load_path;

use crate::{settings, EXIT_FAILED, EXIT_OK, EXIT_USAGE};

/// Regenerates the binding set from a contract and writes it out.
///
/// The binding set is always regenerated wholesale: every file in the
/// output directory reflects this contract and nothing else.
pub fn run(contract_path: &Path, out: &Path) -> i32 {
    let contract = match load_path(contract_path) {
        Ok(contract) => contract,
        Err(error) => {
            eprintln!("failed to load contract: {error}");
            return EXIT_USAGE;
        }
    };

    let bindings = match generate(&contract) {
        Ok(bindings) => bindings,
        Err(error) => {
            eprintln!("binding generation failed: {error}");
            return EXIT_FAILED;
        }
    };

    if let Err(error) = bindings.write_to(out) {
        eprintln!("failed to write bindings: {error}");
        return EXIT_FAILED;
    }

    println!(
        "generated bindings for {} v{}",
        contract.service(),
        contract.version()
    );
    for path in bindings.paths() {
        println!("  {path}");
    }
    EXIT_OK
}

/// Checks a written binding set for drift against a contract.
///
/// Drift in either direction fails: a generated type whose schema is
/// gone, or a schema that never got a binding.
pub fn verify(
    contract_flag: Option<&Path>,
    bindings_flag: Option<&Path>,
    config_path: Option<&Path>,
) -> i32 {
    let (contract_path, bindings_dir) =
        match resolve_paths(contract_flag, bindings_flag, config_path) {
            Ok(paths) => paths,
            Err(message) => {
                eprintln!("{message}");
                return EXIT_USAGE;
            }
        };

    let contract = match load_path(&contract_path) {
        Ok(contract) => contract,
        Err(error) => {
            eprintln!("failed to load contract: {error}");
            return EXIT_USAGE;
        }
    };
    let manifest = match BindingManifest::load(&bindings_dir) {
        Ok(manifest) => manifest,
        Err(error) => {
            eprintln!("failed to load binding manifest: {error}");
            return EXIT_FAILED;
        }
    };

    if let Err(error) = manifest.verify_against(&contract) {
        eprintln!("binding drift: {error}");
        return EXIT_FAILED;
    }
    for name in contract.schemas().keys() {
        if !manifest.types.contains_key(name) {
            eprintln!("binding drift: schema `{name}` has no generated binding");
            return EXIT_FAILED;
        }
    }

    println!(
        "ok: bindings match {} v{} ({} types)",
        manifest.service,
        manifest.contract_version,
        manifest.types.len()
    );
    EXIT_OK
}

fn resolve_paths(
    contract_flag: Option<&Path>,
    bindings_flag: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<(PathBuf, PathBuf), String> {
    let config = settings::load(config_path)?;

    let contract_path = contract_flag
        .map(Path::to_path_buf)
        .or_else(|| config.contract.path.as_ref().map(PathBuf::from))
        .ok_or("no contract: pass --contract <path> or set contract.path")?;
    let bindings_dir = bindings_flag
        .map(Path::to_path_buf)
        .or_else(|| config.contract.bindings_dir.as_ref().map(PathBuf::from))
        .ok_or("no binding set: pass --bindings <dir> or set contract.bindings_dir")?;

    Ok((contract_path, bindings_dir))
}

//! The `accord contract` subcommands.

use std::path::Path;

use accord_contract::store::load_path;
use accord_contract::diff;

use crate::{EXIT_FAILED, EXIT_OK};

/// Loads a contract and verifies its integrity.
///
/// Loading already verifies references, cycles, and duplicate operation
/// IDs; reaching the summary line means the contract is sound.
pub fn check(path: &Path) -> i32 {
    match load_path(path) {
        Ok(contract) => {
            println!(
                "ok: {} v{} ({} schemas, {} endpoints)",
                contract.service(),
                contract.version(),
                contract.schemas().len(),
                contract.endpoints().len()
            );
            EXIT_OK
        }
        Err(error) => {
            eprintln!("contract check failed: {error}");
            EXIT_FAILED
        }
    }
}

/// Diffs two contract versions for review.
pub fn diff_contracts(old_path: &Path, new_path: &Path) -> i32 {
    let old = match load_path(old_path) {
        Ok(contract) => contract,
        Err(error) => {
            eprintln!("failed to load {}: {error}", old_path.display());
            return EXIT_FAILED;
        }
    };
    let new = match load_path(new_path) {
        Ok(contract) => contract,
        Err(error) => {
            eprintln!("failed to load {}: {error}", new_path.display());
            return EXIT_FAILED;
        }
    };

    print!("{}", diff(&old, &new));
    EXIT_OK
}

//! Control surface for Accord services.
//!
//! The `accord` binary drives the operational workflows that do not
//! belong inside the server process: applying and reverting migrations,
//! regenerating binding sets, and checking or diffing contracts.
//!
//! Exit codes are part of the interface, for scripting:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | work performed |
//! | 1 | a migration or generation step failed |
//! | 2 | usage or configuration error |
//! | 3 | nothing to do |

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod args;
mod bindings;
mod contract_ops;
mod migrate;
mod settings;

pub use args::{Command, MigrateArgs};

/// The crate version reported by `accord --version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Work performed.
pub const EXIT_OK: i32 = 0;
/// A migration or generation step failed.
pub const EXIT_FAILED: i32 = 1;
/// Malformed invocation or unusable configuration.
pub const EXIT_USAGE: i32 = 2;
/// The command had nothing to do.
pub const EXIT_NOTHING_TO_DO: i32 = 3;

/// Executes a parsed command and returns its exit code.
pub async fn execute(command: Command) -> i32 {
    match command {
        Command::MigrateRun(args) => migrate::run(&args).await,
        Command::MigrateRevert(args) => migrate::revert(&args).await,
        Command::MigrateShow(args) => migrate::show(&args).await,
        Command::BindingsGenerate { contract, out } => bindings::run(&contract, &out),
        Command::BindingsVerify {
            contract,
            bindings,
            config,
        } => bindings::verify(contract.as_deref(), bindings.as_deref(), config.as_deref()),
        Command::ContractCheck { path } => contract_ops::check(&path),
        Command::ContractDiff { old, new } => contract_ops::diff_contracts(&old, &new),
        Command::Help => {
            print_help();
            EXIT_OK
        }
        Command::Version => {
            println!("accord {VERSION}");
            EXIT_OK
        }
    }
}

/// Prints usage to stdout.
pub fn print_help() {
    println!(
        r"accord - contract, binding, and migration tooling

USAGE:
    accord <COMMAND> [OPTIONS]

COMMANDS:
    migrate run        Apply every pending migration in key order
    migrate revert     Revert the most recently applied migration
    migrate show       Print the ledger state of every migration
    bindings generate  Regenerate the binding set from a contract
    bindings verify    Check a binding set for drift against a contract
    contract check     Verify contract integrity
    contract diff      Diff two contract versions for review

MIGRATE OPTIONS:
    --store <dir>        Store root directory (default: storage.root)
    --migrations <dir>   Migration script directory (default: migration.dir)
    -c, --config <path>  Configuration file (TOML or JSON)

BINDINGS OPTIONS:
    --contract <path>    Contract file or directory (verify: default contract.path)
    --out <dir>          Output directory for the binding set
    --bindings <dir>     Binding set to verify (default: contract.bindings_dir)

GLOBAL:
    -h, --help           Print help information
    -V, --version        Print version information

ENVIRONMENT VARIABLES:
    ACCORD__STORAGE__ROOT     Store root directory
    ACCORD__MIGRATION__DIR    Migration script directory
    Any ACCORD__SECTION__KEY  Overrides the matching configuration field

EXIT CODES:
    0  work performed
    1  a migration or generation step failed
    2  usage or configuration error
    3  nothing to do
"
    );
}

//! Command-line argument parsing.
//!
//! Hand-rolled over `std::env::args`; the surface is small enough that a
//! parser dependency would outweigh it.

use std::path::PathBuf;

/// Flags shared by the `migrate` subcommands.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrateArgs {
    /// Store root directory; falls back to `storage.root` from config.
    pub store: Option<PathBuf>,
    /// Migration script directory; falls back to `migration.dir`.
    pub migrations: Option<PathBuf>,
    /// Configuration file providing the fallbacks.
    pub config: Option<PathBuf>,
}

/// A parsed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Apply every pending migration in key order.
    MigrateRun(MigrateArgs),
    /// Revert the most recently applied migration.
    MigrateRevert(MigrateArgs),
    /// Print the ledger state for every known migration.
    MigrateShow(MigrateArgs),
    /// Regenerate the binding set from a contract.
    BindingsGenerate {
        /// Contract file or directory.
        contract: PathBuf,
        /// Output directory for the binding set.
        out: PathBuf,
    },
    /// Check a binding set for drift against a contract.
    BindingsVerify {
        /// Contract file or directory; falls back to `contract.path`.
        contract: Option<PathBuf>,
        /// Binding set directory; falls back to `contract.bindings_dir`.
        bindings: Option<PathBuf>,
        /// Configuration file providing the fallbacks.
        config: Option<PathBuf>,
    },
    /// Verify contract integrity.
    ContractCheck {
        /// Contract file or directory.
        path: PathBuf,
    },
    /// Diff two contract versions for review.
    ContractDiff {
        /// The older contract.
        old: PathBuf,
        /// The newer contract.
        new: PathBuf,
    },
    /// Print usage.
    Help,
    /// Print the version.
    Version,
}

impl Command {
    /// Parses an argument list (without the program name).
    ///
    /// # Errors
    ///
    /// Returns a usage message when the invocation is malformed.
    pub fn parse<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        let Some(first) = args.next() else {
            return Err("missing command; try `accord --help`".to_string());
        };

        match first.as_str() {
            "--help" | "-h" | "help" => Ok(Self::Help),
            "--version" | "-V" | "version" => Ok(Self::Version),
            "migrate" => Self::parse_migrate(&mut args),
            "bindings" => Self::parse_bindings(&mut args),
            "contract" => Self::parse_contract(&mut args),
            other => Err(format!("unknown command `{other}`; try `accord --help`")),
        }
    }

    fn parse_migrate(args: &mut impl Iterator<Item = String>) -> Result<Self, String> {
        let Some(action) = args.next() else {
            return Err("migrate needs an action: run, revert, or show".to_string());
        };

        let mut flags = MigrateArgs::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--store" => {
                    flags.store = Some(required_value(args, "--store")?);
                }
                "--migrations" => {
                    flags.migrations = Some(required_value(args, "--migrations")?);
                }
                "--config" | "-c" => {
                    flags.config = Some(required_value(args, "--config")?);
                }
                other => return Err(format!("unknown flag `{other}` for migrate")),
            }
        }

        match action.as_str() {
            "run" => Ok(Self::MigrateRun(flags)),
            "revert" => Ok(Self::MigrateRevert(flags)),
            "show" => Ok(Self::MigrateShow(flags)),
            other => Err(format!(
                "unknown migrate action `{other}`; expected run, revert, or show"
            )),
        }
    }

    fn parse_bindings(args: &mut impl Iterator<Item = String>) -> Result<Self, String> {
        match args.next().as_deref() {
            Some("generate") => {
                let mut contract = None;
                let mut out = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--contract" => contract = Some(required_value(args, "--contract")?),
                        "--out" => out = Some(required_value(args, "--out")?),
                        other => {
                            return Err(format!("unknown flag `{other}` for bindings generate"))
                        }
                    }
                }

                Ok(Self::BindingsGenerate {
                    contract: contract.ok_or("bindings generate requires --contract <path>")?,
                    out: out.ok_or("bindings generate requires --out <dir>")?,
                })
            }
            Some("verify") => {
                let mut contract = None;
                let mut bindings = None;
                let mut config = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--contract" => contract = Some(required_value(args, "--contract")?),
                        "--bindings" => bindings = Some(required_value(args, "--bindings")?),
                        "--config" | "-c" => config = Some(required_value(args, "--config")?),
                        other => {
                            return Err(format!("unknown flag `{other}` for bindings verify"))
                        }
                    }
                }

                Ok(Self::BindingsVerify {
                    contract,
                    bindings,
                    config,
                })
            }
            Some(other) => Err(format!(
                "unknown bindings action `{other}`; expected generate or verify"
            )),
            None => Err("bindings needs an action: generate or verify".to_string()),
        }
    }

    fn parse_contract(args: &mut impl Iterator<Item = String>) -> Result<Self, String> {
        match args.next().as_deref() {
            Some("check") => {
                let path = args
                    .next()
                    .map(PathBuf::from)
                    .ok_or("contract check requires a path")?;
                Ok(Self::ContractCheck { path })
            }
            Some("diff") => {
                let old = args
                    .next()
                    .map(PathBuf::from)
                    .ok_or("contract diff requires two paths")?;
                let new = args
                    .next()
                    .map(PathBuf::from)
                    .ok_or("contract diff requires two paths")?;
                Ok(Self::ContractDiff { old, new })
            }
            Some(other) => Err(format!(
                "unknown contract action `{other}`; expected check or diff"
            )),
            None => Err("contract needs an action: check or diff".to_string()),
        }
    }
}

fn required_value(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<PathBuf, String> {
    args.next()
        .map(PathBuf::from)
        .ok_or_else(|| format!("{flag} requires a value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        Command::parse(args.iter().map(ToString::to_string))
    }

    #[test]
    fn test_migrate_run_with_flags() {
        let cmd = parse(&["migrate", "run", "--store", "/data", "--migrations", "/m"]).unwrap();
        assert_eq!(
            cmd,
            Command::MigrateRun(MigrateArgs {
                store: Some(PathBuf::from("/data")),
                migrations: Some(PathBuf::from("/m")),
                config: None,
            })
        );
    }

    #[test]
    fn test_migrate_show_bare() {
        let cmd = parse(&["migrate", "show"]).unwrap();
        assert_eq!(cmd, Command::MigrateShow(MigrateArgs::default()));
    }

    #[test]
    fn test_migrate_unknown_action() {
        assert!(parse(&["migrate", "sideways"]).is_err());
    }

    #[test]
    fn test_flag_without_value_is_rejected() {
        let err = parse(&["migrate", "run", "--store"]).unwrap_err();
        assert!(err.contains("--store"));
    }

    #[test]
    fn test_bindings_generate() {
        let cmd = parse(&["bindings", "generate", "--contract", "c.json", "--out", "gen"]).unwrap();
        assert_eq!(
            cmd,
            Command::BindingsGenerate {
                contract: PathBuf::from("c.json"),
                out: PathBuf::from("gen"),
            }
        );
    }

    #[test]
    fn test_bindings_generate_requires_both_flags() {
        assert!(parse(&["bindings", "generate", "--contract", "c.json"]).is_err());
    }

    #[test]
    fn test_bindings_verify_flags_are_optional() {
        assert_eq!(
            parse(&["bindings", "verify"]).unwrap(),
            Command::BindingsVerify {
                contract: None,
                bindings: None,
                config: None,
            }
        );
        assert_eq!(
            parse(&["bindings", "verify", "--contract", "c.json", "--bindings", "gen"]).unwrap(),
            Command::BindingsVerify {
                contract: Some(PathBuf::from("c.json")),
                bindings: Some(PathBuf::from("gen")),
                config: None,
            }
        );
    }

    #[test]
    fn test_contract_check_and_diff() {
        assert_eq!(
            parse(&["contract", "check", "c.json"]).unwrap(),
            Command::ContractCheck {
                path: PathBuf::from("c.json")
            }
        );
        assert_eq!(
            parse(&["contract", "diff", "a.json", "b.json"]).unwrap(),
            Command::ContractDiff {
                old: PathBuf::from("a.json"),
                new: PathBuf::from("b.json"),
            }
        );
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&["--help"]).unwrap(), Command::Help);
        assert_eq!(parse(&["--version"]).unwrap(), Command::Version);
    }

    #[test]
    fn test_empty_invocation_is_an_error() {
        assert!(parse(&[]).is_err());
    }
}

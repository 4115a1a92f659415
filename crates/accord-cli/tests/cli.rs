//! End-to-end command execution against temporary stores and contracts.

use std::fs;
use std::path::{Path, PathBuf};

use accord_cli::{
    execute, Command, MigrateArgs, EXIT_FAILED, EXIT_NOTHING_TO_DO, EXIT_OK, EXIT_USAGE,
};
use accord_codegen::{BINDINGS_FILE, MANIFEST_FILE};
use accord_contract::{Contract, Endpoint, Schema};
use tempfile::TempDir;

fn write_script(dir: &Path, key: &str, body: &str) {
    fs::write(dir.join(format!("{key}.json")), body).unwrap();
}

fn migrate_args(store: &TempDir, migrations: &TempDir) -> MigrateArgs {
    MigrateArgs {
        store: Some(store.path().to_path_buf()),
        migrations: Some(migrations.path().to_path_buf()),
        config: None,
    }
}

fn write_contract(dir: &Path, version: &str) -> PathBuf {
    let contract = Contract::builder("notes")
        .version(version)
        .schema(
            "Note",
            Schema::object(vec![
                ("id", Schema::string().required()),
                ("name", Schema::string().required()),
            ]),
        )
        .endpoint(
            Endpoint::builder("listNotes")
                .path("/notes")
                .response(200, Some("Note"))
                .build(),
        )
        .build()
        .unwrap();

    let path = dir.join(format!("contract-{version}.json"));
    let source = serde_json::to_string_pretty(&contract.to_document()).unwrap();
    fs::write(&path, source).unwrap();
    path
}

#[tokio::test]
async fn migrate_run_applies_then_reports_nothing_to_do() {
    let store = TempDir::new().unwrap();
    let migrations = TempDir::new().unwrap();
    write_script(
        migrations.path(),
        "20240101120000_create_notes",
        r#"{"steps": [{"op": "create_collection", "collection": "notes"}]}"#,
    );

    let args = migrate_args(&store, &migrations);
    assert_eq!(execute(Command::MigrateRun(args.clone())).await, EXIT_OK);
    assert_eq!(
        execute(Command::MigrateRun(args)).await,
        EXIT_NOTHING_TO_DO
    );
}

#[tokio::test]
async fn migrate_revert_undoes_the_last_applied() {
    let store = TempDir::new().unwrap();
    let migrations = TempDir::new().unwrap();
    write_script(
        migrations.path(),
        "20240101120000_create_notes",
        r#"{"steps": [{"op": "create_collection", "collection": "notes"}]}"#,
    );

    let args = migrate_args(&store, &migrations);
    assert_eq!(execute(Command::MigrateRun(args.clone())).await, EXIT_OK);
    assert_eq!(execute(Command::MigrateRevert(args.clone())).await, EXIT_OK);
    assert_eq!(
        execute(Command::MigrateRevert(args)).await,
        EXIT_NOTHING_TO_DO
    );
}

#[tokio::test]
async fn migrate_show_lists_the_ledger() {
    let store = TempDir::new().unwrap();
    let migrations = TempDir::new().unwrap();
    write_script(
        migrations.path(),
        "20240101120000_create_notes",
        r#"{"steps": [{"op": "create_collection", "collection": "notes"}]}"#,
    );

    let args = migrate_args(&store, &migrations);
    assert_eq!(execute(Command::MigrateShow(args)).await, EXIT_OK);
}

#[tokio::test]
async fn migrate_without_a_store_is_a_usage_error() {
    let migrations = TempDir::new().unwrap();
    let args = MigrateArgs {
        store: None,
        migrations: Some(migrations.path().to_path_buf()),
        config: None,
    };
    assert_eq!(execute(Command::MigrateRun(args)).await, EXIT_USAGE);
}

#[tokio::test]
async fn migrate_reads_directories_from_a_config_file() {
    let store = TempDir::new().unwrap();
    let migrations = TempDir::new().unwrap();
    write_script(
        migrations.path(),
        "20240101120000_create_notes",
        r#"{"steps": [{"op": "create_collection", "collection": "notes"}]}"#,
    );

    let config_dir = TempDir::new().unwrap();
    let config_path = config_dir.path().join("accord.toml");
    fs::write(
        &config_path,
        format!(
            "[storage]\nbackend = \"file\"\nroot = {:?}\n\n[migration]\ndir = {:?}\n",
            store.path(),
            migrations.path()
        ),
    )
    .unwrap();

    let args = MigrateArgs {
        store: None,
        migrations: None,
        config: Some(config_path),
    };
    assert_eq!(execute(Command::MigrateRun(args)).await, EXIT_OK);
}

#[tokio::test]
async fn bindings_generate_writes_the_binding_set() {
    let dir = TempDir::new().unwrap();
    let contract = write_contract(dir.path(), "1.0.0");
    let out = dir.path().join("bindings");

    let code = execute(Command::BindingsGenerate {
        contract,
        out: out.clone(),
    })
    .await;

    assert_eq!(code, EXIT_OK);
    assert!(out.join(BINDINGS_FILE).is_file());
    assert!(out.join(MANIFEST_FILE).is_file());
}

#[tokio::test]
async fn bindings_generate_rejects_a_missing_contract() {
    let dir = TempDir::new().unwrap();
    let code = execute(Command::BindingsGenerate {
        contract: dir.path().join("absent.json"),
        out: dir.path().join("bindings"),
    })
    .await;
    assert_eq!(code, EXIT_USAGE);
}

#[tokio::test]
async fn bindings_verify_passes_for_a_fresh_set() {
    let dir = TempDir::new().unwrap();
    let contract = write_contract(dir.path(), "1.0.0");
    let out = dir.path().join("bindings");

    assert_eq!(
        execute(Command::BindingsGenerate {
            contract: contract.clone(),
            out: out.clone(),
        })
        .await,
        EXIT_OK
    );
    assert_eq!(
        execute(Command::BindingsVerify {
            contract: Some(contract),
            bindings: Some(out),
            config: None,
        })
        .await,
        EXIT_OK
    );
}

#[tokio::test]
async fn bindings_verify_flags_a_schema_without_a_binding() {
    let dir = TempDir::new().unwrap();
    let contract = write_contract(dir.path(), "1.0.0");
    let out = dir.path().join("bindings");
    assert_eq!(
        execute(Command::BindingsGenerate {
            contract,
            out: out.clone(),
        })
        .await,
        EXIT_OK
    );

    // A schema added after generation has no binding yet.
    let grown = {
        let contract = Contract::builder("notes")
            .version("1.1.0")
            .schema(
                "Note",
                Schema::object(vec![
                    ("id", Schema::string().required()),
                    ("name", Schema::string().required()),
                ]),
            )
            .schema("Tag", Schema::object(vec![("label", Schema::string())]))
            .endpoint(
                Endpoint::builder("listNotes")
                    .path("/notes")
                    .response(200, Some("Note"))
                    .build(),
            )
            .build()
            .unwrap();
        let path = dir.path().join("grown.json");
        fs::write(
            &path,
            serde_json::to_string_pretty(&contract.to_document()).unwrap(),
        )
        .unwrap();
        path
    };

    assert_eq!(
        execute(Command::BindingsVerify {
            contract: Some(grown),
            bindings: Some(out),
            config: None,
        })
        .await,
        EXIT_FAILED
    );
}

#[tokio::test]
async fn bindings_verify_without_paths_is_a_usage_error() {
    assert_eq!(
        execute(Command::BindingsVerify {
            contract: None,
            bindings: None,
            config: None,
        })
        .await,
        EXIT_USAGE
    );
}

#[tokio::test]
async fn contract_check_accepts_a_sound_contract() {
    let dir = TempDir::new().unwrap();
    let contract = write_contract(dir.path(), "1.0.0");
    assert_eq!(
        execute(Command::ContractCheck { path: contract }).await,
        EXIT_OK
    );
}

#[tokio::test]
async fn contract_check_rejects_a_broken_reference() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(
        &path,
        r#"{
            "service": "notes",
            "version": "1.0.0",
            "endpoints": [{
                "operation_id": "listNotes",
                "method": "GET",
                "path": "/notes",
                "request_schema": "Missing"
            }]
        }"#,
    )
    .unwrap();

    assert_eq!(
        execute(Command::ContractCheck { path }).await,
        EXIT_FAILED
    );
}

#[tokio::test]
async fn contract_diff_compares_two_versions() {
    let dir = TempDir::new().unwrap();
    let old = write_contract(dir.path(), "1.0.0");
    let new = write_contract(dir.path(), "1.1.0");
    assert_eq!(
        execute(Command::ContractDiff { old, new }).await,
        EXIT_OK
    );
}

#[test]
fn parse_and_execute_share_one_surface() {
    let parsed = Command::parse(
        ["migrate", "run", "--store", "/tmp/s", "--migrations", "/tmp/m"]
            .into_iter()
            .map(String::from),
    )
    .unwrap();

    assert_eq!(
        parsed,
        Command::MigrateRun(MigrateArgs {
            store: Some(PathBuf::from("/tmp/s")),
            migrations: Some(PathBuf::from("/tmp/m")),
            config: None,
        })
    );
}

//! Integration tests for `tripplan init`, run against the built binary with
//! an isolated config directory. No database is required.

use std::path::Path;
use std::process::{Command, Output};

fn tripplan(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tripplan"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("TRIPPLAN_DATABASE_URL")
        .output()
        .expect("failed to run tripplan binary")
}

#[test]
fn init_writes_config_file() {
    let tmp = tempfile::TempDir::new().unwrap();

    let out = tripplan(
        tmp.path(),
        &[
            "init",
            "--db-url",
            "postgresql://db.internal:5432/trips",
            "--llm-endpoint",
            "https://contoso.openai.azure.com",
        ],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let path = tmp.path().join("tripplan").join("config.toml");
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("[database]"));
    assert!(contents.contains("postgresql://db.internal:5432/trips"));
    assert!(contents.contains("https://contoso.openai.azure.com"));
    assert!(!contents.contains("api_key"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let tmp = tempfile::TempDir::new().unwrap();

    assert!(tripplan(tmp.path(), &["init"]).status.success());

    let out = tripplan(tmp.path(), &["init", "--db-url", "postgresql://other/db"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("--force"));

    let out = tripplan(
        tmp.path(),
        &["init", "--db-url", "postgresql://other/db", "--force"],
    );
    assert!(out.status.success());
    let contents =
        std::fs::read_to_string(tmp.path().join("tripplan").join("config.toml")).unwrap();
    assert!(contents.contains("postgresql://other/db"));
}

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn prelaunch(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("prelaunch").unwrap();
    cmd.env_remove("PRELAUNCH_CONFIG_PATH")
        .env_remove("RUST_LOG")
        .env("PRELAUNCH_NO_PROGRESS", "1")
        .arg("--install-root")
        .arg(root.path());
    cmd
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("prelaunch").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("--source-url"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let root = TempDir::new().unwrap();
    prelaunch(&root)
        .arg("--config")
        .arg(root.path().join("absent.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_unconfigured_source_is_logged() {
    let root = TempDir::new().unwrap();
    prelaunch(&root)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no update source configured"));

    let log = std::fs::read_to_string(root.path().join("prelaunch-error.log")).unwrap();
    assert!(log.contains("no update source configured"));
    assert_eq!(log.lines().count(), 1);
}

#[test]
fn test_invalid_toml_reports_parse_error() {
    let root = TempDir::new().unwrap();
    std::fs::write(root.path().join("prelaunch.toml"), "[source\nurl = ").unwrap();

    prelaunch(&root)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Check the TOML syntax"));
}

#[test]
fn test_unreachable_source_appends_error_log() {
    let root = TempDir::new().unwrap();
    std::fs::write(
        root.path().join("prelaunch.toml"),
        "[source]\nkind = \"listing\"\nurl = \"http://127.0.0.1:9/releases/\"\n\n[records]\nerror_log = \"logs/update-errors.log\"\n",
    )
    .unwrap();

    for _ in 0..2 {
        prelaunch(&root)
            .arg("--quiet")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Cannot reach update source"));
    }

    let log = std::fs::read_to_string(root.path().join("logs/update-errors.log")).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.lines().all(|line| line.contains("127.0.0.1:9")));
    assert!(!root.path().join("prelaunch-success.txt").exists());
}

#[test]
fn test_check_reports_unreachable_without_download() {
    let root = TempDir::new().unwrap();
    prelaunch(&root)
        .arg("check")
        .arg("--json")
        .arg("--source-url")
        .arg("http://127.0.0.1:9/latest.json")
        .arg("--source-kind")
        .arg("metadata")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());

    assert!(!root.path().join(".prelaunch").exists());
}

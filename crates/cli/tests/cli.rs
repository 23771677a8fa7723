//! End-to-end tests for the `shelf` binary.

use assert_cmd::Command;
use tempfile::TempDir;

/// A `shelf` command isolated from the caller's environment and config files.
fn shelf(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.current_dir(dir.path())
        .env("SHELF_CONFIG_DIR", dir.path())
        .env("RUST_LOG", "error")
        .env_remove("SHELF_ENV")
        .env_remove("DATABASE_URL")
        .env_remove("SHELF_DATABASE__URL");
    cmd
}

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("books.db").display())
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    let output = shelf(&dir).arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["serve", "migrate", "config"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn missing_database_url_is_a_startup_failure() {
    let dir = TempDir::new().unwrap();
    let output = shelf(&dir).arg("config").output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DATABASE_URL is not set"), "stderr: {stderr}");
}

#[test]
fn migrate_applies_once() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);

    let first = shelf(&dir)
        .env("DATABASE_URL", &url)
        .arg("migrate")
        .output()
        .unwrap();
    assert!(first.status.success());
    assert!(String::from_utf8_lossy(&first.stdout).contains("applied 1 migration(s)"));

    let second = shelf(&dir)
        .env("DATABASE_URL", &url)
        .arg("migrate")
        .output()
        .unwrap();
    assert!(second.status.success());
    assert!(String::from_utf8_lossy(&second.stdout).contains("applied 0 migration(s)"));
}

#[test]
fn config_reads_layered_file_and_env() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("base.toml"), "[server]\nport = 9100\n").unwrap();

    let output = shelf(&dir)
        .env("SHELF_DATABASE__URL", database_url(&dir))
        .env("SHELF_SERVER__HOST", "127.0.0.1")
        .arg("config")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("server: 127.0.0.1:9100"), "stdout: {stdout}");
    assert!(stdout.contains("cors: http://localhost:3000, http://localhost:5173"));
}

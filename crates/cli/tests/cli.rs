use assert_cmd::Command;
use serde_json::Value;

fn bookshelf() -> Command {
    let mut cmd = Command::cargo_bin("bookshelf").unwrap();
    cmd.env("BOOKSHELF_CONFIG_DIR", "/nonexistent/bookshelf-config")
        .env_remove("BOOKSHELF_ENV");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn routes_prints_book_endpoints() {
    let index = stdout_json(bookshelf().arg("routes"));
    assert_eq!(index["endpoints"]["health"], "GET /health");
    assert_eq!(index["endpoints"]["books"]["getAll"], "GET /api/books");
    assert_eq!(
        index["endpoints"]["books"]["search"],
        "GET /api/books/search/{query}"
    );
}

#[test]
fn settings_applies_flag_overrides() {
    let settings = stdout_json(bookshelf().args(["settings", "--port", "4000"]));
    assert_eq!(settings["server"]["port"], 4000);
    assert_eq!(settings["environment"], "local");
    assert_eq!(settings["database"]["endpoint"], "mem://");
}

#[test]
fn unknown_environment_fails() {
    bookshelf()
        .env("BOOKSHELF_ENV", "qa")
        .arg("settings")
        .assert()
        .failure();
}

#[test]
fn check_reports_an_empty_catalogue() {
    let output = bookshelf().arg("check").output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Connected to mem://"));
    assert!(stdout.contains("No books found in database."));
    assert!(stdout.contains("Total books: 0"));
    assert!(stdout.contains("Books without publish year: 0"));
    assert!(stdout.trim_end().ends_with("Database connection closed"));
}

#[test]
fn check_fails_on_unreachable_endpoint() {
    bookshelf()
        .env("BOOKSHELF__DATABASE__ENDPOINT", "gopher://localhost")
        .arg("check")
        .assert()
        .failure();
}

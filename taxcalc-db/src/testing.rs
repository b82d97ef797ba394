//! SQLite URL helpers shared by the unit tests

use tempfile::TempDir;

/// File-backed database inside `dir`, created on first connect
pub fn sqlite_file_url(dir: &TempDir, name: &str) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join(name).display())
}

/// Path under a directory that does not exist; opening it always fails
pub fn missing_sqlite_url(dir: &TempDir) -> String {
    format!(
        "sqlite://{}",
        dir.path().join("missing").join("gone.db").display()
    )
}

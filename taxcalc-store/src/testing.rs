//! Shared fixtures for the unit tests

use taxcalc_db::{ConnectionConfig, Sql, SqlExecutor, TopologyConfig};
use tempfile::TempDir;

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE taxes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id BIGINT NOT NULL REFERENCES users (id),
        name TEXT NOT NULL,
        tax_code BIGINT NOT NULL,
        price BIGINT NOT NULL CHECK (price >= 0),
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )
    "#,
];

/// A primary and one secondary over the same SQLite file, schema applied
pub async fn open_sql() -> (TempDir, Sql) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("store.db").display()
    );

    let topology = TopologyConfig::new(ConnectionConfig::new(url.clone()).with_pool_size(4))
        .with_secondary(ConnectionConfig::new(url).with_pool_size(2));
    let sql = Sql::open(&topology).await.unwrap();

    let writer = sql.writer();
    for statement in SCHEMA {
        writer.execute(sqlx::query(statement)).await.unwrap();
    }

    (dir, sql)
}

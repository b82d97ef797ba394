//! User repository

use taxcalc_db::{Sql, SqlExecutor};

use crate::error::{StoreError, StoreResult};
use crate::models::{now_millis, User};

const INSERT_USER: &str = r#"
    INSERT INTO users (username, password, created_at, updated_at)
    VALUES ($1, $2, $3, $3)
    RETURNING id, username, password, created_at, updated_at
"#;

const FIND_BY_ID: &str = r#"
    SELECT id, username, password, created_at, updated_at
    FROM users
    WHERE id = $1
"#;

const FIND_BY_USERNAME: &str = r#"
    SELECT id, username, password, created_at, updated_at
    FROM users
    WHERE username = $1
"#;

/// Insert a user on whatever executor the caller holds
pub async fn insert<E: SqlExecutor>(
    executor: &E,
    username: &str,
    password_hash: &str,
) -> StoreResult<User> {
    let user = executor
        .fetch_one(
            sqlx::query_as(INSERT_USER)
                .bind(username)
                .bind(password_hash)
                .bind(now_millis()),
        )
        .await?;
    Ok(user)
}

/// User repository
pub struct UserRepo<'a> {
    sql: &'a Sql,
}

impl<'a> UserRepo<'a> {
    pub fn new(sql: &'a Sql) -> Self {
        Self { sql }
    }

    /// Create a user on the primary.
    ///
    /// A duplicate username surfaces as the driver's unique-violation error.
    pub async fn create(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        insert(&self.sql.writer(), username, password_hash).await
    }

    pub async fn find_by_id(&self, id: i64) -> StoreResult<User> {
        self.sql
            .reader()
            .await
            .fetch_optional(sqlx::query_as(FIND_BY_ID).bind(id))
            .await?
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    pub async fn find_by_username(&self, username: &str) -> StoreResult<User> {
        self.sql
            .reader()
            .await
            .fetch_optional(sqlx::query_as(FIND_BY_USERNAME).bind(username))
            .await?
            .ok_or_else(|| StoreError::not_found("user", username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::open_sql;
    use taxcalc_db::ErrorKind;

    #[tokio::test]
    async fn create_then_find() {
        let (_dir, sql) = open_sql().await;
        let repo = UserRepo::new(&sql);

        let created = repo.create("test_user", "hashed-password").await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.created_at, created.updated_at);

        let by_id = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(by_id, created);

        let by_name = repo.find_by_username("test_user").await.unwrap();
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_name.password, "hashed-password");

        sql.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let (_dir, sql) = open_sql().await;
        let repo = UserRepo::new(&sql);

        let err = repo.find_by_id(404).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { resource: "user", .. }));

        let err = repo.find_by_username("nobody").await.unwrap_err();
        assert_eq!(err.to_string(), "Not found: user 'nobody'");

        sql.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_username_is_a_driver_error() {
        let (_dir, sql) = open_sql().await;
        let repo = UserRepo::new(&sql);

        repo.create("test_user", "one").await.unwrap();
        let err = repo.create("test_user", "two").await.unwrap_err();
        match err {
            StoreError::Database(db) => assert_eq!(db.kind(), ErrorKind::Driver),
            other => panic!("unexpected error: {other}"),
        }

        sql.close().await.unwrap();
    }
}

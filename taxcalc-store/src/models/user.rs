use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::from_millis;

/// User record from the `users` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Already hashed by the caller; never serialized
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn created(&self) -> DateTime<Utc> {
        from_millis(self.created_at)
    }

    pub fn updated(&self) -> DateTime<Utc> {
        from_millis(self.updated_at)
    }
}

//! Uniform query/exec surface over a pool or an open transaction.
//!
//! Callers build statements with sqlx and positional placeholders:
//!
//! ```ignore
//! let user: User = sql
//!     .reader()
//!     .await
//!     .fetch_one(sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id))
//!     .await?;
//! ```

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{Any, Execute, FromRow};

use crate::error::Result;
use crate::pool::DbPool;

/// A statement returning rows decoded into `T`
pub type TypedQuery<'q, T> = QueryAs<'q, Any, T, AnyArguments<'q>>;

/// A statement whose rows are not read back
pub type RawQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

/// Query/exec contract shared by pool executors and transactions.
///
/// Repositories are generic over this trait, so the same code runs inside
/// or outside a transaction.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Exactly one row; `RowNotFound` from the driver otherwise
    async fn fetch_one<'q, T>(&self, query: TypedQuery<'q, T>) -> Result<T>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin + 'q;

    /// Zero or one row
    async fn fetch_optional<'q, T>(&self, query: TypedQuery<'q, T>) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin + 'q;

    /// Every row, in the order the database returned them
    async fn fetch_all<'q, T>(&self, query: TypedQuery<'q, T>) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin + 'q;

    /// Run a statement and return the number of rows affected
    async fn execute<'q>(&self, query: RawQuery<'q>) -> Result<u64>;
}

/// Which endpoint an [`Executor`] was bound to at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Secondary,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Secondary => write!(f, "secondary"),
        }
    }
}

/// Executor bound to one pool for its whole life.
///
/// Holds a non-owning clone of the pool; it never closes it.
#[derive(Clone, Debug)]
pub struct Executor {
    pool: DbPool,
    role: Role,
}

impl Executor {
    pub(crate) fn new(pool: DbPool, role: Role) -> Self {
        Self { pool, role }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Credential-free label of the bound endpoint
    pub fn target(&self) -> &str {
        self.pool.target()
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl SqlExecutor for Executor {
    async fn fetch_one<'q, T>(&self, query: TypedQuery<'q, T>) -> Result<T>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin + 'q,
    {
        let started = Instant::now();
        let sql = query.sql();
        let row = query.fetch_one(self.pool.inner()).await;
        self.pool.trace_query(sql, started);
        Ok(row?)
    }

    async fn fetch_optional<'q, T>(&self, query: TypedQuery<'q, T>) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin + 'q,
    {
        let started = Instant::now();
        let sql = query.sql();
        let row = query.fetch_optional(self.pool.inner()).await;
        self.pool.trace_query(sql, started);
        Ok(row?)
    }

    async fn fetch_all<'q, T>(&self, query: TypedQuery<'q, T>) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin + 'q,
    {
        let started = Instant::now();
        let sql = query.sql();
        let rows = query.fetch_all(self.pool.inner()).await;
        self.pool.trace_query(sql, started);
        Ok(rows?)
    }

    async fn execute<'q>(&self, query: RawQuery<'q>) -> Result<u64> {
        let started = Instant::now();
        let sql = query.sql();
        let done = query.execute(self.pool.inner()).await;
        self.pool.trace_query(sql, started);
        Ok(done?.rows_affected())
    }
}

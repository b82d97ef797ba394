use std::time::Instant;

use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::{Any, Execute, FromRow};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{DbError, Result};
use crate::executor::{RawQuery, SqlExecutor, TypedQuery};
use crate::pool::DbPool;

type Inner = sqlx::Transaction<'static, Any>;

/// A transaction pinned to the primary.
///
/// Exactly one of [`commit`](Self::commit) or [`rollback`](Self::rollback)
/// finishes it; every later call fails with `TransactionClosed`. Dropping an
/// unfinished transaction rolls it back.
pub struct Transaction {
    inner: Mutex<Option<Inner>>,
    pool: DbPool,
}

impl Transaction {
    pub(crate) async fn begin(pool: DbPool) -> Result<Self> {
        let tx = pool
            .inner()
            .begin()
            .await
            .map_err(|source| DbError::BeginTransaction {
                target: pool.target().to_string(),
                source,
            })?;

        if pool.debug() {
            debug!(db = %pool.target(), "transaction started");
        }

        Ok(Self {
            inner: Mutex::new(Some(tx)),
            pool,
        })
    }

    pub async fn commit(&self) -> Result<()> {
        let tx = self.finish().await?;
        tx.commit().await?;
        if self.pool.debug() {
            debug!(db = %self.pool.target(), "transaction committed");
        }
        Ok(())
    }

    pub async fn rollback(&self) -> Result<()> {
        let tx = self.finish().await?;
        tx.rollback().await?;
        if self.pool.debug() {
            debug!(db = %self.pool.target(), "transaction rolled back");
        }
        Ok(())
    }

    /// False once commit or rollback has been called
    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Take the driver transaction out; it is finished whatever happens next
    async fn finish(&self) -> Result<Inner> {
        self.inner
            .lock()
            .await
            .take()
            .ok_or(DbError::TransactionClosed)
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("target", &self.pool.target())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SqlExecutor for Transaction {
    async fn fetch_one<'q, T>(&self, query: TypedQuery<'q, T>) -> Result<T>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin + 'q,
    {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or(DbError::TransactionClosed)?;

        let started = Instant::now();
        let sql = query.sql();
        let row = query.fetch_one(&mut **tx).await;
        self.pool.trace_query(sql, started);
        Ok(row?)
    }

    async fn fetch_optional<'q, T>(&self, query: TypedQuery<'q, T>) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin + 'q,
    {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or(DbError::TransactionClosed)?;

        let started = Instant::now();
        let sql = query.sql();
        let row = query.fetch_optional(&mut **tx).await;
        self.pool.trace_query(sql, started);
        Ok(row?)
    }

    async fn fetch_all<'q, T>(&self, query: TypedQuery<'q, T>) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin + 'q,
    {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or(DbError::TransactionClosed)?;

        let started = Instant::now();
        let sql = query.sql();
        let rows = query.fetch_all(&mut **tx).await;
        self.pool.trace_query(sql, started);
        Ok(rows?)
    }

    async fn execute<'q>(&self, query: RawQuery<'q>) -> Result<u64> {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or(DbError::TransactionClosed)?;

        let started = Instant::now();
        let sql = query.sql();
        let done = query.execute(&mut **tx).await;
        self.pool.trace_query(sql, started);
        Ok(done?.rows_affected())
    }
}

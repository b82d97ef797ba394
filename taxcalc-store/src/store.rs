//! Dependency-injection handle over the database topology

use taxcalc_db::{Sql, SqlExecutor, Transaction};
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::models::{NewTax, Tax, User};
use crate::repos::{taxes, users, TaxRepo, UserRepo};

/// Owns the `Sql` handle and hands out repositories bound to it
#[derive(Clone, Debug)]
pub struct Store {
    sql: Sql,
}

impl Store {
    pub fn new(sql: Sql) -> Self {
        Self { sql }
    }

    pub fn sql(&self) -> &Sql {
        &self.sql
    }

    pub fn users(&self) -> UserRepo<'_> {
        UserRepo::new(&self.sql)
    }

    pub fn taxes(&self) -> TaxRepo<'_> {
        TaxRepo::new(&self.sql)
    }

    /// Insert a user and all of their tax items atomically.
    ///
    /// Commits only if every insert succeeds; any failure rolls the whole
    /// batch back and is returned to the caller.
    pub async fn create_user_with_taxes(
        &self,
        username: &str,
        password_hash: &str,
        items: &[NewTax],
    ) -> StoreResult<(User, Vec<Tax>)> {
        let tx = self.sql.new_transaction().await?;

        match insert_all(&tx, username, password_hash, items).await {
            Ok(created) => {
                tx.commit().await?;
                debug!(user_id = created.0.id, taxes = created.1.len(), "user created with taxes");
                Ok(created)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed after insert error");
                }
                Err(err)
            }
        }
    }

    /// Close every pool behind the handle
    pub async fn close(&self) -> StoreResult<()> {
        self.sql.close().await?;
        Ok(())
    }
}

async fn insert_all(
    tx: &Transaction,
    username: &str,
    password_hash: &str,
    items: &[NewTax],
) -> StoreResult<(User, Vec<Tax>)> {
    let user = users::insert(tx, username, password_hash).await?;

    let mut created = Vec::with_capacity(items.len());
    for item in items {
        created.push(taxes::insert(tx, user.id, item).await?);
    }

    Ok((user, created))
}

//! Replica router: writes and transactions go to the primary, reads go to
//! the healthiest secondary elected on every `reader()` call.
//!
//! # Election
//!
//! Each `reader()` call takes the exclusive section, probes every secondary
//! that opened at startup, marks it healthy or not for this round, and picks
//! the healthy one with the most connection hits (earliest configured wins
//! ties). With no healthy secondary the read goes to the primary. Health is
//! recomputed every round, so a replica that recovers is used again on the
//! next call.
//!
//! `close()` takes the same exclusive section, so it waits for an in-flight
//! election and no election can probe pools that are being torn down.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::config::TopologyConfig;
use crate::error::{DbError, Result};
use crate::executor::{Executor, Role};
use crate::pool::DbPool;
use crate::transaction::Transaction;

/// Shared handle over one primary and its read replicas.
///
/// Cheap to clone; pass it explicitly to whatever needs database access.
#[derive(Clone, Debug)]
pub struct Sql {
    inner: Arc<SqlInner>,
}

#[derive(Debug)]
struct SqlInner {
    primary: DbPool,
    state: RwLock<RouterState>,
}

#[derive(Debug)]
struct RouterState {
    secondaries: Vec<Secondary>,
    closed: bool,
}

#[derive(Debug)]
struct Secondary {
    pool: DbPool,
    healthy: bool,
}

/// Per-secondary view from the most recent election
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryStatus {
    pub target: String,
    pub healthy: bool,
    pub hits: u64,
}

impl Sql {
    /// Open the primary and every secondary.
    ///
    /// A primary failure aborts the whole call. A secondary that fails to
    /// open is left out of the active set and logged when its config has
    /// `debug` on.
    pub async fn open(topology: &TopologyConfig) -> Result<Self> {
        let primary = DbPool::open(&topology.primary).await?;

        let opened = join_all(topology.secondaries.iter().map(DbPool::open)).await;
        let secondaries = opened
            .into_iter()
            .zip(&topology.secondaries)
            .filter_map(|(result, config)| match result {
                Ok(pool) => Some(Secondary {
                    pool,
                    healthy: true,
                }),
                Err(err) => {
                    if config.debug {
                        error!(error = %err, "error when creating secondary connection");
                    }
                    None
                }
            })
            .collect::<Vec<_>>();

        if topology.primary.debug {
            debug!(
                primary = %primary.target(),
                secondaries = secondaries.len(),
                configured = topology.secondaries.len(),
                "database topology opened"
            );
        }

        Ok(Self {
            inner: Arc::new(SqlInner {
                primary,
                state: RwLock::new(RouterState {
                    secondaries,
                    closed: false,
                }),
            }),
        })
    }

    /// Executor bound to the primary
    pub fn writer(&self) -> Executor {
        Executor::new(self.inner.primary.clone(), Role::Primary)
    }

    /// Run an election and return an executor bound to the winner.
    ///
    /// Never fails: without a healthy secondary the primary serves the read.
    pub async fn reader(&self) -> Executor {
        let mut state = self.inner.state.write().await;
        if state.closed || state.secondaries.is_empty() {
            return self.writer();
        }

        let probes = join_all(state.secondaries.iter().map(|s| s.pool.ping())).await;

        let mut elected: Option<(usize, u64)> = None;
        for (index, (secondary, probe)) in state.secondaries.iter_mut().zip(probes).enumerate() {
            match probe {
                Ok(()) => {
                    secondary.healthy = true;
                    let hits = secondary.pool.hits();
                    if elected.map_or(true, |(_, best)| hits > best) {
                        elected = Some((index, hits));
                    }
                }
                Err(err) => {
                    secondary.healthy = false;
                    if secondary.pool.debug() {
                        warn!(error = %err, "secondary failed liveness probe");
                    }
                }
            }
        }

        match elected {
            Some((index, hits)) => {
                let pool = state.secondaries[index].pool.clone();
                if pool.debug() {
                    debug!(db = %pool.target(), hits, "secondary elected for read");
                }
                Executor::new(pool, Role::Secondary)
            }
            None => {
                if self.inner.primary.debug() {
                    debug!(db = %self.inner.primary.target(), "no healthy secondary, reading from primary");
                }
                self.writer()
            }
        }
    }

    /// Begin a transaction on the primary.
    ///
    /// Each call is independent; concurrent transactions are isolated by the
    /// database, not by this handle.
    pub async fn new_transaction(&self) -> Result<Transaction> {
        Transaction::begin(self.inner.primary.clone()).await
    }

    /// Close the primary, then every secondary.
    ///
    /// Keeps going past individual failures and reports the last one. A
    /// handle that is already closed no longer owns a primary and fails
    /// without touching any pool. Waits for open transactions to finish;
    /// elections started meanwhile see the handle as closed and read from
    /// the primary.
    pub async fn close(&self) -> Result<()> {
        // Mark closed under the lock, close outside it: a pool close waits for
        // every borrowed connection, and readers must not queue behind that.
        let secondaries: Vec<DbPool> = {
            let mut state = self.inner.state.write().await;
            if state.closed {
                return Err(DbError::shutdown(
                    self.inner.primary.target(),
                    "primary connection does not exist, hence cannot be closed",
                ));
            }
            state.closed = true;
            state.secondaries.iter().map(|s| s.pool.clone()).collect()
        };

        let mut last_err = self.inner.primary.close().await.err();
        for pool in &secondaries {
            if let Err(err) = pool.close().await {
                last_err = Some(err);
            }
        }

        match last_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Secondaries that opened successfully, healthy or not
    pub async fn secondary_count(&self) -> usize {
        self.inner.state.read().await.secondaries.len()
    }

    /// Health and hit counts as of the last election
    pub async fn secondary_health(&self) -> Vec<SecondaryStatus> {
        self.inner
            .state
            .read()
            .await
            .secondaries
            .iter()
            .map(|s| SecondaryStatus {
                target: s.pool.target().to_string(),
                healthy: s.healthy,
                hits: s.pool.hits(),
            })
            .collect()
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.state.read().await.closed
    }

    pub fn primary(&self) -> &DbPool {
        &self.inner.primary
    }

    #[cfg(test)]
    async fn secondary_pool(&self, index: usize) -> DbPool {
        self.inner.state.read().await.secondaries[index].pool.clone()
    }
}

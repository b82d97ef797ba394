//! Database access layer for taxcalc.
//!
//! One [`Sql`] handle fans writes and transactions to the primary and reads
//! to a replica elected per call. Collaborators talk to it only through
//! [`SqlExecutor`].

pub mod config;
pub mod error;
pub mod executor;
pub mod pool;
pub mod router;
pub mod transaction;

#[cfg(test)]
mod testing;

pub use config::{ConnectionConfig, TopologyConfig};
pub use error::{DbError, ErrorKind, Result};
pub use executor::{Executor, RawQuery, Role, SqlExecutor, TypedQuery};
pub use pool::DbPool;
pub use router::{SecondaryStatus, Sql};
pub use transaction::Transaction;

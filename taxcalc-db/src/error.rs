//! Structured error types for the taxcalc database layer.
//!
//! Callers branch on [`DbError::kind`] instead of matching error text.
//! Driver failures from queries are carried through untouched in
//! [`DbError::Driver`].

use thiserror::Error;

/// Main error type for taxcalc-db operations
#[derive(Error, Debug)]
pub enum DbError {
    /// Malformed connection string or configuration values
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Liveness probe or initial connect failed
    #[error("Cannot reach database {target}: {source}")]
    Connectivity {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    /// Commit, rollback, query or exec on a finished transaction
    #[error("Transaction error: transaction already closed")]
    TransactionClosed,

    /// The primary could not start a transaction
    #[error("Transaction error: cannot begin transaction on {target}: {source}")]
    BeginTransaction {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    /// A pool failed to close (the last failure seen during shutdown)
    #[error("Shutdown error on {target}: {reason}")]
    Shutdown { target: String, reason: String },

    /// Query/exec failure reported by the driver, unmodified
    #[error(transparent)]
    Driver(#[from] sqlx::Error),
}

/// Coarse error classification for callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Connectivity,
    Transaction,
    Shutdown,
    Driver,
}

/// Result type alias for taxcalc-db operations
pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a connectivity error for the given endpoint label
    pub fn connectivity(target: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Connectivity {
            target: target.into(),
            source,
        }
    }

    /// Create a shutdown error
    pub fn shutdown(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Shutdown {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Map a failure from establishing a pool.
    ///
    /// The driver reports bad URLs and unknown schemes as configuration
    /// errors; everything else means the endpoint could not be reached.
    pub(crate) fn from_connect(target: &str, source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::Configuration(err) => Self::config(format!("{target}: {err}")),
            other => Self::connectivity(target, other),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Connectivity { .. } => ErrorKind::Connectivity,
            Self::TransactionClosed | Self::BeginTransaction { .. } => ErrorKind::Transaction,
            Self::Shutdown { .. } => ErrorKind::Shutdown,
            Self::Driver(_) => ErrorKind::Driver,
        }
    }
}

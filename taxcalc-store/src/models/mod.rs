//! Row models for the users and taxes tables
//!
//! Timestamps are stored as Unix milliseconds so rows decode the same way
//! from Postgres and SQLite.

pub mod tax;
pub mod user;

pub use tax::{NewTax, Tax, TaxCode, UnknownTaxCode};
pub use user::User;

use chrono::{DateTime, TimeZone, Utc};

/// Current time as stored in `created_at`/`updated_at`
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

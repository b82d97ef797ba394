//! taxcalc-store: user and tax repositories
//!
//! Every repository receives the `Sql` handle explicitly. Writes go to the
//! primary, lookups to whichever replica the router elects.

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{StoreError, StoreResult};
pub use models::{NewTax, Tax, TaxCode, UnknownTaxCode, User};
pub use repos::{TaxRepo, UserRepo};
pub use store::Store;

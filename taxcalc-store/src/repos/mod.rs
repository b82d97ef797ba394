//! Repositories over the `Sql` handle
//!
//! Each repository follows these patterns:
//! - Writes go through `writer()`, lookups through `reader()`
//! - Statements live in free functions generic over `SqlExecutor`, so the
//!   same SQL runs inside a transaction
//! - Placeholders for every caller-supplied value

pub mod taxes;
pub mod users;

pub use taxes::TaxRepo;
pub use users::UserRepo;

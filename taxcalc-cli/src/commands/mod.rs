//! Command implementations for the taxcalc CLI

pub mod check;
pub mod elect;

pub use check::run_check;
pub use elect::run_elect;

//! Query translation for the two storage backends
//!
//! [`sql`] turns a [`crate::query::TransactionQuery`] into parameterized SQLite
//! statements; [`memory`] evaluates the same query over a slice. Both order
//! ties by ascending id, fold search text with ASCII case rules and place
//! missing descriptions first when ascending.

pub mod memory;
pub mod sql;

pub use sql::{SqlFragment, SqlParam};

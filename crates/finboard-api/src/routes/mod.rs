//! Route modules for the API server
//!
//! - auth: Register, login, current user, logout
//! - transactions: Filtered listing, dashboard stats, chart series, create
//! - export: CSV export and its column list / size preview
//!
//! Each module keeps its handlers in `api.rs` and re-exports them from `mod.rs`.

pub mod auth;
pub mod export;
pub mod transactions;

//! Auth routes - Account creation and session tokens

pub mod api;

pub use api::{login, logout, me, register};

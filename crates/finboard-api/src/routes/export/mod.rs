//! Export routes - CSV download of filtered transactions

pub mod api;

pub use api::{export_columns, export_csv, export_stats};

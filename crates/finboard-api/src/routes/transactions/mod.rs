//! Transaction routes - Listing, statistics, chart data, create
//!
//! Listing reads the filter, sort and page from the query string. When the
//! store is unreachable, read endpoints answer with empty data instead of
//! failing.

pub mod api;

pub use api::{chart_data, create_transaction, dashboard_stats, list_transactions};

//! The canonical filter / sort / paginate request
//!
//! Both storage backends consume a [`TransactionQuery`] that has already been
//! parsed and normalized here, so they never see raw strings. Dates are UTC
//! instants truncated to milliseconds, which is the precision the database
//! stores.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{Category, Status};

pub use finboard_config::MAX_PAGE_LIMIT;

/// Page size used when neither the request nor the config names one
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Drop sub-millisecond precision
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

/// Parse a date bound or transaction date.
///
/// Accepts RFC 3339 (offset converted to UTC), `YYYY-MM-DDTHH:MM:SS[.fff]`
/// (read as UTC) and `YYYY-MM-DD` (UTC midnight).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(truncate_to_millis(at.with_timezone(&Utc)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(truncate_to_millis(naive.and_utc()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Lenient integer parse for page numbers: `"2"`, `" 3 "`, `"2.9"` → 2
fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

fn non_empty<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|s| s.as_str())
        .filter(|s| !s.trim().is_empty())
}

fn date_param(params: &HashMap<String, String>, key: &str) -> CoreResult<Option<DateTime<Utc>>> {
    match non_empty(params, key) {
        None => Ok(None),
        Some(raw) => parse_instant(raw)
            .map(Some)
            .ok_or_else(|| CoreError::validation(format!("Invalid {}: {}", key, raw))),
    }
}

fn amount_param(params: &HashMap<String, String>, key: &str) -> CoreResult<Option<f64>> {
    match non_empty(params, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| CoreError::validation(format!("Invalid {}: {}", key, raw))),
    }
}

/// Constraints on transaction fields; `None` means unconstrained
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Inclusive lower date bound
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper date bound
    pub date_to: Option<DateTime<Utc>>,
    /// Inclusive lower amount bound
    pub amount_from: Option<f64>,
    /// Inclusive upper amount bound
    pub amount_to: Option<f64>,
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub user_id: Option<String>,
    /// Case-insensitive substring over user_id, description, category, status
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Parse from request parameters (`dateFrom`, `amountTo`, `user_id`, ...)
    pub fn from_params(params: &HashMap<String, String>) -> CoreResult<Self> {
        let category = non_empty(params, "category")
            .map(|raw| raw.parse::<Category>().map_err(CoreError::validation))
            .transpose()?;
        let status = non_empty(params, "status")
            .map(|raw| raw.parse::<Status>().map_err(CoreError::validation))
            .transpose()?;

        Ok(Self {
            date_from: date_param(params, "dateFrom")?,
            date_to: date_param(params, "dateTo")?,
            amount_from: amount_param(params, "amountFrom")?,
            amount_to: amount_param(params, "amountTo")?,
            category,
            status,
            user_id: non_empty(params, "user_id").map(str::to_string),
            search: params
                .get("search")
                .filter(|s| !s.is_empty())
                .cloned(),
        })
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.date_from = Some(truncate_to_millis(from));
        self
    }

    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.date_to = Some(truncate_to_millis(to));
        self
    }

    /// Search text folded the way both backends compare it
    pub fn search_needle(&self) -> Option<String> {
        self.search.as_ref().map(|s| s.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Sortable transaction fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Date,
    Amount,
    Category,
    Status,
    UserId,
    UserProfile,
    Description,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const ALL: [SortField; 10] = [
        SortField::Id,
        SortField::Date,
        SortField::Amount,
        SortField::Category,
        SortField::Status,
        SortField::UserId,
        SortField::UserProfile,
        SortField::Description,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    /// Request-facing field name
    pub fn key(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Date => "date",
            SortField::Amount => "amount",
            SortField::Category => "category",
            SortField::Status => "status",
            SortField::UserId => "user_id",
            SortField::UserProfile => "user_profile",
            SortField::Description => "description",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .iter()
            .copied()
            .find(|field| field.key() == s)
            .ok_or_else(|| format!("Invalid sort field: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Only an explicit `asc` sorts ascending
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

/// Single-field sort; ties fall back to ascending id in every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::Date,
            order: SortOrder::Desc,
        }
    }
}

impl Sort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    pub fn from_params(params: &HashMap<String, String>) -> CoreResult<Self> {
        let field = match non_empty(params, "sortBy") {
            Some(raw) => raw.parse::<SortField>().map_err(CoreError::validation)?,
            None => SortField::Date,
        };
        let order = SortOrder::from_param(params.get("sortOrder").map(|s| s.as_str()));
        Ok(Self { field, order })
    }
}

/// Clamped page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    /// Page is at least 1; limit is clamped to `[1, MAX_PAGE_LIMIT]`
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: u32) -> Self {
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX)) as u32;
        let limit = limit
            .unwrap_or(i64::from(default_limit))
            .clamp(1, i64::from(MAX_PAGE_LIMIT)) as u32;
        Self { page, limit }
    }

    pub fn from_params(params: &HashMap<String, String>, default_limit: u32) -> Self {
        Self::new(
            params.get("page").and_then(|s| parse_int(s)),
            params.get("limit").and_then(|s| parse_int(s)),
            default_limit,
        )
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Records skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None, DEFAULT_PAGE_LIMIT)
    }
}

/// Filter + sort + page window for the transaction listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    pub filter: TransactionFilter,
    pub sort: Sort,
    pub pagination: Pagination,
}

impl TransactionQuery {
    pub fn new(filter: TransactionFilter, sort: Sort, pagination: Pagination) -> Self {
        Self {
            filter,
            sort,
            pagination,
        }
    }

    /// Parse a query string map
    pub fn from_params(params: &HashMap<String, String>, default_limit: u32) -> CoreResult<Self> {
        Ok(Self {
            filter: TransactionFilter::from_params(params)?,
            sort: Sort::from_params(params)?,
            pagination: Pagination::from_params(params, default_limit),
        })
    }
}

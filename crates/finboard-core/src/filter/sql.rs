//! SQL generation for transaction queries

use crate::query::{Sort, SortField, SortOrder, TransactionFilter, TransactionQuery};

/// Stored column list, in [`crate::store::sqlite::TransactionRow`] order
pub const TRANSACTION_COLUMNS: &str =
    "id, date, amount, category, status, user_id, user_profile, description, created_at, updated_at";

/// A bound parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Real(f64),
    Text(String),
}

/// SQL text plus its positional parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlFragment {
    fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    fn append(&mut self, other: SqlFragment) {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
    }
}

/// Column backing a sort field
pub fn column(field: SortField) -> &'static str {
    match field {
        SortField::Id => "id",
        SortField::Date => "date",
        SortField::Amount => "amount",
        SortField::Category => "category",
        SortField::Status => "status",
        SortField::UserId => "user_id",
        SortField::UserProfile => "user_profile",
        SortField::Description => "description",
        SortField::CreatedAt => "created_at",
        SortField::UpdatedAt => "updated_at",
    }
}

/// Escape `%`, `_` and `\` so the text matches literally under `ESCAPE '\'`
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Lowercased copies of the free-text columns, filled in on insert.
/// SQLite's `lower()` only folds ASCII, so these are folded in Rust.
pub const FOLDED_COLUMNS: &str = "user_id_folded, description_folded";

/// Case-folded form of a free-text value for [`FOLDED_COLUMNS`]
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Columns the free-text search looks at
const SEARCH_COLUMNS: [&str; 4] = ["user_id_folded", "description_folded", "lower(category)", "lower(status)"];

/// `WHERE` clause for a filter, empty when unconstrained
pub fn where_clause(filter: &TransactionFilter) -> SqlFragment {
    let mut conditions: Vec<String> = Vec::new();
    let mut params = Vec::new();

    if let Some(from) = filter.date_from {
        conditions.push("date >= ?".to_string());
        params.push(SqlParam::Int(from.timestamp_millis()));
    }
    if let Some(to) = filter.date_to {
        conditions.push("date <= ?".to_string());
        params.push(SqlParam::Int(to.timestamp_millis()));
    }
    if let Some(min) = filter.amount_from {
        conditions.push("amount >= ?".to_string());
        params.push(SqlParam::Real(min));
    }
    if let Some(max) = filter.amount_to {
        conditions.push("amount <= ?".to_string());
        params.push(SqlParam::Real(max));
    }
    if let Some(category) = filter.category {
        conditions.push("category = ?".to_string());
        params.push(SqlParam::Text(category.as_str().to_string()));
    }
    if let Some(status) = filter.status {
        conditions.push("status = ?".to_string());
        params.push(SqlParam::Text(status.as_str().to_string()));
    }
    if let Some(ref user_id) = filter.user_id {
        conditions.push("user_id = ?".to_string());
        params.push(SqlParam::Text(user_id.clone()));
    }
    if let Some(needle) = filter.search_needle() {
        let pattern = format!("%{}%", escape_like(&needle));
        let alternatives: Vec<String> = SEARCH_COLUMNS
            .iter()
            .map(|col| format!("{} LIKE ? ESCAPE '\\'", col))
            .collect();
        conditions.push(format!("({})", alternatives.join(" OR ")));
        params.extend(SEARCH_COLUMNS.iter().map(|_| SqlParam::Text(pattern.clone())));
    }

    if conditions.is_empty() {
        return SqlFragment::default();
    }
    SqlFragment {
        sql: format!(" WHERE {}", conditions.join(" AND ")),
        params,
    }
}

/// `ORDER BY` clause with the id tie-break
pub fn order_by(sort: &Sort) -> String {
    let direction = match sort.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    match sort.field {
        SortField::Id => format!(" ORDER BY id {}", direction),
        field => format!(" ORDER BY {} {}, id ASC", column(field), direction),
    }
}

/// Every matching row in sort order
pub fn select_all(filter: &TransactionFilter, sort: &Sort) -> SqlFragment {
    let mut fragment = SqlFragment::new(format!("SELECT {} FROM transactions", TRANSACTION_COLUMNS));
    fragment.append(where_clause(filter));
    fragment.sql.push_str(&order_by(sort));
    fragment
}

/// One page of matching rows
pub fn select_page(query: &TransactionQuery) -> SqlFragment {
    let mut fragment = select_all(&query.filter, &query.sort);
    fragment.sql.push_str(" LIMIT ? OFFSET ?");
    fragment
        .params
        .push(SqlParam::Int(i64::from(query.pagination.limit())));
    fragment.params.push(SqlParam::Int(
        i64::try_from(query.pagination.offset()).unwrap_or(i64::MAX),
    ));
    fragment
}

/// Number of matching rows
pub fn count(filter: &TransactionFilter) -> SqlFragment {
    let mut fragment = SqlFragment::new("SELECT COUNT(*) FROM transactions");
    fragment.append(where_clause(filter));
    fragment
}

/// Sum of matching amounts, `0.0` when nothing matches
pub fn sum_amount(filter: &TransactionFilter) -> SqlFragment {
    let mut fragment = SqlFragment::new("SELECT COALESCE(SUM(amount), 0.0) FROM transactions");
    fragment.append(where_clause(filter));
    fragment
}

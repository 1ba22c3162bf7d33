//! CSV export of filtered transactions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::models::Transaction;
use crate::query::{Sort, TransactionFilter};
use crate::store::TransactionStore;

/// A column that can appear in an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportColumn {
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

impl ExportColumn {
    pub const ALL: [ExportColumn; 10] = [
        ExportColumn::Id,
        ExportColumn::Date,
        ExportColumn::Amount,
        ExportColumn::Category,
        ExportColumn::Status,
        ExportColumn::UserId,
        ExportColumn::UserProfile,
        ExportColumn::Description,
        ExportColumn::CreatedAt,
        ExportColumn::UpdatedAt,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ExportColumn::Id => "id",
            ExportColumn::Date => "date",
            ExportColumn::Amount => "amount",
            ExportColumn::Category => "category",
            ExportColumn::Status => "status",
            ExportColumn::UserId => "user_id",
            ExportColumn::UserProfile => "user_profile",
            ExportColumn::Description => "description",
            ExportColumn::CreatedAt => "createdAt",
            ExportColumn::UpdatedAt => "updatedAt",
        }
    }

    /// Header text
    pub fn label(&self) -> &'static str {
        match self {
            ExportColumn::Id => "ID",
            ExportColumn::Date => "Date",
            ExportColumn::Amount => "Amount",
            ExportColumn::Category => "Category",
            ExportColumn::Status => "Status",
            ExportColumn::UserId => "User ID",
            ExportColumn::UserProfile => "User Profile",
            ExportColumn::Description => "Description",
            ExportColumn::CreatedAt => "Created At",
            ExportColumn::UpdatedAt => "Updated At",
        }
    }

    /// Pre-selected in the export dialog
    pub fn is_default(&self) -> bool {
        matches!(
            self,
            ExportColumn::Id
                | ExportColumn::Date
                | ExportColumn::Amount
                | ExportColumn::Category
                | ExportColumn::Status
                | ExportColumn::UserId
        )
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.key() == key)
    }

    /// Cell text for one transaction
    pub fn value(&self, tx: &Transaction) -> String {
        match self {
            ExportColumn::Id => tx.id.to_string(),
            ExportColumn::Date => finboard_utils::iso_timestamp(&tx.date),
            ExportColumn::Amount => finboard_utils::format_amount(tx.amount),
            ExportColumn::Category => tx.category.to_string(),
            ExportColumn::Status => tx.status.to_string(),
            ExportColumn::UserId => tx.user_id.clone(),
            ExportColumn::UserProfile => tx.user_profile.clone(),
            ExportColumn::Description => tx.description.clone().unwrap_or_default(),
            ExportColumn::CreatedAt => finboard_utils::iso_timestamp(&tx.created_at),
            ExportColumn::UpdatedAt => finboard_utils::iso_timestamp(&tx.updated_at),
        }
    }
}

/// Column description served to the export dialog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub default: bool,
}

pub fn available_columns() -> Vec<ColumnInfo> {
    ExportColumn::ALL
        .iter()
        .map(|c| ColumnInfo {
            key: c.key(),
            label: c.label(),
            default: c.is_default(),
        })
        .collect()
}

/// Resolve requested column keys, keeping their order
pub fn parse_columns(keys: &[String]) -> CoreResult<Vec<ExportColumn>> {
    if keys.is_empty() {
        return Err(CoreError::validation("At least one column must be selected"));
    }
    let invalid: Vec<String> = keys
        .iter()
        .filter(|k| ExportColumn::from_key(k).is_none())
        .cloned()
        .collect();
    if !invalid.is_empty() {
        return Err(CoreError::InvalidColumns { columns: invalid });
    }
    Ok(keys.iter().filter_map(|k| ExportColumn::from_key(k)).collect())
}

/// Body of an export request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub filters: Option<serde_json::Map<String, Value>>,
}

impl ExportRequest {
    pub fn filter(&self) -> CoreResult<TransactionFilter> {
        match self.filters {
            Some(ref filters) => TransactionFilter::from_params(&json_filter_params(filters)),
            None => Ok(TransactionFilter::default()),
        }
    }
}

/// Flatten JSON filter values into the string form the query parser reads
pub fn json_filter_params(filters: &serde_json::Map<String, Value>) -> HashMap<String, String> {
    filters
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}

/// Accept both `dateFrom=...` and `filters[dateFrom]=...` query keys
pub fn query_filter_params(params: &HashMap<String, String>) -> HashMap<String, String> {
    params
        .iter()
        .map(|(key, value)| {
            let key = key
                .strip_prefix("filters[")
                .and_then(|k| k.strip_suffix(']'))
                .unwrap_or(key);
            (key.to_string(), value.clone())
        })
        .collect()
}

/// Render rows as CSV with a header line of column labels
pub fn write_csv(columns: &[ExportColumn], transactions: &[Transaction]) -> CoreResult<String> {
    let csv_error = |e: csv::Error| CoreError::Internal {
        message: format!("CSV error: {}", e),
    };

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(columns.iter().map(|c| c.label()))
        .map_err(csv_error)?;
    for tx in transactions {
        writer
            .write_record(columns.iter().map(|c| c.value(tx)))
            .map_err(csv_error)?;
    }

    let bytes = writer.into_inner().map_err(|e| CoreError::Internal {
        message: format!("CSV error: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| CoreError::Internal {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

/// Export every matching transaction, newest first
pub async fn export_csv(store: &dyn TransactionStore, request: &ExportRequest) -> CoreResult<String> {
    let columns = parse_columns(&request.columns)?;
    let filter = request.filter()?;
    let transactions = store.find_all(&filter, &Sort::default()).await?;
    log::info!(
        "Exporting {} transactions with {} columns",
        transactions.len(),
        columns.len()
    );
    write_csv(&columns, &transactions)
}

/// Size preview for an export
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStats {
    pub total_records: u64,
    /// e.g. `"12KB"`
    pub estimated_file_size: String,
}

pub async fn export_stats(
    store: &dyn TransactionStore,
    filter: &TransactionFilter,
    bytes_per_record: u64,
) -> CoreResult<ExportStats> {
    let total_records = store.count(filter).await?;
    Ok(ExportStats {
        total_records,
        estimated_file_size: finboard_utils::estimated_file_size(total_records, bytes_per_record),
    })
}

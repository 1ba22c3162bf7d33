//! Export API endpoints
//!
//! Endpoints:
//! - export_columns: GET /api/export/columns
//! - export_csv: POST /api/export/csv
//! - export_stats: GET /api/export/stats

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use finboard_core::export::{self, ColumnInfo, ExportRequest, ExportStats};
use finboard_core::{ErrorContext, TransactionFilter};
use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Exportable columns and whether each is pre-selected
pub async fn export_columns(_user: AuthUser) -> Json<Vec<ColumnInfo>> {
    Json(export::available_columns())
}

/// Download matching transactions as a CSV attachment
pub async fn export_csv(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let context = ErrorContext::new("export_csv").with_user_id(user.id);
    let csv = export::export_csv(state.stores.transactions.as_ref(), &request)
        .await
        .map_err(|e| ApiError::from_core(e, &context))?;

    let filename = finboard_utils::export_filename(Utc::now().date_naive());
    Ok((
        [
            (CONTENT_TYPE, "text/csv".to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        csv,
    )
        .into_response())
}

/// Record count and rough file size for an export with the given filters
pub async fn export_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ExportStats>> {
    let context = ErrorContext::new("export_stats").with_user_id(user.id);
    let filter = TransactionFilter::from_params(&export::query_filter_params(&params))
        .map_err(|e| ApiError::from_core(e, &context))?;
    let stats = export::export_stats(
        state.stores.transactions.as_ref(),
        &filter,
        state.config.export.bytes_per_record,
    )
    .await
    .map_err(|e| ApiError::from_core(e, &context))?;
    Ok(Json(stats))
}

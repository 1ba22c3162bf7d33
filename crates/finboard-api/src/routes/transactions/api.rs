//! Transactions API endpoints
//!
//! Endpoints:
//! - list_transactions: GET /api/transactions
//! - dashboard_stats: GET /api/transactions/stats
//! - chart_data: GET /api/transactions/chart-data
//! - create_transaction: POST /api/transactions

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use finboard_core::stats::{self, ChartPoint, DashboardStats};
use finboard_core::{
    CoreError, DefaultErrorLogger, ErrorContext, ErrorKind, ErrorLogger, NewTransaction, Page,
    Transaction, TransactionQuery, TransactionStore,
};
use std::collections::HashMap;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Fall back to `empty` when the store is down; other errors still fail the request
fn degrade<T>(result: Result<T, CoreError>, empty: impl FnOnce() -> T, context: &ErrorContext) -> ApiResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.kind() == ErrorKind::Unavailable => {
            DefaultErrorLogger.log_warning(&format!("Serving empty result: {}", e), context);
            Ok(empty())
        }
        Err(e) => Err(ApiError::from_core(e, context)),
    }
}

/// Filtered, sorted, paginated transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Page<Transaction>>> {
    let context = ErrorContext::new("list_transactions").with_user_id(user.id);
    let query = TransactionQuery::from_params(&params, state.config.pagination.default_limit)
        .map_err(|e| ApiError::from_core(e, &context))?;

    let result = state.stores.transactions.query(&query).await;
    let page = degrade(result, || Page::empty(&query.pagination), &context)?;
    Ok(Json(page))
}

/// Current-month totals and growth against last month
pub async fn dashboard_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<DashboardStats>> {
    let context = ErrorContext::new("dashboard_stats").with_user_id(user.id);
    let result = stats::dashboard_stats(state.stores.transactions.as_ref(), Utc::now()).await;
    Ok(Json(degrade(result, DashboardStats::default, &context)?))
}

/// Monthly paid revenue/expense series, `?period=N` months back
pub async fn chart_data(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Vec<ChartPoint>>> {
    let context = ErrorContext::new("chart_data").with_user_id(user.id);
    let period = stats::chart_period(params.get("period").map(String::as_str));
    let result = stats::chart_data(state.stores.transactions.as_ref(), period, Utc::now()).await;
    Ok(Json(degrade(result, Vec::new, &context)?))
}

/// Create a transaction under the next sequential id
pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let Json(new) = payload?;
    let context = ErrorContext::new("create_transaction").with_user_id(user.id);
    let created = state
        .stores
        .transactions
        .insert(new)
        .await
        .map_err(|e| ApiError::from_core(e, &context))?;
    log::info!("Created transaction {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

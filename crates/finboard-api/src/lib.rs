//! HTTP JSON API for the finboard dashboard
//!
//! Routes are organized into modules:
//! - routes::auth: Registration, login, current user
//! - routes::transactions: Listing, dashboard stats, chart data, create
//! - routes::export: Column list, CSV download, export size estimate

pub mod auth;
pub mod error;
pub mod routes;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use finboard_config::Config;
use finboard_core::{Stores, TransactionStore, UserStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use auth::{AuthUser, TokenService};
pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub config: Arc<Config>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(stores: Stores, config: Config) -> Self {
        let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl_days);
        Self {
            stores,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::auth::{login, logout, me, register};
    use routes::export::{export_columns, export_csv, export_stats};
    use routes::transactions::{chart_data, create_transaction, dashboard_stats, list_transactions};

    let cors = state.config.server.cors;

    let router = Router::new()
        .route("/api/ping", get(ping))
        .route("/api/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/transactions", get(list_transactions).post(create_transaction))
        .route("/api/transactions/stats", get(dashboard_stats))
        .route("/api/transactions/chart-data", get(chart_data))
        .route("/api/export/columns", get(export_columns))
        .route("/api/export/csv", post(export_csv))
        .route("/api/export/stats", get(export_stats))
        .fallback(not_found)
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "pong" }))
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = if state.stores.database_connected() {
        "connected"
    } else {
        "unavailable"
    };
    Json(serde_json::json!({
        "status": "OK",
        "database": database,
        "transactionStore": state.stores.transactions.backend(),
        "userStore": state.stores.users.backend(),
    }))
}

async fn not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::NotFound {
        resource: uri.path().to_string(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

/// Start the HTTP server
///
/// Serves until Ctrl-C, then closes the stores.
pub async fn start_server(config: Config, stores: Stores) -> std::io::Result<()> {
    let addr = config.bind_address();
    let state = AppState::new(stores.clone(), config);
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting finboard server on http://{}", addr);

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    stores.close().await;

    match result {
        Ok(()) => {
            log::info!("Server stopped gracefully");
            Ok(())
        }
        Err(e) => {
            log::error!("Server error: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn app(name: &str) -> Router {
        let users_file =
            std::env::temp_dir().join(format!("finboard-api-{}-{}.json", name, std::process::id()));
        let _ = std::fs::remove_file(&users_file);
        let stores = Stores::in_memory(users_file);
        stores.seed().await.unwrap();
        create_router(AppState::new(stores, Config::default()))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    async fn login(app: &Router) -> String {
        let credentials = serde_json::json!({
            "email": finboard_core::seed::DEMO_EMAIL,
            "password": finboard_core::seed::DEMO_PASSWORD,
        });
        let (status, body) = send(app, "POST", "/api/auth/login", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::OK);
        json(&body)["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_ping_and_unknown_route() {
        let app = app("ping").await;
        let (status, body) = send(&app, "GET", "/api/ping", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["message"], "pong");

        let (status, _) = send(&app, "GET", "/api/nowhere", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_protected_routes_need_token() {
        let app = app("no-token").await;
        let (status, body) = send(&app, "GET", "/api/transactions", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json(&body)["error"], "Access token required");

        let (status, _) = send(&app, "GET", "/api/transactions", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let app = app("me").await;
        let token = login(&app).await;
        let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let user = json(&body);
        assert_eq!(user["email"], finboard_core::seed::DEMO_EMAIL);
        assert!(user.get("passwordHash").is_none());

        let wrong = serde_json::json!({ "email": finboard_core::seed::DEMO_EMAIL, "password": "nope" });
        let (status, _) = send(&app, "POST", "/api/auth/login", None, Some(wrong)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_rules() {
        let app = app("register").await;
        let new_user = serde_json::json!({ "email": "new@example.com", "password": "secret1", "name": "New" });
        let (status, body) = send(&app, "POST", "/api/auth/register", None, Some(new_user.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json(&body)["user"]["role"], "analyst");

        let (status, _) = send(&app, "POST", "/api/auth/register", None, Some(new_user)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let bad_email = serde_json::json!({ "email": "nope", "password": "secret1", "name": "X" });
        let (status, body) = send(&app, "POST", "/api/auth/register", None, Some(bad_email)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "Please enter a valid email address");
    }

    #[tokio::test]
    async fn test_listing_clamps_limit_and_rejects_bad_sort() {
        let app = app("listing").await;
        let token = login(&app).await;

        let (status, body) = send(&app, "GET", "/api/transactions?limit=500", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let page = json(&body);
        assert_eq!(page["limit"], 100);
        assert_eq!(page["total"], 10);
        assert_eq!(page["data"].as_array().unwrap().len(), 10);

        let (status, body) = send(&app, "GET", "/api/transactions?sortBy=ssn", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "Invalid sort field: ssn");
    }

    #[tokio::test]
    async fn test_create_transaction() {
        let app = app("create").await;
        let token = login(&app).await;
        let new = serde_json::json!({
            "date": "2024-04-01T10:00:00.000Z",
            "amount": 42.5,
            "category": "revenue",
            "status": "paid",
            "user_id": "user_001",
            "user_profile": "https://example.com/avatar.png",
        });
        let (status, body) = send(&app, "POST", "/api/transactions", Some(&token), Some(new)).await;
        assert_eq!(status, StatusCode::CREATED);
        let created = json(&body);
        assert_eq!(created["id"], 11);
        assert_eq!(created["category"], "Revenue");
        assert_eq!(created["status"], "Paid");
    }

    #[tokio::test]
    async fn test_enum_values_accept_any_case() {
        let app = app("enum-case").await;
        let token = login(&app).await;

        let (status, body) =
            send(&app, "GET", "/api/transactions?category=EXPENSE&status=paid", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let page = json(&body);
        assert!(page["total"].as_u64().unwrap() > 0);
        for tx in page["data"].as_array().unwrap() {
            assert_eq!(tx["category"], "Expense");
            assert_eq!(tx["status"], "Paid");
        }

        let new = serde_json::json!({
            "date": "2024-04-02T10:00:00.000Z",
            "amount": 10.0,
            "category": "Refund",
            "status": "Paid",
            "user_id": "user_001",
            "user_profile": "https://example.com/avatar.png",
        });
        let (status, _) = send(&app, "POST", "/api/transactions", Some(&token), Some(new)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    /// Router over a SQLite store whose pool is already closed
    async fn app_with_closed_database(name: &str) -> (Router, String) {
        let users_file =
            std::env::temp_dir().join(format!("finboard-api-{}-{}.json", name, std::process::id()));
        let _ = std::fs::remove_file(&users_file);
        let database = finboard_core::Database::in_memory().await.unwrap();
        let stores = Stores {
            transactions: Arc::new(finboard_core::store::SqliteTransactionStore::new(
                database.pool().clone(),
            )),
            users: Arc::new(finboard_core::users::FileUserStore::empty(users_file)),
            database: Some(database.clone()),
        };
        finboard_core::seed::seed_demo_user(stores.users.as_ref()).await.unwrap();
        let app = create_router(AppState::new(stores, Config::default()));
        let token = login(&app).await;
        database.close().await;
        (app, token)
    }

    #[tokio::test]
    async fn test_unavailable_store_degrades_reads() {
        let (app, token) = app_with_closed_database("closed-reads").await;

        let (status, body) = send(&app, "GET", "/api/transactions?limit=5", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let page = json(&body);
        assert_eq!(page["data"], serde_json::json!([]));
        assert_eq!(page["total"], 0);
        assert_eq!(page["limit"], 5);
        assert_eq!(page["totalPages"], 0);

        let (status, body) = send(&app, "GET", "/api/transactions/stats", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let stats = json(&body);
        assert_eq!(stats["totalRevenue"], 0.0);
        assert_eq!(stats["totalExpenses"], 0.0);
        assert_eq!(stats["transactionCount"], 0);

        let (status, body) = send(&app, "GET", "/api/transactions/chart-data", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_export_and_create() {
        let (app, token) = app_with_closed_database("closed-writes").await;

        let request = serde_json::json!({ "columns": ["id", "amount"] });
        let (status, body) = send(&app, "POST", "/api/export/csv", Some(&token), Some(request)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json(&body)["error"], error::DATABASE_UNAVAILABLE);

        let new = serde_json::json!({
            "date": "2024-04-01T10:00:00.000Z",
            "amount": 1.0,
            "category": "Expense",
            "status": "Pending",
            "user_id": "user_001",
            "user_profile": "https://example.com/avatar.png",
        });
        let (status, _) = send(&app, "POST", "/api/transactions", Some(&token), Some(new)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_csv_export() {
        let app = app("export").await;
        let token = login(&app).await;

        let request = serde_json::json!({ "columns": ["id", "ssn"] });
        let (status, body) = send(&app, "POST", "/api/export/csv", Some(&token), Some(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json(&body)["error"].as_str().unwrap().contains("ssn"));

        let request = serde_json::json!({ "columns": ["id", "amount"], "filters": { "category": "revenue" } });
        let (status, body) = send(&app, "POST", "/api/export/csv", Some(&token), Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        let csv = String::from_utf8(body).unwrap();
        assert!(csv.starts_with("ID,Amount\n"));

        let (status, body) = send(&app, "GET", "/api/export/stats", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["totalRecords"], 10);
    }
}

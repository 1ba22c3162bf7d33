//! Auth API endpoints
//!
//! Endpoints:
//! - register: POST /api/auth/register
//! - login: POST /api/auth/login
//! - me: GET /api/auth/me
//! - logout: POST /api/auth/logout

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use finboard_core::users::{self, Registration};
use finboard_core::{ErrorContext, User};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Token plus the public user, returned by register and login
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Create an analyst account and sign it in
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let Json(registration) = payload?;
    // required-field check runs first so an empty email reports the missing field
    if !registration.email.trim().is_empty() && !is_valid_email(&registration.email) {
        return Err(ApiError::bad_request("Please enter a valid email address"));
    }

    let context = ErrorContext::new("register");
    let user = users::register(
        state.stores.users.as_ref(),
        registration,
        state.config.auth.min_password_length,
    )
    .await
    .map_err(|e| ApiError::from_core(e, &context))?;

    let token = state.tokens.issue(&user.id)?;
    Ok((StatusCode::CREATED, Json(Session { token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Session>> {
    let Json(request) = payload?;
    let context = ErrorContext::new("login");
    let user = users::authenticate(state.stores.users.as_ref(), &request.email, &request.password)
        .await
        .map_err(|e| ApiError::from_core(e, &context))?;

    log::info!("User {} logged in", user.id);
    let token = state.tokens.issue(&user.id)?;
    Ok(Json(Session { token, user }))
}

pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

/// Tokens are stateless; the client discards its copy
pub async fn logout() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Logged out successfully" }))
}

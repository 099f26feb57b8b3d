//!
//! credence HTTP server
//! --------------------
//! This module defines the Axum-based HTTP API for credence.
//!
//! Responsibilities:
//! - Registration and login endpoints backed by the `identity` module.
//! - Bearer-token authentication for the caller-profile endpoint.
//! - Refresh rotation and logout over server-held refresh tokens.
//! - Translating `AppError` into JSON error bodies with matching status codes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::{get, post}, Router, extract::State, Json};
use axum::response::IntoResponse;
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::identity::{AuthSession, AuthenticatedPrincipal, Registration, SessionAuthenticator};
use crate::store::MemoryUserStore;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<SessionAuthenticator>,
}

/// Start the credence HTTP server with configuration drawn from the
/// environment.
pub async fn run() -> anyhow::Result<()> {
    let config = AuthConfig::from_env();
    run_with_config(config).await
}

pub async fn run_with_config(config: AuthConfig) -> anyhow::Result<()> {
    let store = Arc::new(MemoryUserStore::new());
    let auth = Arc::new(SessionAuthenticator::from_config(store, &config));
    let app = router(AppState { auth });

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Mount all HTTP routes. Split out from [`run_with_config`] so tests can
/// drive the router without binding a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "credence ok" }))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .with_state(state)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get("authorization")?.to_str().ok()?;
    let rest = raw.strip_prefix("Bearer ").or_else(|| raw.strip_prefix("bearer "))?;
    let token = rest.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Explicit boundary authentication: pull the bearer access token out of the
/// headers and validate it. Handlers call this directly; there is no guard
/// middleware in front of the router.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> AppResult<AuthenticatedPrincipal> {
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::auth("unauthenticated", "missing bearer token"))?;
    state.auth.current_user(token).await
}

fn error_response(err: AppError) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"status": "error", "error": err})))
}

fn missing_bearer() -> (StatusCode, Json<Value>) {
    error_response(AppError::auth("unauthenticated", "missing bearer token"))
}

fn session_body(session: &AuthSession) -> Value {
    json!({
        "user": session.user,
        "accessToken": session.tokens.access_token,
        "refreshToken": session.tokens.refresh_token,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterPayload {
    email: String,
    password: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

async fn register(State(state): State<AppState>, Json(payload): Json<RegisterPayload>) -> impl IntoResponse {
    let reg = Registration {
        email: payload.email,
        password: payload.password,
        first_name: payload.first_name,
        last_name: payload.last_name,
    };
    match state.auth.register(reg).await {
        Ok(session) => (StatusCode::CREATED, Json(session_body(&session))),
        Err(e) => error_response(e),
    }
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginPayload>) -> impl IntoResponse {
    match state.auth.login(&payload.email, &payload.password).await {
        Ok(session) => (StatusCode::OK, Json(session_body(&session))),
        Err(e) => error_response(e),
    }
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    match authenticate(&state, &headers).await {
        Ok(principal) => (StatusCode::OK, Json(json!({"user": principal}))),
        Err(e) => error_response(e),
    }
}

async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = bearer_token(&headers) else {
        return missing_bearer();
    };
    match state.auth.refresh(token).await {
        Ok(session) => (StatusCode::OK, Json(session_body(&session))),
        Err(e) => error_response(e),
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = bearer_token(&headers) else {
        return missing_bearer();
    };
    let revoked = state.auth.logout(token);
    (StatusCode::OK, Json(json!({"status": "ok", "revoked": revoked})))
}

//! Axum-based HTTP gateway for the auth workflows.
//!
//! Routes:
//! - `GET  /`         — welcome message
//! - `GET  /health`   — liveness probe
//! - `POST /signup`   — create an account
//! - `POST /signin`   — exchange credentials for a bearer token
//! - `GET  /user/me`  — profile of the bearer token's owner
//!
//! Every failure body is `{"result": false, "error": "<message>"}`.
//! Workflows run on the blocking pool because bcrypt is deliberately slow.

use crate::auth::{validate, AuthError, AuthResult, AuthService};
use crate::config::Config;
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB)
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

/// Concrete return type for handlers (avoids `impl IntoResponse` inference issues).
type ApiResponse = (StatusCode, Json<serde_json::Value>);

/// Build the router with body-limit and timeout middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/signup", post(handle_signup))
        .route("/signin", post(handle_signin))
        .route("/user/me", get(handle_user_me))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

/// Bind and serve until Ctrl-C.
pub async fn run_gateway(config: &Config) -> Result<()> {
    let auth = Arc::new(AuthService::from_config(config)?);

    let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    println!("🔐 userauth listening on http://{local}");
    println!("  POST /signup   — create new user account");
    println!("  POST /signin   — authenticate and get bearer token");
    println!("  GET  /user/me  — current user profile (Authorization: Bearer <token>)");
    tracing::info!(%local, "Gateway started");

    axum::serve(listener, router(AppState { auth }))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// Request body for sign-up.
#[derive(Debug, Deserialize)]
struct SignupBody {
    username: String,
    password: String,
    fname: String,
    lname: String,
}

/// Request body for sign-in.
#[derive(Debug, Deserialize)]
struct SigninBody {
    username: String,
    password: String,
}

/// Extract bearer token from Authorization header. The scheme is
/// case-insensitive; anything other than `Bearer` counts as no token.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

fn error_response(err: &AuthError) -> ApiResponse {
    let status = match err {
        AuthError::DuplicateUsername => StatusCode::BAD_REQUEST,
        AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AuthError::InvalidCredentials
        | AuthError::MissingToken
        | AuthError::InvalidToken
        | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
        AuthError::Storage(_) | AuthError::Crypto(_) | AuthError::Internal(_) => {
            tracing::error!("Request failed: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(serde_json::json!({"result": false, "error": err.public_message()})),
    )
}

fn rejection_response(rejection: &JsonRejection) -> ApiResponse {
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (
        status,
        Json(serde_json::json!({
            "result": false,
            "error": format!("Invalid request: {}", rejection.body_text()),
        })),
    )
}

/// Run a workflow off the async executor.
async fn run_blocking<T, F>(state: &AppState, work: F) -> AuthResult<T>
where
    F: FnOnce(&AuthService) -> AuthResult<T> + Send + 'static,
    T: Send + 'static,
{
    let auth = Arc::clone(&state.auth);
    tokio::task::spawn_blocking(move || work(&auth))
        .await
        .map_err(|e| AuthError::Internal(format!("worker task failed: {e}")))?
}

/// GET / — welcome message
async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "Welcome to the User Auth API"}))
}

/// GET /health — always public
async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// POST /signup — create a new user account.
async fn handle_signup(
    State(state): State<AppState>,
    body: Result<Json<SignupBody>, JsonRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(Json(b)) => b,
        Err(e) => return rejection_response(&e),
    };

    if let Err(e) = validate::signup(&body.username, &body.password, &body.fname, &body.lname) {
        return error_response(&e);
    }

    let result = run_blocking(&state, move |auth| {
        auth.register(&body.username, &body.password, &body.fname, &body.lname)
    })
    .await;

    match result {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "result": true,
                "message": "SignUp success. Please proceed to Signin",
            })),
        ),
        Err(e) => error_response(&e),
    }
}

/// POST /signin — authenticate and get a bearer token.
async fn handle_signin(
    State(state): State<AppState>,
    body: Result<Json<SigninBody>, JsonRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(Json(b)) => b,
        Err(e) => return rejection_response(&e),
    };

    if let Err(e) = validate::signin(&body.username, &body.password) {
        return error_response(&e);
    }

    let result = run_blocking(&state, move |auth| {
        auth.authenticate(&body.username, &body.password)
    })
    .await;

    match result {
        Ok(token) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "result": true,
                "jwt": token,
                "message": "Signin Success",
            })),
        ),
        Err(e) => error_response(&e),
    }
}

/// GET /user/me — profile of the token's owner.
async fn handle_user_me(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let token = extract_bearer_token(&headers).map(str::to_owned);

    let result = run_blocking(&state, move |auth| auth.fetch_profile(token.as_deref())).await;

    match result {
        Ok(profile) => (
            StatusCode::OK,
            Json(serde_json::json!({"result": true, "data": profile})),
        ),
        Err(e) => error_response(&e),
    }
}

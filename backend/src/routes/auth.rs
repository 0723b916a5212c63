use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use deep_thoughts_common::{AuthPayload, LoginRequest, SignupRequest};

use crate::error::{AppError, Result};
use crate::AppState;

/// POST /signup - create an account and return a credential for it
///
/// Password hashing runs on the blocking pool.
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthPayload>)> {
    let store_state = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        store_state
            .store
            .create_user(&request.username, &request.email, &request.password)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;
    let token = state.tokens.issue(&user.claim())?;

    tracing::info!(username = %user.username, "User signed up");

    Ok((StatusCode::CREATED, Json(AuthPayload { token, user })))
}

/// POST /login - exchange email and password for a credential
async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthPayload>> {
    let store_state = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        store_state
            .store
            .authenticate_user(&request.email, &request.password)
            .inspect_err(|_| tracing::info!(email = %request.email, "Login failed"))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;
    let token = state.tokens.issue(&user.claim())?;

    tracing::info!(username = %user.username, "User logged in");

    Ok(Json(AuthPayload { token, user }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .with_state(state)
}

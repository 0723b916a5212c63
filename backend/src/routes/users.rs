use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use deep_thoughts_common::User;

use crate::auth::Identity;
use crate::error::{AppError, Result};
use crate::AppState;

/// GET /me - the logged-in user, looked up by the id in their credential
async fn me(State(state): State<Arc<AppState>>, identity: Identity) -> Result<Json<User>> {
    let claim = identity.require()?;
    let user = state
        .store
        .user_by_id(&claim.id)?
        .ok_or_else(|| AppError::NotFound(format!("user {}", claim.id)))?;
    Ok(Json(user))
}

/// GET /users
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>> {
    Ok(Json(state.store.list_users()?))
}

/// GET /users/:username
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<User>> {
    let user = state
        .store
        .user_by_username(&username)?
        .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;
    Ok(Json(user))
}

/// POST /friends/:friend_id - add a friend to the logged-in user
async fn add_friend(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(friend_id): Path<String>,
) -> Result<Json<User>> {
    let claim = identity.require()?;
    let user = state.store.add_friend(claim, &friend_id)?;
    Ok(Json(user))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/me", get(me))
        .route("/users", get(list_users))
        .route("/users/:username", get(get_user))
        .route("/friends/:friend_id", post(add_friend))
        .with_state(state)
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use deep_thoughts_common::{NewReaction, NewThought, Thought};
use serde::Deserialize;

use crate::auth::Identity;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
struct ThoughtsQuery {
    username: Option<String>,
}

/// GET /thoughts?username= - newest first, optionally by one author
async fn list_thoughts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ThoughtsQuery>,
) -> Result<Json<Vec<Thought>>> {
    let username = query.username.as_deref().filter(|u| !u.is_empty());
    Ok(Json(state.store.thoughts(username)?))
}

/// GET /thoughts/:id
async fn get_thought(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Thought>> {
    let thought = state
        .store
        .thought(&id)?
        .ok_or_else(|| AppError::NotFound(format!("thought {}", id)))?;
    Ok(Json(thought))
}

/// POST /thoughts
async fn add_thought(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(body): Json<NewThought>,
) -> Result<(StatusCode, Json<Thought>)> {
    let claim = identity.require()?;
    let thought = state.store.add_thought(claim, &body.thought_text)?;
    Ok((StatusCode::CREATED, Json(thought)))
}

/// POST /thoughts/:id/reactions
async fn add_reaction(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<NewReaction>,
) -> Result<Json<Thought>> {
    let claim = identity.require()?;
    let thought = state.store.add_reaction(claim, &id, &body.reaction_body)?;
    Ok(Json(thought))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/thoughts", get(list_thoughts).post(add_thought))
        .route("/thoughts/:id", get(get_thought))
        .route("/thoughts/:id/reactions", post(add_reaction))
        .with_state(state)
}

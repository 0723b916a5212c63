pub mod auth;
pub mod health;
pub mod thoughts;
pub mod users;

use std::sync::Arc;

use axum::http::Uri;
use axum::Router;

use crate::error::AppError;
use crate::AppState;

async fn api_not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("route {}", uri.path()))
}

/// Every route served under `/api`.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::router(state.clone()))
        .merge(users::router(state.clone()))
        .merge(thoughts::router(state))
        .fallback(api_not_found)
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
}

/// GET /health - 503 when the store cannot answer a trivial query
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (status, label, database) = match state.store.counts() {
        Ok(_) => (StatusCode::OK, "ok", "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}

/// GET /metrics - Prometheus text exposition
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let mut body = format!(
        "# HELP deepthoughts_info Service information\n\
         # TYPE deepthoughts_info gauge\n\
         deepthoughts_info{{version=\"{}\"}} 1\n",
        env!("CARGO_PKG_VERSION")
    );

    if let Ok(counts) = state.store.counts() {
        body.push_str(&format!(
            "# HELP deepthoughts_users Registered users\n\
             # TYPE deepthoughts_users gauge\n\
             deepthoughts_users {}\n\
             # HELP deepthoughts_thoughts Posted thoughts\n\
             # TYPE deepthoughts_thoughts gauge\n\
             deepthoughts_thoughts {}\n",
            counts.users, counts.thoughts
        ));
    }

    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

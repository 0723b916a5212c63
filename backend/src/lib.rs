pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod store;
pub mod test_util;

pub use auth::{Identity, TokenService, Verification};
pub use config::Config;
pub use error::AppError;
pub use store::{Store, StoreError};

use std::path::Path;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Issuer and verifier, keyed by the configured secret.
    pub tokens: TokenService,
    pub store: Store,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, StoreError> {
        let tokens = TokenService::from_config(&config.auth);
        let store = Store::open(&config.database.url)?;
        Ok(Self {
            config,
            tokens,
            store,
        })
    }
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origin = match cors.origin_list() {
        None => AllowOrigin::from(Any),
        Some(origins) => AllowOrigin::list(origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| tracing::warn!("Ignoring invalid CORS origin: {}", origin))
                .ok()
        })),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the full router: health, `/api`, optional static client, and the
/// layer stack. Unknown paths outside `/api` get the client's `index.html`.
/// The authenticator wraps everything so every handler sees an [`Identity`].
pub fn app(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .merge(routes::health::router(state.clone()))
        .nest("/api", routes::api_router(state.clone()));

    if let Some(dir) = &state.config.server.static_dir {
        let index = Path::new(dir).join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router
        .layer(middleware::from_fn(logging::request_logger))
        .layer(middleware::from_fn_with_state(state.clone(), auth::authenticate))
        .layer(cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
}

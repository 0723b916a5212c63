use std::sync::Arc;

use chrono::Utc;
use deep_thoughts_common::IdentityClaim;

use crate::config::{AuthConfig, Config, CorsConfig, DatabaseConfig, LoggingConfig, ServerConfig};
use crate::AppState;

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_LIFETIME_SECS: u64 = 2 * 60 * 60;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3001,
            static_dir: None,
        },
        auth: AuthConfig {
            secret: TEST_SECRET.to_string(),
            token_lifetime_secs: TEST_LIFETIME_SECS,
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        cors: CorsConfig {
            origins: "*".to_string(),
        },
    }
}

/// State over an in-memory store.
pub fn create_test_state() -> Arc<AppState> {
    Arc::new(AppState::new(test_config()).expect("in-memory store opens"))
}

pub fn test_claim(username: &str) -> IdentityClaim {
    IdentityClaim::new(username, format!("{}@example.com", username), format!("id-{}", username))
}

/// Credential for `claim` issued now.
pub fn generate_test_token(state: &AppState, claim: &IdentityClaim) -> String {
    state.tokens.issue(claim).expect("Failed to issue token")
}

/// Credential for `claim` issued far enough in the past to be expired.
pub fn generate_expired_token(state: &AppState, claim: &IdentityClaim) -> String {
    let issued_at = Utc::now().timestamp() - state.tokens.lifetime_secs() - 60;
    state
        .tokens
        .issue_at(claim, issued_at)
        .expect("Failed to issue token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

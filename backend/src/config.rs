//! Configuration for the API server.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the built client. Unmatched paths fall back to its
    /// `index.html` when set.
    #[serde(default)]
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

/// Token signing configuration.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret shared by the issuer and the verifier.
    pub secret: String,
    /// Credential lifetime in seconds (default: 2 hours).
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: u64,
}

// Keep the secret out of debug output.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_lifetime_secs", &self.token_lifetime_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path, optionally prefixed with `sqlite:`. `:memory:` is allowed.
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// `*` or a comma-separated list of origins.
    #[serde(default = "default_cors_origins")]
    pub origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
        }
    }
}

impl CorsConfig {
    /// Explicit origins, or `None` when any origin is allowed.
    pub fn origin_list(&self) -> Option<Vec<String>> {
        let trimmed = self.origins.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return None;
        }
        Some(
            trimmed
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3001
}
fn default_token_lifetime() -> u64 {
    2 * 60 * 60
}
fn default_database_url() -> String {
    "sqlite:./data/deep-thoughts.db".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cors_origins() -> String {
    "*".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (THOUGHTS__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("auth.token_lifetime_secs", default_token_lifetime() as i64)?
            .set_default("database.url", default_database_url())?
            .set_default("logging.level", default_log_level())?
            .set_default("cors.origins", default_cors_origins())?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("THOUGHTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 3001);
        assert!(server.static_dir.is_none());
    }

    #[test]
    fn test_auth_config_defaults_lifetime_to_two_hours() {
        let auth: AuthConfig = serde_json::from_str(r#"{"secret":"s"}"#).unwrap();
        assert_eq!(auth.token_lifetime_secs, 7200);
    }

    #[test]
    fn test_auth_config_requires_secret() {
        assert!(serde_json::from_str::<AuthConfig>("{}").is_err());
    }

    #[test]
    fn test_auth_config_debug_redacts_secret() {
        let auth = AuthConfig {
            secret: "mysecretsshhhhh".to_string(),
            token_lifetime_secs: 60,
        };
        let debug = format!("{:?}", auth);
        assert!(!debug.contains("mysecretsshhhhh"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_cors_wildcard_has_no_origin_list() {
        assert!(CorsConfig::default().origin_list().is_none());
    }

    #[test]
    fn test_cors_origin_list_splits_and_trims() {
        let cors = CorsConfig {
            origins: "http://a.test, http://b.test,".to_string(),
        };
        assert_eq!(
            cors.origin_list(),
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
    }
}

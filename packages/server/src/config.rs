//! Server configuration.
//!
//! Loading order (later sources override earlier):
//! 1. built-in defaults
//! 2. `<config_dir>/default.toml` (optional)
//! 3. `<config_dir>/local.toml` (optional, not in git)
//! 4. environment variables with the `TEAMQUIZ__` prefix, e.g. `TEAMQUIZ__SERVER__PORT`
//! 5. `TEST_DATABASE`, which replaces `catalog.path`

use std::{net::SocketAddr, path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;

use crate::usecase::CleanupPolicy;

const DEFAULTS: &str = r#"
    [server]
    host = "127.0.0.1"
    port = 8080

    [logging]
    level = "info"
    format = "pretty"

    [auth]
    jwt_secret = "teamquiz-dev-secret"
    token_ttl_secs = 86400

    [game]
    chat_history_limit = 50
    outbound_buffer = 256
    heartbeat_secs = 30

    [cleanup]
    interval_secs = 300
    waiting_ttl_secs = 1800
    empty_lobby_ttl_secs = 300

    [catalog]
    path = "data/catalog.json"
"#;

/// Environment variable naming an alternate catalog file (tests only).
pub const TEST_DATABASE_ENV: &str = "TEST_DATABASE";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub game: GameConfig,
    pub cleanup: CleanupConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub chat_history_limit: usize,
    /// Capacity of each push channel's outbound queue
    pub outbound_buffer: usize,
    pub heartbeat_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    pub interval_secs: u64,
    pub waiting_ttl_secs: u64,
    pub empty_lobby_ttl_secs: u64,
}

impl CleanupConfig {
    pub fn policy(&self) -> CleanupPolicy {
        CleanupPolicy {
            waiting_ttl: Duration::from_secs(self.waiting_ttl_secs),
            empty_lobby_ttl: Duration::from_secs(self.empty_lobby_ttl_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub path: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from `config_dir` and the environment.
    pub fn load(config_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = config_dir.as_ref();
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULTS, config::FileFormat::Toml))
            .add_source(config::File::from(dir.join("default")).required(false))
            .add_source(config::File::from(dir.join("local")).required(false))
            .add_source(config::Environment::with_prefix("TEAMQUIZ").separator("__"));

        if let Ok(path) = std::env::var(TEST_DATABASE_ENV) {
            builder = builder.set_override("catalog.path", path)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Built-in defaults plus `overrides`, without touching files or the environment.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULTS, config::FileFormat::Toml));
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }
        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }
        if self.auth.token_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.token_ttl_secs must be positive".to_string(),
            ));
        }
        let limits = [
            ("game.chat_history_limit", self.game.chat_history_limit as u64),
            ("game.outbound_buffer", self.game.outbound_buffer as u64),
            ("game.heartbeat_secs", self.game.heartbeat_secs),
            ("cleanup.interval_secs", self.cleanup.interval_secs),
            ("cleanup.waiting_ttl_secs", self.cleanup.waiting_ttl_secs),
            ("cleanup.empty_lobby_ttl_secs", self.cleanup.empty_lobby_ttl_secs),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidValue(format!("{name} must not be zero")));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue(format!("server address: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // テスト項目: 設定ファイルがなくても既定値で起動できる
        let config = Config::load_for_test(&[]).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.game.chat_history_limit, 50);
        assert_eq!(config.game.outbound_buffer, 256);
        assert_eq!(config.cleanup.policy().waiting_ttl, Duration::from_secs(1800));
        assert_eq!(config.cleanup.policy().empty_lobby_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides_and_socket_addr() {
        let config = Config::load_for_test(&[("server.host", "0.0.0.0"), ("server.port", "9000")])
            .unwrap();

        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:9000");
    }

    #[test]
    fn test_validation_rejects_empty_secret_and_zero_limits() {
        // テスト項目: 空の JWT シークレットと 0 の上限値は拒否される
        let empty_secret = Config::load_for_test(&[("auth.jwt_secret", " ")]);
        assert!(matches!(empty_secret, Err(ConfigError::InvalidValue(_))));

        let zero_buffer = Config::load_for_test(&[("game.outbound_buffer", "0")]);
        let message = zero_buffer.unwrap_err().to_string();
        assert!(message.contains("game.outbound_buffer"));
    }

    #[test]
    fn test_secret_is_not_logged() {
        let config = Config::load_for_test(&[]).unwrap();
        assert!(!format!("{:?}", config.auth).contains("teamquiz-dev-secret"));
    }
}

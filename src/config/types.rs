//! Root configuration types.

use super::defaults::{default_cors_origins, default_port};
use super::game::GameConfig;
use super::logging::LoggingConfig;
use super::server::ServerConfig;
use serde::{Deserialize, Serialize};

/// Root configuration struct for Trivion.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// TCP listen port; the `PORT` environment variable overrides this.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Optional external broker URL; the `PUBSUB_URL` environment variable
    /// overrides this. When unset the broadcast bus is purely in-process.
    #[serde(default)]
    pub pubsub_url: Option<String>,
    /// Comma-separated CORS origins, or "*" for permissive.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            pubsub_url: None,
            cors_origins: default_cors_origins(),
            server: ServerConfig::default(),
            game: GameConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

//! Configuration module for Trivion.
//!
//! Supports an optional `config.json`, environment variable overrides for
//! the documented knobs (`PORT`, `PUBSUB_URL`), and sensible defaults.
//!
//! # Module Structure
//!
//! - [`types`]: Root `Config` struct
//! - [`server`]: Connection/heartbeat/reconnection settings
//! - [`game`]: Game pacing and validation limits
//! - [`logging`]: Logging configuration
//! - [`loader`]: Configuration loading functions
//! - [`validation`]: Configuration validation functions
//! - [`defaults`]: Default value functions

pub mod defaults;
pub mod game;
pub mod loader;
pub mod logging;
pub mod server;
pub mod types;
pub mod validation;

pub use game::GameConfig;
pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use server::ServerConfig;
pub use types::Config;
pub use validation::validate_config;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.port, 8000);
        assert!(config.pubsub_url.is_none());
        assert_eq!(config.server.heartbeat_interval_secs, 15);
        assert_eq!(config.server.heartbeat_timeout_secs, 30);
        assert_eq!(config.server.reconnect_window_secs, 10);
        assert_eq!(config.game.countdown_secs, 3);
        assert_eq!(config.game.default_deadline_secs, 20);
        assert_eq!(config.game.min_deadline_secs, 5);
        assert_eq!(config.game.max_deadline_secs, 60);
        assert_eq!(config.game.max_name_length, 20);
        assert_eq!(config.logging.dir, "logs");
        assert_eq!(config.logging.rotation, "daily");
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(config.port, deserialized.port);
        assert_eq!(
            config.server.outbound_queue_capacity,
            deserialized.server.outbound_queue_capacity
        );
        assert_eq!(
            config.game.podium_step_ms,
            deserialized.game.podium_step_ms
        );
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Error.as_str(), "error");
    }
}

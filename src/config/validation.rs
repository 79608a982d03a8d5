//! Configuration validation.

use super::Config;

/// Check a loaded configuration for values the server cannot run with.
/// Returns a newline-separated description of every problem found.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut problems = Vec::new();

    if config.port == 0 {
        problems.push("port must be non-zero".to_string());
    }

    if config.server.heartbeat_interval_secs == 0 {
        problems.push("server.heartbeat_interval_secs must be non-zero".to_string());
    }
    if config.server.heartbeat_timeout_secs <= config.server.heartbeat_interval_secs {
        problems.push(format!(
            "server.heartbeat_timeout_secs ({}) must exceed heartbeat_interval_secs ({})",
            config.server.heartbeat_timeout_secs, config.server.heartbeat_interval_secs
        ));
    }
    if config.server.outbound_queue_capacity == 0 {
        problems.push("server.outbound_queue_capacity must be non-zero".to_string());
    }

    if config.game.min_deadline_secs == 0 {
        problems.push("game.min_deadline_secs must be non-zero".to_string());
    }
    if config.game.min_deadline_secs > config.game.max_deadline_secs {
        problems.push(format!(
            "game.min_deadline_secs ({}) must not exceed max_deadline_secs ({})",
            config.game.min_deadline_secs, config.game.max_deadline_secs
        ));
    }
    if config.game.default_deadline_secs < config.game.min_deadline_secs
        || config.game.default_deadline_secs > config.game.max_deadline_secs
    {
        problems.push(format!(
            "game.default_deadline_secs ({}) must lie within [{}, {}]",
            config.game.default_deadline_secs,
            config.game.min_deadline_secs,
            config.game.max_deadline_secs
        ));
    }
    if config.game.max_name_length == 0 {
        problems.push("game.max_name_length must be non-zero".to_string());
    }
    if config.game.code_allocation_attempts == 0 {
        problems.push("game.code_allocation_attempts must be non-zero".to_string());
    }

    if let Some(pubsub_url) = &config.pubsub_url {
        if let Err(e) = url::Url::parse(pubsub_url) {
            problems.push(format!("pubsub_url '{pubsub_url}' is not a valid URL: {e}"));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("\n"))
    }
}

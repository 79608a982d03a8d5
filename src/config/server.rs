//! Server behavior configuration types.

use super::defaults::{
    default_heartbeat_interval_secs, default_heartbeat_timeout_secs, default_max_message_size,
    default_outbound_queue_capacity, default_reconnect_sweep_ms, default_reconnect_window_secs,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection and reconnection behavior.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Interval between `ping_heartbeat` frames (seconds)
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// A connection with no `pong_heartbeat` for this long is dropped (seconds)
    #[serde(default = "default_heartbeat_timeout_secs")]
    pub heartbeat_timeout_secs: u64,
    /// Grace window for disconnected members to resume (seconds)
    #[serde(default = "default_reconnect_window_secs")]
    pub reconnect_window_secs: u64,
    /// How often expired reconnection slots are collected (milliseconds)
    #[serde(default = "default_reconnect_sweep_ms")]
    pub reconnect_sweep_ms: u64,
    /// Bounded per-connection outbound queue; overflow drops the subscriber
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// Maximum accepted inbound frame size (bytes)
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl ServerConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    pub fn reconnect_window(&self) -> Duration {
        Duration::from_secs(self.reconnect_window_secs)
    }

    pub fn reconnect_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_sweep_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            heartbeat_timeout_secs: default_heartbeat_timeout_secs(),
            reconnect_window_secs: default_reconnect_window_secs(),
            reconnect_sweep_ms: default_reconnect_sweep_ms(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            max_message_size: default_max_message_size(),
        }
    }
}

//! Default value functions for configuration fields.
//!
//! Used by serde's `#[serde(default = ...)]` attributes throughout the
//! configuration system.

use super::logging::LogFormat;

// =============================================================================
// Port & Root Config
// =============================================================================

pub const fn default_port() -> u16 {
    8000
}

pub fn default_cors_origins() -> String {
    "*".to_string()
}

// =============================================================================
// Server Defaults
// =============================================================================

pub const fn default_heartbeat_interval_secs() -> u64 {
    15
}

pub const fn default_heartbeat_timeout_secs() -> u64 {
    30
}

pub const fn default_reconnect_window_secs() -> u64 {
    10
}

/// How often the sweeper looks for expired reconnection slots (milliseconds).
pub const fn default_reconnect_sweep_ms() -> u64 {
    250
}

pub const fn default_outbound_queue_capacity() -> usize {
    64
}

pub const fn default_max_message_size() -> usize {
    65536 // 64KB
}

// =============================================================================
// Game Defaults
// =============================================================================

pub const fn default_countdown_secs() -> u64 {
    3
}

pub const fn default_question_deadline_secs() -> u64 {
    20
}

pub const fn default_min_deadline_secs() -> u64 {
    5
}

pub const fn default_max_deadline_secs() -> u64 {
    60
}

/// Pause before each podium position reveal (milliseconds).
pub const fn default_podium_step_ms() -> u64 {
    1000
}

/// Pause between the last reveal and `podium_complete` (milliseconds).
pub const fn default_podium_finale_ms() -> u64 {
    2000
}

pub const fn default_max_name_length() -> usize {
    20
}

/// Collision retries before room code allocation gives up.
pub const fn default_code_allocation_attempts() -> usize {
    10
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Text
}

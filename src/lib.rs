#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! # Trivion
//!
//! A real-time multiplayer quiz server over WebSockets.
//!
//! Rooms host live sessions: an administrator drives timed questions, any
//! number of players answer concurrently, and scores, results, podium
//! reveals and rankings fan out to every room member. All state is
//! in-memory and lost on restart.

/// Typed broadcast fan-out with bounded per-subscriber queues
pub mod broadcast;

/// Per-room Lamport clock
pub mod clock;

/// Server configuration and environment variables
pub mod config;

/// Optional external pub/sub fabric interface
pub mod fabric;

/// Game coordinator: phase machine, timers, scoring
pub mod game;

/// Structured logging configuration
pub mod logging;

/// Wire protocol definitions
pub mod protocol;

/// Reconnection window bookkeeping
pub mod reconnect;

/// Process-wide room registry
pub mod registry;

/// Room state: members, questions, clock, bus
pub mod room;

/// Room password hashing
pub mod security;

/// Server orchestration and command handlers
pub mod server;

/// WebSocket connection handling and HTTP API
pub mod websocket;

//! Transport adapter: WebSocket connections and the HTTP JSON API.

pub mod api;
mod connection;
pub mod routes;

pub use routes::create_router;

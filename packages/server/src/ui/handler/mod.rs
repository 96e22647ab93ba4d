//! HTTP / WebSocket endpoint handlers.

mod http;
mod websocket;

pub use http::{health_check, root};
pub use websocket::websocket_handler;

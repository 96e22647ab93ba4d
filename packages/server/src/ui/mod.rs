//! Party relay server UI layer: HTTP/WebSocket endpoints and server wiring.

mod handler;
mod server;
mod signal;
pub mod state; // UseCase 層からアクセスするため public

pub use server::Server;

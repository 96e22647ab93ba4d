//! Data Transfer Objects (DTOs) for the relay service.
//!
//! DTOs are organized by wire context:
//! - `client`: client-facing WebSocket frames, shape `{"type", "payload"}`
//! - `bus`: inter-process relay bus envelopes, shape `{"command", "data"}`
//!
//! The two envelope shapes are deliberately distinct so a frame is never
//! ambiguous between the two contexts.

pub mod bus;
pub mod client;
pub mod conversion;

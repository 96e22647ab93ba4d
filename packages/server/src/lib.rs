//! Partyline relay server library.
//!
//! This library implements a horizontally-scalable relay service: browser
//! clients discover each other inside named parties and exchange WebRTC
//! signaling and synchronization messages through it. Room membership is
//! shared across processes via a presence store, and messages fan out
//! across processes via a publish/subscribe relay bus.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

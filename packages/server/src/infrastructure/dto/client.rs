//! WebSocket client-facing message DTOs.
//!
//! Every frame in either direction is a self-describing envelope
//! `{"type": string, "payload": object}`. Inbound payloads are validated
//! per declared type; outbound frames are built through the constructors
//! on [`ClientEnvelope`].

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::{Participant, UserId};

use super::conversion::ParticipantDto;

/// Client-facing message types.
pub mod types {
    // inbound
    pub const GET_CURRENT_PARTY_USERS: &str = "getCurrentPartyUsers";
    pub const NEW_SIGNAL: &str = "newSignal";
    pub const RETURN_SIGNAL: &str = "returnSignal";
    pub const BROADCAST_MESSAGE: &str = "broadcastMessage";
    pub const SET_USER_MUTE: &str = "setUserMute";
    pub const TIME_UPDATE: &str = "timeUpdate";
    pub const SET_ADMIN_CONTROLS: &str = "setAdminControls";

    // server-originated
    pub const USER_ID: &str = "userId";
    pub const CURRENT_PARTY_USERS: &str = "currentPartyUsers";
    pub const NEW_FOREIGN_SIGNAL: &str = "newForeignSignal";
    pub const RETURNED_SIGNAL: &str = "returnedSignal";
    pub const NEW_FOREIGN_MESSAGE: &str = "newForeignMessage";
    pub const PROMOTE_TO_ROOM_OWNER: &str = "promoteToRoomOwner";
    pub const ERROR: &str = "error";
}

/// Self-describing client-facing frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientEnvelope {
    pub r#type: String,
    pub payload: Value,
}

impl ClientEnvelope {
    fn new(r#type: &str, payload: Value) -> Self {
        Self {
            r#type: r#type.to_string(),
            payload,
        }
    }

    /// `userId` frame, sent immediately on connect.
    pub fn user_assigned(user_id: &UserId) -> Self {
        Self::new(types::USER_ID, json!({ "userId": user_id.as_str() }))
    }

    /// `currentPartyUsers` frame: membership snapshot reply to a join.
    pub fn current_party_users(users: &[Participant]) -> Self {
        let users: Vec<ParticipantDto> = users.iter().map(ParticipantDto::from).collect();
        Self::new(
            types::CURRENT_PARTY_USERS,
            json!({ "users": users }),
        )
    }

    /// `newForeignSignal` frame: forward-direction point-to-point signal.
    pub fn new_foreign_signal(sender_id: &str, signal: Value, username: &str) -> Self {
        Self::new(
            types::NEW_FOREIGN_SIGNAL,
            json!({
                "senderId": sender_id,
                "signal": signal,
                "username": username,
            }),
        )
    }

    /// `returnedSignal` frame: reply-direction point-to-point signal.
    pub fn returned_signal(sender_id: &str, signal: Value) -> Self {
        Self::new(
            types::RETURNED_SIGNAL,
            json!({
                "senderId": sender_id,
                "signal": signal,
            }),
        )
    }

    /// Relayed broadcast frame; the payload mirrors the sender's.
    pub fn relayed(r#type: &str, payload: Value) -> Self {
        Self::new(r#type, payload)
    }

    /// `promoteToRoomOwner` frame.
    pub fn promote_to_room_owner(user_id: &str, username: &str) -> Self {
        Self::new(
            types::PROMOTE_TO_ROOM_OWNER,
            json!({ "userId": user_id, "username": username }),
        )
    }

    /// `error` frame.
    pub fn error(message: &str) -> Self {
        Self::new(types::ERROR, json!({ "message": message }))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

/// Payload of `getCurrentPartyUsers` (join request).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub party_id: String,
    pub username: String,
}

/// Payload of `newSignal` (forward-direction signal).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSignalPayload {
    pub recipient_id: String,
    pub signal: Value,
    pub username: String,
}

/// Payload of `returnSignal` (reply-direction signal).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnSignalPayload {
    pub recipient_id: String,
    pub signal: Value,
}

/// Payload of `broadcastMessage`. Only `content` is required; the whole
/// payload is relayed verbatim.
#[derive(Debug, Deserialize)]
pub struct BroadcastMessagePayload {
    #[allow(dead_code)]
    pub content: Value,
}

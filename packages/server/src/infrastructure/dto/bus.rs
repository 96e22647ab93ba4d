//! Inter-process relay bus DTOs.
//!
//! Envelopes published on a party's channel have the shape
//! `{"command": string, "data": object}`. `data` always carries the sending
//! `userId` so every subscribed process (including the publisher's own) can
//! exclude the sender from fan-out and route point-to-point deliveries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Relay bus commands.
pub mod commands {
    pub const REDIRECT_SIGNAL: &str = "redirectSignal";
    pub const BROADCAST_MESSAGE: &str = "broadcastMessage";
    pub const SET_USER_MUTE: &str = "setUserMute";
    pub const TIME_UPDATE: &str = "timeUpdate";
    pub const SET_ADMIN_CONTROLS: &str = "setAdminControls";
    pub const PROMOTE_TO_ROOM_OWNER: &str = "promoteToRoomOwner";
}

/// Self-describing bus envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusEnvelope {
    pub command: String,
    pub data: Value,
}

impl BusEnvelope {
    fn new(command: &str, data: Value) -> Self {
        Self {
            command: command.to_string(),
            data,
        }
    }

    /// Point-to-point signal redirection.
    pub fn redirect_signal(data: &RedirectSignalData) -> Self {
        Self::new(
            commands::REDIRECT_SIGNAL,
            serde_json::to_value(data).unwrap(),
        )
    }

    /// Party-wide broadcast relay (`broadcastMessage`, `setUserMute`,
    /// `timeUpdate`, `setAdminControls`).
    pub fn relayed(command: &str, data: &RelayedData) -> Self {
        Self::new(command, serde_json::to_value(data).unwrap())
    }

    /// Ownership-change notice.
    pub fn promote_to_room_owner(user_id: &str, username: &str) -> Self {
        let data = PromoteData {
            user_id: user_id.to_string(),
            username: username.to_string(),
        };
        Self::new(
            commands::PROMOTE_TO_ROOM_OWNER,
            serde_json::to_value(&data).unwrap(),
        )
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

/// Data of a `redirectSignal` command.
///
/// `username` is carried for the forward direction only; the reply
/// direction sets `is_reply` and omits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedirectSignalData {
    /// The sending user.
    pub user_id: String,
    pub recipient_id: String,
    pub signal: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub is_reply: bool,
}

/// Data of a party-wide broadcast command; `payload` mirrors the sending
/// client's payload verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RelayedData {
    /// The sending user, excluded from fan-out.
    pub user_id: String,
    pub payload: Value,
}

/// Data of a `promoteToRoomOwner` command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromoteData {
    pub user_id: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bus_envelope_round_trip() {
        // テスト項目: バスエンベロープが {command, data} 形式で直列化される
        // given (前提条件):
        let envelope = BusEnvelope::promote_to_room_owner("u2", "bob");

        // when (操作):
        let json = envelope.to_json();
        let parsed: BusEnvelope = serde_json::from_str(&json).unwrap();

        // then (期待する結果):
        assert_eq!(parsed.command, "promoteToRoomOwner");
        assert_eq!(parsed.data["userId"], "u2");
        assert_eq!(parsed.data["username"], "bob");
    }

    #[test]
    fn test_redirect_signal_forward_direction_keeps_username() {
        // テスト項目: 順方向の redirectSignal は username を運ぶ
        // given (前提条件):
        let data = RedirectSignalData {
            user_id: "u1".to_string(),
            recipient_id: "u2".to_string(),
            signal: json!({"sdp": "offer"}),
            username: Some("alice".to_string()),
            is_reply: false,
        };

        // when (操作):
        let envelope = BusEnvelope::redirect_signal(&data);
        let parsed: RedirectSignalData = serde_json::from_value(envelope.data).unwrap();

        // then (期待する結果):
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_redirect_signal_reply_direction_omits_username() {
        // テスト項目: 応答方向の redirectSignal は username フィールドを持たない
        // given (前提条件):
        let data = RedirectSignalData {
            user_id: "u2".to_string(),
            recipient_id: "u1".to_string(),
            signal: json!({"sdp": "answer"}),
            username: None,
            is_reply: true,
        };

        // when (操作):
        let envelope = BusEnvelope::redirect_signal(&data);

        // then (期待する結果):
        assert!(envelope.data.get("username").is_none());
        assert_eq!(envelope.data["isReply"], true);
    }

    #[test]
    fn test_relayed_data_carries_sender() {
        // テスト項目: ブロードキャスト系コマンドの data が送信者 userId を運ぶ
        // given (前提条件):
        let data = RelayedData {
            user_id: "u1".to_string(),
            payload: json!({"content": "hello"}),
        };

        // when (操作):
        let envelope = BusEnvelope::relayed(commands::BROADCAST_MESSAGE, &data);

        // then (期待する結果):
        assert_eq!(envelope.command, "broadcastMessage");
        assert_eq!(envelope.data["userId"], "u1");
        assert_eq!(envelope.data["payload"]["content"], "hello");
    }

    #[test]
    fn test_envelope_rejects_missing_command() {
        // テスト項目: command フィールド欠落はデコードエラーになる
        // given (前提条件):
        let raw = r#"{"data":{}}"#;

        // when (操作):
        let result = serde_json::from_str::<BusEnvelope>(raw);

        // then (期待する結果):
        assert!(result.is_err());
    }
}

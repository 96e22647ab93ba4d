//! Redis PresenceStore 実装
//!
//! ## キー設計
//!
//! - `{partyId}:users` — パーティのメンバー集合（set）
//! - `{partyId}:user:{userId}` — 参加者レコード（hash）
//!
//! boolean フィールドは `"true"` / `"false"` の文字列としてエンコードする。
//! メンバー集合とレコードの追加・削除は MULTI パイプラインでまとめて発行する。
//!
//! ## 設計ノート
//!
//! 接続には `ConnectionManager` を使う（切断時に自動再接続）。コマンド発行は
//! マネージャの clone に対して行うため、ストア自体はロックを持たない。
//! `get_participants` の smembers → hgetall は原子的ではない。途中で削除された
//! メンバーの hash は空で返るため、その参加者は一覧から落とす。

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::domain::{
    Participant, PartyId, PresenceStore, PresenceStoreError, UserId, Username,
};

const FIELD_USER_ID: &str = "userId";
const FIELD_USERNAME: &str = "username";
const FIELD_IS_ADMIN: &str = "isAdmin";
const FIELD_IS_ROOM_OWNER: &str = "isRoomOwner";

/// Redis を使った PresenceStore 実装
pub struct RedisPresenceStore {
    conn: ConnectionManager,
}

impl RedisPresenceStore {
    /// Redis へ接続してストアを構築する
    pub async fn connect(url: &str) -> Result<Self, PresenceStoreError> {
        let client = redis::Client::open(url).map_err(backend)?;
        let conn = client.get_connection_manager().await.map_err(backend)?;
        Ok(Self { conn })
    }

    fn member_set_key(party_id: &PartyId) -> String {
        format!("{}:users", party_id.as_str())
    }

    fn record_key(party_id: &PartyId, user_id: &str) -> String {
        format!("{}:user:{}", party_id.as_str(), user_id)
    }

    fn record_fields(participant: &Participant) -> [(&'static str, String); 4] {
        [
            (FIELD_USER_ID, participant.user_id.as_str().to_string()),
            (FIELD_USERNAME, participant.username.as_str().to_string()),
            (FIELD_IS_ADMIN, encode_flag(participant.is_admin)),
            (FIELD_IS_ROOM_OWNER, encode_flag(participant.is_room_owner)),
        ]
    }
}

fn backend(e: redis::RedisError) -> PresenceStoreError {
    PresenceStoreError::Backend(e.to_string())
}

fn encode_flag(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// hash のフィールドマップから参加者レコードを復元する
///
/// 必須フィールドが欠けている（= レコードが消えた直後などの）場合は None。
fn participant_from_hash(fields: &HashMap<String, String>) -> Option<Participant> {
    let user_id = UserId::new(fields.get(FIELD_USER_ID)?.clone()).ok()?;
    let username = Username::new(fields.get(FIELD_USERNAME)?.clone()).ok()?;
    Some(Participant {
        user_id,
        username,
        is_admin: fields.get(FIELD_IS_ADMIN).is_some_and(|v| v == "true"),
        is_room_owner: fields.get(FIELD_IS_ROOM_OWNER).is_some_and(|v| v == "true"),
    })
}

#[async_trait]
impl PresenceStore for RedisPresenceStore {
    async fn get_participants(
        &self,
        party_id: &PartyId,
    ) -> Result<Vec<Participant>, PresenceStoreError> {
        let mut conn = self.conn.clone();
        let user_ids: Vec<String> = conn
            .smembers(Self::member_set_key(party_id))
            .await
            .map_err(backend)?;

        let mut participants = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let fields: HashMap<String, String> = conn
                .hgetall(Self::record_key(party_id, &user_id))
                .await
                .map_err(backend)?;
            // メンバー集合とレコードの読み取りは原子的ではない。消えた直後の
            // レコードは空 hash で返るので黙って落とす。
            if let Some(participant) = participant_from_hash(&fields) {
                participants.push(participant);
            }
        }
        Ok(participants)
    }

    async fn get_participant(
        &self,
        party_id: &PartyId,
        user_id: &UserId,
    ) -> Result<Option<Participant>, PresenceStoreError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(Self::record_key(party_id, user_id.as_str()))
            .await
            .map_err(backend)?;
        Ok(participant_from_hash(&fields))
    }

    async fn add_participant(
        &self,
        party_id: &PartyId,
        participant: Participant,
    ) -> Result<(), PresenceStoreError> {
        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .sadd(
                Self::member_set_key(party_id),
                participant.user_id.as_str(),
            )
            .ignore()
            .hset_multiple(
                Self::record_key(party_id, participant.user_id.as_str()),
                &Self::record_fields(&participant),
            )
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(backend)
    }

    async fn update_participant(
        &self,
        party_id: &PartyId,
        participant: Participant,
    ) -> Result<(), PresenceStoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset_multiple(
                Self::record_key(party_id, participant.user_id.as_str()),
                &Self::record_fields(&participant),
            )
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn remove_participant(
        &self,
        party_id: &PartyId,
        user_id: &UserId,
    ) -> Result<(), PresenceStoreError> {
        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .srem(Self::member_set_key(party_id), user_id.as_str())
            .ignore()
            .del(Self::record_key(party_id, user_id.as_str()))
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party(id: &str) -> PartyId {
        PartyId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_key_layout() {
        // テスト項目: キーのレイアウトが {partyId}:users / {partyId}:user:{userId}
        // given (前提条件):
        let party_id = party("abc");

        // when (操作):
        let set_key = RedisPresenceStore::member_set_key(&party_id);
        let record_key = RedisPresenceStore::record_key(&party_id, "u1");

        // then (期待する結果):
        assert_eq!(set_key, "abc:users");
        assert_eq!(record_key, "abc:user:u1");
    }

    #[test]
    fn test_record_fields_encode_flags_as_strings() {
        // テスト項目: boolean フィールドが "true"/"false" 文字列でエンコードされる
        // given (前提条件):
        let participant = Participant::creator(
            UserId::new("u1".to_string()).unwrap(),
            Username::new("alice".to_string()).unwrap(),
        );

        // when (操作):
        let fields = RedisPresenceStore::record_fields(&participant);

        // then (期待する結果):
        assert!(fields.contains(&(FIELD_IS_ADMIN, "true".to_string())));
        assert!(fields.contains(&(FIELD_IS_ROOM_OWNER, "true".to_string())));
    }

    #[test]
    fn test_participant_from_hash_round_trip() {
        // テスト項目: hash フィールドから参加者レコードを復元できる
        // given (前提条件):
        let mut fields = HashMap::new();
        fields.insert(FIELD_USER_ID.to_string(), "u1".to_string());
        fields.insert(FIELD_USERNAME.to_string(), "alice".to_string());
        fields.insert(FIELD_IS_ADMIN.to_string(), "true".to_string());
        fields.insert(FIELD_IS_ROOM_OWNER.to_string(), "false".to_string());

        // when (操作):
        let participant = participant_from_hash(&fields).unwrap();

        // then (期待する結果):
        assert_eq!(participant.user_id.as_str(), "u1");
        assert_eq!(participant.username.as_str(), "alice");
        assert!(participant.is_admin);
        assert!(!participant.is_room_owner);
    }

    #[test]
    fn test_participant_from_empty_hash_is_none() {
        // テスト項目: 空 hash（削除直後のレコード）は None になる
        // given (前提条件):
        let fields = HashMap::new();

        // when (操作):
        let participant = participant_from_hash(&fields);

        // then (期待する結果):
        assert!(participant.is_none());
    }
}

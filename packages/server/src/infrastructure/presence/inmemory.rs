//! InMemory PresenceStore 実装
//!
//! 単一プロセス構成（`--redis-url` なし）とテストで使用する。
//! 共有ストアとしての意味論は Redis 実装と同一で、read-your-writes を
//! 自明に満たす。複数の「プロセス」を模したテストでは同一インスタンスを
//! Arc で共有する。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Participant, PartyId, PresenceStore, PresenceStoreError, UserId};

/// インメモリ PresenceStore 実装
pub struct InMemoryPresenceStore {
    parties: Mutex<HashMap<String, HashMap<String, Participant>>>,
}

impl InMemoryPresenceStore {
    pub fn new() -> Self {
        Self {
            parties: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPresenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresenceStore for InMemoryPresenceStore {
    async fn get_participants(
        &self,
        party_id: &PartyId,
    ) -> Result<Vec<Participant>, PresenceStoreError> {
        let parties = self.parties.lock().await;
        Ok(parties
            .get(party_id.as_str())
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_participant(
        &self,
        party_id: &PartyId,
        user_id: &UserId,
    ) -> Result<Option<Participant>, PresenceStoreError> {
        let parties = self.parties.lock().await;
        Ok(parties
            .get(party_id.as_str())
            .and_then(|members| members.get(user_id.as_str()))
            .cloned())
    }

    async fn add_participant(
        &self,
        party_id: &PartyId,
        participant: Participant,
    ) -> Result<(), PresenceStoreError> {
        let mut parties = self.parties.lock().await;
        parties
            .entry(party_id.as_str().to_string())
            .or_default()
            .insert(participant.user_id.as_str().to_string(), participant);
        Ok(())
    }

    async fn update_participant(
        &self,
        party_id: &PartyId,
        participant: Participant,
    ) -> Result<(), PresenceStoreError> {
        // 追加と同じ upsert 意味論（Redis 実装の hash 上書きに合わせる）
        self.add_participant(party_id, participant).await
    }

    async fn remove_participant(
        &self,
        party_id: &PartyId,
        user_id: &UserId,
    ) -> Result<(), PresenceStoreError> {
        let mut parties = self.parties.lock().await;
        if let Some(members) = parties.get_mut(party_id.as_str()) {
            members.remove(user_id.as_str());
            if members.is_empty() {
                parties.remove(party_id.as_str());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Username;

    fn party(id: &str) -> PartyId {
        PartyId::new(id.to_string()).unwrap()
    }

    fn creator(id: &str) -> Participant {
        Participant::creator(
            UserId::new(id.to_string()).unwrap(),
            Username::new(format!("name-{id}")).unwrap(),
        )
    }

    fn member(id: &str) -> Participant {
        Participant::member(
            UserId::new(id.to_string()).unwrap(),
            Username::new(format!("name-{id}")).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_empty_party_has_no_participants() {
        // テスト項目: 未知のパーティの参加者一覧は空
        // given (前提条件):
        let store = InMemoryPresenceStore::new();

        // when (操作):
        let participants = store.get_participants(&party("abc")).await.unwrap();

        // then (期待する結果):
        assert!(participants.is_empty());
    }

    #[tokio::test]
    async fn test_add_then_get_participant() {
        // テスト項目: 追加した参加者レコードを読み戻せる（read-your-writes）
        // given (前提条件):
        let store = InMemoryPresenceStore::new();
        let p = creator("u1");

        // when (操作):
        store.add_participant(&party("abc"), p.clone()).await.unwrap();

        // then (期待する結果):
        let got = store
            .get_participant(&party("abc"), &p.user_id)
            .await
            .unwrap();
        assert_eq!(got, Some(p));
    }

    #[tokio::test]
    async fn test_update_overwrites_flags() {
        // テスト項目: update が既存レコードのフラグを上書きする
        // given (前提条件):
        let store = InMemoryPresenceStore::new();
        let p = member("u2");
        store.add_participant(&party("abc"), p.clone()).await.unwrap();

        // when (操作): owner に昇格させて上書き
        let mut promoted = p.clone();
        promoted.is_admin = true;
        promoted.is_room_owner = true;
        store
            .update_participant(&party("abc"), promoted.clone())
            .await
            .unwrap();

        // then (期待する結果):
        let got = store
            .get_participant(&party("abc"), &p.user_id)
            .await
            .unwrap();
        assert_eq!(got, Some(promoted));
    }

    #[tokio::test]
    async fn test_remove_last_participant_empties_party() {
        // テスト項目: 最後の参加者を削除するとパーティの集合が空になる
        // given (前提条件):
        let store = InMemoryPresenceStore::new();
        let p = creator("u1");
        store.add_participant(&party("abc"), p.clone()).await.unwrap();

        // when (操作):
        store
            .remove_participant(&party("abc"), &p.user_id)
            .await
            .unwrap();

        // then (期待する結果):
        let participants = store.get_participants(&party("abc")).await.unwrap();
        assert!(participants.is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_participant_is_noop() {
        // テスト項目: 存在しない参加者の削除はエラーにならない
        // given (前提条件):
        let store = InMemoryPresenceStore::new();

        // when (操作):
        let result = store
            .remove_participant(&party("abc"), &UserId::new("ghost".to_string()).unwrap())
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_parties_are_isolated() {
        // テスト項目: パーティ間で参加者レコードが混ざらない
        // given (前提条件):
        let store = InMemoryPresenceStore::new();
        store
            .add_participant(&party("abc"), creator("u1"))
            .await
            .unwrap();
        store
            .add_participant(&party("xyz"), creator("u2"))
            .await
            .unwrap();

        // when (操作):
        let abc = store.get_participants(&party("abc")).await.unwrap();
        let xyz = store.get_participants(&party("xyz")).await.unwrap();

        // then (期待する結果):
        assert_eq!(abc.len(), 1);
        assert_eq!(abc[0].user_id.as_str(), "u1");
        assert_eq!(xyz.len(), 1);
        assert_eq!(xyz[0].user_id.as_str(), "u2");
    }
}

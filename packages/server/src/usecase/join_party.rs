//! UseCase: パーティ参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinPartyUseCase::execute() メソッド
//! - 参加処理（ローカル登録 → 購読 → スナップショット読み取り → レコード書き込み）
//!
//! ### なぜこのテストが必要か
//! - 最初の参加者だけが owner/admin として自己昇格することを保証
//! - ローカル登録がストア書き込みより先に行われることを保証（結果整合性の契約）
//! - ストア障害時に接続もプロセスも巻き込まないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：空パーティへの参加（作成者）、既存パーティへの参加
//! - 異常系：スナップショット読み取り失敗、レコード書き込み失敗
//! - エッジケース：同一パーティへの二重購読（冪等）

use std::sync::Arc;

use crate::domain::{Participant, PartyId, PresenceStore, RelayBus, UserId, Username};
use crate::infrastructure::{ConnectionRegistry, ConnectionSender};

use super::error::JoinError;

/// パーティ参加のユースケース
///
/// 手順は意図的に非原子的である。スナップショット読み取りと自レコードの
/// 書き込みの間に他の参加者の join が割り込みうる。ほぼ同時の 2 接続が
/// どちらも空スナップショットを観測し、どちらも owner として自己昇格する
/// レースは許容された仕様である。
pub struct JoinPartyUseCase {
    /// このプロセスの接続レジストリ
    registry: Arc<ConnectionRegistry>,
    /// PresenceStore（共有ストアの抽象化）
    store: Arc<dyn PresenceStore>,
    /// RelayBus（プロセス間ファンアウトの抽象化）
    bus: Arc<dyn RelayBus>,
}

impl JoinPartyUseCase {
    /// 新しい JoinPartyUseCase を作成
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<dyn PresenceStore>,
        bus: Arc<dyn RelayBus>,
    ) -> Self {
        Self {
            registry,
            store,
            bus,
        }
    }

    /// パーティ参加を実行
    ///
    /// # Arguments
    ///
    /// * `party_id` - 参加先のパーティ ID
    /// * `user_id` - 参加する接続のユーザ ID
    /// * `username` - 表示名
    /// * `sender` - 接続へのアウトバウンド送信チャネル
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Participant>)` - 参加時点のメンバースナップショット
    ///   （自分自身を含まない。呼び出し側がこれを `currentPartyUsers` として返信する）
    /// * `Err(JoinError)` - 参加失敗（返信は行われない）
    pub async fn execute(
        &self,
        party_id: PartyId,
        user_id: UserId,
        username: Username,
        sender: ConnectionSender,
    ) -> Result<Vec<Participant>, JoinError> {
        // 1. ローカル登録。ストア書き込みより必ず先に行う。
        //    （(partyId, userId) のローカル登録集合はストアのレコード集合と
        //    結果整合であり、登録直後はストア側の読み取りが取りこぼしうる）
        self.registry
            .register(party_id.clone(), user_id.clone(), sender)
            .await;

        // 2. パーティのチャネル購読を保証（冪等）
        self.bus
            .subscribe(&party_id)
            .await
            .map_err(|e| JoinError::Bus(e.to_string()))?;

        // 3. 現時点のメンバースナップショットを読む
        let snapshot = self
            .store
            .get_participants(&party_id)
            .await
            .map_err(|e| JoinError::Store(e.to_string()))?;

        // 4. スナップショットが空だった場合に限り、この参加者はパーティの
        //    作成者として owner/admin の両フラグを立てる
        let participant = if snapshot.is_empty() {
            Participant::creator(user_id, username)
        } else {
            Participant::member(user_id, username)
        };

        // 書き込み失敗は記録するだけで join 自体は成立させる（ベストエフォート。
        // レコードは切断時の削除対象でもあるため、残留はしない）
        if let Err(e) = self.store.add_participant(&party_id, participant).await {
            tracing::warn!(
                "Failed to persist participant record for party '{}': {}",
                party_id.as_str(),
                e
            );
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockPresenceStore, MockRelayBus, PresenceStoreError, RelayBusError};
    use crate::infrastructure::bus::InMemoryBusHub;
    use crate::infrastructure::presence::InMemoryPresenceStore;
    use tokio::sync::mpsc;

    fn party(id: &str) -> PartyId {
        PartyId::new(id.to_string()).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn name(n: &str) -> Username {
        Username::new(n.to_string()).unwrap()
    }

    fn create_usecase() -> (
        JoinPartyUseCase,
        Arc<ConnectionRegistry>,
        Arc<InMemoryPresenceStore>,
    ) {
        let registry = Arc::new(ConnectionRegistry::new());
        let store = Arc::new(InMemoryPresenceStore::new());
        let hub = InMemoryBusHub::new();
        let (delivery_tx, _delivery_rx) = mpsc::unbounded_channel();
        let bus = Arc::new(hub.connect(delivery_tx));
        let usecase = JoinPartyUseCase::new(registry.clone(), store.clone(), bus);
        (usecase, registry, store)
    }

    #[tokio::test]
    async fn test_first_joiner_becomes_owner_and_admin() {
        // テスト項目: 空パーティへの参加者が owner/admin として書き込まれる
        // given (前提条件):
        let (usecase, _registry, store) = create_usecase();
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let snapshot = usecase
            .execute(party("abc"), user("u1"), name("alice"), tx)
            .await
            .unwrap();

        // then (期待する結果): スナップショットは空、レコードは両フラグ true
        assert!(snapshot.is_empty());
        let record = store
            .get_participant(&party("abc"), &user("u1"))
            .await
            .unwrap()
            .unwrap();
        assert!(record.is_admin);
        assert!(record.is_room_owner);
    }

    #[tokio::test]
    async fn test_second_joiner_is_plain_member() {
        // テスト項目: 既存パーティへの参加者は両フラグ false で書き込まれる
        // given (前提条件): alice が先に参加済み
        let (usecase, _registry, store) = create_usecase();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        usecase
            .execute(party("abc"), user("u1"), name("alice"), tx1)
            .await
            .unwrap();

        // when (操作): bob が参加
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let snapshot = usecase
            .execute(party("abc"), user("u2"), name("bob"), tx2)
            .await
            .unwrap();

        // then (期待する結果): スナップショットに alice だけが入り、bob は平メンバー
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].user_id.as_str(), "u1");
        let record = store
            .get_participant(&party("abc"), &user("u2"))
            .await
            .unwrap()
            .unwrap();
        assert!(!record.is_admin);
        assert!(!record.is_room_owner);
    }

    #[tokio::test]
    async fn test_join_registers_connection_locally() {
        // テスト項目: 参加した接続がレジストリから引けるようになる
        // given (前提条件):
        let (usecase, registry, _store) = create_usecase();
        let (tx, mut rx) = mpsc::unbounded_channel();

        // when (操作):
        usecase
            .execute(party("abc"), user("u1"), name("alice"), tx)
            .await
            .unwrap();

        // then (期待する結果):
        let delivered = registry.push_to(&party("abc"), &user("u1"), "frame").await;
        assert!(delivered);
        assert_eq!(rx.recv().await, Some("frame".to_string()));
    }

    #[tokio::test]
    async fn test_snapshot_read_failure_aborts_join() {
        // テスト項目: スナップショット読み取り失敗で join が中断される
        // given (前提条件): 読み取りが失敗するストア
        let registry = Arc::new(ConnectionRegistry::new());
        let mut store = MockPresenceStore::new();
        store
            .expect_get_participants()
            .returning(|_| Err(PresenceStoreError::Backend("connection refused".to_string())));
        store.expect_add_participant().times(0);
        let mut bus = MockRelayBus::new();
        bus.expect_subscribe().returning(|_| Ok(()));
        let usecase = JoinPartyUseCase::new(registry, Arc::new(store), Arc::new(bus));

        // when (操作):
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = usecase
            .execute(party("abc"), user("u1"), name("alice"), tx)
            .await;

        // then (期待する結果): レコードは書き込まれず、エラーが返る
        assert!(matches!(result, Err(JoinError::Store(_))));
    }

    #[tokio::test]
    async fn test_record_write_failure_still_returns_snapshot() {
        // テスト項目: レコード書き込み失敗は記録のみで、スナップショットは返信される
        // given (前提条件): 書き込みだけが失敗するストア
        let registry = Arc::new(ConnectionRegistry::new());
        let mut store = MockPresenceStore::new();
        store.expect_get_participants().returning(|_| Ok(Vec::new()));
        store
            .expect_add_participant()
            .returning(|_, _| Err(PresenceStoreError::Backend("write failed".to_string())));
        let mut bus = MockRelayBus::new();
        bus.expect_subscribe().returning(|_| Ok(()));
        let usecase = JoinPartyUseCase::new(registry, Arc::new(store), Arc::new(bus));

        // when (操作):
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = usecase
            .execute(party("abc"), user("u1"), name("alice"), tx)
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_subscribe_failure_aborts_before_snapshot() {
        // テスト項目: 購読失敗で join が中断され、ストアは読まれない
        // given (前提条件): 購読が失敗するバス
        let registry = Arc::new(ConnectionRegistry::new());
        let mut store = MockPresenceStore::new();
        store.expect_get_participants().times(0);
        let mut bus = MockRelayBus::new();
        bus.expect_subscribe()
            .returning(|_| Err(RelayBusError::Backend("subscribe failed".to_string())));
        let usecase = JoinPartyUseCase::new(registry, Arc::new(store), Arc::new(bus));

        // when (操作):
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = usecase
            .execute(party("abc"), user("u1"), name("alice"), tx)
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(JoinError::Bus(_))));
    }
}

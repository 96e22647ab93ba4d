//! UseCase: 参加者切断とオーナーフェイルオーバー処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 切断時の後片付け（ローカル登録解除、レコード削除）とオーナー再選出
//!
//! ### なぜこのテストが必要か
//! - オーナー切断時にちょうど 1 人が昇格することを保証
//! - admin が 1 人残っている場合の選出が決定的であることを保証
//! - 最後の参加者の切断で昇格通知が出ないことを保証
//! - ストア障害が接続の teardown を巻き込まないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：オーナーの切断と再選出、非オーナーの切断
//! - エッジケース：最後の参加者の切断、オーナーが既に解決済みの場合
//! - 異常系：各ステップでのストア・バス障害（記録して飲み込む）

use std::sync::Arc;

use crate::domain::{PartyId, PresenceStore, RelayBus, UserId, elect_replacement_owner};
use crate::infrastructure::ConnectionRegistry;
use crate::infrastructure::dto::bus::BusEnvelope;

/// 参加者切断のユースケース
///
/// 接続クローズごとにちょうど 1 回起動される（パーティに参加しなかった
/// 接続は何も起動しない）。失敗はすべて記録して飲み込む。切断処理自体が
/// 失敗してプロセスや他の接続を巻き込むことはない。
pub struct DisconnectParticipantUseCase {
    /// このプロセスの接続レジストリ
    registry: Arc<ConnectionRegistry>,
    /// PresenceStore（共有ストアの抽象化）
    store: Arc<dyn PresenceStore>,
    /// RelayBus（プロセス間ファンアウトの抽象化）
    bus: Arc<dyn RelayBus>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
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

    /// 切断処理とオーナーフェイルオーバーを実行
    ///
    /// 読み取り → 選出 → 書き込みのシーケンスは非原子的であり、同一パーティの
    /// 並行切断とのインターリーブに対してはレース耐性で対処する（ステップ 4 の
    /// 再確認）。失敗した場合はパーティが一時的にオーナー不在のまま残り、
    /// 次の切断時のチェックで解決される。
    pub async fn execute(&self, party_id: PartyId, user_id: UserId) {
        // 1. ローカル登録解除。このパーティの最後のローカル接続なら購読も解除
        let remaining_local = self.registry.unregister(&party_id, &user_id).await;
        if remaining_local == 0 {
            if let Err(e) = self.bus.unsubscribe(&party_id).await {
                tracing::warn!(
                    "Failed to unsubscribe from party '{}': {}",
                    party_id.as_str(),
                    e
                );
            }
        }

        // 参加者レコードを削除
        if let Err(e) = self.store.remove_participant(&party_id, &user_id).await {
            tracing::warn!(
                "Aborting ownership failover for party '{}': failed to remove participant '{}': {}",
                party_id.as_str(),
                user_id.as_str(),
                e
            );
            return;
        }

        // 2. 残存参加者を読む
        let remaining = match self.store.get_participants(&party_id).await {
            Ok(remaining) => remaining,
            Err(e) => {
                tracing::warn!(
                    "Aborting ownership failover for party '{}': failed to read participants: {}",
                    party_id.as_str(),
                    e
                );
                return;
            }
        };

        // 3. パーティが空なら選出するものがない
        if remaining.is_empty() {
            return;
        }

        // 4. オーナーが残っていれば何もしない（切断したのがオーナーでなかったか、
        //    並行フェイルオーバーが既に解決済み）
        if remaining.iter().any(|p| p.is_room_owner) {
            return;
        }

        // 5. 後任を選出
        let Some(elected) = elect_replacement_owner(&remaining) else {
            return;
        };

        // 6. オーナーは admin を兼ねる。他の参加者の降格は行わない
        let mut promoted = elected.clone();
        promoted.is_admin = true;
        promoted.is_room_owner = true;
        if let Err(e) = self
            .store
            .update_participant(&party_id, promoted.clone())
            .await
        {
            tracing::warn!(
                "Aborting ownership failover for party '{}': failed to persist promotion: {}",
                party_id.as_str(),
                e
            );
            return;
        }

        // 7. 昇格通知を発行。全プロセスがローカル接続へ転送する
        let envelope = BusEnvelope::promote_to_room_owner(
            promoted.user_id.as_str(),
            promoted.username.as_str(),
        );
        if let Err(e) = self.bus.publish(&party_id, envelope.to_json()).await {
            tracing::warn!(
                "Failed to publish promotion notice for party '{}': {}",
                party_id.as_str(),
                e
            );
            return;
        }

        tracing::info!(
            "Promoted user '{}' to room owner of party '{}'",
            promoted.user_id.as_str(),
            party_id.as_str()
        );
    }
}

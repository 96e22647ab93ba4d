//! UseCase: バス受信メッセージの配送処理
//!
//! 購読チャネルから届いたバスエンベロープをデコードし、command ごとに
//! ローカル接続へファンアウトします。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DeliverBusMessageUseCase::execute() メソッド
//! - command ごとの配送（ポイントツーポイント / ブロードキャスト / 昇格通知）
//!
//! ### なぜこのテストが必要か
//! - 不正なバスメッセージがクライアントに伝播しないことを保証
//! - ポイントツーポイント配送が宛先以外へ漏れないことを保証
//! - ブロードキャストの送信者除外と、昇格通知の非除外を保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：各 command の配送
//! - 異常系：デコード不能なペイロード、必須フィールド欠落、未知の command
//! - エッジケース：宛先がローカルにいない（他プロセスの配送に任せて黙って落とす）

use std::sync::Arc;

use serde_json::Value;

use crate::domain::{BusDelivery, PartyId, UserId};
use crate::infrastructure::ConnectionRegistry;
use crate::infrastructure::dto::bus::{
    BusEnvelope, PromoteData, RedirectSignalData, RelayedData, commands,
};
use crate::infrastructure::dto::client::{ClientEnvelope, types};

/// バス受信メッセージ配送のユースケース
pub struct DeliverBusMessageUseCase {
    /// このプロセスの接続レジストリ
    registry: Arc<ConnectionRegistry>,
}

impl DeliverBusMessageUseCase {
    /// 新しい DeliverBusMessageUseCase を作成
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 1 件のバス配送を処理する
    ///
    /// デコード失敗・必須フィールド欠落・未知の command はいずれも記録して
    /// 落とすだけで、クライアントに伝播させない。
    pub async fn execute(&self, delivery: BusDelivery) {
        let envelope: BusEnvelope = match serde_json::from_str(&delivery.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(
                    "Dropping malformed bus message on channel '{}': {}",
                    delivery.channel,
                    e
                );
                return;
            }
        };

        let Ok(party_id) = PartyId::new(delivery.channel.clone()) else {
            tracing::warn!("Dropping bus message with empty channel name");
            return;
        };

        match envelope.command.as_str() {
            commands::REDIRECT_SIGNAL => self.deliver_signal(&party_id, envelope.data).await,
            commands::BROADCAST_MESSAGE => {
                self.deliver_broadcast(&party_id, types::NEW_FOREIGN_MESSAGE, envelope.data)
                    .await
            }
            commands::SET_USER_MUTE => {
                self.deliver_broadcast(&party_id, types::SET_USER_MUTE, envelope.data)
                    .await
            }
            commands::TIME_UPDATE => {
                self.deliver_broadcast(&party_id, types::TIME_UPDATE, envelope.data)
                    .await
            }
            commands::SET_ADMIN_CONTROLS => {
                self.deliver_broadcast(&party_id, types::SET_ADMIN_CONTROLS, envelope.data)
                    .await
            }
            commands::PROMOTE_TO_ROOM_OWNER => {
                self.deliver_promotion(&party_id, envelope.data).await
            }
            other => {
                tracing::warn!(
                    "Rejecting bus message with invalid command '{}' on channel '{}'",
                    other,
                    party_id.as_str()
                );
            }
        }
    }

    /// ポイントツーポイントのシグナル転送
    ///
    /// 宛先がローカルレジストリにいなければ黙って落とす。宛先を終端している
    /// 別プロセスが配送する。
    async fn deliver_signal(&self, party_id: &PartyId, data: Value) {
        let data: RedirectSignalData = match serde_json::from_value(data) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Dropping redirectSignal with malformed data: {}", e);
                return;
            }
        };
        let Ok(recipient_id) = UserId::new(data.recipient_id) else {
            tracing::warn!("Dropping redirectSignal with empty recipientId");
            return;
        };

        let frame = if data.is_reply {
            ClientEnvelope::returned_signal(&data.user_id, data.signal)
        } else {
            let Some(username) = data.username else {
                tracing::warn!("Dropping forward redirectSignal without username");
                return;
            };
            ClientEnvelope::new_foreign_signal(&data.user_id, data.signal, &username)
        };

        self.registry
            .push_to(party_id, &recipient_id, &frame.to_json())
            .await;
    }

    /// 送信者を除くパーティ全体へのブロードキャスト
    async fn deliver_broadcast(&self, party_id: &PartyId, client_type: &str, data: Value) {
        let data: RelayedData = match serde_json::from_value(data) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(
                    "Dropping '{}' broadcast with malformed data: {}",
                    client_type,
                    e
                );
                return;
            }
        };
        let Ok(sender_id) = UserId::new(data.user_id) else {
            tracing::warn!("Dropping '{}' broadcast with empty userId", client_type);
            return;
        };

        let frame = ClientEnvelope::relayed(client_type, data.payload);
        self.registry
            .broadcast_except(party_id, Some(&sender_id), &frame.to_json())
            .await;
    }

    /// オーナー昇格通知のブロードキャスト
    ///
    /// 昇格通知は送信者除外の対象外。パーティの全ローカル接続に届ける。
    async fn deliver_promotion(&self, party_id: &PartyId, data: Value) {
        let data: PromoteData = match serde_json::from_value(data) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Dropping promoteToRoomOwner with malformed data: {}", e);
                return;
            }
        };

        let frame = ClientEnvelope::promote_to_room_owner(&data.user_id, &data.username);
        self.registry
            .broadcast_except(party_id, None, &frame.to_json())
            .await;
    }
}

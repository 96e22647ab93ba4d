//! RelayBus trait 定義
//!
//! プロセス間のファンアウトに使う publish/subscribe トランスポートへの
//! インターフェース。チャネルはパーティごとに 1 本で、チャネル名は partyId。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 順序の契約
//!
//! 単一チャネル上の単一パブリッシャについては発行順に配送される。
//! 異なるプロセスからの発行間に順序保証はない。

use async_trait::async_trait;

use super::error::RelayBusError;
use super::value_object::PartyId;

/// バスから配送された 1 件のメッセージ
///
/// `channel` は購読中のパーティ ID。`payload` はエンコード済みのバス
/// エンベロープで、デコードは受信側（配送ユースケース）の責務。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusDelivery {
    pub channel: String,
    pub payload: String,
}

/// リレーバスへのインターフェース
///
/// 配送はバス実装の構築時に渡されるチャネル経由で行われる。プロセスは
/// ローカル接続を 1 つ以上持つパーティのチャネルだけを購読する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RelayBus: Send + Sync {
    /// パーティのチャネルにエンコード済みエンベロープを発行する
    async fn publish(&self, party_id: &PartyId, payload: String) -> Result<(), RelayBusError>;

    /// パーティのチャネル購読を保証する
    ///
    /// 冪等であること: 二重購読しても配送が重複してはならない。
    async fn subscribe(&self, party_id: &PartyId) -> Result<(), RelayBusError>;

    /// パーティのチャネル購読を解除する（未購読なら no-op）
    async fn unsubscribe(&self, party_id: &PartyId) -> Result<(), RelayBusError>;
}

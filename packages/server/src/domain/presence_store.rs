//! PresenceStore trait 定義
//!
//! 全プロセスから到達可能な共有ストアへのインターフェース。パーティごとの
//! メンバー集合と、(partyId, userId) ごとの参加者レコードを保持する。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 一貫性の契約
//!
//! - 単一クライアント接続に対して read-your-writes 以上の一貫性を提供すること
//! - 複数操作にまたがる原子性は提供しない。snapshot-then-write のような
//!   シーケンスは呼び出し側がベストエフォートとして扱う（§ レース耐性設計）

use async_trait::async_trait;

use super::entity::Participant;
use super::error::PresenceStoreError;
use super::value_object::{PartyId, UserId};

/// 共有プレゼンスストアへのインターフェース
///
/// パーティは暗黙的な存在であり、メンバー集合が空になれば論理的に消滅する。
/// 明示的な削除操作は存在しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// パーティの参加者レコード一覧を取得
    async fn get_participants(
        &self,
        party_id: &PartyId,
    ) -> Result<Vec<Participant>, PresenceStoreError>;

    /// 参加者レコードを 1 件取得（存在しなければ None）
    async fn get_participant(
        &self,
        party_id: &PartyId,
        user_id: &UserId,
    ) -> Result<Option<Participant>, PresenceStoreError>;

    /// 参加者をメンバー集合に追加し、レコードを書き込む
    async fn add_participant(
        &self,
        party_id: &PartyId,
        participant: Participant,
    ) -> Result<(), PresenceStoreError>;

    /// 参加者レコードを上書きする（フェイルオーバーのフラグ更新に使用）
    async fn update_participant(
        &self,
        party_id: &PartyId,
        participant: Participant,
    ) -> Result<(), PresenceStoreError>;

    /// 参加者をメンバー集合から外し、レコードを削除する
    async fn remove_participant(
        &self,
        party_id: &PartyId,
        user_id: &UserId,
    ) -> Result<(), PresenceStoreError>;
}

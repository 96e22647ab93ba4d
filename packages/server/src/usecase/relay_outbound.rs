//! UseCase: アウトバウンドリレー処理
//!
//! クライアントから受けたリレー系メッセージ（シグナル転送、テキスト
//! ブロードキャスト、ミュート状態、再生位置、管理者設定）を、パーティの
//! チャネルへバスエンベロープとして発行します。ローカル接続への直接配送は
//! 行わず、自プロセスを含む全購読プロセスがバス経由で受けて配送します。

use std::sync::Arc;

use crate::domain::{PartyId, RelayBus};

use super::error::RelayError;

/// アウトバウンドリレーのユースケース
pub struct RelayOutboundUseCase {
    /// RelayBus（プロセス間ファンアウトの抽象化）
    bus: Arc<dyn RelayBus>,
}

impl RelayOutboundUseCase {
    /// 新しい RelayOutboundUseCase を作成
    pub fn new(bus: Arc<dyn RelayBus>) -> Self {
        Self { bus }
    }

    /// エンコード済みのバスエンベロープをパーティのチャネルへ発行する
    ///
    /// # Arguments
    ///
    /// * `party_id` - 発行先のパーティ
    /// * `payload` - エンコード済みのバスエンベロープ（DTO 層で生成されたもの）
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 発行成功
    /// * `Err(RelayError)` - 発行失敗（呼び出し側は記録のみ行い、
    ///   クライアントには通知しない）
    pub async fn execute(&self, party_id: &PartyId, payload: String) -> Result<(), RelayError> {
        self.bus
            .publish(party_id, payload)
            .await
            .map_err(|e| RelayError::Bus(e.to_string()))
    }
}

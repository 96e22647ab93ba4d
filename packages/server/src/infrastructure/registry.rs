//! プロセス内の接続レジストリ
//!
//! ## 責務
//!
//! - partyId → (userId → 送信チャネル) のインメモリマップを保持
//! - ローカル接続への push / ブロードキャスト
//!
//! ## 設計ノート
//!
//! このレジストリが保持するのは「このプロセスで終端している接続」だけで、
//! プロセス間で共有されることはない。純粋なインメモリ構造であり I/O を
//! 持たないため、失敗モードは「見つからない」のみ（存在しない接続の
//! unregister はエラーではなく no-op）。
//!
//! パーティ単位の直列化はマップ全体の Mutex で満たす。パーティ内の
//! 反復順序は未規定であり、呼び出し側はこれに依存してはならない。
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われ、
//! ここには生成済みの `UnboundedSender` だけが渡される。

use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};

use crate::domain::{PartyId, UserId};

/// 接続へのアウトバウンド送信チャネル
///
/// 値はエンコード済みのクライアント向けフレーム（JSON 文字列）。
pub type ConnectionSender = mpsc::UnboundedSender<String>;

/// プロセスごとに 1 つ生成され、参照で各コンポーネントへ渡される接続レジストリ
///
/// グローバル状態としてではなく、明示的に所有されるコンポーネントとして
/// 生成・受け渡しされる（テスト時はフェイクのストア・バスと組み合わせる）。
pub struct ConnectionRegistry {
    parties: Mutex<HashMap<PartyId, HashMap<UserId, ConnectionSender>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            parties: Mutex::new(HashMap::new()),
        }
    }

    /// 接続を登録する
    pub async fn register(&self, party_id: PartyId, user_id: UserId, sender: ConnectionSender) {
        let mut parties = self.parties.lock().await;
        parties.entry(party_id).or_default().insert(user_id, sender);
    }

    /// 接続を登録解除し、そのパーティに残るローカル接続数を返す
    ///
    /// 存在しない接続の解除は no-op。空になったパーティのエントリは落とす。
    pub async fn unregister(&self, party_id: &PartyId, user_id: &UserId) -> usize {
        let mut parties = self.parties.lock().await;
        let Some(members) = parties.get_mut(party_id) else {
            return 0;
        };
        members.remove(user_id);
        let remaining = members.len();
        if remaining == 0 {
            parties.remove(party_id);
        }
        remaining
    }

    /// ローカル接続の送信チャネルを引く（いなければ None）
    pub async fn lookup(&self, party_id: &PartyId, user_id: &UserId) -> Option<ConnectionSender> {
        let parties = self.parties.lock().await;
        parties.get(party_id).and_then(|m| m.get(user_id)).cloned()
    }

    /// パーティ内の全ローカル接続を返す
    pub async fn all_in_party(&self, party_id: &PartyId) -> Vec<(UserId, ConnectionSender)> {
        let parties = self.parties.lock().await;
        parties
            .get(party_id)
            .map(|members| {
                members
                    .iter()
                    .map(|(id, sender)| (id.clone(), sender.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 特定のローカル接続へフレームを送信する
    ///
    /// 接続がローカルに存在すれば true。送信失敗（チャネル断）は警告のみ。
    pub async fn push_to(&self, party_id: &PartyId, user_id: &UserId, frame: &str) -> bool {
        let Some(sender) = self.lookup(party_id, user_id).await else {
            return false;
        };
        if let Err(e) = sender.send(frame.to_string()) {
            tracing::warn!(
                "Failed to push frame to user '{}' in party '{}': {}",
                user_id.as_str(),
                party_id.as_str(),
                e
            );
        }
        true
    }

    /// パーティ内の全ローカル接続へフレームをブロードキャストする
    ///
    /// `exclude` を指定した場合、そのユーザの接続は除外する。
    /// 一部の送信失敗は許容する（警告して続行）。
    pub async fn broadcast_except(
        &self,
        party_id: &PartyId,
        exclude: Option<&UserId>,
        frame: &str,
    ) {
        let targets = self.all_in_party(party_id).await;
        for (user_id, sender) in targets {
            if exclude.is_some_and(|ex| ex == &user_id) {
                continue;
            }
            if let Err(e) = sender.send(frame.to_string()) {
                tracing::warn!(
                    "Failed to broadcast frame to user '{}' in party '{}': {}",
                    user_id.as_str(),
                    party_id.as_str(),
                    e
                );
            }
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! InMemory RelayBus 実装
//!
//! ## 設計ノート
//!
//! 単一の `tokio::sync::broadcast` チャネルをハブとして、全インスタンスが
//! 全発行を受信し、購読中のチャネル（パーティ）だけを配送キューへ流す。
//! 複数の「プロセス」を模したテストでは、同じハブから `connect` した
//! バスインスタンスを各プロセスに 1 つずつ持たせる。
//!
//! 発行元のインスタンス自身も（購読していれば）配送を受ける。これは
//! Redis pub/sub と同じ意味論で、送信者の除外は配送側が userId で行う。

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast, mpsc};

use crate::domain::{BusDelivery, PartyId, RelayBus, RelayBusError};

/// 遅い受信側が取りこぼすまでの余裕（テスト・単一プロセス用途では十分）
const HUB_CAPACITY: usize = 1024;

/// 全インスタンスが共有するプロセス内ハブ
#[derive(Clone)]
pub struct InMemoryBusHub {
    sender: broadcast::Sender<(String, String)>,
}

impl InMemoryBusHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(HUB_CAPACITY);
        Self { sender }
    }

    /// ハブに接続したバスインスタンスを作る
    ///
    /// 配送は `delivery_tx` 経由で行われる。インスタンスごとに受信タスクを
    /// 1 つ spawn し、購読中のチャネル宛ての発行だけを流す。
    pub fn connect(&self, delivery_tx: mpsc::UnboundedSender<BusDelivery>) -> InMemoryRelayBus {
        let subscriptions = Arc::new(Mutex::new(HashSet::new()));
        let mut hub_rx = self.sender.subscribe();
        let task_subscriptions = subscriptions.clone();

        tokio::spawn(async move {
            loop {
                match hub_rx.recv().await {
                    Ok((channel, payload)) => {
                        if !task_subscriptions.lock().await.contains(&channel) {
                            continue;
                        }
                        if delivery_tx
                            .send(BusDelivery { channel, payload })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("In-memory bus receiver lagged, skipped {} messages", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        InMemoryRelayBus {
            hub_sender: self.sender.clone(),
            subscriptions,
        }
    }
}

impl Default for InMemoryBusHub {
    fn default() -> Self {
        Self::new()
    }
}

/// ハブに接続された 1 インスタンス分のバス
pub struct InMemoryRelayBus {
    hub_sender: broadcast::Sender<(String, String)>,
    subscriptions: Arc<Mutex<HashSet<String>>>,
}

#[async_trait]
impl RelayBus for InMemoryRelayBus {
    async fn publish(&self, party_id: &PartyId, payload: String) -> Result<(), RelayBusError> {
        // 受信側が 1 つもいない場合の send エラーは「配送先なし」であり
        // バスの失敗ではない
        let _ = self
            .hub_sender
            .send((party_id.as_str().to_string(), payload));
        Ok(())
    }

    async fn subscribe(&self, party_id: &PartyId) -> Result<(), RelayBusError> {
        let mut subscriptions = self.subscriptions.lock().await;
        subscriptions.insert(party_id.as_str().to_string());
        Ok(())
    }

    async fn unsubscribe(&self, party_id: &PartyId) -> Result<(), RelayBusError> {
        let mut subscriptions = self.subscriptions.lock().await;
        subscriptions.remove(party_id.as_str());
        Ok(())
    }
}

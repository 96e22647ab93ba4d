//! Redis pub/sub RelayBus 実装
//!
//! ## 設計ノート
//!
//! - 発行は `ConnectionManager` 経由（自動再接続、clone してコマンド発行）
//! - 購読はプロセスごとに 1 本の pub/sub 接続。`split` した sink 側で
//!   subscribe / unsubscribe を発行し、stream 側を読むタスクが配送キューへ
//!   流す
//! - 購読の冪等性は購読集合で保証する。集合のロックを sink 操作の間
//!   保持し、同一パーティへの並行 subscribe が二重購読にならないようにする
//!
//! Redis の pub/sub は発行元の接続にもメッセージを配送する（発行用と購読用の
//! 接続が別であるため）。送信者の除外は配送側が userId で行う。

use std::collections::HashSet;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, PubSubSink};
use tokio::sync::{Mutex, mpsc};

use crate::domain::{BusDelivery, PartyId, RelayBus, RelayBusError};

/// Redis pub/sub を使った RelayBus 実装
pub struct RedisRelayBus {
    publisher: ConnectionManager,
    sink: Mutex<PubSubSink>,
    subscriptions: Mutex<HashSet<String>>,
}

impl RedisRelayBus {
    /// Redis へ接続し、受信タスクを開始してバスを構築する
    ///
    /// 購読チャネル上の受信メッセージは `delivery_tx` 経由で配送される。
    pub async fn connect(
        url: &str,
        delivery_tx: mpsc::UnboundedSender<BusDelivery>,
    ) -> Result<Self, RelayBusError> {
        let client = redis::Client::open(url).map_err(backend)?;
        let publisher = client.get_connection_manager().await.map_err(backend)?;
        let pubsub = client.get_async_pubsub().await.map_err(backend)?;
        let (sink, mut stream) = pubsub.split();

        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                let channel = msg.get_channel_name().to_string();
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(
                            "Dropping non-text bus message on channel '{}': {}",
                            channel,
                            e
                        );
                        continue;
                    }
                };
                if delivery_tx.send(BusDelivery { channel, payload }).is_err() {
                    break;
                }
            }
            tracing::warn!("Relay bus subscription stream ended");
        });

        Ok(Self {
            publisher,
            sink: Mutex::new(sink),
            subscriptions: Mutex::new(HashSet::new()),
        })
    }
}

fn backend(e: redis::RedisError) -> RelayBusError {
    RelayBusError::Backend(e.to_string())
}

#[async_trait]
impl RelayBus for RedisRelayBus {
    async fn publish(&self, party_id: &PartyId, payload: String) -> Result<(), RelayBusError> {
        let mut conn = self.publisher.clone();
        let _: () = conn
            .publish(party_id.as_str(), payload)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn subscribe(&self, party_id: &PartyId) -> Result<(), RelayBusError> {
        // 集合のロックを SUBSCRIBE 発行の間保持する（冪等性の保証）
        let mut subscriptions = self.subscriptions.lock().await;
        if subscriptions.contains(party_id.as_str()) {
            return Ok(());
        }
        let mut sink = self.sink.lock().await;
        sink.subscribe(party_id.as_str()).await.map_err(backend)?;
        subscriptions.insert(party_id.as_str().to_string());
        Ok(())
    }

    async fn unsubscribe(&self, party_id: &PartyId) -> Result<(), RelayBusError> {
        let mut subscriptions = self.subscriptions.lock().await;
        if !subscriptions.contains(party_id.as_str()) {
            return Ok(());
        }
        let mut sink = self.sink.lock().await;
        sink.unsubscribe(party_id.as_str()).await.map_err(backend)?;
        subscriptions.remove(party_id.as_str());
        Ok(())
    }
}

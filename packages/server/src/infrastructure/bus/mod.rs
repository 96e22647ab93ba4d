//! RelayBus 実装
//!
//! ## 概要
//!
//! このモジュールは `RelayBus` trait の具体的な実装を提供します。
//!
//! ## 実装
//!
//! - `redis`: Redis pub/sub を使った実装。水平スケール構成で使用
//! - `inmemory`: 単一プロセス構成・テスト用のプロセス内ハブ実装

pub mod inmemory;
pub mod redis;

pub use inmemory::{InMemoryBusHub, InMemoryRelayBus};
pub use redis::RedisRelayBus;

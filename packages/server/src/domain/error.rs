//! ドメイン層のエラー型定義

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// PresenceStore のエラー
///
/// バックエンド（Redis など）の I/O 失敗を抽象化する。個別のエラー原因は
/// 文字列として保持し、ドメイン層がバックエンドのクレートに依存しないようにする。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresenceStoreError {
    #[error("presence store backend error: {0}")]
    Backend(String),
}

/// RelayBus のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayBusError {
    #[error("relay bus backend error: {0}")]
    Backend(String),
}

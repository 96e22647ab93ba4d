//! UseCase 層のエラー型定義

use thiserror::Error;

/// パーティ参加のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("presence store error during join: {0}")]
    Store(String),
    #[error("relay bus error during join: {0}")]
    Bus(String),
}

/// アウトバウンドリレーのエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("relay bus error: {0}")]
    Bus(String),
}

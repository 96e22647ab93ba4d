//! Server state shared across connection handlers.

use std::sync::Arc;

use crate::usecase::{DisconnectParticipantUseCase, JoinPartyUseCase, RelayOutboundUseCase};

/// Shared application state
pub struct AppState {
    /// JoinPartyUseCase（パーティ参加のユースケース）
    pub join_party_usecase: Arc<JoinPartyUseCase>,
    /// RelayOutboundUseCase（アウトバウンドリレーのユースケース）
    pub relay_outbound_usecase: Arc<RelayOutboundUseCase>,
    /// DisconnectParticipantUseCase（切断とフェイルオーバーのユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
}

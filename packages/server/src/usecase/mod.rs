//! UseCase 層
//!
//! プレゼンス・ファンアウト・コーディネータの各操作をユースケースとして
//! 実装します。Connection Registry、PresenceStore、RelayBus をつなぐ層です。

pub mod deliver_bus_message;
pub mod disconnect_participant;
pub mod error;
pub mod join_party;
pub mod relay_outbound;

pub use deliver_bus_message::DeliverBusMessageUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{JoinError, RelayError};
pub use join_party::JoinPartyUseCase;
pub use relay_outbound::RelayOutboundUseCase;

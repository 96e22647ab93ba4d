//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::usecase::{DisconnectParticipantUseCase, JoinPartyUseCase, RelayOutboundUseCase};

use super::{
    handler::{health_check, root, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Party relay server
///
/// This struct encapsulates the server configuration and provides methods to
/// run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     join_party_usecase,
///     relay_outbound_usecase,
///     disconnect_participant_usecase,
/// );
/// server.run("0.0.0.0".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// JoinPartyUseCase（パーティ参加のユースケース）
    join_party_usecase: Arc<JoinPartyUseCase>,
    /// RelayOutboundUseCase（アウトバウンドリレーのユースケース）
    relay_outbound_usecase: Arc<RelayOutboundUseCase>,
    /// DisconnectParticipantUseCase（切断とフェイルオーバーのユースケース）
    disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        join_party_usecase: Arc<JoinPartyUseCase>,
        relay_outbound_usecase: Arc<RelayOutboundUseCase>,
        disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    ) -> Self {
        Self {
            join_party_usecase,
            relay_outbound_usecase,
            disconnect_participant_usecase,
        }
    }

    /// Run the party relay server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "0.0.0.0")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            join_party_usecase: self.join_party_usecase,
            relay_outbound_usecase: self.relay_outbound_usecase,
            disconnect_participant_usecase: self.disconnect_participant_usecase,
        });

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/", get(root))
            .route("/api/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "Party relay server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

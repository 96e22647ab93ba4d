//! Party relay server binary.
//!
//! Each process terminates its own WebSocket connections and shares party
//! membership with its siblings through Redis (presence store + pub/sub
//! relay bus). Without `--redis-url` the process runs standalone with
//! in-memory backends.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin partyline-server
//! cargo run --bin partyline-server -- --host 0.0.0.0 --port 8080 --redis-url redis://127.0.0.1:6379
//! ```

use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use partyline_server::{
    domain::{PresenceStore, RelayBus},
    infrastructure::{
        ConnectionRegistry,
        bus::{InMemoryBusHub, RedisRelayBus},
        presence::{InMemoryPresenceStore, RedisPresenceStore},
    },
    ui::Server,
    usecase::{
        DeliverBusMessageUseCase, DisconnectParticipantUseCase, JoinPartyUseCase,
        RelayOutboundUseCase,
    },
};
use partyline_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "partyline-server")]
#[command(about = "Party relay server for WebRTC signaling and watch-party sync", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Redis URL for the shared presence store and relay bus.
    /// When omitted the process runs standalone with in-memory backends.
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Process label for horizontally-scaled deployments (logging only)
    #[arg(long, env = "SERVER_ID")]
    server_id: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger("partyline-server", "info");

    let args = Args::parse();
    if let Some(server_id) = &args.server_id {
        tracing::info!("Starting relay process '{}'", server_id);
    }

    // Initialize dependencies in order:
    // 1. Connection registry
    // 2. Presence store + relay bus (Redis or in-memory)
    // 3. UseCases
    // 4. Bus dispatcher task
    // 5. Server

    // 1. Create the per-process connection registry
    let registry = Arc::new(ConnectionRegistry::new());

    // 2. Create the shared-store backends. Bus deliveries arrive on the
    //    delivery channel regardless of backend.
    let (delivery_tx, mut delivery_rx) = mpsc::unbounded_channel();
    let (store, bus): (Arc<dyn PresenceStore>, Arc<dyn RelayBus>) = match &args.redis_url {
        Some(url) => {
            let store = match RedisPresenceStore::connect(url).await {
                Ok(store) => store,
                Err(e) => {
                    tracing::error!("Failed to connect presence store to {}: {}", url, e);
                    std::process::exit(1);
                }
            };
            let bus = match RedisRelayBus::connect(url, delivery_tx).await {
                Ok(bus) => bus,
                Err(e) => {
                    tracing::error!("Failed to connect relay bus to {}: {}", url, e);
                    std::process::exit(1);
                }
            };
            tracing::info!("Using Redis backends at {}", url);
            (Arc::new(store), Arc::new(bus))
        }
        None => {
            tracing::warn!(
                "No --redis-url given; running standalone with in-memory backends"
            );
            let hub = InMemoryBusHub::new();
            (
                Arc::new(InMemoryPresenceStore::new()),
                Arc::new(hub.connect(delivery_tx)),
            )
        }
    };

    // 3. Create UseCases
    let join_party_usecase = Arc::new(JoinPartyUseCase::new(
        registry.clone(),
        store.clone(),
        bus.clone(),
    ));
    let relay_outbound_usecase = Arc::new(RelayOutboundUseCase::new(bus.clone()));
    let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
        registry.clone(),
        store.clone(),
        bus.clone(),
    ));
    let deliver_bus_message_usecase = Arc::new(DeliverBusMessageUseCase::new(registry.clone()));

    // 4. Drain bus deliveries sequentially. Sequential handling preserves the
    //    per-publisher ordering the bus guarantees on a single channel.
    tokio::spawn(async move {
        while let Some(delivery) = delivery_rx.recv().await {
            deliver_bus_message_usecase.execute(delivery).await;
        }
        tracing::warn!("Bus delivery channel closed");
    });

    // 5. Create and run the server
    let server = Server::new(
        join_party_usecase,
        relay_outbound_usecase,
        disconnect_participant_usecase,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

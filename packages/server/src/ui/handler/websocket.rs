//! WebSocket connection handlers.
//!
//! This is the only component that talks directly to a client connection
//! inbound: it decodes each frame, rejects malformed input with an `error`
//! frame (the connection stays open), and dispatches by declared type.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    domain::{PartyId, UserId, Username},
    infrastructure::ConnectionSender,
    infrastructure::dto::bus::{BusEnvelope, RedirectSignalData, RelayedData, commands},
    infrastructure::dto::client::{
        BroadcastMessagePayload, ClientEnvelope, JoinPayload, NewSignalPayload,
        ReturnSignalPayload, types,
    },
    ui::state::AppState,
};

/// Connection session record
///
/// The identity is assigned at accept time, before any message is processed.
/// The party binding is set at most once, on the first join request; the
/// transport handle itself is only referenced through the registered sender
/// channel, never carried here.
struct ConnectionSession {
    user_id: UserId,
    party_id: Option<PartyId>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives frames from the rx channel and pushes them to
/// the WebSocket sender.
///
/// This handles the outbound flow: frames produced anywhere in the process
/// (join replies, bus fan-out, error frames) are sent to this client's
/// WebSocket connection.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    let user_id = UserId::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut send_task = pusher_loop(rx, sender);

    // Tell the client its identity immediately on connect
    if tx
        .send(ClientEnvelope::user_assigned(&user_id).to_json())
        .is_err()
    {
        return;
    }
    tracing::info!("Client connected, assigned userId '{}'", user_id.as_str());

    let mut session = ConnectionSession {
        user_id,
        party_id: None,
    };

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(&text, &mut session, &state, &tx).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Client '{}' requested close", session.user_id.as_str());
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong is handled by the WebSocket layer; other
                        // frame kinds are ignored
                    }
                    Some(Err(e)) => {
                        tracing::error!(
                            "WebSocket error for '{}': {}",
                            session.user_id.as_str(),
                            e
                        );
                        break;
                    }
                    None => break,
                }
            }
            _ = &mut send_task => break,
        }
    }

    send_task.abort();

    // Triggered exactly once per connection close. A connection that never
    // joined a party triggers nothing.
    if let Some(party_id) = session.party_id {
        tracing::info!("Client '{}' disconnected", session.user_id.as_str());
        state
            .disconnect_participant_usecase
            .execute(party_id, session.user_id)
            .await;
    }
}

fn reply_error(tx: &ConnectionSender, message: &str) {
    let _ = tx.send(ClientEnvelope::error(message).to_json());
}

/// Decode one inbound frame and dispatch by declared type.
///
/// Decode failures never tear the connection down: the sender gets an
/// `error` frame and subsequent frames keep being processed.
async fn handle_text(
    text: &str,
    session: &mut ConnectionSession,
    state: &Arc<AppState>,
    tx: &ConnectionSender,
) {
    let envelope: ClientEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(
                "Malformed message from client '{}': {}",
                session.user_id.as_str(),
                e
            );
            reply_error(tx, "Message sent was not in JSON format");
            return;
        }
    };
    let ClientEnvelope { r#type, payload } = envelope;

    match r#type.as_str() {
        types::GET_CURRENT_PARTY_USERS => handle_join(payload, session, state, tx).await,
        types::NEW_SIGNAL => handle_new_signal(payload, session, state, tx).await,
        types::RETURN_SIGNAL => handle_return_signal(payload, session, state, tx).await,
        types::BROADCAST_MESSAGE | types::SET_USER_MUTE | types::TIME_UPDATE
        | types::SET_ADMIN_CONTROLS => {
            handle_party_broadcast(&r#type, payload, session, state, tx).await
        }
        other => {
            tracing::warn!("Could not identify message type '{}'", other);
            reply_error(tx, "Not a valid message type");
        }
    }
}

/// Join request: bind the party, register locally, subscribe, reply with the
/// membership snapshot.
async fn handle_join(
    payload: Value,
    session: &mut ConnectionSession,
    state: &Arc<AppState>,
    tx: &ConnectionSender,
) {
    // The party binding is immutable once set
    if session.party_id.is_some() {
        reply_error(tx, "Already joined a party");
        return;
    }

    let payload: JoinPayload = match serde_json::from_value(payload) {
        Ok(payload) => payload,
        Err(_) => {
            reply_error(tx, "Invalid payload for message type 'getCurrentPartyUsers'");
            return;
        }
    };
    let (Ok(party_id), Ok(username)) = (
        PartyId::new(payload.party_id),
        Username::new(payload.username),
    ) else {
        reply_error(tx, "Invalid payload for message type 'getCurrentPartyUsers'");
        return;
    };

    // Bind before the join sequence runs: the disconnect path relies on the
    // binding for cleanup even if the join fails partway
    session.party_id = Some(party_id.clone());

    match state
        .join_party_usecase
        .execute(
            party_id.clone(),
            session.user_id.clone(),
            username,
            tx.clone(),
        )
        .await
    {
        Ok(snapshot) => {
            let _ = tx.send(ClientEnvelope::current_party_users(&snapshot).to_json());
            tracing::info!(
                "User '{}' joined party '{}' ({} existing member(s))",
                session.user_id.as_str(),
                party_id.as_str(),
                snapshot.len()
            );
        }
        Err(e) => {
            // Store/bus trouble during a join is logged, never reported to
            // the client
            tracing::warn!(
                "Join of '{}' to party '{}' abandoned: {}",
                session.user_id.as_str(),
                party_id.as_str(),
                e
            );
        }
    }
}

/// Forward-direction point-to-point signal.
async fn handle_new_signal(
    payload: Value,
    session: &ConnectionSession,
    state: &Arc<AppState>,
    tx: &ConnectionSender,
) {
    let Some(party_id) = session.party_id.clone() else {
        reply_error(tx, "Not in a party");
        return;
    };
    let payload: NewSignalPayload = match serde_json::from_value(payload) {
        Ok(payload) => payload,
        Err(_) => {
            reply_error(tx, "Invalid payload for message type 'newSignal'");
            return;
        }
    };

    let data = RedirectSignalData {
        user_id: session.user_id.as_str().to_string(),
        recipient_id: payload.recipient_id,
        signal: payload.signal,
        username: Some(payload.username),
        is_reply: false,
    };
    publish(state, &party_id, session, BusEnvelope::redirect_signal(&data)).await;
}

/// Reply-direction point-to-point signal.
async fn handle_return_signal(
    payload: Value,
    session: &ConnectionSession,
    state: &Arc<AppState>,
    tx: &ConnectionSender,
) {
    let Some(party_id) = session.party_id.clone() else {
        reply_error(tx, "Not in a party");
        return;
    };
    let payload: ReturnSignalPayload = match serde_json::from_value(payload) {
        Ok(payload) => payload,
        Err(_) => {
            reply_error(tx, "Invalid payload for message type 'returnSignal'");
            return;
        }
    };

    let data = RedirectSignalData {
        user_id: session.user_id.as_str().to_string(),
        recipient_id: payload.recipient_id,
        signal: payload.signal,
        username: None,
        is_reply: true,
    };
    publish(state, &party_id, session, BusEnvelope::redirect_signal(&data)).await;
}

/// Party-wide broadcast relay: `broadcastMessage`, `setUserMute`,
/// `timeUpdate`, `setAdminControls`. The payload is relayed verbatim.
async fn handle_party_broadcast(
    r#type: &str,
    payload: Value,
    session: &ConnectionSession,
    state: &Arc<AppState>,
    tx: &ConnectionSender,
) {
    let Some(party_id) = session.party_id.clone() else {
        reply_error(tx, "Not in a party");
        return;
    };

    let command = match r#type {
        types::BROADCAST_MESSAGE => {
            // content is the one required field
            if serde_json::from_value::<BroadcastMessagePayload>(payload.clone()).is_err() {
                reply_error(tx, "Invalid payload for message type 'broadcastMessage'");
                return;
            }
            commands::BROADCAST_MESSAGE
        }
        types::SET_USER_MUTE => commands::SET_USER_MUTE,
        types::TIME_UPDATE => commands::TIME_UPDATE,
        _ => commands::SET_ADMIN_CONTROLS,
    };

    let data = RelayedData {
        user_id: session.user_id.as_str().to_string(),
        payload,
    };
    publish(state, &party_id, session, BusEnvelope::relayed(command, &data)).await;
}

/// Publish an envelope on the party's channel. Bus trouble during routine
/// relay is logged and the operation abandoned; the client is not notified.
async fn publish(
    state: &Arc<AppState>,
    party_id: &PartyId,
    session: &ConnectionSession,
    envelope: BusEnvelope,
) {
    if let Err(e) = state
        .relay_outbound_usecase
        .execute(party_id, envelope.to_json())
        .await
    {
        tracing::warn!(
            "Abandoning relay of '{}' from '{}': {}",
            envelope.command,
            session.user_id.as_str(),
            e
        );
    }
}

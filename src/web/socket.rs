//! Per-connection WebSocket loop.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};

use crate::board::{handle_text, ArduinoState};
use crate::web::api::AppState;
use crate::board::{Envelope, ServerMessage};
use crate::web::registry::ClientId;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Greet the peer, then answer commands until it goes away.
pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (id, mut outbox) = state.clients.register().await;
    tracing::info!("Client {} connected ({} connected)", id, state.clients.len().await);

    // Replies and broadcasts share one queue so each peer sees them in order.
    let writer = tokio::spawn(async move {
        while let Some(payload) = outbox.recv().await {
            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    deliver(&state, id, &state.greeting().await).await;

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("Client {} transport error: {}", id, e);
                break;
            }
        };
        tracing::debug!("Client {} sent: {}", id, text.as_str());

        // The reply and the state_update are queued before the write guard is
        // released, so peers observe updates in mutation order.
        let mut board = state.board.write().await;
        let reply = apply(&mut board, text.as_str());
        deliver(&state, id, &reply).await;
        if reply.broadcast {
            notify_peers(&state, id, &board).await;
        }
    }

    state.clients.remove(id).await;
    if let Err(e) = writer.await {
        tracing::warn!("Writer task for client {} failed: {}", id, e);
    }
    tracing::info!("Client {} disconnected ({} connected)", id, state.clients.len().await);
}

fn apply(board: &mut ArduinoState, text: &str) -> Envelope {
    handle_text(board, text, &mut rand::rng())
}

async fn notify_peers(state: &AppState, id: ClientId, board: &ArduinoState) {
    let update = Envelope::new(ServerMessage::StateUpdate {
        state: board.clone(),
    });
    match update.to_json() {
        Ok(payload) => {
            let reached = state.clients.broadcast(&payload, Some(id)).await;
            tracing::debug!("State update from {} sent to {} peers", id, reached);
        }
        Err(e) => tracing::error!("Failed to encode state update: {}", e),
    }
}

async fn deliver(state: &AppState, id: ClientId, envelope: &Envelope) {
    match envelope.to_json() {
        Ok(payload) => {
            state.clients.send_to(id, payload).await;
        }
        Err(e) => tracing::error!("Failed to encode reply for {}: {}", id, e),
    }
}

//! Defines the Axum routes and the state shared by every handler.

use crate::board::{ArduinoState, SharedBoard};
use crate::config::BoardConfig;
use crate::board::{Envelope, ServerMessage};
use crate::web::registry::ClientRegistry;
use crate::web::socket::ws_handler;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

/// Simulator context handed to every handler and to the drift task.
#[derive(Debug, Clone)]
pub struct AppState {
    pub board: SharedBoard,
    pub clients: ClientRegistry,
    pub identity: Arc<BoardConfig>,
}

impl AppState {
    pub fn new(identity: BoardConfig) -> Self {
        Self::with_board(ArduinoState::new(), identity)
    }

    pub fn with_board(board: ArduinoState, identity: BoardConfig) -> Self {
        Self {
            board: board.shared(),
            clients: ClientRegistry::new(),
            identity: Arc::new(identity),
        }
    }

    pub async fn snapshot(&self) -> ArduinoState {
        self.board.read().await.clone()
    }

    /// Greeting sent to each new connection.
    pub async fn greeting(&self) -> Envelope {
        Envelope::new(ServerMessage::Ready {
            message: format!("{} Simulator Ready", self.identity.name),
            board: self.identity.name.clone(),
            firmware: self.identity.firmware.clone(),
            state: self.snapshot().await,
        })
    }
}

/// Creates the Axum router: the WebSocket endpoint at `/` plus a read-only
/// state endpoint.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/api/v1/state", get(get_state))
        .with_state(state)
}

/// Handler returning the current board state.
async fn get_state(State(state): State<AppState>) -> Json<ArduinoState> {
    Json(state.snapshot().await)
}

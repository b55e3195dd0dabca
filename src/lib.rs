//! Arduino Uno R3 simulator served over a WebSocket, plus a polling client.
//!
//! The server keeps a single simulated board (`board`), applies JSON commands
//! to it (`board::processor`), fans state changes out to every connected
//! socket (`web`) and lets the sensors drift in the background (`simulator`).

pub mod board;
pub mod client;
pub mod config;
pub mod error;
pub mod simulator;
pub mod web;

pub use board::ArduinoState;
pub use config::{load_config, Config};
pub use error::ServerError;
pub use web::api::{create_router, AppState};

//! Replies and pushes the board sends back to clients.

use serde::Serialize;

use super::{ArduinoState, Sensors};

/// Every message the server emits, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Greeting sent once per connection.
    #[serde(rename = "arduino_ready")]
    Ready {
        message: String,
        board: String,
        firmware: String,
        state: ArduinoState,
    },
    #[serde(rename = "digitalWrite_response")]
    DigitalWrite {
        pin: i64,
        value: bool,
        status: String,
        message: String,
    },
    #[serde(rename = "digitalRead_response")]
    DigitalRead { pin: i64, value: bool },
    #[serde(rename = "analogRead_response")]
    AnalogRead { pin: i64, value: i64 },
    #[serde(rename = "blink_response")]
    Blink { message: String, times: i64, delay: i64 },
    #[serde(rename = "reset_response")]
    Reset { message: String, state: ArduinoState },
    #[serde(rename = "state_response")]
    State { state: ArduinoState },
    /// Pushed to other peers after a broadcast-flagged command.
    #[serde(rename = "state_update")]
    StateUpdate { state: ArduinoState },
    /// Pushed to every peer by the drift task.
    #[serde(rename = "sensor_update")]
    SensorUpdate { sensors: Sensors },
    #[serde(rename = "error")]
    Error { message: String },
}

/// A message stamped with its send time and the broadcast flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub message: ServerMessage,
    pub timestamp: String,
    /// Asks the connection handler to notify the other peers. Only serialized
    /// when set.
    #[serde(skip_serializing_if = "is_false")]
    pub broadcast: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl Envelope {
    pub fn new(message: ServerMessage) -> Self {
        Self {
            message,
            timestamp: timestamp(),
            broadcast: false,
        }
    }

    pub fn broadcast(message: ServerMessage) -> Self {
        Self {
            broadcast: true,
            ..Self::new(message)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ServerMessage::Error {
            message: message.into(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self.message, ServerMessage::Error { .. })
    }

    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Local wall-clock time, ISO-8601 with microseconds.
pub fn timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

//! Incoming board commands and their JSON decoding.

use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use thiserror::Error;

const DEFAULT_BLINK_TIMES: i64 = 3;
const DEFAULT_BLINK_DELAY_MS: i64 = 500;

/// Reasons a text frame could not be turned into a [`Command`].
///
/// The `Display` string is sent back verbatim as the error message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Invalid JSON format")]
    InvalidJson,
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Missing field '{field}' for {command}")]
    MissingField {
        command: &'static str,
        field: &'static str,
    },
}

/// A command as it appears on the wire, before the `type` tag is checked.
#[derive(Debug, Deserialize)]
struct CommandFrame {
    #[serde(rename = "type", default)]
    kind: String,
    pin: Option<i64>,
    value: Option<bool>,
    times: Option<i64>,
    delay: Option<i64>,
}

/// A decoded board command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Command {
    #[serde(rename = "digitalWrite")]
    DigitalWrite { pin: i64, value: bool },
    #[serde(rename = "digitalRead")]
    DigitalRead { pin: i64 },
    #[serde(rename = "analogRead")]
    AnalogRead { pin: i64 },
    #[serde(rename = "blink_builtin")]
    BlinkBuiltin { times: i64, delay: i64 },
    #[serde(rename = "reset_arduino")]
    ResetArduino,
    #[serde(rename = "get_state")]
    GetState,
}

impl CommandFrame {
    fn into_command(self) -> Result<Command, CommandError> {
        match self.kind.as_str() {
            "digitalWrite" => {
                let pin = self.pin.ok_or(CommandError::MissingField {
                    command: "digitalWrite",
                    field: "pin",
                })?;
                Ok(Command::DigitalWrite {
                    pin,
                    value: self.value.unwrap_or(false),
                })
            }
            "digitalRead" => Ok(Command::DigitalRead {
                pin: self.pin.unwrap_or(0),
            }),
            "analogRead" => Ok(Command::AnalogRead {
                pin: self.pin.unwrap_or(0),
            }),
            "blink_builtin" => Ok(Command::BlinkBuiltin {
                times: self.times.unwrap_or(DEFAULT_BLINK_TIMES),
                delay: self.delay.unwrap_or(DEFAULT_BLINK_DELAY_MS),
            }),
            "reset_arduino" => Ok(Command::ResetArduino),
            "get_state" => Ok(Command::GetState),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// Decode one text frame into a command.
pub fn parse_command(text: &str) -> Result<Command, CommandError> {
    let frame: CommandFrame = serde_json::from_str(text).map_err(|e| match e.classify() {
        Category::Data => CommandError::InvalidCommand(e.to_string()),
        Category::Syntax | Category::Eof | Category::Io => CommandError::InvalidJson,
    })?;
    frame.into_command()
}

//! WebSocket client for the simulator: single commands and the sensor
//! polling loop.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::fmt;
use std::io::Write;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::board::processor::{LIGHT_PIN, TEMPERATURE_PIN};
use crate::board::{ArduinoState, Command, Led};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Connect(#[source] tungstenite::Error),
    #[error("Transport error: {0}")]
    Transport(#[from] tungstenite::Error),
    #[error("Invalid reply: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Connection closed by server")]
    Closed,
    #[error("Server rejected command: {0}")]
    Rejected(String),
    #[error("Reply is missing '{0}'")]
    MissingField(&'static str),
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// A server message as seen by the client. Only the fields the client acts
/// on are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct Reply {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Option<serde_json::Value>,
    pub message: Option<String>,
    pub state: Option<ArduinoState>,
    pub timestamp: Option<String>,
}

impl Reply {
    /// Messages the server sends on its own rather than in answer to a
    /// request.
    pub fn is_push(&self) -> bool {
        matches!(self.kind.as_str(), "arduino_ready" | "state_update" | "sensor_update")
    }

    /// Integer `value`, or 0 when absent.
    pub fn int_value(&self) -> i64 {
        self.value.as_ref().and_then(serde_json::Value::as_i64).unwrap_or(0)
    }
}

/// One temperature/light sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    /// Tenths of a degree Celsius, as returned by analog pin 0.
    pub temperature: i64,
    /// Raw light ADC value from analog pin 1.
    pub light: i64,
}

impl SensorReading {
    pub fn celsius(&self) -> f64 {
        self.temperature as f64 / 10.0
    }

    /// `{temp}, {light}` with the raw pin values.
    pub fn raw(&self) -> String {
        format!("{}, {}", self.temperature, self.light)
    }
}

/// Arduino serial style: `TEMP:25.3, LIGHT:512`.
impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TEMP:{:.1}, LIGHT:{}", self.celsius(), self.light)
    }
}

/// Loop counter deciding which samples get printed: odd counts print, and
/// the count wraps to zero at [`PollCounter::WRAP`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PollCounter {
    count: u32,
}

impl PollCounter {
    pub const WRAP: u32 = 1000;

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Step the counter. Returns whether the sample taken at the previous
    /// count should be printed.
    pub fn advance(&mut self) -> bool {
        let print = self.count % 2 == 1;
        self.count += 1;
        if self.count == Self::WRAP {
            self.count = 0;
        }
        print
    }
}

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub interval: Duration,
    /// Print raw pin values instead of the serial style line.
    pub raw: bool,
    /// Stop after this many samples. Unbounded when `None`.
    pub iterations: Option<u64>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            raw: false,
            iterations: None,
        }
    }
}

/// A connected simulator client. Requests are strictly sequential: each
/// command waits for its reply before the next is sent.
pub struct ArduinoClient {
    socket: WsStream,
}

impl ArduinoClient {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        tracing::info!("Connecting to Arduino at {}", url);
        let (socket, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(ClientError::Connect)?;
        tracing::info!("Connected to Arduino");
        Ok(Self { socket })
    }

    /// Send one command and wait for its reply. Pushes that arrive in the
    /// meantime are skipped; an `error` reply becomes [`ClientError::Rejected`].
    pub async fn send_command(&mut self, command: &Command) -> Result<Reply, ClientError> {
        let payload = serde_json::to_string(command)?;
        tracing::debug!("Sending {}", payload);
        self.socket.send(Message::Text(payload.into())).await?;

        let reply = self.next_reply().await?;
        if reply.kind == "error" {
            return Err(ClientError::Rejected(reply.message.unwrap_or_default()));
        }
        Ok(reply)
    }

    async fn next_reply(&mut self) -> Result<Reply, ClientError> {
        while let Some(frame) = self.socket.next().await {
            match frame? {
                Message::Text(text) => {
                    let reply: Reply = serde_json::from_str(text.as_str())?;
                    if reply.is_push() {
                        tracing::debug!("Skipping {} push", reply.kind);
                        continue;
                    }
                    return Ok(reply);
                }
                Message::Close(_) => return Err(ClientError::Closed),
                _ => continue,
            }
        }
        Err(ClientError::Closed)
    }

    pub async fn analog_read(&mut self, pin: i64) -> Result<i64, ClientError> {
        let reply = self.send_command(&Command::AnalogRead { pin }).await?;
        Ok(reply.int_value())
    }

    /// Read temperature then light, one request at a time.
    pub async fn read_sensors(&mut self) -> Result<SensorReading, ClientError> {
        let temperature = self.analog_read(TEMPERATURE_PIN).await?;
        let light = self.analog_read(LIGHT_PIN).await?;
        Ok(SensorReading { temperature, light })
    }

    pub async fn set_led(&mut self, led: Led, on: bool) -> Result<Reply, ClientError> {
        self.send_command(&Command::DigitalWrite { pin: led.pin(), value: on })
            .await
    }

    pub async fn blink(&mut self, times: i64, delay: i64) -> Result<Reply, ClientError> {
        self.send_command(&Command::BlinkBuiltin { times, delay }).await
    }

    pub async fn state(&mut self) -> Result<ArduinoState, ClientError> {
        let reply = self.send_command(&Command::GetState).await?;
        reply.state.ok_or(ClientError::MissingField("state"))
    }

    pub async fn reset(&mut self) -> Result<ArduinoState, ClientError> {
        let reply = self.send_command(&Command::ResetArduino).await?;
        reply.state.ok_or(ClientError::MissingField("state"))
    }

    /// Sample the sensors in a loop, writing every other reading to `out` as
    /// a carriage-return terminated line. Returns the number of samples taken
    /// when `options.iterations` is reached; any failure ends the loop.
    pub async fn poll<W: Write>(&mut self, out: &mut W, options: &PollOptions) -> Result<u64, ClientError> {
        let mut counter = PollCounter::default();
        let mut taken = 0u64;
        while options.iterations.is_none_or(|limit| taken < limit) {
            let reading = self.read_sensors().await?;
            if counter.advance() {
                let line = if options.raw { reading.raw() } else { reading.to_string() };
                write!(out, "{}\r", line)?;
                out.flush()?;
            }
            taken += 1;
            tokio::time::sleep(options.interval).await;
        }
        Ok(taken)
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.socket.close(None).await?;
        tracing::info!("Disconnected from Arduino");
        Ok(())
    }
}

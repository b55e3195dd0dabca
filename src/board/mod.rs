// src/board/mod.rs - Simulated Arduino Uno board state
pub mod command;
pub mod processor;
pub mod reply;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

pub use command::{parse_command, Command, CommandError};
pub use processor::{handle_text, process_command};
pub use reply::{Envelope, ServerMessage};

/// Number of digital I/O lines (D0-D13).
pub const DIGITAL_PINS: usize = 14;
/// Number of analog input lines (A0-A5).
pub const ANALOG_PINS: usize = 6;

/// Board state shared between connection handlers and the drift task.
pub type SharedBoard = Arc<RwLock<ArduinoState>>;

/// The on-board LEDs wired to digital pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    BuiltIn,
    Red,
    Green,
    Blue,
    Yellow,
}

impl Led {
    pub const ALL: [Led; 5] = [Led::BuiltIn, Led::Red, Led::Green, Led::Blue, Led::Yellow];

    /// LED wired to the given digital pin, if any.
    pub fn from_pin(pin: i64) -> Option<Led> {
        match pin {
            13 => Some(Led::BuiltIn),
            8 => Some(Led::Red),
            9 => Some(Led::Green),
            10 => Some(Led::Blue),
            11 => Some(Led::Yellow),
            _ => None,
        }
    }

    pub fn pin(self) -> i64 {
        match self {
            Led::BuiltIn => 13,
            Led::Red => 8,
            Led::Green => 9,
            Led::Blue => 10,
            Led::Yellow => 11,
        }
    }
}

/// On/off flag per LED, serialized as a name→bool mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leds {
    pub built_in: bool,
    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub yellow: bool,
}

impl Leds {
    pub fn get(&self, led: Led) -> bool {
        match led {
            Led::BuiltIn => self.built_in,
            Led::Red => self.red,
            Led::Green => self.green,
            Led::Blue => self.blue,
            Led::Yellow => self.yellow,
        }
    }

    pub fn set(&mut self, led: Led, on: bool) {
        let flag = match led {
            Led::BuiltIn => &mut self.built_in,
            Led::Red => &mut self.red,
            Led::Green => &mut self.green,
            Led::Blue => &mut self.blue,
            Led::Yellow => &mut self.yellow,
        };
        *flag = on;
    }

    pub fn any_on(&self) -> bool {
        Led::ALL.iter().any(|led| self.get(*led))
    }
}

/// Simulated sensor readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sensors {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Raw 10-bit ADC value.
    pub light: i64,
    pub potentiometer: i64,
}

impl Default for Sensors {
    fn default() -> Self {
        Self {
            temperature: 25.0,
            light: 512,
            potentiometer: 0,
        }
    }
}

/// Raw pin levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pins {
    pub analog: [i64; ANALOG_PINS],
    pub digital: [bool; DIGITAL_PINS],
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            analog: [0; ANALOG_PINS],
            digital: [false; DIGITAL_PINS],
        }
    }
}

impl Pins {
    /// Digital level of `pin`, `false` when out of range.
    pub fn digital(&self, pin: i64) -> bool {
        usize::try_from(pin)
            .ok()
            .and_then(|idx| self.digital.get(idx).copied())
            .unwrap_or(false)
    }

    /// Stored analog value of `pin`, `0` when out of range.
    pub fn analog(&self, pin: i64) -> i64 {
        usize::try_from(pin)
            .ok()
            .and_then(|idx| self.analog.get(idx).copied())
            .unwrap_or(0)
    }

    /// Set a digital level. Returns `false` and leaves the pins untouched when
    /// `pin` is out of range.
    pub fn set_digital(&mut self, pin: i64, level: bool) -> bool {
        match usize::try_from(pin).ok().and_then(|idx| self.digital.get_mut(idx)) {
            Some(slot) => {
                *slot = level;
                true
            }
            None => false,
        }
    }
}

/// Complete simulated board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArduinoState {
    pub leds: Leds,
    pub sensors: Sensors,
    pub pins: Pins,
}

impl ArduinoState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedBoard {
        Arc::new(RwLock::new(self))
    }

    /// Turn every LED off and drive every digital pin low. Sensors and analog
    /// pins keep their values.
    pub fn reset(&mut self) {
        self.leds = Leds::default();
        self.pins.digital = [false; DIGITAL_PINS];
    }
}

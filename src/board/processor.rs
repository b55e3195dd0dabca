//! Applies commands to the board and builds the reply for the sender.

use rand::Rng;

use super::command::{parse_command, Command};
use super::{ArduinoState, Led};
use super::reply::{Envelope, ServerMessage};

/// Analog input the temperature sensor is wired to.
pub const TEMPERATURE_PIN: i64 = 0;
/// Analog input the light sensor is wired to.
pub const LIGHT_PIN: i64 = 1;
/// Analog input the potentiometer is wired to.
pub const POTENTIOMETER_PIN: i64 = 2;

const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 20.0..=35.0;
const ADC_MAX: i64 = 1023;

/// Apply `command` to `state` and return the reply.
///
/// Replies to state-changing commands carry the broadcast flag.
pub fn process_command<R: Rng>(
    state: &mut ArduinoState,
    command: Command,
    rng: &mut R,
) -> Envelope {
    match command {
        Command::DigitalWrite { pin, value } => {
            if let Some(led) = Led::from_pin(pin) {
                state.leds.set(led, value);
            }
            state.pins.set_digital(pin, value);
            Envelope::broadcast(ServerMessage::DigitalWrite {
                pin,
                value,
                status: "success".to_string(),
                message: format!("Pin {} set to {}", pin, if value { "HIGH" } else { "LOW" }),
            })
        }
        Command::DigitalRead { pin } => Envelope::new(ServerMessage::DigitalRead {
            pin,
            value: state.pins.digital(pin),
        }),
        Command::AnalogRead { pin } => {
            let value = analog_read(state, pin, rng);
            Envelope::new(ServerMessage::AnalogRead { pin, value })
        }
        Command::BlinkBuiltin { times, delay } => Envelope::broadcast(ServerMessage::Blink {
            message: format!("Blinking built-in LED {} times", times),
            times,
            delay,
        }),
        Command::ResetArduino => {
            state.reset();
            Envelope::broadcast(ServerMessage::Reset {
                message: "Arduino has been reset".to_string(),
                state: state.clone(),
            })
        }
        Command::GetState => Envelope::new(ServerMessage::State {
            state: state.clone(),
        }),
    }
}

/// Sensor pins take a fresh sample on every read; other pins return the
/// stored analog level.
fn analog_read<R: Rng>(state: &mut ArduinoState, pin: i64, rng: &mut R) -> i64 {
    match pin {
        TEMPERATURE_PIN => {
            let celsius = (rng.random_range(TEMPERATURE_RANGE) * 10.0).round() / 10.0;
            state.sensors.temperature = celsius;
            (celsius * 10.0).round() as i64
        }
        LIGHT_PIN => {
            state.sensors.light = rng.random_range(0..=ADC_MAX);
            state.sensors.light
        }
        POTENTIOMETER_PIN => {
            state.sensors.potentiometer = rng.random_range(0..=ADC_MAX);
            state.sensors.potentiometer
        }
        _ => state.pins.analog(pin),
    }
}

/// Decode a text frame and apply it. Decoding failures become error replies
/// and leave `state` untouched.
pub fn handle_text<R: Rng>(state: &mut ArduinoState, text: &str, rng: &mut R) -> Envelope {
    match parse_command(text) {
        Ok(command) => process_command(state, command, rng),
        Err(e) => Envelope::error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{DIGITAL_PINS, Led};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_digital_write_sets_led_and_pin() {
        let mut state = ArduinoState::new();
        let mut rng = rng();
        for led in Led::ALL {
            for value in [true, false, true] {
                let reply = process_command(
                    &mut state,
                    Command::DigitalWrite { pin: led.pin(), value },
                    &mut rng,
                );
                assert!(reply.broadcast);
                assert_eq!(state.leds.get(led), value);
                assert_eq!(state.pins.digital(led.pin()), value);
            }
        }
    }

    #[test]
    fn test_digital_write_reply_shape() {
        let mut state = ArduinoState::new();
        let reply = handle_text(&mut state, r#"{"type":"digitalWrite","pin":13,"value":true}"#, &mut rng());
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "digitalWrite_response");
        assert_eq!(json["pin"], 13);
        assert_eq!(json["value"], true);
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Pin 13 set to HIGH");
        assert_eq!(json["broadcast"], true);
        assert!(state.leds.built_in);
    }

    #[test]
    fn test_digital_write_non_led_pin() {
        let mut state = ArduinoState::new();
        process_command(&mut state, Command::DigitalWrite { pin: 2, value: true }, &mut rng());
        assert!(state.pins.digital(2));
        assert!(!state.leds.any_on());
    }

    #[test]
    fn test_digital_write_out_of_range_still_succeeds() {
        let mut state = ArduinoState::new();
        let before = state.clone();
        let reply = process_command(&mut state, Command::DigitalWrite { pin: 42, value: true }, &mut rng());
        assert!(!reply.is_error());
        assert_eq!(state, before);
    }

    #[test]
    fn test_digital_read() {
        let mut state = ArduinoState::new();
        state.pins.set_digital(4, true);
        let reply = process_command(&mut state, Command::DigitalRead { pin: 4 }, &mut rng());
        assert_eq!(reply.message, ServerMessage::DigitalRead { pin: 4, value: true });
        assert!(!reply.broadcast);
        let reply = process_command(&mut state, Command::DigitalRead { pin: 99 }, &mut rng());
        assert_eq!(reply.message, ServerMessage::DigitalRead { pin: 99, value: false });
    }

    #[test]
    fn test_analog_read_sensor_ranges() {
        let mut state = ArduinoState::new();
        let mut rng = rng();
        for _ in 0..500 {
            let reply = process_command(&mut state, Command::AnalogRead { pin: TEMPERATURE_PIN }, &mut rng);
            let ServerMessage::AnalogRead { value, .. } = reply.message else {
                panic!("unexpected reply {:?}", reply.message);
            };
            assert!((200..=350).contains(&value), "temperature value {}", value);
            assert_eq!(value, (state.sensors.temperature * 10.0).round() as i64);

            let reply = process_command(&mut state, Command::AnalogRead { pin: LIGHT_PIN }, &mut rng);
            let ServerMessage::AnalogRead { value, .. } = reply.message else {
                panic!("unexpected reply {:?}", reply.message);
            };
            assert!((0..=1023).contains(&value), "light value {}", value);
            assert_eq!(value, state.sensors.light);
        }
    }

    #[test]
    fn test_analog_read_potentiometer_and_stored_pins() {
        let mut state = ArduinoState::new();
        let mut rng = rng();
        let reply = process_command(&mut state, Command::AnalogRead { pin: POTENTIOMETER_PIN }, &mut rng);
        let ServerMessage::AnalogRead { value, .. } = reply.message else {
            panic!("unexpected reply {:?}", reply.message);
        };
        assert_eq!(value, state.sensors.potentiometer);

        state.pins.analog[4] = 321;
        let reply = process_command(&mut state, Command::AnalogRead { pin: 4 }, &mut rng);
        assert_eq!(reply.message, ServerMessage::AnalogRead { pin: 4, value: 321 });
        let reply = process_command(&mut state, Command::AnalogRead { pin: 9 }, &mut rng);
        assert_eq!(reply.message, ServerMessage::AnalogRead { pin: 9, value: 0 });
    }

    #[test]
    fn test_blink_does_not_touch_state() {
        let mut state = ArduinoState::new();
        let before = state.clone();
        let reply = handle_text(&mut state, r#"{"type":"blink_builtin","times":5,"delay":200}"#, &mut rng());
        assert!(reply.broadcast);
        assert_eq!(
            reply.message,
            ServerMessage::Blink {
                message: "Blinking built-in LED 5 times".to_string(),
                times: 5,
                delay: 200,
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_reset_then_get_state() {
        let mut state = ArduinoState::new();
        let mut rng = rng();
        for pin in 0..DIGITAL_PINS as i64 {
            process_command(&mut state, Command::DigitalWrite { pin, value: true }, &mut rng);
        }
        assert!(state.leds.any_on());

        let reply = process_command(&mut state, Command::ResetArduino, &mut rng);
        assert!(reply.broadcast);
        assert!(matches!(reply.message, ServerMessage::Reset { .. }));

        let reply = process_command(&mut state, Command::GetState, &mut rng);
        assert!(!reply.broadcast);
        let ServerMessage::State { state: snapshot } = &reply.message else {
            panic!("unexpected reply {:?}", reply.message);
        };
        assert!(!snapshot.leds.any_on());
        assert!(snapshot.pins.digital.iter().all(|level| !level));
    }

    #[test]
    fn test_unknown_and_malformed_never_mutate() {
        let mut state = ArduinoState::new();
        state.leds.set(Led::Blue, true);
        let before = state.clone();
        let mut rng = rng();
        for text in [
            r#"{"type":"selfDestruct","pin":13,"value":false}"#,
            r#"{"pin":13,"value":false}"#,
            "{{{{",
            "42",
            r#"{"type":"digitalWrite","value":false}"#,
        ] {
            let reply = handle_text(&mut state, text, &mut rng);
            assert!(reply.is_error(), "expected error for {}", text);
            assert!(!reply.broadcast);
            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_unknown_command_message() {
        let mut state = ArduinoState::new();
        let reply = handle_text(&mut state, r#"{"type":"selfDestruct"}"#, &mut rng());
        assert_eq!(
            reply.message,
            ServerMessage::Error { message: "Unknown command: selfDestruct".to_string() }
        );
    }
}

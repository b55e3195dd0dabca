//! Background behaviour of the simulated board.

pub mod drift;

pub use drift::SensorDrift;

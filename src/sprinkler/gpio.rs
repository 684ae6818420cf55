//! GPIO pin contract.
//!
//! The controller only ever needs three primitives (pin mode, digital read,
//! digital write), so the hardware is hidden behind [`Backend`]. The real
//! implementation drives the Raspberry Pi header through `rppal`; the
//! in-memory implementation backs the `demo` feature and the test suite.

use core::fmt;
use std::collections::HashMap;

/// Fixed BCM pin assignments.
pub mod pin {
    /// Shift register **CLOCK** pin
    pub const SHIFT_REGISTER_CLOCK: u8 = 4;
    /// Shift register **OE** (output enable, active low) pin
    pub const SHIFT_REGISTER_OE: u8 = 17;
    /// Shift register **LATCH** pin
    pub const SHIFT_REGISTER_LATCH: u8 = 22;
    /// Shift register **DATA** pin
    pub const SHIFT_REGISTER_DATA: u8 = 27;
    /// Sensor 1 pin
    pub const SENSOR_1: u8 = 14;
    /// Sensor 2 pin
    pub const SENSOR_2: u8 = 23;

    /// Pins owned by the firmware; GPIO-kind stations may not claim these.
    pub const RESERVED: [u8; 6] = [SHIFT_REGISTER_CLOCK, SHIFT_REGISTER_OE, SHIFT_REGISTER_LATCH, SHIFT_REGISTER_DATA, SENSOR_1, SENSOR_2];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Level::High
        } else {
            Level::Low
        }
    }

    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl std::ops::Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Input,
    InputPullup,
    Output,
}

#[derive(Debug)]
pub enum Error {
    /// The pin is not configured for the requested operation.
    BadMode(u8),
    /// The underlying GPIO chip reported a failure.
    Chip(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadMode(pin) => write!(f, "pin {} is not configured for this operation", pin),
            Error::Chip(message) => write!(f, "gpio chip error: {}", message),
        }
    }
}

impl std::error::Error for Error {}

/// The hardware seam consumed by the controller.
///
/// Pin failures are considered fatal to control safety; callers propagate
/// them instead of retrying.
pub trait Backend: Send {
    fn pin_mode(&mut self, pin: u8, mode: Mode) -> Result<(), Error>;
    fn digital_read(&mut self, pin: u8) -> Result<Level, Error>;
    fn digital_write(&mut self, pin: u8, level: Level) -> Result<(), Error>;
}

enum RpiPin {
    Input(rppal::gpio::InputPin),
    Output(rppal::gpio::OutputPin),
}

/// Backend for the Raspberry Pi header.
pub struct RpiBackend {
    chip: rppal::gpio::Gpio,
    pins: HashMap<u8, RpiPin>,
}

impl RpiBackend {
    pub fn new() -> Result<Self, Error> {
        let chip = rppal::gpio::Gpio::new().map_err(|e| Error::Chip(e.to_string()))?;
        Ok(RpiBackend { chip, pins: HashMap::new() })
    }
}

impl Backend for RpiBackend {
    fn pin_mode(&mut self, pin: u8, mode: Mode) -> Result<(), Error> {
        let raw = self.chip.get(pin).map_err(|e| Error::Chip(e.to_string()))?;
        let handle = match mode {
            Mode::Input => RpiPin::Input(raw.into_input()),
            Mode::InputPullup => {
                let mut input = raw.into_input_pullup();
                // keep the pull-up engaged across process exits
                input.set_reset_on_drop(false);
                RpiPin::Input(input)
            }
            Mode::Output => RpiPin::Output(raw.into_output()),
        };
        self.pins.insert(pin, handle);
        Ok(())
    }

    fn digital_read(&mut self, pin: u8) -> Result<Level, Error> {
        match self.pins.get(&pin) {
            Some(RpiPin::Input(input)) => Ok(match input.read() {
                rppal::gpio::Level::Low => Level::Low,
                rppal::gpio::Level::High => Level::High,
            }),
            _ => Err(Error::BadMode(pin)),
        }
    }

    fn digital_write(&mut self, pin: u8, level: Level) -> Result<(), Error> {
        match self.pins.get_mut(&pin) {
            Some(RpiPin::Output(output)) => {
                match level {
                    Level::Low => output.set_low(),
                    Level::High => output.set_high(),
                }
                Ok(())
            }
            _ => Err(Error::BadMode(pin)),
        }
    }
}

/// In-memory backend for the `demo` feature and tests.
///
/// Unconfigured or floating input pins read high, matching the pulled-up
/// sensor inputs on the real board.
pub struct MemoryBackend {
    levels: HashMap<u8, Level>,
    modes: HashMap<u8, Mode>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            levels: HashMap::new(),
            modes: HashMap::new(),
        }
    }

    /// Force a pin level, e.g. to simulate a sensor closing.
    pub fn set_level(&mut self, pin: u8, level: Level) {
        self.levels.insert(pin, level);
    }

    pub fn level(&self, pin: u8) -> Level {
        self.levels.get(&pin).copied().unwrap_or(Level::High)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn pin_mode(&mut self, pin: u8, mode: Mode) -> Result<(), Error> {
        self.modes.insert(pin, mode);
        Ok(())
    }

    fn digital_read(&mut self, pin: u8) -> Result<Level, Error> {
        Ok(self.level(pin))
    }

    fn digital_write(&mut self, pin: u8, level: Level) -> Result<(), Error> {
        self.levels.insert(pin, level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_defaults_high() {
        let mut backend = MemoryBackend::new();
        assert_eq!(backend.digital_read(pin::SENSOR_1).unwrap(), Level::High);
        backend.set_level(pin::SENSOR_1, Level::Low);
        assert_eq!(backend.digital_read(pin::SENSOR_1).unwrap(), Level::Low);
    }

    #[test]
    fn memory_backend_write_read_back() {
        let mut backend = MemoryBackend::new();
        backend.pin_mode(pin::SHIFT_REGISTER_DATA, Mode::Output).unwrap();
        backend.digital_write(pin::SHIFT_REGISTER_DATA, Level::High).unwrap();
        assert_eq!(backend.level(pin::SHIFT_REGISTER_DATA), Level::High);
        backend.digital_write(pin::SHIFT_REGISTER_DATA, !Level::High).unwrap();
        assert_eq!(backend.level(pin::SHIFT_REGISTER_DATA), Level::Low);
    }
}

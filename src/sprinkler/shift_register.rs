//! 74HC595 shift-register driver.
//!
//! The in-memory bit array is the single source of truth for station output
//! state; [`ShiftRegister::apply`] serializes it to the chain exactly once
//! per tick, after the scheduler has finalized the target set, so
//! intermediate toggles during master/station computation never reach the
//! pins.

use super::gpio::{self, Backend, Level, Mode};
use super::station::{StationIndex, MAX_NUM_BOARDS, SHIFT_REGISTER_LINES};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitChange {
    TurnedOn,
    TurnedOff,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetBit {
    Changed(BitChange),
    NoChange,
}

pub struct ShiftRegister {
    /// One byte per board; bit `id & 7` of byte `id >> 3` is station `id`.
    bits: [u8; MAX_NUM_BOARDS],
    latch_pin: u8,
    data_pin: u8,
    clock_pin: u8,
    output_enable_pin: u8,
}

impl ShiftRegister {
    pub fn new() -> Self {
        ShiftRegister {
            bits: [0u8; MAX_NUM_BOARDS],
            latch_pin: gpio::pin::SHIFT_REGISTER_LATCH,
            data_pin: gpio::pin::SHIFT_REGISTER_DATA,
            clock_pin: gpio::pin::SHIFT_REGISTER_CLOCK,
            output_enable_pin: gpio::pin::SHIFT_REGISTER_OE,
        }
    }

    /// Configure the four control pins: latch idles high, OE (active low)
    /// is driven low to enable the outputs.
    pub fn setup(&self, backend: &mut dyn Backend) -> Result<(), gpio::Error> {
        for pin in [self.latch_pin, self.data_pin, self.clock_pin, self.output_enable_pin] {
            backend.pin_mode(pin, Mode::Output)?;
        }
        backend.digital_write(self.latch_pin, Level::High)?;
        backend.digital_write(self.output_enable_pin, Level::Low)?;
        Ok(())
    }

    /// Update the in-memory bit only; the pins are untouched until
    /// [`ShiftRegister::apply`].
    pub fn set_bit(&mut self, station: StationIndex, value: bool) -> SetBit {
        let byte = self.bits[station >> 3];
        let mask = 1u8 << (station & 0x07);

        if value {
            if byte & mask != 0 {
                return SetBit::NoChange;
            }
            self.bits[station >> 3] = byte | mask;
            SetBit::Changed(BitChange::TurnedOn)
        } else {
            if byte & mask == 0 {
                return SetBit::NoChange;
            }
            self.bits[station >> 3] = byte & !mask;
            SetBit::Changed(BitChange::TurnedOff)
        }
    }

    pub fn bit(&self, station: StationIndex) -> bool {
        self.bits[station >> 3] & (1 << (station & 0x07)) != 0
    }

    pub fn clear_all(&mut self) {
        self.bits = [0u8; MAX_NUM_BOARDS];
    }

    pub fn board_bytes(&self) -> &[u8; MAX_NUM_BOARDS] {
        &self.bits
    }

    /// Station ids whose bit is currently set.
    pub fn active_stations(&self) -> impl Iterator<Item = StationIndex> + '_ {
        (0..MAX_NUM_BOARDS * SHIFT_REGISTER_LINES).filter(move |&station| self.bit(station))
    }

    /// Shift the bit array out, MSB-first from the highest board down to
    /// board zero, then pulse latch high. With `enabled == false` zeros are
    /// shifted regardless of the in-memory bits (device disabled, shutdown).
    pub fn apply(&self, backend: &mut dyn Backend, enabled: bool) -> Result<(), gpio::Error> {
        backend.digital_write(self.latch_pin, Level::Low)?;

        for board in (0..MAX_NUM_BOARDS).rev() {
            let byte = if enabled { self.bits[board] } else { 0 };

            for line in (0..SHIFT_REGISTER_LINES).rev() {
                // data must be valid before the clock's rising edge
                backend.digital_write(self.clock_pin, Level::Low)?;
                backend.digital_write(self.data_pin, Level::from_bool(byte & (1 << line) != 0))?;
                backend.digital_write(self.clock_pin, Level::High)?;
            }
        }

        backend.digital_write(self.latch_pin, Level::High)?;
        Ok(())
    }
}

impl Default for ShiftRegister {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprinkler::station::MAX_NUM_STATIONS;

    /// Captures the data level at every clock rising edge.
    struct EdgeRecorder {
        data: Level,
        clock: Level,
        latch: Level,
        stream: Vec<bool>,
    }

    impl EdgeRecorder {
        fn new() -> Self {
            EdgeRecorder {
                data: Level::Low,
                clock: Level::Low,
                latch: Level::High,
                stream: Vec::new(),
            }
        }
    }

    impl Backend for EdgeRecorder {
        fn pin_mode(&mut self, _pin: u8, _mode: Mode) -> Result<(), gpio::Error> {
            Ok(())
        }

        fn digital_read(&mut self, _pin: u8) -> Result<Level, gpio::Error> {
            Ok(Level::High)
        }

        fn digital_write(&mut self, pin: u8, level: Level) -> Result<(), gpio::Error> {
            match pin {
                gpio::pin::SHIFT_REGISTER_DATA => self.data = level,
                gpio::pin::SHIFT_REGISTER_LATCH => self.latch = level,
                gpio::pin::SHIFT_REGISTER_CLOCK => {
                    if !self.clock.is_high() && level.is_high() {
                        self.stream.push(self.data.is_high());
                    }
                    self.clock = level;
                }
                _ => {}
            }
            Ok(())
        }
    }

    #[test]
    fn set_bit_reports_transitions() {
        let mut sr = ShiftRegister::new();
        assert_eq!(sr.set_bit(9, true), SetBit::Changed(BitChange::TurnedOn));
        assert_eq!(sr.set_bit(9, true), SetBit::NoChange);
        assert_eq!(sr.set_bit(9, false), SetBit::Changed(BitChange::TurnedOff));
        assert_eq!(sr.set_bit(9, false), SetBit::NoChange);
    }

    #[test]
    fn bits_map_to_board_and_line() {
        let mut sr = ShiftRegister::new();
        sr.set_bit(11, true);
        assert!(sr.bit(11));
        assert_eq!(sr.board_bytes()[1], 1 << 3, "station 11 = board 1, line 3");
        sr.clear_all();
        assert_eq!(sr.active_stations().count(), 0);
    }

    #[test]
    fn active_stations_enumerates_set_bits() {
        let mut sr = ShiftRegister::new();
        for station in [0, 7, 8, 42, 199] {
            sr.set_bit(station, true);
        }
        let active: Vec<_> = sr.active_stations().collect();
        assert_eq!(active, vec![0, 7, 8, 42, 199]);
    }

    #[test]
    fn apply_shifts_highest_station_first() {
        let mut sr = ShiftRegister::new();
        sr.set_bit(0, true);
        sr.set_bit(199, true);

        let mut recorder = EdgeRecorder::new();
        sr.apply(&mut recorder, true).unwrap();

        assert_eq!(recorder.stream.len(), MAX_NUM_STATIONS);
        assert!(recorder.stream[0], "station 199 is the first bit out");
        assert!(recorder.stream[MAX_NUM_STATIONS - 1], "station 0 is the last bit out");
        assert_eq!(recorder.stream.iter().filter(|b| **b).count(), 2);
        assert!(recorder.latch.is_high(), "latch pulsed high after the shift");
    }

    #[test]
    fn apply_disabled_shifts_zeros() {
        let mut sr = ShiftRegister::new();
        sr.set_bit(3, true);

        let mut recorder = EdgeRecorder::new();
        sr.apply(&mut recorder, false).unwrap();

        assert!(recorder.stream.iter().all(|bit| !bit));
        assert!(sr.bit(3), "in-memory bits survive a disabled apply");
    }
}

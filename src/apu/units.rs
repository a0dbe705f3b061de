#![doc = r#"
Building blocks shared by the APU channels.

- `LengthCounter`: silences a channel after a programmed number of
  half-frame clocks. Loaded from a 5-bit index into `LENGTH_TABLE`.
- `Envelope`: the decaying 4-bit volume clocked on quarter frames, or a
  constant volume when the channel's constant flag is set.
"#]

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::save_state::check_range;

pub const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthCounter {
    counter: u8,
}

impl LengthCounter {
    pub fn load(&mut self, index: u8) {
        self.counter = LENGTH_TABLE[(index & 0x1F) as usize];
    }

    /// Half-frame clock. A disabled channel holds its counter at zero.
    pub fn clock(&mut self, enabled: bool, halted: bool) {
        if !enabled {
            self.reset();
        } else if self.counter > 0 && !halted {
            self.counter -= 1;
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.counter > 0
    }

    #[inline]
    pub fn value(&self) -> u8 {
        self.counter
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    start: bool,
    divider: u8,
    decay: u8,
}

impl Envelope {
    /// Restart on the next quarter frame (length-register write).
    pub fn restart(&mut self) {
        self.start = true;
    }

    /// Quarter-frame clock. `period` is the channel's 4-bit volume field.
    pub fn clock(&mut self, period: u8, looping: bool) {
        if self.start {
            self.start = false;
            self.decay = 15;
            self.divider = period;
            return;
        }
        if self.divider > 0 {
            self.divider -= 1;
            return;
        }
        self.divider = period;
        if self.decay > 0 {
            self.decay -= 1;
        } else if looping {
            self.decay = 15;
        }
    }

    pub fn volume(&self, constant: bool, volume: u8) -> u8 {
        if constant { volume } else { self.decay }
    }

    pub(crate) fn validate(&self) -> Result<(), StateError> {
        check_range("envelope divider", self.divider, 0..=15)?;
        check_range("envelope decay", self.decay, 0..=15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_loads_from_table_and_counts_down() {
        let mut l = LengthCounter::default();
        l.load(0b00001);
        assert_eq!(l.value(), 254);
        l.load(3);
        assert_eq!(l.value(), 2);
        l.clock(true, false);
        assert!(l.is_active());
        l.clock(true, false);
        assert!(!l.is_active());
        l.clock(true, false);
        assert_eq!(l.value(), 0);
    }

    #[test]
    fn length_halt_and_disable() {
        let mut l = LengthCounter::default();
        l.load(0);
        l.clock(true, true);
        assert_eq!(l.value(), 10);
        l.clock(false, true);
        assert_eq!(l.value(), 0);
    }

    #[test]
    fn envelope_decays_then_stops_or_loops() {
        let mut e = Envelope::default();
        e.restart();
        e.clock(0, false);
        assert_eq!(e.volume(false, 0), 15);
        for _ in 0..15 {
            e.clock(0, false);
        }
        assert_eq!(e.volume(false, 0), 0);
        e.clock(0, false);
        assert_eq!(e.volume(false, 0), 0);
        e.clock(0, true);
        assert_eq!(e.volume(false, 0), 15);
    }

    #[test]
    fn envelope_divider_slows_decay() {
        let mut e = Envelope::default();
        e.restart();
        e.clock(2, false);
        e.clock(2, false);
        e.clock(2, false);
        assert_eq!(e.volume(false, 0), 15);
        e.clock(2, false);
        assert_eq!(e.volume(false, 0), 14);
        assert_eq!(e.volume(true, 9), 9);
    }

    #[test]
    fn envelope_validate_bounds_decay() {
        let mut e = Envelope::default();
        assert!(e.validate().is_ok());
        e.decay = 16;
        assert!(e.validate().is_err());
    }
}

#![doc = r#"
Noise channel, $400C-$400F.

A 15-bit linear-feedback shift register clocked by a timer whose period
comes from `PERIOD_TABLE` (CPU cycles). Feedback is bit 0 XOR bit 1, or
bit 0 XOR bit 6 in short mode ($400E bit 7). The channel is silent
whenever bit 0 of the shift register is set.
"#]

use serde::{Deserialize, Serialize};

use super::pulse::{CONSTANT_VOLUME, HALT, LENGTH_INDEX, VOLUME};
use super::units::{Envelope, LengthCounter};
use crate::bits;
use crate::error::StateError;
use crate::register::{BitField, Reg8, Register};
use crate::save_state::check_range;

const PERIOD_INDEX: BitField = BitField::new(0, 4);
const SHORT_MODE: BitField = BitField::bit(7);

const PERIOD_TABLE: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Noise {
    control: Reg8,
    mode_period: Reg8,
    length_load: Reg8,
    enabled: bool,
    length: LengthCounter,
    envelope: Envelope,
    shift: u16,
    timer: u16,
}

impl Default for Noise {
    fn default() -> Self {
        Self {
            control: Reg8::default(),
            mode_period: Reg8::default(),
            length_load: Reg8::default(),
            enabled: false,
            length: LengthCounter::default(),
            envelope: Envelope::default(),
            shift: 1,
            timer: 0,
        }
    }
}

impl Noise {
    pub fn write_reg(&mut self, index: u16, value: u8) {
        match index & 3 {
            0 => self.control.write(value),
            1 => {}
            2 => self.mode_period.write(value),
            _ => {
                self.length_load.write(value);
                if self.enabled {
                    self.length.load(self.length_load.field(LENGTH_INDEX));
                }
                self.envelope.restart();
            }
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length.reset();
        }
    }

    pub fn is_active(&self) -> bool {
        self.length.is_active()
    }

    pub fn shift_register(&self) -> u16 {
        self.shift
    }

    fn clock_shift(&mut self) {
        let tap = if self.mode_period.flag(SHORT_MODE) { 6 } else { 1 };
        let feedback = (self.shift ^ (self.shift >> tap)) & 1;
        self.shift = (self.shift >> 1) | (feedback << 14);
    }

    pub fn step_timer(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = PERIOD_TABLE[self.mode_period.field(PERIOD_INDEX) as usize] - 1;
        self.clock_shift();
    }

    pub fn clock_quarter(&mut self) {
        self.envelope.clock(self.control.field(VOLUME), self.control.flag(HALT));
    }

    pub fn clock_half(&mut self) {
        self.length.clock(self.enabled, self.control.flag(HALT));
    }

    pub fn output(&self) -> u8 {
        if !self.length.is_active() || bits::get_bit(bits::low_byte(self.shift), 0) != 0 {
            return 0;
        }
        self.envelope
            .volume(self.control.flag(CONSTANT_VOLUME), self.control.field(VOLUME))
    }

    /// A zero shift register would never produce feedback again.
    pub(crate) fn validate(&self) -> Result<(), StateError> {
        check_range("noise shift", self.shift, 1..=0x7FFF)?;
        self.envelope.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_mode_feedback_from_bit_one() {
        let mut n = Noise::default();
        n.clock_shift();
        // 1 ^ 0 = 1 shifted into bit 14
        assert_eq!(n.shift_register(), 0x4000);
        n.clock_shift();
        assert_eq!(n.shift_register(), 0x2000);
    }

    #[test]
    fn short_mode_feedback_from_bit_six() {
        let mut n = Noise::default();
        n.write_reg(2, 0x80);
        n.shift = 0b100_0001;
        n.clock_shift();
        // bit0 ^ bit6 = 0
        assert_eq!(n.shift_register(), 0b10_0000);
    }

    #[test]
    fn timer_uses_period_table() {
        let mut n = Noise::default();
        n.write_reg(2, 0);
        n.step_timer();
        assert_eq!(n.shift_register(), 0x4000);
        for _ in 0..3 {
            n.step_timer();
        }
        assert_eq!(n.shift_register(), 0x4000);
        n.step_timer();
        assert_eq!(n.shift_register(), 0x2000);
    }

    #[test]
    fn output_follows_bit_zero_and_length() {
        let mut n = Noise::default();
        n.set_enabled(true);
        n.write_reg(0, 0b0001_0111);
        n.write_reg(3, 0b0000_1000);
        assert_eq!(n.output(), 0, "bit 0 set at power on");
        n.clock_shift();
        assert_eq!(n.output(), 7);
    }

    #[test]
    fn validate_rejects_empty_shift_register() {
        let mut n = Noise::default();
        assert!(n.validate().is_ok());
        n.shift = 0;
        assert!(n.validate().is_err());
        n.shift = 0x8000;
        assert!(n.validate().is_err());
    }
}

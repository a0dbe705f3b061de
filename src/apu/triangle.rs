#![doc = r#"
Triangle channel, $4008-$400B.

$4008 holds the linear counter reload value (bits 0-6) and the control
flag (bit 7), which both halts the length counter and keeps the linear
counter reload flag set. Writing $400B loads the length counter and sets
the reload flag.

The timer runs at the CPU rate and steps a 32-entry sequence only while
both the length counter and the linear counter are non-zero.
"#]

use serde::{Deserialize, Serialize};

use super::pulse::{LENGTH_INDEX, TIMER_HIGH};
use super::units::LengthCounter;
use crate::error::StateError;
use crate::register::{BitField, Reg8, Register};
use crate::save_state::check_range;

const LINEAR_RELOAD: BitField = BitField::new(0, 7);
const CONTROL: BitField = BitField::bit(7);

const SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    13, 14, 15,
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    linear: Reg8,
    timer_low: Reg8,
    timer_high: Reg8,
    enabled: bool,
    length: LengthCounter,
    linear_counter: u8,
    linear_reload: bool,
    timer: u16,
    step: u8,
}

impl Triangle {
    pub fn write_reg(&mut self, index: u16, value: u8) {
        match index & 3 {
            0 => self.linear.write(value),
            1 => {}
            2 => self.timer_low.write(value),
            _ => {
                self.timer_high.write(value);
                if self.enabled {
                    self.length.load(self.timer_high.field(LENGTH_INDEX));
                }
                self.linear_reload = true;
            }
        }
    }

    /// Disabling clears both counters.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length.reset();
            self.linear_counter = 0;
            self.linear_reload = false;
        }
    }

    pub fn is_active(&self) -> bool {
        self.length.is_active()
    }

    pub fn period(&self) -> u16 {
        ((self.timer_high.field(TIMER_HIGH) as u16) << 8) | self.timer_low.read() as u16
    }

    pub fn linear_counter(&self) -> u8 {
        self.linear_counter
    }

    pub fn step_timer(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.period();
        if self.length.is_active() && self.linear_counter > 0 {
            self.step = (self.step + 1) % 32;
        }
    }

    pub fn clock_quarter(&mut self) {
        if self.linear_reload {
            self.linear_counter = self.linear.field(LINEAR_RELOAD);
        } else if self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
        if !self.linear.flag(CONTROL) {
            self.linear_reload = false;
        }
    }

    pub fn clock_half(&mut self) {
        self.length.clock(self.enabled, self.linear.flag(CONTROL));
    }

    /// Ultrasonic periods (below 2) output silence instead of aliasing.
    pub fn output(&self) -> u8 {
        if self.period() < 2 {
            return 0;
        }
        SEQUENCE[self.step as usize]
    }

    pub(crate) fn validate(&self) -> Result<(), StateError> {
        check_range("triangle step", self.step, 0..=31)?;
        check_range("triangle linear counter", self.linear_counter, 0..=0x7F)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(linear: u8) -> Triangle {
        let mut t = Triangle::default();
        t.set_enabled(true);
        t.write_reg(0, linear);
        t.write_reg(2, 4);
        t.write_reg(3, 0b0000_1000);
        t
    }

    #[test]
    fn linear_counter_reloads_then_counts_down() {
        let mut t = playing(3);
        t.clock_quarter();
        assert_eq!(t.linear_counter(), 3);
        t.clock_quarter();
        t.clock_quarter();
        assert_eq!(t.linear_counter(), 1);
    }

    #[test]
    fn control_flag_keeps_reloading() {
        let mut t = playing(0x80 | 5);
        t.clock_quarter();
        t.clock_quarter();
        assert_eq!(t.linear_counter(), 5);
    }

    #[test]
    fn sequencer_only_moves_with_both_counters() {
        let mut t = playing(10);
        for _ in 0..20 {
            t.step_timer();
        }
        assert_eq!(t.output(), 15, "linear counter still zero");

        t.clock_quarter();
        for _ in 0..5 {
            t.step_timer();
        }
        assert_eq!(t.output(), 14);
    }

    #[test]
    fn disable_resets_both_counters() {
        let mut t = playing(10);
        t.clock_quarter();
        t.set_enabled(false);
        assert!(!t.is_active());
        assert_eq!(t.linear_counter(), 0);
    }

    #[test]
    fn validate_rejects_step_past_sequence() {
        let mut t = playing(3);
        assert!(t.validate().is_ok());
        t.step = 32;
        assert!(t.validate().is_err());
    }
}

#![doc = r#"
Pulse (square wave) channel, $4000-$4003 and $4004-$4007.

Registers
- control: volume/envelope period (0-3), constant volume (4),
  length halt / envelope loop (5), duty (6-7)
- sweep: shift (0-2), negate (3), divider period (4-6), enable (7)
- timer low byte, then timer high bits (0-2) with the length index (3-7)

The timer is clocked every other CPU cycle and walks an 8-step duty
sequence. The sweep unit runs on half frames; the channel is muted while
the period is below 8 or the sweep target leaves the 11-bit timer range.
Pulse 1 negates with one's complement, pulse 2 with two's complement.
"#]

use serde::{Deserialize, Serialize};

use super::units::{Envelope, LengthCounter};
use crate::error::StateError;
use crate::register::{BitField, Reg8, Register};
use crate::save_state::check_range;

pub const VOLUME: BitField = BitField::new(0, 4);
pub const CONSTANT_VOLUME: BitField = BitField::bit(4);
pub const HALT: BitField = BitField::bit(5);
const DUTY: BitField = BitField::new(6, 2);

const SWEEP_SHIFT: BitField = BitField::new(0, 3);
const SWEEP_NEGATE: BitField = BitField::bit(3);
const SWEEP_PERIOD: BitField = BitField::new(4, 3);
const SWEEP_ENABLED: BitField = BitField::bit(7);

pub const TIMER_HIGH: BitField = BitField::new(0, 3);
pub const LENGTH_INDEX: BitField = BitField::new(3, 5);

const MAX_PERIOD: u16 = 0x7FF;

const DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pulse {
    ones_complement: bool,
    control: Reg8,
    sweep: Reg8,
    timer_low: Reg8,
    timer_high: Reg8,
    enabled: bool,
    length: LengthCounter,
    envelope: Envelope,
    timer: u16,
    step: u8,
    sweep_divider: u8,
    sweep_reload: bool,
}

impl Pulse {
    /// `ones_complement` selects the pulse 1 sweep negate behavior.
    pub fn new(ones_complement: bool) -> Self {
        Self {
            ones_complement,
            control: Reg8::default(),
            sweep: Reg8::default(),
            timer_low: Reg8::default(),
            timer_high: Reg8::default(),
            enabled: false,
            length: LengthCounter::default(),
            envelope: Envelope::default(),
            timer: 0,
            step: 0,
            sweep_divider: 0,
            sweep_reload: false,
        }
    }

    /// Write register `index` (0..4) of this channel.
    pub fn write_reg(&mut self, index: u16, value: u8) {
        match index & 3 {
            0 => self.control.write(value),
            1 => {
                self.sweep.write(value);
                self.sweep_reload = true;
            }
            2 => self.timer_low.write(value),
            _ => {
                self.timer_high.write(value);
                if self.enabled {
                    self.length.load(self.timer_high.field(LENGTH_INDEX));
                }
                self.envelope.restart();
                self.step = 0;
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

    pub fn period(&self) -> u16 {
        ((self.timer_high.field(TIMER_HIGH) as u16) << 8) | self.timer_low.read() as u16
    }

    fn set_period(&mut self, period: u16) {
        self.timer_low.write(period as u8);
        self.timer_high.set_field(TIMER_HIGH, (period >> 8) as u8);
    }

    /// Period the sweep unit would move to next.
    pub fn sweep_target(&self) -> u16 {
        let period = self.period();
        let delta = period >> self.sweep.field(SWEEP_SHIFT);
        if self.sweep.flag(SWEEP_NEGATE) {
            let extra = u16::from(self.ones_complement);
            period.saturating_sub(delta + extra)
        } else {
            period + delta
        }
    }

    pub fn is_muted(&self) -> bool {
        self.period() < 8 || self.sweep_target() > MAX_PERIOD
    }

    /// APU cycle (every second CPU cycle).
    pub fn step_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.period();
            self.step = (self.step + 1) % 8;
        } else {
            self.timer -= 1;
        }
    }

    pub fn clock_quarter(&mut self) {
        self.envelope.clock(self.control.field(VOLUME), self.control.flag(HALT));
    }

    pub fn clock_half(&mut self) {
        self.length.clock(self.enabled, self.control.flag(HALT));

        let shift = self.sweep.field(SWEEP_SHIFT);
        if self.sweep_divider == 0
            && self.sweep.flag(SWEEP_ENABLED)
            && shift > 0
            && !self.is_muted()
        {
            let target = self.sweep_target();
            self.set_period(target);
        }
        if self.sweep_divider == 0 || self.sweep_reload {
            self.sweep_divider = self.sweep.field(SWEEP_PERIOD);
            self.sweep_reload = false;
        } else {
            self.sweep_divider -= 1;
        }
    }

    pub fn output(&self) -> u8 {
        if !self.length.is_active() || self.is_muted() {
            return 0;
        }
        let duty = self.control.field(DUTY) as usize;
        if DUTY_TABLE[duty][self.step as usize] == 0 {
            return 0;
        }
        self.envelope
            .volume(self.control.flag(CONSTANT_VOLUME), self.control.field(VOLUME))
    }

    pub(crate) fn validate(&self) -> Result<(), StateError> {
        check_range("pulse step", self.step, 0..=7)?;
        check_range("pulse sweep divider", self.sweep_divider, 0..=7)?;
        self.envelope.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(ones_complement: bool, period: u16) -> Pulse {
        let mut p = Pulse::new(ones_complement);
        p.set_enabled(true);
        // 50% duty, constant volume 12
        p.write_reg(0, 0b1011_1100);
        p.write_reg(2, period as u8);
        p.write_reg(3, (period >> 8) as u8 | 0b0000_1000);
        p
    }

    #[test]
    fn length_load_only_while_enabled() {
        let mut p = Pulse::new(false);
        p.write_reg(3, 0b0000_1000);
        assert!(!p.is_active());
        p.set_enabled(true);
        p.write_reg(3, 0b0000_1000);
        assert!(p.is_active());
        p.set_enabled(false);
        assert!(!p.is_active());
    }

    #[test]
    fn period_below_eight_is_muted() {
        let p = playing(false, 7);
        assert!(p.is_muted());
        assert_eq!(p.output(), 0);
        assert!(!playing(false, 8).is_muted());
    }

    #[test]
    fn sweep_target_overflow_mutes() {
        let mut p = playing(false, 0x700);
        // enabled, shift 1, no negate: target 0x700 + 0x380
        p.write_reg(1, 0b1000_0001);
        assert!(p.is_muted());
    }

    #[test]
    fn negate_differs_between_channels() {
        let mut one = playing(true, 0x100);
        let mut two = playing(false, 0x100);
        one.write_reg(1, 0b1000_1001);
        two.write_reg(1, 0b1000_1001);
        assert_eq!(one.sweep_target(), 0x100 - 0x80 - 1);
        assert_eq!(two.sweep_target(), 0x100 - 0x80);
    }

    #[test]
    fn sweep_adjusts_period_on_half_frames() {
        let mut p = playing(false, 0x100);
        // enabled, divider period 0, shift 2
        p.write_reg(1, 0b1000_0010);
        p.clock_half();
        assert_eq!(p.period(), 0x140);
        p.clock_half();
        assert_eq!(p.period(), 0x190);
    }

    #[test]
    fn duty_sequence_emits_constant_volume() {
        let mut p = playing(false, 8);
        let mut seen = Vec::new();
        for _ in 0..8 {
            for _ in 0..=8 {
                p.step_timer();
            }
            seen.push(p.output());
        }
        assert_eq!(seen.iter().filter(|&&v| v == 12).count(), 4);
        assert_eq!(seen.iter().filter(|&&v| v == 0).count(), 4);
    }

    #[test]
    fn validate_rejects_step_past_duty_table() {
        let mut p = playing(false, 0x100);
        for _ in 0..50 {
            p.step_timer();
        }
        assert!(p.validate().is_ok());
        p.step = 8;
        assert!(p.validate().is_err());
    }
}

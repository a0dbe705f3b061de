#![doc = r#"
APU frame sequencer ($4017).

Counts CPU cycles and emits quarter-frame clocks (envelopes, triangle
linear counter) and half-frame clocks (length counters, sweeps).

| mode   | quarter                        | half          | end   |
|--------|--------------------------------|---------------|-------|
| 4-step | 3729, 7457, 11186, 14916       | 7457, 14916   | 14916 |
| 5-step | 3729, 7457, 11186, 18641       | 7457, 18641   | 18641 |

The 4-step sequence raises the frame IRQ at its end unless bit 6 of $4017
inhibits it. Writing $4017 restarts the count and clocks both units at
once.
"#]

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::register::{BitField, Reg8, Register};
use crate::save_state::check_range;

const IRQ_INHIBIT: BitField = BitField::bit(6);
const FIVE_STEP: BitField = BitField::bit(7);

const STEP_1: u32 = 3729;
const STEP_2: u32 = 7457;
const STEP_3: u32 = 11186;
const FOUR_STEP_END: u32 = 14916;
const FIVE_STEP_END: u32 = 18641;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct FrameClock: u8 {
        const QUARTER = 1 << 0;
        const HALF    = 1 << 1;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSequencer {
    control: Reg8,
    counter: u32,
    irq: bool,
}

impl FrameSequencer {
    pub fn five_step(&self) -> bool {
        self.control.flag(FIVE_STEP)
    }

    pub fn irq(&self) -> bool {
        self.irq
    }

    pub fn clear_irq(&mut self) {
        self.irq = false;
    }

    /// The counter must sit before the end of the selected sequence.
    pub(crate) fn validate(&self) -> Result<(), StateError> {
        let end = if self.five_step() { FIVE_STEP_END } else { FOUR_STEP_END };
        check_range("frame counter", self.counter, 0..=end - 1)
    }

    pub fn write_control(&mut self, value: u8) -> FrameClock {
        self.control.write(value);
        if self.control.flag(IRQ_INHIBIT) {
            self.irq = false;
        }
        self.counter = 0;
        FrameClock::QUARTER | FrameClock::HALF
    }

    pub fn step(&mut self) -> FrameClock {
        self.counter += 1;
        let end = if self.five_step() { FIVE_STEP_END } else { FOUR_STEP_END };

        let clock = match self.counter {
            STEP_1 | STEP_3 => FrameClock::QUARTER,
            STEP_2 => FrameClock::QUARTER | FrameClock::HALF,
            c if c == end => FrameClock::QUARTER | FrameClock::HALF,
            _ => FrameClock::empty(),
        };

        if self.counter == end {
            if !self.five_step() && !self.control.flag(IRQ_INHIBIT) {
                self.irq = true;
            }
            self.counter = 0;
        }
        clock
    }
}

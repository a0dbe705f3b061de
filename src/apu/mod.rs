#![doc = r#"
Audio processing unit.

Register map (CPU side)
- $4000-$4003 pulse 1, $4004-$4007 pulse 2
- $4008-$400B triangle, $400C-$400F noise, $4010-$4013 DMC
- $4015 write: channel enables (bits 0-4), also acknowledges the DMC IRQ
- $4015 read: length counters active (0-3), DMC bytes remaining (4),
  frame IRQ (6, cleared by the read), DMC IRQ (7)
- $4017 write: frame sequencer control
- $4014 (OAM DMA) and the $4016/$4017 controller reads belong to the bus.

Timing
- `step` runs one CPU cycle: pulse timers every other cycle; triangle,
  noise and DMC timers every cycle; then the sample divider and the
  frame sequencer.
- Every `SAMPLE_PERIOD` CPU cycles the channels are mixed with fixed
  linear weights and handed to the sample callback.
"#]

mod dmc;
mod frame;
mod noise;
mod pulse;
mod triangle;
mod units;

pub use dmc::Dmc;
pub use frame::{FrameClock, FrameSequencer};
pub use noise::Noise;
pub use pulse::Pulse;
pub use triangle::Triangle;
pub use units::{Envelope, LENGTH_TABLE, LengthCounter};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::mapper::Mapper;
use crate::save_state::check_range;

/// CPU cycles between two mixed samples.
pub const SAMPLE_PERIOD: u32 = 20;

const PULSE_WEIGHT: f32 = 0.00752;
const TRIANGLE_WEIGHT: f32 = 0.00851;
const NOISE_WEIGHT: f32 = 0.00494;
const DMC_WEIGHT: f32 = 0.00335;

const STATUS_FRAME_IRQ: u8 = 0x40;
const STATUS_DMC_IRQ: u8 = 0x80;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Apu {
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    frame: FrameSequencer,
    cycle: u64,
    sample_counter: u32,
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl Apu {
    pub fn new() -> Self {
        Self {
            pulse1: Pulse::new(true),
            pulse2: Pulse::new(false),
            triangle: Triangle::default(),
            noise: Noise::default(),
            dmc: Dmc::default(),
            frame: FrameSequencer::default(),
            cycle: 0,
            sample_counter: 0,
        }
    }

    /// Write an APU register. Addresses outside the APU map are ignored.
    pub fn write_reg(&mut self, addr: u16, value: u8) {
        match addr {
            0x4000..=0x4003 => self.pulse1.write_reg(addr - 0x4000, value),
            0x4004..=0x4007 => self.pulse2.write_reg(addr - 0x4004, value),
            0x4008..=0x400B => self.triangle.write_reg(addr - 0x4008, value),
            0x400C..=0x400F => self.noise.write_reg(addr - 0x400C, value),
            0x4010..=0x4013 => self.dmc.write_reg(addr - 0x4010, value),
            0x4015 => self.write_status(value),
            0x4017 => {
                let clock = self.frame.write_control(value);
                self.apply_frame_clock(clock);
            }
            _ => trace!("ignored APU write {:#06X} = {:#04X}", addr, value),
        }
    }

    /// Read an APU register. Only $4015 is readable.
    pub fn read_reg(&mut self, addr: u16) -> u8 {
        if addr == 0x4015 {
            self.read_status()
        } else {
            0
        }
    }

    fn write_status(&mut self, value: u8) {
        self.pulse1.set_enabled(value & 0x01 != 0);
        self.pulse2.set_enabled(value & 0x02 != 0);
        self.triangle.set_enabled(value & 0x04 != 0);
        self.noise.set_enabled(value & 0x08 != 0);
        self.dmc.set_enabled(value & 0x10 != 0);
        self.dmc.clear_irq();
    }

    fn read_status(&mut self) -> u8 {
        let mut status = 0;
        status |= u8::from(self.pulse1.is_active());
        status |= u8::from(self.pulse2.is_active()) << 1;
        status |= u8::from(self.triangle.is_active()) << 2;
        status |= u8::from(self.noise.is_active()) << 3;
        status |= u8::from(self.dmc.bytes_remaining() > 0) << 4;
        if self.frame.irq() {
            status |= STATUS_FRAME_IRQ;
        }
        if self.dmc.irq() {
            status |= STATUS_DMC_IRQ;
        }
        self.frame.clear_irq();
        status
    }

    /// Level of the APU IRQ line (frame sequencer or DMC).
    pub fn irq_pending(&self) -> bool {
        self.frame.irq() || self.dmc.irq()
    }

    /// Advance one CPU cycle. DMC sample bytes are read through `mapper`.
    pub fn step(&mut self, mapper: &mut dyn Mapper, on_sample: &mut dyn FnMut(f32)) {
        if self.cycle % 2 == 1 {
            self.pulse1.step_timer();
            self.pulse2.step_timer();
        }
        self.triangle.step_timer();
        self.noise.step_timer();
        self.dmc.step(mapper);
        self.cycle += 1;

        self.sample_counter += 1;
        let clock = self.frame.step();
        self.apply_frame_clock(clock);

        if self.sample_counter == SAMPLE_PERIOD {
            self.sample_counter = 0;
            on_sample(self.mix());
        }
    }

    fn apply_frame_clock(&mut self, clock: FrameClock) {
        if clock.contains(FrameClock::QUARTER) {
            self.pulse1.clock_quarter();
            self.pulse2.clock_quarter();
            self.triangle.clock_quarter();
            self.noise.clock_quarter();
        }
        if clock.contains(FrameClock::HALF) {
            self.pulse1.clock_half();
            self.pulse2.clock_half();
            self.triangle.clock_half();
            self.noise.clock_half();
        }
    }

    /// Linear mix of the five channel levels.
    pub fn mix(&self) -> f32 {
        let pulses = (self.pulse1.output() + self.pulse2.output()) as f32;
        PULSE_WEIGHT * pulses
            + TRIANGLE_WEIGHT * self.triangle.output() as f32
            + NOISE_WEIGHT * self.noise.output() as f32
            + DMC_WEIGHT * self.dmc.output() as f32
    }

    pub fn pulse1(&self) -> &Pulse {
        &self.pulse1
    }

    pub fn pulse2(&self) -> &Pulse {
        &self.pulse2
    }

    pub fn triangle(&self) -> &Triangle {
        &self.triangle
    }

    pub fn noise(&self) -> &Noise {
        &self.noise
    }

    pub fn dmc(&self) -> &Dmc {
        &self.dmc
    }

    pub fn frame_sequencer(&self) -> &FrameSequencer {
        &self.frame
    }

    /// Reject a deserialized APU whose counters would index past a table
    /// or never reach their reload value.
    pub fn validate(&self) -> Result<(), StateError> {
        self.pulse1.validate()?;
        self.pulse2.validate()?;
        self.triangle.validate()?;
        self.noise.validate()?;
        self.dmc.validate()?;
        self.frame.validate()?;
        check_range("sample counter", self.sample_counter, 0..=SAMPLE_PERIOD - 1)
    }
}

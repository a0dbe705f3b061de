#![doc = r#"
Delta modulation channel, $4010-$4013.

Plays 1-bit delta samples fetched from cartridge space. Each output bit
moves a 7-bit counter up or down by 2 (clamped to 0..=127); $4011 loads
the counter directly.

- $4010: IRQ enable (7), loop (6), rate index (0-3)
- $4012: sample address = $C000 + A * 64
- $4013: sample length = L * 16 + 1 bytes

Sample bytes are read through the mapper as they are needed. The reader
wraps from $FFFF to $8000. When the last byte is fetched the sample
restarts (loop) or raises the DMC IRQ (when enabled).
"#]

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::mapper::Mapper;
use crate::register::{BitField, Reg8, Register};
use crate::save_state::check_range;

const RATE_INDEX: BitField = BitField::new(0, 4);
const LOOP: BitField = BitField::bit(6);
const IRQ_ENABLED: BitField = BitField::bit(7);
const DIRECT_LOAD: BitField = BitField::new(0, 7);

/// NTSC output rates in CPU cycles per bit.
const RATE_TABLE: [u16; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dmc {
    control: Reg8,
    address: Reg8,
    length: Reg8,
    irq: bool,
    current_address: u16,
    bytes_remaining: u16,
    sample_buffer: Option<u8>,
    shift: u8,
    bits_remaining: u8,
    silence: bool,
    level: u8,
    timer: u16,
}

impl Default for Dmc {
    fn default() -> Self {
        Self {
            control: Reg8::default(),
            address: Reg8::default(),
            length: Reg8::default(),
            irq: false,
            current_address: 0xC000,
            bytes_remaining: 0,
            sample_buffer: None,
            shift: 0,
            bits_remaining: 8,
            silence: true,
            level: 0,
            timer: 0,
        }
    }
}

impl Dmc {
    pub fn write_reg(&mut self, index: u16, value: u8) {
        match index & 3 {
            0 => {
                self.control.write(value);
                if !self.control.flag(IRQ_ENABLED) {
                    self.irq = false;
                }
            }
            1 => self.level = Reg8::new(value).field(DIRECT_LOAD),
            2 => self.address.write(value),
            _ => self.length.write(value),
        }
    }

    pub fn sample_address(&self) -> u16 {
        0xC000 + self.address.read() as u16 * 64
    }

    pub fn sample_length(&self) -> u16 {
        self.length.read() as u16 * 16 + 1
    }

    fn restart(&mut self) {
        self.current_address = self.sample_address();
        self.bytes_remaining = self.sample_length();
    }

    /// $4015 bit 4.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.bytes_remaining = 0;
        } else if self.bytes_remaining == 0 {
            self.restart();
        }
    }

    pub fn bytes_remaining(&self) -> u16 {
        self.bytes_remaining
    }

    pub fn irq(&self) -> bool {
        self.irq
    }

    pub fn clear_irq(&mut self) {
        self.irq = false;
    }

    pub fn output(&self) -> u8 {
        self.level
    }

    pub(crate) fn validate(&self) -> Result<(), StateError> {
        check_range("dmc bits_remaining", self.bits_remaining, 1..=8)?;
        check_range("dmc level", self.level, 0..=0x7F)?;
        check_range("dmc address", self.current_address, 0x8000..=0xFFFF)
    }

    /// One CPU cycle.
    pub fn step(&mut self, mapper: &mut dyn Mapper) {
        self.fill_buffer(mapper);

        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = RATE_TABLE[self.control.field(RATE_INDEX) as usize] - 1;
        self.clock_output();
    }

    fn fill_buffer(&mut self, mapper: &mut dyn Mapper) {
        if self.sample_buffer.is_some() || self.bytes_remaining == 0 {
            return;
        }
        self.sample_buffer = Some(mapper.cpu_read(self.current_address));
        self.current_address = if self.current_address == 0xFFFF {
            0x8000
        } else {
            self.current_address + 1
        };
        self.bytes_remaining -= 1;

        if self.bytes_remaining == 0 {
            if self.control.flag(LOOP) {
                self.restart();
            } else if self.control.flag(IRQ_ENABLED) {
                trace!("DMC sample finished, raising IRQ");
                self.irq = true;
            }
        }
    }

    fn clock_output(&mut self) {
        if !self.silence {
            if self.shift & 1 != 0 {
                if self.level <= 125 {
                    self.level += 2;
                }
            } else if self.level >= 2 {
                self.level -= 2;
            }
        }
        self.shift >>= 1;
        self.bits_remaining -= 1;

        if self.bits_remaining == 0 {
            self.bits_remaining = 8;
            match self.sample_buffer.take() {
                Some(byte) => {
                    self.silence = false;
                    self.shift = byte;
                }
                None => self.silence = true,
            }
        }
    }
}

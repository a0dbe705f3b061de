//! MMC1 (Mapper 1) implementation.
//!
//! Implements:
//! - Serial shift register: five one-bit writes to $8000..=$FFFF assemble a
//!   5-bit value committed to control / CHR0 / PRG / CHR1 by address range
//! - PRG banking modes (32K switch, or 16K with fixed first or last bank)
//! - CHR banking (8K or 4K+4K), CHR RAM writes when the cart has no CHR ROM
//! - Mirroring control (single-screen lower/upper, vertical, horizontal)
//! - PRG RAM at $6000..=$7FFF (the RAM-disable bit is not enforced)
use serde::{Deserialize, Serialize};

use log::trace;

use crate::cartridge::Mirroring;
use crate::error::StateError;
use crate::mapper::{Mapper, MapperState};
use crate::save_state::{check_chr_ram, check_len, check_range};

/// Shift register value after a reset; the set bit falls out after five writes.
const SHIFT_RESET: u8 = 0x10;
/// Control register at power-on: PRG mode 3 (fix last bank at $C000).
const CONTROL_POWER_ON: u8 = 0x0C;

/// Snapshot of every MMC1 register plus its RAM.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mmc1State {
    pub shift_register: u8,
    pub write_count: u8,
    pub control: u8,
    pub chr_bank0: u8,
    pub chr_bank1: u8,
    pub prg_bank: u8,
    pub prg_ram: Vec<u8>,
    pub chr_ram: Option<Vec<u8>>,
}

/// MMC1 mapper core state.
#[derive(Debug, Clone)]
pub struct Mmc1 {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,

    // 5-bit registers
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,

    // Serial latch
    shift_register: u8,
    write_count: u8,

    // Bank counts
    prg_16k_bank_count: usize,
    chr_4k_bank_count: usize,

    // Derived from control + prg_bank; refreshed on every commit and restore
    prg_bank_lo_index: usize,
    prg_bank_hi_index: usize,
}

impl Mmc1 {
    pub fn new(prg_rom: Vec<u8>, prg_ram: Vec<u8>, chr: Vec<u8>, chr_is_ram: bool) -> Self {
        let prg_16k_bank_count = (prg_rom.len() / 0x4000).max(1);
        let chr = if chr.is_empty() { vec![0; 8 * 1024] } else { chr };
        let chr_4k_bank_count = (chr.len() / 0x1000).max(1);

        let mut s = Self {
            prg_rom,
            prg_ram,
            chr,
            chr_is_ram,
            control: CONTROL_POWER_ON,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
            shift_register: SHIFT_RESET,
            write_count: 0,
            prg_16k_bank_count,
            chr_4k_bank_count,
            prg_bank_lo_index: 0,
            prg_bank_hi_index: 0,
        };
        s.recompute_prg_banks();
        s
    }

    #[inline]
    fn prg_mode(&self) -> u8 {
        (self.control >> 2) & 0x03
    }

    #[inline]
    fn chr_mode(&self) -> u8 {
        (self.control >> 4) & 0x01
    }

    fn reset_shift(&mut self) {
        self.shift_register = SHIFT_RESET;
        self.write_count = 0;
    }

    fn recompute_prg_banks(&mut self) {
        let count = self.prg_16k_bank_count;
        let bank = self.prg_bank as usize & 0x0F;
        match self.prg_mode() {
            0 | 1 => {
                let base = (bank & !1) % count;
                self.prg_bank_lo_index = base;
                self.prg_bank_hi_index = (base + 1) % count;
            }
            2 => {
                self.prg_bank_lo_index = 0;
                self.prg_bank_hi_index = bank % count;
            }
            _ => {
                self.prg_bank_lo_index = bank % count;
                self.prg_bank_hi_index = count - 1;
            }
        }
    }

    fn commit_register(&mut self, addr: u16, value5: u8) {
        match addr {
            0x8000..=0x9FFF => self.control = value5,
            0xA000..=0xBFFF => self.chr_bank0 = value5,
            0xC000..=0xDFFF => self.prg_bank = value5,
            _ => self.chr_bank1 = value5,
        }
        trace!("mmc1: commit {value5:#04X} via {addr:#06X}");
        self.recompute_prg_banks();
    }

    fn serial_write(&mut self, addr: u16, data: u8) {
        if data & 0x80 != 0 {
            self.reset_shift();
            self.control = CONTROL_POWER_ON;
            self.recompute_prg_banks();
            return;
        }
        self.shift_register = (self.shift_register >> 1) | ((data & 1) << 4);
        self.write_count += 1;
        if self.write_count == 5 {
            let value5 = self.shift_register & 0x1F;
            self.commit_register(addr, value5);
            self.reset_shift();
        }
    }

    fn prg_rom_read(&self, addr: u16) -> u8 {
        let bank = if addr < 0xC000 {
            self.prg_bank_lo_index
        } else {
            self.prg_bank_hi_index
        };
        let idx = bank * 0x4000 + (addr as usize & 0x3FFF);
        self.prg_rom.get(idx).copied().unwrap_or(0)
    }

    fn chr_index(&self, addr: u16) -> usize {
        let a = addr as usize & 0x1FFF;
        let bank = if self.chr_mode() == 0 {
            // 8K mode ignores the low bit of CHR0
            (self.chr_bank0 as usize & !1) + (a >> 12)
        } else if a < 0x1000 {
            self.chr_bank0 as usize
        } else {
            self.chr_bank1 as usize
        };
        (bank % self.chr_4k_bank_count) * 0x1000 + (a & 0x0FFF)
    }

    fn prg_ram_index(&self, addr: u16) -> Option<usize> {
        if self.prg_ram.is_empty() {
            None
        } else {
            Some((addr as usize - 0x6000) % self.prg_ram.len())
        }
    }

    /// Derived PRG bank indices for $8000 and $C000.
    pub fn prg_banks(&self) -> (usize, usize) {
        (self.prg_bank_lo_index, self.prg_bank_hi_index)
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    /// Shift register contents and the number of bits written so far.
    pub fn shift_state(&self) -> (u8, u8) {
        (self.shift_register, self.write_count)
    }
}

impl Mapper for Mmc1 {
    fn mapper_id(&self) -> u16 {
        1
    }

    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.prg_ram_index(addr).map_or(0, |i| self.prg_ram[i]),
            0x8000..=0xFFFF => self.prg_rom_read(addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if let Some(i) = self.prg_ram_index(addr) {
                    self.prg_ram[i] = value;
                }
            }
            0x8000..=0xFFFF => self.serial_write(addr, value),
            _ => {}
        }
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        self.chr[self.chr_index(addr)]
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            let idx = self.chr_index(addr);
            self.chr[idx] = value;
        }
    }

    fn save_state(&self) -> MapperState {
        MapperState::Mmc1(Mmc1State {
            shift_register: self.shift_register,
            write_count: self.write_count,
            control: self.control,
            chr_bank0: self.chr_bank0,
            chr_bank1: self.chr_bank1,
            prg_bank: self.prg_bank,
            prg_ram: self.prg_ram.clone(),
            chr_ram: self.chr_is_ram.then(|| self.chr.clone()),
        })
    }

    fn load_state(&mut self, state: &MapperState) -> Result<(), StateError> {
        let MapperState::Mmc1(s) = state else {
            return Err(StateError::MapperMismatch {
                expected: self.mapper_id(),
                found: state.mapper_id(),
            });
        };
        check_len("prg_ram", &self.prg_ram, &s.prg_ram)?;
        check_chr_ram(self.chr_is_ram, &self.chr, &s.chr_ram)?;
        check_range("mmc1 write_count", s.write_count, 0..=4)?;
        check_range("mmc1 shift_register", s.shift_register, 0..=0x1F)?;

        self.shift_register = s.shift_register;
        self.write_count = s.write_count;
        self.control = s.control & 0x1F;
        self.chr_bank0 = s.chr_bank0 & 0x1F;
        self.chr_bank1 = s.chr_bank1 & 0x1F;
        self.prg_bank = s.prg_bank & 0x1F;
        self.prg_ram.copy_from_slice(&s.prg_ram);
        if let Some(buf) = &s.chr_ram {
            self.chr.copy_from_slice(buf);
        }
        self.recompute_prg_banks();
        Ok(())
    }

    fn reset(&mut self) {
        self.reset_shift();
        self.control = CONTROL_POWER_ON;
        self.chr_bank0 = 0;
        self.chr_bank1 = 0;
        self.prg_bank = 0;
        self.recompute_prg_banks();
    }

    fn current_mirroring(&self) -> Option<Mirroring> {
        Some(match self.control & 0x03 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        })
    }
}

/*!
Mapper subsystem: trait definition, snapshot type and the fixed-bank NROM
(mapper 0) implementation.

Purpose:
- Decouple CPU/PPU address mapping from the `Cartridge` so bank-switching
  variants are selected once at load time behind `Box<dyn Mapper>`.
- Give every variant the same snapshot/restore contract for save states.

Address ranges forwarded by the buses:
- CPU $4020..=$FFFF to `cpu_read`/`cpu_write` ($6000..=$7FFF is PRG RAM).
- PPU $0000..=$1FFF (pattern tables) to `ppu_read`/`ppu_write`.
*/

use serde::{Deserialize, Serialize};

use crate::cartridge::Mirroring;
use crate::error::StateError;
use crate::mappers::mmc1::Mmc1State;
use crate::save_state::{check_chr_ram, check_len};

/// Common interface all cartridge mappers implement.
///
/// Semantics:
/// - All read/write methods take full CPU or PPU addresses (unmasked).
/// - `save_state` captures every mutable register and RAM; `load_state`
///   validates the snapshot first and leaves the mapper untouched on error.
pub trait Mapper {
    /// Mapper numeric identifier (e.g., 0 for NROM).
    fn mapper_id(&self) -> u16;

    /// CPU-visible read at $4020..=$FFFF.
    fn cpu_read(&mut self, addr: u16) -> u8;

    /// CPU-visible write at $4020..=$FFFF.
    fn cpu_write(&mut self, addr: u16, value: u8);

    /// PPU-visible read at $0000..=$1FFF (pattern table region).
    fn ppu_read(&self, addr: u16) -> u8;

    /// PPU-visible write at $0000..=$1FFF (pattern table region).
    fn ppu_write(&mut self, addr: u16, value: u8);

    fn save_state(&self) -> MapperState;

    fn load_state(&mut self, state: &MapperState) -> Result<(), StateError>;

    /// Reset/Power-on mapper state (bank registers, IRQ state, etc).
    fn reset(&mut self) {}

    /// Called by the PPU once per rendered scanline (cycle 260).
    fn on_scanline(&mut self) {}

    /// Whether this mapper is asserting its IRQ output line at the moment.
    fn irq_pending(&self) -> bool {
        false
    }

    /// Dynamic nametable mirroring override. `None` means the cartridge
    /// header decides.
    fn current_mirroring(&self) -> Option<Mirroring> {
        None
    }
}

/// Mapper-specific part of a save state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapperState {
    Nrom {
        prg_ram: Vec<u8>,
        chr_ram: Option<Vec<u8>>,
    },
    Mmc1(Mmc1State),
}

impl MapperState {
    pub fn mapper_id(&self) -> u16 {
        match self {
            MapperState::Nrom { .. } => 0,
            MapperState::Mmc1(_) => 1,
        }
    }
}

/// NROM (mapper 0) implementation.
///
/// - PRG ROM: first 16 KiB page at $8000..=$BFFF, last page at $C000..=$FFFF
///   (a single page therefore appears twice).
/// - PRG RAM: optional 8 KiB at $6000..=$7FFF; reads 0 when absent.
/// - CHR: ROM, or writable RAM when the image declares no CHR pages.
#[derive(Clone, Debug)]
pub struct Nrom {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    last_page: usize,
}

impl Nrom {
    /// - `prg_rom`: whole 16 KiB pages
    /// - `chr`: CHR ROM bytes, or the CHR RAM buffer if `chr_is_ram`
    /// - `prg_ram_size`: size of PRG RAM in bytes (0 to disable)
    pub fn new(prg_rom: Vec<u8>, chr: Vec<u8>, chr_is_ram: bool, prg_ram_size: usize) -> Self {
        let last_page = (prg_rom.len() / 0x4000).saturating_sub(1);
        Self {
            prg_rom,
            prg_ram: vec![0; prg_ram_size],
            chr,
            chr_is_ram,
            last_page,
        }
    }

    #[inline]
    fn prg_rom_read(&self, addr: u16) -> u8 {
        if self.prg_rom.is_empty() {
            return 0;
        }
        let page = if addr < 0xC000 { 0 } else { self.last_page };
        let idx = page * 0x4000 + (addr as usize & 0x3FFF);
        self.prg_rom[idx % self.prg_rom.len()]
    }

    #[inline]
    fn prg_ram_index(&self, addr: u16) -> Option<usize> {
        if self.prg_ram.is_empty() {
            None
        } else {
            Some((addr as usize - 0x6000) % self.prg_ram.len())
        }
    }
}

impl Mapper for Nrom {
    #[inline]
    fn mapper_id(&self) -> u16 {
        0
    }

    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.prg_ram_index(addr).map_or(0, |i| self.prg_ram[i]),
            0x8000..=0xFFFF => self.prg_rom_read(addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if !(0x6000..=0x7FFF).contains(&addr) {
            return;
        }
        if let Some(i) = self.prg_ram_index(addr) {
            self.prg_ram[i] = value;
        }
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        if self.chr.is_empty() {
            return 0;
        }
        self.chr[(addr as usize & 0x1FFF) % self.chr.len()]
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if !self.chr_is_ram || self.chr.is_empty() {
            return;
        }
        let idx = (addr as usize & 0x1FFF) % self.chr.len();
        self.chr[idx] = value;
    }

    fn save_state(&self) -> MapperState {
        MapperState::Nrom {
            prg_ram: self.prg_ram.clone(),
            chr_ram: self.chr_is_ram.then(|| self.chr.clone()),
        }
    }

    fn load_state(&mut self, state: &MapperState) -> Result<(), StateError> {
        let MapperState::Nrom { prg_ram, chr_ram } = state else {
            return Err(StateError::MapperMismatch {
                expected: self.mapper_id(),
                found: state.mapper_id(),
            });
        };
        check_len("prg_ram", &self.prg_ram, prg_ram)?;
        check_chr_ram(self.chr_is_ram, &self.chr, chr_ram)?;

        self.prg_ram.copy_from_slice(prg_ram);
        if let Some(buf) = chr_ram {
            self.chr.copy_from_slice(buf);
        }
        Ok(())
    }
}

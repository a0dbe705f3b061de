//! Shared test utilities for building iNES (v1) images in memory.
//!
//! Header fields written here:
//! - bytes[0..4] = b"NES\x1A"
//! - byte 4 = PRG ROM size in 16 KiB units
//! - byte 5 = CHR ROM size in 8 KiB units (0 => CHR RAM)
//! - byte 6 = Flags 6 (mirroring, PRG RAM, trainer, four-screen, mapper low nibble)
//! - byte 7 = Flags 7 (NES 2.0 indicator, mapper high nibble)
//! - byte 8 = PRG RAM size in 8 KiB units
//!
//! Vectors always live in the last 6 bytes of the last PRG page.

#![allow(dead_code)]

use crate::bus::CpuBus;
use crate::cartridge::Cartridge;
use crate::nes::Nes;

/// Flat 64 KiB address space with no mirroring or devices, for exercising
/// the CPU core in isolation.
pub struct FlatBus {
    pub mem: Vec<u8>,
}

impl FlatBus {
    pub fn new() -> Self {
        Self {
            mem: vec![0; 0x10000],
        }
    }

    /// Copy `program` to `origin` and point the RESET vector at it.
    pub fn with_program(origin: u16, program: &[u8]) -> Self {
        let mut bus = Self::new();
        let start = origin as usize;
        bus.mem[start..start + program.len()].copy_from_slice(program);
        bus.mem[0xFFFC..0xFFFE].copy_from_slice(&origin.to_le_bytes());
        bus
    }
}

impl CpuBus for FlatBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.mem[addr as usize] = value;
    }
}

/// Build an iNES image with pattern-filled PRG (0xAA) and CHR (0xCC).
pub fn build_ines(
    prg_16k: usize,
    chr_8k: usize,
    flags6: u8,
    flags7: u8,
    prg_ram_8k: u8,
    trainer: Option<&[u8; 512]>,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(16 + 512 + prg_16k * 0x4000 + chr_8k * 0x2000);
    bytes.extend_from_slice(b"NES\x1A");
    bytes.push(prg_16k as u8);
    bytes.push(chr_8k as u8);
    bytes.push(flags6);
    bytes.push(flags7);
    bytes.push(prg_ram_8k);
    bytes.extend_from_slice(&[0u8; 7]);
    if let Some(t) = trainer {
        bytes.extend_from_slice(t);
    }
    bytes.extend(std::iter::repeat_n(0xAA, prg_16k * 0x4000));
    bytes.extend(std::iter::repeat_n(0xCC, chr_8k * 0x2000));
    bytes
}

/// NROM image with `prg` placed at $8000 (one 16 KiB page, one CHR page)
/// and RESET/NMI/IRQ vectors set to `vectors` or $8000.
pub fn build_nrom_with_prg(prg: &[u8], vectors: Option<(u16, u16, u16)>) -> Vec<u8> {
    assert!(prg.len() <= 0x4000 - 6, "program must fit below the vectors");
    let mut rom = build_ines(1, 1, 0, 0, 1, None);
    let page = &mut rom[16..16 + 0x4000];
    page.fill(0xEA); // NOP sled
    page[..prg.len()].copy_from_slice(prg);
    let (reset, nmi, irq) = vectors.unwrap_or((0x8000, 0x8000, 0x8000));
    set_vectors_in_prg(page, reset, nmi, irq);
    // Blank pattern data so rendering tests start from a clean CHR
    rom[16 + 0x4000..].fill(0);
    rom
}

/// MMC1 image with `banks` 16 KiB pages, every byte of page `n` set to `n`
/// except the vectors (all pointing at $C000 in the fixed last bank).
pub fn build_mmc1(banks: usize, chr_8k: usize) -> Vec<u8> {
    let mut rom = build_ines(banks, chr_8k, 0x10, 0, 1, None);
    for b in 0..banks {
        let start = 16 + b * 0x4000;
        rom[start..start + 0x4000].fill(b as u8);
    }
    let last = 16 + (banks - 1) * 0x4000;
    set_vectors_in_prg(&mut rom[last..last + 0x4000], 0xC000, 0xC000, 0xC000);
    rom
}

/// Write CPU vectors (NMI, RESET, IRQ/BRK) into the last 6 bytes of a PRG page.
pub fn set_vectors_in_prg(prg: &mut [u8], reset: u16, nmi: u16, irq: u16) {
    let base = prg.len() - 6;
    prg[base..base + 2].copy_from_slice(&nmi.to_le_bytes());
    prg[base + 2..base + 4].copy_from_slice(&reset.to_le_bytes());
    prg[base + 4..base + 6].copy_from_slice(&irq.to_le_bytes());
}

pub fn cartridge_with_prg(prg: &[u8]) -> Cartridge {
    Cartridge::from_ines_bytes(&build_nrom_with_prg(prg, None)).expect("test ROM parses")
}

/// Console running `prg` from $8000 after reset.
pub fn nes_with_prg(prg: &[u8]) -> Nes {
    Nes::from_ines_bytes(&build_nrom_with_prg(prg, None)).expect("test ROM parses")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_basic_ines() {
        let rom = build_ines(2, 1, 0x01, 0x00, 1, None);
        assert_eq!(&rom[0..4], b"NES\x1A");
        assert_eq!(rom[4], 2);
        assert_eq!(rom[5], 1);
        assert_eq!(rom[6], 0x01);
        assert_eq!(rom.len(), 16 + 2 * 16 * 1024 + 8 * 1024);
    }

    #[test]
    fn writes_vectors_for_16k_prg() {
        let mut prg = vec![0u8; 16 * 1024];
        set_vectors_in_prg(&mut prg, 0x8123, 0x8456, 0x8ABC);
        assert_eq!(&prg[0x3FFA..], &[0x56, 0x84, 0x23, 0x81, 0xBC, 0x8A]);
    }

    #[test]
    fn mmc1_image_marks_banks() {
        let rom = build_mmc1(4, 1);
        assert_eq!(rom[6] >> 4, 1);
        assert_eq!(rom[16 + 0x4000 * 2 + 5], 2);
        assert_eq!(rom[16 + 0x4000 * 4 - 3], 0xC0);
    }
}

#![doc = r#"
PPU registers module

Purpose
- CPU-visible register semantics for $2000-$2007: read_reg/write_reg with
  their side effects spelled out in one place.
- Typed views of PPUCTRL, PPUMASK and PPUSTATUS as bitflags.

Side effects
- PPUCTRL write: nametable select bits are copied into loopy `t`.
- PPUSTATUS read: returns the flags, then clears VBlank and the write toggle.
- OAMDATA write: stores at OAMADDR, then increments OAMADDR.
- PPUSCROLL / PPUADDR writes: two-write latch into loopy `t` (second
  PPUADDR write also copies `t` into `v`).
- PPUDATA read: buffered below $3F00 (returns the previous fetch), direct
  for palette addresses. Read or write increments `v` by 1 or 32.

Addresses 0x2000..=0x3FFF mirror to the 8-byte window; callers pass the
raw CPU address.
"#]

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::Ppu;
use crate::mapper::Mapper;

bitflags! {
    /// $2000
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PpuCtrl: u8 {
        const NAMETABLE_X = 0b0000_0001;
        const NAMETABLE_Y = 0b0000_0010;
        const VRAM_INCREMENT_32 = 0b0000_0100;
        const SPRITE_TABLE = 0b0000_1000;
        const BACKGROUND_TABLE = 0b0001_0000;
        const SPRITE_SIZE_16 = 0b0010_0000;
        const MASTER_SLAVE = 0b0100_0000;
        const GENERATE_NMI = 0b1000_0000;
    }
}

bitflags! {
    /// $2001
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PpuMask: u8 {
        const GRAYSCALE = 0b0000_0001;
        const SHOW_BACKGROUND_LEFT = 0b0000_0010;
        const SHOW_SPRITES_LEFT = 0b0000_0100;
        const SHOW_BACKGROUND = 0b0000_1000;
        const SHOW_SPRITES = 0b0001_0000;
        const EMPHASIZE_RED = 0b0010_0000;
        const EMPHASIZE_GREEN = 0b0100_0000;
        const EMPHASIZE_BLUE = 0b1000_0000;
    }
}

bitflags! {
    /// $2002
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PpuStatus: u8 {
        const SPRITE_OVERFLOW = 0b0010_0000;
        const SPRITE_ZERO_HIT = 0b0100_0000;
        const VBLANK = 0b1000_0000;
    }
}

impl PpuCtrl {
    pub fn vram_increment(self) -> u16 {
        if self.contains(PpuCtrl::VRAM_INCREMENT_32) { 32 } else { 1 }
    }

    pub fn background_table(self) -> u16 {
        if self.contains(PpuCtrl::BACKGROUND_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Pattern table for 8x8 sprites (8x16 sprites pick it per tile).
    pub fn sprite_table(self) -> u16 {
        if self.contains(PpuCtrl::SPRITE_TABLE) { 0x1000 } else { 0x0000 }
    }
}

impl PpuMask {
    pub fn rendering_enabled(self) -> bool {
        self.intersects(PpuMask::SHOW_BACKGROUND | PpuMask::SHOW_SPRITES)
    }

    /// Apply grayscale and color emphasis to an RGB triple and pack it as
    /// 0xAABBGGRR with opaque alpha.
    ///
    /// Emphasis darkens every channel that is not emphasized to 75%. With
    /// all three emphasis bits set, every channel is darkened.
    pub fn transform(self, rgb: [u8; 3]) -> u32 {
        let [mut r, mut g, mut b] = rgb.map(u32::from);

        if self.contains(PpuMask::GRAYSCALE) {
            let avg = (r + g + b) / 3;
            (r, g, b) = (avg, avg, avg);
        }

        let emphasis = PpuMask::EMPHASIZE_RED | PpuMask::EMPHASIZE_GREEN | PpuMask::EMPHASIZE_BLUE;
        if self.intersects(emphasis) {
            let all = self.contains(emphasis);
            let dim = |c: u32| c * 3 / 4;
            if all || !self.contains(PpuMask::EMPHASIZE_RED) {
                r = dim(r);
            }
            if all || !self.contains(PpuMask::EMPHASIZE_GREEN) {
                g = dim(g);
            }
            if all || !self.contains(PpuMask::EMPHASIZE_BLUE) {
                b = dim(b);
            }
        }

        0xFF00_0000 | (b << 16) | (g << 8) | r
    }
}

impl Ppu {
    /// CPU read of $2000-$2007 (mirrored through $3FFF).
    pub fn read_reg(&mut self, addr: u16, mapper: &dyn Mapper) -> u8 {
        match addr & 0x7 {
            2 => {
                let value = self.status.bits();
                self.status.remove(PpuStatus::VBLANK);
                self.loopy.on_status_read();
                value
            }
            4 => self.oam[self.oam_addr as usize],
            7 => {
                let a = self.loopy.vram_addr();
                let mut data = self.data_buffer;
                self.data_buffer = self.bus.read(mapper, a);
                if a >= 0x3F00 {
                    data = self.data_buffer;
                }
                self.increment_vram_addr();
                data
            }
            // Write-only registers
            _ => 0,
        }
    }

    /// CPU write of $2000-$2007 (mirrored through $3FFF).
    pub fn write_reg(&mut self, addr: u16, value: u8, mapper: &mut dyn Mapper) {
        match addr & 0x7 {
            0 => {
                self.ctrl = PpuCtrl::from_bits_retain(value);
                self.loopy.on_ctrl_write(value);
            }
            1 => self.mask = PpuMask::from_bits_retain(value),
            2 => {}
            3 => self.oam_addr = value,
            4 => self.write_oam_data(value),
            5 => self.loopy.on_scroll_write(value),
            6 => self.loopy.on_addr_write(value),
            _ => {
                let a = self.loopy.vram_addr();
                self.bus.write(mapper, a, value);
                self.increment_vram_addr();
            }
        }
    }

    fn increment_vram_addr(&mut self) {
        let step = self.ctrl.vram_increment();
        self.loopy.increment_vram_addr(step);
    }
}

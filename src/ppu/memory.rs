#![doc = r#"
PPU memory submodule

Responsibilities
- OAM access: the OAMDATA write path, raw peek/poke and the OAM DMA copy.
- Raw picture-bus peek/poke for code that needs VRAM or palette contents
  without PPUDATA side effects (tests, debuggers).

OAM DMA goes through OAMDATA semantics: bytes land at OAMADDR and the
address wraps, so a transfer started at a non-zero OAMADDR rotates the
table. CPU stall timing belongs to the CPU bus.
"#]

use super::Ppu;
use crate::mapper::Mapper;

pub const OAM_SIZE: usize = 256;

impl Ppu {
    pub(in crate::ppu) fn write_oam_data(&mut self, value: u8) {
        self.oam[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    /// Copy one CPU page into OAM through OAMDATA.
    pub fn oam_dma(&mut self, page: &[u8; 256]) {
        for &b in page {
            self.write_oam_data(b);
        }
    }

    #[inline]
    pub fn peek_oam(&self, idx: usize) -> u8 {
        self.oam[idx & 0xFF]
    }

    #[inline]
    pub fn poke_oam(&mut self, idx: usize, value: u8) {
        self.oam[idx & 0xFF] = value;
    }

    pub fn oam(&self) -> &[u8] {
        &self.oam
    }

    /// Picture-bus read without touching the PPUDATA buffer or `v`.
    pub fn peek_vram(&self, addr: u16, mapper: &dyn Mapper) -> u8 {
        self.bus.read(mapper, addr)
    }

    pub fn poke_vram(&mut self, addr: u16, value: u8, mapper: &mut dyn Mapper) {
        self.bus.write(mapper, addr, value);
    }
}

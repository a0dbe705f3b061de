/*!
ppu_bus: the picture unit's 16 KiB address space.

Address map (14-bit, callers may pass any u16; it is masked):
- 0x0000-0x1FFF : Pattern tables, forwarded to the cartridge mapper (CHR ROM/RAM)
- 0x2000-0x2FFF : Four logical nametables backed by 4 KiB of VRAM, arranged
                  by the active mirroring mode
- 0x3000-0x3EFF : Mirror of 0x2000-0x2EFF
- 0x3F00-0x3F1F : Palette RAM; entries 0x10/0x14/0x18/0x1C alias 0x00/0x04/0x08/0x0C
- 0x3F20-0x3FFF : Mirrors of 0x3F00-0x3F1F

Mirroring comes from the mapper when it controls it (MMC1), otherwise from
the cartridge header. A four-screen header always wins.

The mapper is not owned here; every access borrows it from the console so
the PPU and the CPU bus can share one cartridge.
*/

use serde::{Deserialize, Serialize};

use crate::cartridge::Mirroring;
use crate::mapper::Mapper;

const VRAM_SIZE: usize = 0x1000;
const NAMETABLE_SIZE: u16 = 0x0400;

/// Physical VRAM offsets of logical nametables 0..3.
fn nametable_offsets(mode: Mirroring) -> [u16; 4] {
    match mode {
        Mirroring::Horizontal => [0x000, 0x000, 0x400, 0x400],
        Mirroring::Vertical => [0x000, 0x400, 0x000, 0x400],
        Mirroring::SingleScreenLower => [0x000; 4],
        Mirroring::SingleScreenUpper => [0x400; 4],
        Mirroring::FourScreen => [0x000, 0x400, 0x800, 0xC00],
    }
}

/// Palette RAM index for an address in 0x3F00-0x3FFF.
#[inline]
fn palette_index(addr: u16) -> usize {
    let idx = (addr & 0x1F) as usize;
    if idx >= 0x10 && idx & 0x03 == 0 {
        idx - 0x10
    } else {
        idx
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PictureBus {
    vram: Vec<u8>,
    palette: [u8; 32],
    header_mirroring: Mirroring,
}

impl PictureBus {
    pub fn new(header_mirroring: Mirroring) -> Self {
        Self {
            vram: vec![0; VRAM_SIZE],
            palette: [0; 32],
            header_mirroring,
        }
    }

    /// Active nametable arrangement.
    pub fn mirroring(&self, mapper: &dyn Mapper) -> Mirroring {
        if self.header_mirroring == Mirroring::FourScreen {
            return Mirroring::FourScreen;
        }
        mapper.current_mirroring().unwrap_or(self.header_mirroring)
    }

    pub fn header_mirroring(&self) -> Mirroring {
        self.header_mirroring
    }

    pub fn vram_len(&self) -> usize {
        self.vram.len()
    }

    #[inline]
    fn vram_index(&self, mapper: &dyn Mapper, addr: u16) -> usize {
        let rel = (addr - 0x2000) & 0x0FFF;
        let table = (rel / NAMETABLE_SIZE) as usize;
        let offsets = nametable_offsets(self.mirroring(mapper));
        (offsets[table] + (rel % NAMETABLE_SIZE)) as usize
    }

    pub fn read(&self, mapper: &dyn Mapper, addr: u16) -> u8 {
        let a = addr & 0x3FFF;
        match a {
            0x0000..=0x1FFF => mapper.ppu_read(a),
            0x2000..=0x3EFF => self.vram[self.vram_index(mapper, a)],
            _ => self.palette[palette_index(a)],
        }
    }

    pub fn write(&mut self, mapper: &mut dyn Mapper, addr: u16, value: u8) {
        let a = addr & 0x3FFF;
        match a {
            0x0000..=0x1FFF => mapper.ppu_write(a, value),
            0x2000..=0x3EFF => {
                let idx = self.vram_index(mapper, a);
                self.vram[idx] = value;
            }
            _ => self.palette[palette_index(a)] = value,
        }
    }

    /// Palette entry by raw index (0..32), after aliasing.
    #[inline]
    pub fn palette_entry(&self, index: u8) -> u8 {
        self.palette[palette_index(index as u16)]
    }
}

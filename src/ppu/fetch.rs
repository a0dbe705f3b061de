#![doc = r#"
PPU pattern fetch

A tile is 16 bytes in a pattern table: 8 bytes of low bitplane followed by
8 bytes of high bitplane. One `PatternRow` holds both planes of a single
row, and yields 2-bit color indices with pixel 0 in bit 7.

Shared by the background and sprite renderers.
"#]

use crate::bits;
use crate::mapper::Mapper;
use crate::ppu_bus::PictureBus;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternRow {
    low: u8,
    high: u8,
}

impl PatternRow {
    /// Fetch row `row` (0..8) of `tile` from the pattern table at `table`
    /// ($0000 or $1000).
    pub fn fetch(bus: &PictureBus, mapper: &dyn Mapper, table: u16, tile: u8, row: u8) -> Self {
        let low_addr = table + tile as u16 * 16 + (row & 0x07) as u16;
        Self {
            low: bus.read(mapper, low_addr),
            high: bus.read(mapper, low_addr + 8),
        }
    }

    /// The same row drawn right to left.
    pub fn mirrored(self) -> Self {
        Self {
            low: bits::reverse8(self.low),
            high: bits::reverse8(self.high),
        }
    }

    /// Color index (0..4) of pixel `x` (0 = leftmost).
    #[inline]
    pub fn color_index(self, x: usize) -> u8 {
        let bit = 7 - (x as u8 & 0x07);
        bits::build_u2(bits::get_bit(self.high, bit), bits::get_bit(self.low, bit))
    }
}

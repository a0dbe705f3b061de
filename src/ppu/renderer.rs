#![doc = r#"
PPU renderer module

Responsibilities
- Draw one whole background scanline from the loopy scroll position.
- Resolve (palette id, color index) pairs through palette RAM and the
  master palette, then through the PPUMASK color transform.
- Keep the per-pixel background color index buffer that sprite priority
  and sprite-zero hit consult.

Background walk
- `v` is sampled once per line. Screen column `x` maps to
  `coarse_x * 8 + fine_x + x`; columns past 256 continue in the
  horizontally adjacent nametable.
- The palette for each 16x16 area comes from the attribute table at
  nametable + 960: one byte per 32x32 block, two bits per quadrant.
- Masked pixels (background off, or left 8 columns hidden) and color
  index 0 both show the backdrop color at $3F00 and count as transparent.
"#]

use super::fetch::PatternRow;
use super::registers::PpuMask;
use super::{NES_HEIGHT, NES_WIDTH, Ppu};
use crate::bits;
use crate::mapper::Mapper;

const NAMETABLE_BASE: u16 = 0x2000;
const NAMETABLE_SIZE: u16 = 0x0400;
const ATTRIBUTE_OFFSET: u16 = 960;

/// Master palette (RGB) indexed by the 6-bit color numbers stored in palette RAM.
pub const MASTER_PALETTE: [[u8; 3]; 64] = [
    [0x75, 0x75, 0x75], [0x27, 0x1B, 0x8F], [0x00, 0x00, 0xAB], [0x47, 0x00, 0x9F],
    [0x8F, 0x00, 0x77], [0xAB, 0x00, 0x13], [0xA7, 0x00, 0x00], [0x7F, 0x0B, 0x00],
    [0x43, 0x2F, 0x00], [0x00, 0x47, 0x00], [0x00, 0x51, 0x00], [0x00, 0x3F, 0x17],
    [0x1B, 0x3F, 0x5F], [0x00, 0x00, 0x00], [0x00, 0x00, 0x00], [0x00, 0x00, 0x00],
    [0xBC, 0xBC, 0xBC], [0x00, 0x73, 0xEF], [0x23, 0x3B, 0xEF], [0x83, 0x00, 0xF3],
    [0xBF, 0x00, 0xBF], [0xE7, 0x00, 0x5B], [0xDB, 0x2B, 0x00], [0xCB, 0x4F, 0x0F],
    [0x8B, 0x73, 0x00], [0x00, 0x97, 0x00], [0x00, 0xAB, 0x00], [0x00, 0x93, 0x3B],
    [0x00, 0x83, 0x8B], [0x00, 0x00, 0x00], [0x00, 0x00, 0x00], [0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF], [0x3F, 0xBF, 0xFF], [0x5F, 0x97, 0xFF], [0xA7, 0x8B, 0xFD],
    [0xF7, 0x7B, 0xFF], [0xFF, 0x77, 0xB7], [0xFF, 0x77, 0x63], [0xFF, 0x9B, 0x3B],
    [0xF3, 0xBF, 0x3F], [0x83, 0xD3, 0x13], [0x4F, 0xDF, 0x4B], [0x58, 0xF8, 0x98],
    [0x00, 0xEB, 0xDB], [0x00, 0x00, 0x00], [0x00, 0x00, 0x00], [0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF], [0xAB, 0xE7, 0xFF], [0xC7, 0xD7, 0xFF], [0xD7, 0xCB, 0xFF],
    [0xFF, 0xC7, 0xFF], [0xFF, 0xC7, 0xDB], [0xFF, 0xBF, 0xB3], [0xFF, 0xDB, 0xAB],
    [0xFF, 0xE7, 0xA3], [0xE3, 0xFF, 0xA3], [0xAB, 0xF3, 0xBF], [0xB3, 0xFF, 0xCF],
    [0x9F, 0xFF, 0xF3], [0x00, 0x00, 0x00], [0x00, 0x00, 0x00], [0x00, 0x00, 0x00],
];

impl Ppu {
    /// Final packed color for `index` (0..4) of palette `palette_id` (0..8).
    pub(in crate::ppu) fn color(&self, palette_id: u8, index: u8) -> u32 {
        let entry = self.bus.palette_entry(palette_id * 4 + index) & 0x3F;
        self.mask.transform(MASTER_PALETTE[entry as usize])
    }

    #[inline]
    pub(in crate::ppu) fn plot(&mut self, x: usize, y: usize, color: u32) {
        self.frame_buffer[y * NES_WIDTH + x] = color;
    }

    #[inline]
    fn plot_background(&mut self, x: usize, y: usize, color: u32, index: u8) {
        self.color_indexes[y * NES_WIDTH + x] = index;
        self.plot(x, y, color);
    }

    #[inline]
    pub fn is_background_opaque(&self, x: usize, y: usize) -> bool {
        self.color_indexes[y * NES_WIDTH + x] != 0
    }

    pub(in crate::ppu) fn render_background_line(&mut self, mapper: &dyn Mapper) {
        let y = self.scanline as usize;
        let show = self.mask.contains(PpuMask::SHOW_BACKGROUND);
        let show_left = self.mask.contains(PpuMask::SHOW_BACKGROUND_LEFT);
        let backdrop = self.color(0, 0);
        let table = self.ctrl.background_table();

        let nt_y = self.loopy.scrolled_y() % NES_HEIGHT;
        let mut x = 0;
        while x < NES_WIDTH {
            let scrolled_x = self.loopy.scrolled_x(x);
            let nametable = self.loopy.nametable_id(scrolled_x);
            let nt_x = scrolled_x % NES_WIDTH;
            let start_in_tile = nt_x % 8;
            let span = (8 - start_in_tile).min(NES_WIDTH - x);

            let nt_base = NAMETABLE_BASE + nametable * NAMETABLE_SIZE;
            let tile_addr = nt_base + ((nt_y / 8) * 32 + nt_x / 8) as u16;
            let tile = self.bus.read(mapper, tile_addr);
            let pattern = PatternRow::fetch(&self.bus, mapper, table, tile, (nt_y % 8) as u8);
            let palette_id = self.background_palette_id(mapper, nt_base, nt_x, nt_y);

            for dx in 0..span {
                let px = x + dx;
                if !show || (!show_left && px < 8) {
                    self.plot_background(px, y, backdrop, 0);
                    continue;
                }
                let index = pattern.color_index(start_in_tile + dx);
                let color = if index == 0 { backdrop } else { self.color(palette_id, index) };
                self.plot_background(px, y, color, index);
            }
            x += span;
        }
    }

    fn background_palette_id(&self, mapper: &dyn Mapper, nt_base: u16, x: usize, y: usize) -> u8 {
        let block = ((y / 32) * 8 + x / 32) as u16;
        let attribute = self.bus.read(mapper, nt_base + ATTRIBUTE_OFFSET + block);
        let quadrant = ((y % 32) / 16) * 2 + (x % 32) / 16;
        bits::get_bits(attribute, quadrant as u8 * 2, 2)
    }
}

#![doc = r#"
PPU sprites

`Sprite` decodes one 4-byte OAM entry (Y, tile, attributes, X) against the
current PPUCTRL. `render_sprite_line` draws the sprites selected for a
scanline on top of the already-drawn background.

Priority
- Sprites are visited in OAM order and the first opaque pixel in each
  column wins; later sprites never overwrite it, even when the winner is
  hidden behind the background.
- The winning pixel is plotted when it is in front, or when the
  background pixel under it is transparent.

Sprite-zero hit is raised when sprite 0 puts an opaque pixel over an
opaque background pixel with both layers enabled. Left-column masking
applies to both tests: a masked background pixel counts as transparent.
"#]

use super::Ppu;
use super::fetch::PatternRow;
use super::registers::{PpuCtrl, PpuMask, PpuStatus};
use super::{NES_WIDTH, PALETTE_SPRITE_BASE};
use crate::mapper::Mapper;

const ATTR_PALETTE: u8 = 0x03;
const ATTR_BEHIND_BACKGROUND: u8 = 0x20;
const ATTR_FLIP_X: u8 = 0x40;
const ATTR_FLIP_Y: u8 = 0x80;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sprite {
    /// OAM slot (0..64)
    pub index: u8,
    pub x: u8,
    /// First scanline the sprite appears on (OAM Y + 1)
    pub y: u16,
    pub tall: bool,
    pub table: u16,
    /// Tile number; for 8x16 sprites the top half
    pub tile: u8,
    pub attributes: u8,
}

impl Sprite {
    pub fn from_oam(index: u8, entry: &[u8], ctrl: PpuCtrl) -> Self {
        let tile_byte = entry[1];
        let tall = ctrl.contains(PpuCtrl::SPRITE_SIZE_16);
        let (table, tile) = if tall {
            ((tile_byte as u16 & 0x01) * 0x1000, tile_byte & 0xFE)
        } else {
            (ctrl.sprite_table(), tile_byte)
        };
        Self {
            index,
            x: entry[3],
            y: entry[0] as u16 + 1,
            tall,
            table,
            tile,
            attributes: entry[2],
        }
    }

    #[inline]
    pub fn height(&self) -> u16 {
        if self.tall { 16 } else { 8 }
    }

    #[inline]
    pub fn covers(&self, scanline: u16) -> bool {
        scanline >= self.y && scanline < self.y + self.height()
    }

    pub fn palette_id(&self) -> u8 {
        PALETTE_SPRITE_BASE + (self.attributes & ATTR_PALETTE)
    }

    pub fn in_front(&self) -> bool {
        self.attributes & ATTR_BEHIND_BACKGROUND == 0
    }

    pub fn flip_x(&self) -> bool {
        self.attributes & ATTR_FLIP_X != 0
    }

    pub fn flip_y(&self) -> bool {
        self.attributes & ATTR_FLIP_Y != 0
    }

    /// Tile and tile row to draw on `scanline`, after vertical flip. For 8x16
    /// sprites a flip also swaps the two halves.
    pub fn tile_row(&self, scanline: u16) -> (u8, u8) {
        let mut inside = scanline - self.y;
        if self.flip_y() {
            inside = self.height() - 1 - inside;
        }
        let tile = self.tile.wrapping_add((inside / 8) as u8);
        (tile, (inside % 8) as u8)
    }
}

#[derive(Copy, Clone)]
struct SpritePixel {
    color: u32,
    in_front: bool,
}

impl Ppu {
    pub(in crate::ppu) fn render_sprite_line(&mut self, mapper: &dyn Mapper) {
        if !self.mask.contains(PpuMask::SHOW_SPRITES) {
            return;
        }
        let y = self.scanline as u16;
        let sprites = self.evaluate_sprites(y);
        if sprites.is_empty() {
            return;
        }

        let show_left = self.mask.contains(PpuMask::SHOW_SPRITES_LEFT);
        let show_background = self.mask.contains(PpuMask::SHOW_BACKGROUND);
        let mut line: [Option<SpritePixel>; NES_WIDTH] = [None; NES_WIDTH];

        for sprite in &sprites {
            let (tile, row) = sprite.tile_row(y);
            let mut pattern = PatternRow::fetch(&self.bus, mapper, sprite.table, tile, row);
            if sprite.flip_x() {
                pattern = pattern.mirrored();
            }

            for dx in 0..8usize {
                let x = sprite.x as usize + dx;
                if x >= NES_WIDTH {
                    break;
                }
                if !show_left && x < 8 {
                    continue;
                }
                let index = pattern.color_index(dx);
                if index == 0 {
                    continue;
                }

                // No hit is reported at the last column
                if sprite.index == 0
                    && show_background
                    && x != NES_WIDTH - 1
                    && self.is_background_opaque(x, y as usize)
                {
                    self.status.insert(PpuStatus::SPRITE_ZERO_HIT);
                }

                if line[x].is_none() {
                    line[x] = Some(SpritePixel {
                        color: self.color(sprite.palette_id(), index),
                        in_front: sprite.in_front(),
                    });
                }
            }
        }

        for (x, pixel) in line.iter().enumerate() {
            let Some(pixel) = pixel else { continue };
            if pixel.in_front || !self.is_background_opaque(x, y as usize) {
                self.plot(x, y as usize, pixel.color);
            }
        }
    }
}

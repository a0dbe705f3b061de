#![doc = r#"
PPU OAM evaluation

Scans all 64 OAM entries in index order and keeps the first eight whose
vertical span covers the scanline being drawn (8 or 16 rows tall per
PPUCTRL bit 5). Finding a ninth sets the sprite overflow flag and ends
the scan.

The result is ordered by OAM index, which is also sprite priority.
"#]

use super::Ppu;
use super::registers::PpuStatus;
use super::sprite::Sprite;

pub const MAX_SPRITES_PER_LINE: usize = 8;
const OAM_ENTRIES: usize = 64;

impl Ppu {
    pub(in crate::ppu) fn evaluate_sprites(&mut self, scanline: u16) -> Vec<Sprite> {
        let mut selected = Vec::with_capacity(MAX_SPRITES_PER_LINE);
        for index in 0..OAM_ENTRIES {
            let entry = &self.oam[index * 4..index * 4 + 4];
            let sprite = Sprite::from_oam(index as u8, entry, self.ctrl);
            if !sprite.covers(scanline) {
                continue;
            }
            if selected.len() == MAX_SPRITES_PER_LINE {
                self.status.insert(PpuStatus::SPRITE_OVERFLOW);
                break;
            }
            selected.push(sprite);
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Mirroring;

    fn place(p: &mut Ppu, index: usize, y: u8, x: u8) {
        p.poke_oam(index * 4, y);
        p.poke_oam(index * 4 + 1, 0);
        p.poke_oam(index * 4 + 2, 0);
        p.poke_oam(index * 4 + 3, x);
    }

    fn hide_all(p: &mut Ppu) {
        for i in 0..64 {
            place(p, i, 0xFF, 0);
        }
    }

    #[test]
    fn selects_at_most_eight_in_oam_order() {
        let mut p = Ppu::new(Mirroring::Horizontal);
        hide_all(&mut p);
        // Nine sprites on scanline 21 (OAM Y 20 appears from line 21)
        for (n, i) in [3usize, 5, 9, 10, 20, 30, 40, 50, 60].iter().enumerate() {
            place(&mut p, *i, 20, n as u8 * 8);
        }
        let chosen = p.evaluate_sprites(21);
        let ids: Vec<u8> = chosen.iter().map(|s| s.index).collect();
        assert_eq!(ids, [3, 5, 9, 10, 20, 30, 40, 50]);
        assert!(p.sprite_overflow());
    }

    #[test]
    fn eight_sprites_do_not_overflow() {
        let mut p = Ppu::new(Mirroring::Horizontal);
        hide_all(&mut p);
        for i in 0..8 {
            place(&mut p, i, 50, 0);
        }
        assert_eq!(p.evaluate_sprites(51).len(), 8);
        assert!(!p.sprite_overflow());
        // Out of range on the line the OAM Y names
        assert!(p.evaluate_sprites(50).is_empty());
        assert_eq!(p.evaluate_sprites(58).len(), 8);
        assert!(p.evaluate_sprites(59).is_empty());
    }

    #[test]
    fn tall_sprites_cover_sixteen_lines() {
        let mut p = Ppu::new(Mirroring::Horizontal);
        hide_all(&mut p);
        place(&mut p, 0, 100, 0);
        p.ctrl.insert(crate::ppu::PpuCtrl::SPRITE_SIZE_16);
        assert_eq!(p.evaluate_sprites(116).len(), 1);
        assert!(p.evaluate_sprites(117).is_empty());
    }
}

#![doc = r#"
Loopy scroll/address registers

`v` (current VRAM address) and `t` (temporary address) share one 15-bit
layout:

```text
yyy NN YYYYY XXXXX
||| || ||||| +++++-- coarse X scroll
||| || +++++-------- coarse Y scroll
||| ++-------------- nametable select
+++----------------- fine Y scroll
```

plus a 3-bit fine X scroll and the shared first/second write toggle `w`.

The background renderer reads `v` once at the start of each visible line
and walks 256 pixels from there, so only the per-line updates are needed:
increment Y at cycle 256, copy horizontal bits from `t` at 257, and (on the
pre-render line) copy vertical bits from `t` during cycles 280..=304.
"#]

use serde::{Deserialize, Serialize};

const COARSE_X: u16 = 0x001F;
const COARSE_Y: u16 = 0x03E0;
const NAMETABLE_X: u16 = 0x0400;
const NAMETABLE_Y: u16 = 0x0800;
const FINE_Y: u16 = 0x7000;

const HORIZONTAL_BITS: u16 = COARSE_X | NAMETABLE_X;
const VERTICAL_BITS: u16 = COARSE_Y | NAMETABLE_Y | FINE_Y;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loopy {
    v: u16,
    t: u16,
    fine_x: u8,
    w: bool,
}

impl Loopy {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Register hooks
    // ---------------------------------------------------------------------

    /// $2000 write: t.NN = value & 3
    pub fn on_ctrl_write(&mut self, value: u8) {
        self.t = (self.t & !(NAMETABLE_X | NAMETABLE_Y)) | (((value & 0x03) as u16) << 10);
    }

    /// $2002 read resets the write toggle.
    pub fn on_status_read(&mut self) {
        self.w = false;
    }

    /// $2005: first write sets coarse/fine X, second sets coarse/fine Y.
    pub fn on_scroll_write(&mut self, value: u8) {
        let value = value as u16;
        if !self.w {
            self.t = (self.t & !COARSE_X) | (value >> 3);
            self.fine_x = (value & 0x07) as u8;
        } else {
            self.t = (self.t & !(COARSE_Y | FINE_Y)) | ((value >> 3) << 5) | ((value & 0x07) << 12);
        }
        self.w = !self.w;
    }

    /// $2006: high 6 bits then low byte; the second write copies t into v.
    pub fn on_addr_write(&mut self, value: u8) {
        let value = value as u16;
        if !self.w {
            self.t = (self.t & 0x00FF) | ((value & 0x3F) << 8);
        } else {
            self.t = (self.t & 0x7F00) | value;
            self.v = self.t;
        }
        self.w = !self.w;
    }

    // ---------------------------------------------------------------------
    // Rendering-time updates
    // ---------------------------------------------------------------------

    pub fn on_visible_line(&mut self, cycle: u16) {
        match cycle {
            256 => self.increment_y(),
            257 => self.copy_x(),
            _ => {}
        }
    }

    pub fn on_pre_line(&mut self, cycle: u16) {
        self.on_visible_line(cycle);
        if (280..=304).contains(&cycle) {
            self.copy_y();
        }
    }

    fn increment_y(&mut self) {
        if self.v & FINE_Y != FINE_Y {
            self.v += 0x1000;
            return;
        }
        self.v &= !FINE_Y;
        let mut coarse_y = (self.v & COARSE_Y) >> 5;
        if coarse_y == 29 {
            coarse_y = 0;
            self.v ^= NAMETABLE_Y;
        } else if coarse_y == 31 {
            // Attribute rows: wrap without switching nametables
            coarse_y = 0;
        } else {
            coarse_y += 1;
        }
        self.v = (self.v & !COARSE_Y) | (coarse_y << 5);
    }

    fn copy_x(&mut self) {
        self.v = (self.v & !HORIZONTAL_BITS) | (self.t & HORIZONTAL_BITS);
    }

    fn copy_y(&mut self) {
        self.v = (self.v & !VERTICAL_BITS) | (self.t & VERTICAL_BITS);
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// 14-bit PPU address in `v`, used by PPUDATA.
    #[inline]
    pub fn vram_addr(&self) -> u16 {
        self.v & 0x3FFF
    }

    pub fn increment_vram_addr(&mut self, step: u16) {
        self.v = self.v.wrapping_add(step) & 0x7FFF;
    }

    pub fn coarse_x(&self) -> u16 {
        self.v & COARSE_X
    }

    pub fn fine_x(&self) -> u8 {
        self.fine_x
    }

    /// Horizontal position inside the two side-by-side nametables for screen
    /// column `x`; values of 256 and above fall into the neighbor.
    #[inline]
    pub fn scrolled_x(&self, x: usize) -> usize {
        (self.coarse_x() as usize) * 8 + self.fine_x as usize + x
    }

    /// Vertical position inside the current nametable.
    #[inline]
    pub fn scrolled_y(&self) -> usize {
        let coarse_y = ((self.v & COARSE_Y) >> 5) as usize;
        let fine_y = ((self.v & FINE_Y) >> 12) as usize;
        coarse_y * 8 + fine_y
    }

    /// Logical nametable (0..3) holding `scrolled_x`.
    #[inline]
    pub fn nametable_id(&self, scrolled_x: usize) -> u16 {
        let base = (self.v >> 10) & 0x03;
        if scrolled_x >= 256 { base ^ 0x01 } else { base }
    }
}

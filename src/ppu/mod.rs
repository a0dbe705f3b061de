/*!
Picture processing unit.

`Ppu::step` advances one dot. The console calls it three times per CPU
cycle, passing the cartridge mapper (pattern tables, mirroring control,
scanline notifications) and the frame sink.

Timing per frame (341 dots x 262 lines, no odd-frame skip):
- Pre-render line (-1): dot 1 clears VBlank, sprite overflow and sprite-0
  hit. With rendering enabled the loopy registers are updated as on a
  visible line plus the vertical copy at dots 280..=304, and the mapper
  is notified at dot 260.
- Visible lines (0..=239): dot 0 draws the whole line, background first,
  then sprites. Loopy updates and the dot-260 mapper notification follow
  when rendering is enabled.
- Line 241, dot 1: VBlank is set; an NMI is latched if PPUCTRL bit 7 is on.
- After dot 340 the line advances; after line 260 the frame counter
  increments and the completed frame buffer is handed to the sink.

STRUCTURE:
- `registers.rs` - $2000-$2007 semantics and the PPUCTRL/PPUMASK/PPUSTATUS flags
- `loopy.rs`     - scroll/address registers (v, t, fine X, toggle)
- `memory.rs`    - OAM, OAM DMA, raw VRAM peek/poke
- `fetch.rs`     - pattern row fetch
- `renderer.rs`  - background line, color resolution, master palette
- `oam_eval.rs`  - per-line sprite selection and overflow
- `sprite.rs`    - sprite decoding and the sprite line pass
*/

use serde::{Deserialize, Serialize};

use crate::cartridge::Mirroring;
use crate::error::StateError;
use crate::mapper::Mapper;
use crate::save_state::{check_len, check_range};
use crate::ppu_bus::PictureBus;

pub(crate) mod fetch;
pub(crate) mod loopy;
pub(crate) mod memory;
pub(crate) mod oam_eval;
pub mod registers;
pub(crate) mod renderer;
pub mod sprite;

pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use renderer::MASTER_PALETTE;

use loopy::Loopy;
use memory::OAM_SIZE;

/// Screen width in pixels.
pub const NES_WIDTH: usize = 256;
/// Screen height in pixels.
pub const NES_HEIGHT: usize = 240;

pub const CYCLES_PER_SCANLINE: u16 = 341;
pub const PRE_RENDER_SCANLINE: i16 = -1;
pub const VBLANK_SCANLINE: i16 = 241;
/// Line after which the frame wraps back to the pre-render line.
pub const LAST_SCANLINE: i16 = 260;
const MAPPER_NOTIFY_CYCLE: u16 = 260;

/// Palettes 4..8 belong to sprites.
pub(crate) const PALETTE_SPRITE_BASE: u8 = 4;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ppu {
    ctrl: PpuCtrl,
    mask: PpuMask,
    status: PpuStatus,
    oam_addr: u8,
    oam: Vec<u8>,
    loopy: Loopy,
    data_buffer: u8,
    bus: PictureBus,

    cycle: u16,
    scanline: i16,
    frame: u64,
    nmi_pending: bool,

    frame_buffer: Vec<u32>,
    // Background color index per pixel; 0 is transparent
    color_indexes: Vec<u8>,
}

impl Ppu {
    pub fn new(mirroring: Mirroring) -> Self {
        Self {
            ctrl: PpuCtrl::empty(),
            mask: PpuMask::empty(),
            status: PpuStatus::VBLANK,
            oam_addr: 0,
            oam: vec![0; OAM_SIZE],
            loopy: Loopy::new(),
            data_buffer: 0,
            bus: PictureBus::new(mirroring),
            cycle: 0,
            scanline: PRE_RENDER_SCANLINE,
            frame: 0,
            nmi_pending: false,
            frame_buffer: vec![0; NES_WIDTH * NES_HEIGHT],
            color_indexes: vec![0; NES_WIDTH * NES_HEIGHT],
        }
    }

    /// Advance one dot.
    pub fn step(&mut self, mapper: &mut dyn Mapper, on_frame: &mut dyn FnMut(&[u32])) {
        match self.scanline {
            PRE_RENDER_SCANLINE => self.pre_render_line(mapper),
            0..=239 => self.visible_line(mapper),
            VBLANK_SCANLINE => self.vblank_line(),
            _ => {}
        }

        self.cycle += 1;
        if self.cycle >= CYCLES_PER_SCANLINE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline > LAST_SCANLINE {
                self.scanline = PRE_RENDER_SCANLINE;
                self.frame += 1;
                on_frame(&self.frame_buffer);
            }
        }
    }

    fn pre_render_line(&mut self, mapper: &mut dyn Mapper) {
        if self.cycle == 1 {
            self.status.remove(
                PpuStatus::VBLANK | PpuStatus::SPRITE_OVERFLOW | PpuStatus::SPRITE_ZERO_HIT,
            );
        }
        if !self.mask.rendering_enabled() {
            return;
        }
        self.loopy.on_pre_line(self.cycle);
        if self.cycle == MAPPER_NOTIFY_CYCLE {
            mapper.on_scanline();
        }
    }

    fn visible_line(&mut self, mapper: &mut dyn Mapper) {
        if self.cycle == 0 {
            self.render_background_line(mapper);
            self.render_sprite_line(mapper);
        }
        if !self.mask.rendering_enabled() {
            return;
        }
        self.loopy.on_visible_line(self.cycle);
        if self.cycle == MAPPER_NOTIFY_CYCLE {
            mapper.on_scanline();
        }
    }

    fn vblank_line(&mut self) {
        if self.cycle != 1 {
            return;
        }
        self.status.insert(PpuStatus::VBLANK);
        if self.ctrl.contains(PpuCtrl::GENERATE_NMI) {
            self.nmi_pending = true;
        }
    }

    // ---------------------------------------------------------------------
    // Interrupt line
    // ---------------------------------------------------------------------

    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Consume a latched NMI request.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    // ---------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------

    pub fn frame_buffer(&self) -> &[u32] {
        &self.frame_buffer
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    pub fn cycle(&self) -> u16 {
        self.cycle
    }

    pub fn ctrl(&self) -> PpuCtrl {
        self.ctrl
    }

    pub fn mask(&self) -> PpuMask {
        self.mask
    }

    pub fn vblank(&self) -> bool {
        self.status.contains(PpuStatus::VBLANK)
    }

    pub fn sprite_zero_hit(&self) -> bool {
        self.status.contains(PpuStatus::SPRITE_ZERO_HIT)
    }

    pub fn sprite_overflow(&self) -> bool {
        self.status.contains(PpuStatus::SPRITE_OVERFLOW)
    }

    pub fn mirroring(&self, mapper: &dyn Mapper) -> Mirroring {
        self.bus.mirroring(mapper)
    }

    /// Check that a deserialized PPU has this one's buffer sizes and header
    /// mirroring, and that its dot position and fine X are in range.
    pub fn check_compatible(&self, saved: &Ppu) -> Result<(), StateError> {
        check_len("oam", &self.oam, &saved.oam)?;
        check_len("color_indexes", &self.color_indexes, &saved.color_indexes)?;
        if saved.frame_buffer.len() != self.frame_buffer.len() {
            return Err(StateError::SizeMismatch {
                field: "frame_buffer",
                expected: self.frame_buffer.len(),
                found: saved.frame_buffer.len(),
            });
        }
        if saved.bus.vram_len() != self.bus.vram_len() {
            return Err(StateError::SizeMismatch {
                field: "vram",
                expected: self.bus.vram_len(),
                found: saved.bus.vram_len(),
            });
        }
        if saved.bus.header_mirroring() != self.bus.header_mirroring() {
            return Err(StateError::MirroringMismatch {
                expected: self.bus.header_mirroring(),
                found: saved.bus.header_mirroring(),
            });
        }
        check_range("ppu cycle", saved.cycle, 0..=CYCLES_PER_SCANLINE - 1)?;
        check_range("ppu scanline", saved.scanline, PRE_RENDER_SCANLINE..=LAST_SCANLINE)?;
        check_range("ppu fine_x", saved.loopy.fine_x(), 0..=7)
    }
}

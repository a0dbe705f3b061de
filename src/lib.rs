#![doc = r#"
nescycle library crate.

A cycle-level NES core: 6502 CPU, CPU bus, PPU, APU and cartridge mappers,
driven one instruction at a time by `Nes::step`. Frames and audio samples
leave through callbacks; nothing here opens a window or an audio device.

Modules:
- bits: byte/word helpers (assembly, sign extension, bit fields)
- register: `Reg8` and typed `BitField` register sub-fields
- error: load, execution and save-state errors
- cartridge: iNES v1 loader; builds the mapper
- mapper: `Mapper` trait and NROM (mapper 0); mappers: MMC1 (mapper 1)
- controller: standard pads on $4016/$4017
- cpu: 6502 core (state, addressing, instruction table, execute)
- bus: CPU address space, RAM, OAM DMA and device clocking
- ppu_bus: picture address space (pattern tables, nametables, palette)
- ppu: picture unit (registers, loopy scroll, background, sprites)
- apu: audio unit (pulse, triangle, noise, DMC, frame sequencer, mixer)
- nes: console driver; save_state: snapshots

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod apu;
pub mod bits;
pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod mapper;
pub mod mappers;
pub mod nes;
pub mod ppu;
pub mod ppu_bus;
pub mod register;
pub mod save_state;

pub use bus::{Bus, CpuBus};
pub use cartridge::{Cartridge, Mirroring};
pub use controller::Button;
pub use cpu::Cpu;
pub use error::{CpuError, EmuError, LoadError, StateError};
pub use nes::Nes;
pub use save_state::SaveState;

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;

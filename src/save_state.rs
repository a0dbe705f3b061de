/*!
Save states.

A `SaveState` is a complete snapshot of the console: CPU registers, work
RAM, both pads, bus timing, the whole PPU and APU, and the mapper's own
state. It is produced by `Nes::save_state` and applied with
`Nes::load_state`, and can be written to bytes with bincode.
*/

use std::ops::RangeInclusive;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::apu::Apu;
use crate::bus::ram::Ram;
use crate::controller::Controller;
use crate::cpu::CpuState;
use crate::error::{EmuError, StateError};
use crate::mapper::MapperState;
use crate::ppu::Ppu;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveState {
    pub cpu: CpuState,
    pub ram: Ram,
    pub controllers: [Controller; 2],
    pub cpu_cycle: u64,
    pub stall_cycles: u32,
    pub ppu: Ppu,
    pub apu: Apu,
    pub mapper: MapperState,
}

impl SaveState {
    pub fn to_bytes(&self) -> Result<Vec<u8>, StateError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, StateError> {
        Ok(bincode::deserialize(data)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EmuError> {
        let data = self.to_bytes()?;
        std::fs::write(path.as_ref(), &data)?;
        info!("save state written to {} ({} bytes)", path.as_ref().display(), data.len());
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, EmuError> {
        let data = std::fs::read(path.as_ref())?;
        let state = Self::from_bytes(&data)?;
        info!("save state loaded from {}", path.as_ref().display());
        Ok(state)
    }
}

/// Check that a saved buffer can be copied over a live one.
pub(crate) fn check_len(field: &'static str, live: &[u8], saved: &[u8]) -> Result<(), StateError> {
    if live.len() != saved.len() {
        return Err(StateError::SizeMismatch {
            field,
            expected: live.len(),
            found: saved.len(),
        });
    }
    Ok(())
}

/// Check an optional CHR RAM buffer (present only for CHR RAM carts).
pub(crate) fn check_chr_ram(
    chr_is_ram: bool,
    live: &[u8],
    saved: &Option<Vec<u8>>,
) -> Result<(), StateError> {
    match (chr_is_ram, saved) {
        (true, Some(buf)) => check_len("chr_ram", live, buf),
        (false, None) => Ok(()),
        (true, None) => Err(StateError::SizeMismatch {
            field: "chr_ram",
            expected: live.len(),
            found: 0,
        }),
        (false, Some(buf)) => Err(StateError::SizeMismatch {
            field: "chr_ram",
            expected: 0,
            found: buf.len(),
        }),
    }
}

/// Check a restored scalar against the values the live code can handle.
pub(crate) fn check_range<T>(
    field: &'static str,
    value: T,
    range: RangeInclusive<T>,
) -> Result<(), StateError>
where
    T: Copy + PartialOrd + Into<i64>,
{
    if !range.contains(&value) {
        return Err(StateError::OutOfRange {
            field,
            value: value.into(),
            min: (*range.start()).into(),
            max: (*range.end()).into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::bus::CpuBus;
    use crate::nes::Nes;
    use crate::test_utils::{build_mmc1, build_nrom_with_prg, nes_with_prg};

    /// Turns on NMI, rendering and a pulse tone, then counts in a loop.
    fn busy_rom() -> Vec<u8> {
        let mut prg = vec![0xEA; 0x40];
        let program = [
            0xA9, 0x80, 0x8D, 0x00, 0x20, // LDA #$80; STA $2000
            0xA9, 0x1E, 0x8D, 0x01, 0x20, // LDA #$1E; STA $2001
            0xA9, 0x01, 0x8D, 0x15, 0x40, // LDA #$01; STA $4015
            0xA9, 0xBF, 0x8D, 0x00, 0x40, // LDA #$BF; STA $4000
            0xA9, 0xFD, 0x8D, 0x02, 0x40, // LDA #$FD; STA $4002
            0xA9, 0x08, 0x8D, 0x03, 0x40, // LDA #$08; STA $4003
            0xE8, 0x8E, 0x10, 0x00, 0x4C, 0x1E, 0x80, // loop: INX; STX $10; JMP loop
        ];
        prg[..program.len()].copy_from_slice(&program);
        // NMI: INC $11; RTI
        prg[0x30..0x34].copy_from_slice(&[0xEE, 0x11, 0x00, 0x40]);
        build_nrom_with_prg(&prg, Some((0x8000, 0x8030, 0x8000)))
    }

    type Recording = Rc<RefCell<(Vec<Vec<u32>>, Vec<f32>)>>;

    fn record(nes: &mut Nes) -> Recording {
        let out: Recording = Rc::new(RefCell::new((Vec::new(), Vec::new())));
        let frames = out.clone();
        nes.set_frame_callback(move |buf| frames.borrow_mut().0.push(buf.to_vec()));
        let samples = out.clone();
        nes.set_sample_callback(move |s| samples.borrow_mut().1.push(s));
        out
    }

    #[test]
    fn restore_of_fresh_capture_changes_nothing() {
        let mut nes = Nes::from_ines_bytes(&busy_rom()).expect("valid image");
        for _ in 0..5_000 {
            nes.step().expect("runs");
        }
        let before = nes.save_state().to_bytes().expect("encodes");
        let snapshot = nes.save_state();
        nes.load_state(&snapshot).expect("restores");
        assert_eq!(nes.save_state().to_bytes().expect("encodes"), before);
    }

    #[test]
    fn thousand_steps_replay_identically() {
        let mut nes = Nes::from_ines_bytes(&busy_rom()).expect("valid image");
        nes.run_frame().expect("first frame");
        while nes.bus().ppu().scanline() < 240 {
            nes.step().expect("runs");
        }
        let snapshot = nes.save_state();

        let first = record(&mut nes);
        for _ in 0..1_000 {
            nes.step().expect("runs");
        }
        let after_first = nes.save_state().to_bytes().expect("encodes");

        nes.load_state(&snapshot).expect("restores");
        let second = record(&mut nes);
        for _ in 0..1_000 {
            nes.step().expect("runs");
        }

        let (a, b) = (first.borrow(), second.borrow());
        assert_eq!(a.0.len(), 1, "a frame completes inside the window");
        assert!(!a.1.is_empty());
        assert!(a.1.iter().any(|&s| s != 0.0), "pulse channel is audible");
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
        assert_eq!(nes.save_state().to_bytes().expect("encodes"), after_first);
    }

    #[test]
    fn bytes_round_trip() {
        let mut nes = Nes::from_ines_bytes(&busy_rom()).expect("valid image");
        for _ in 0..2_000 {
            nes.step().expect("runs");
        }
        let bytes = nes.save_state().to_bytes().expect("encodes");
        let decoded = SaveState::from_bytes(&bytes).expect("decodes");
        assert_eq!(decoded.to_bytes().expect("encodes"), bytes);

        let mut other = Nes::from_ines_bytes(&busy_rom()).expect("valid image");
        other.load_state(&decoded).expect("same cartridge");
        assert_eq!(other.cpu().state(), nes.cpu().state());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            SaveState::from_bytes(&[1, 2, 3]),
            Err(StateError::Encoding(_))
        ));
    }

    #[test]
    fn wrong_mapper_is_rejected_without_changes() {
        let nrom = nes_with_prg(&[]);
        let state = nrom.save_state();

        let mut mmc1 = Nes::from_ines_bytes(&build_mmc1(4, 1)).expect("valid image");
        let before = mmc1.save_state().to_bytes().expect("encodes");
        assert!(matches!(
            mmc1.load_state(&state),
            Err(StateError::MapperMismatch { .. })
        ));
        assert_eq!(mmc1.save_state().to_bytes().expect("encodes"), before);
    }

    #[test]
    fn corrupt_counters_are_rejected_without_changes() {
        let mut nes = Nes::from_ines_bytes(&build_mmc1(4, 1)).expect("valid image");
        nes.bus_mut().write(0x8000, 1);
        let good = nes.save_state();
        let before = good.to_bytes().expect("encodes");

        let mut bad = SaveState::from_bytes(&before).expect("decodes");
        let MapperState::Mmc1(mmc1) = &mut bad.mapper else {
            unreachable!("mmc1 cartridge");
        };
        mmc1.write_count = 9;
        bad.ram.write(0, 0x55);
        assert!(matches!(
            nes.load_state(&bad),
            Err(StateError::OutOfRange { field: "mmc1 write_count", .. })
        ));
        assert_eq!(nes.save_state().to_bytes().expect("encodes"), before);

        nes.load_state(&good).expect("untouched snapshot restores");
    }

    #[test]
    fn foreign_header_mirroring_is_rejected() {
        let horizontal = nes_with_prg(&[]);
        let mut rom = build_nrom_with_prg(&[], None);
        rom[6] |= 0x01;
        let mut vertical = Nes::from_ines_bytes(&rom).expect("valid image");
        assert!(matches!(
            vertical.load_state(&horizontal.save_state()),
            Err(StateError::MirroringMismatch { .. })
        ));
    }
}

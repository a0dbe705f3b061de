//! Error types for loading cartridges, executing code and restoring state.
//!
//! Load and state errors are reported before anything is mutated. The only
//! execution error is an undefined opcode, which halts emulation.

use thiserror::Error;

use crate::cartridge::Mirroring;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("image too small for iNES header ({0} bytes)")]
    TooSmall(usize),
    #[error("invalid iNES header magic (expected NES<1A>)")]
    BadSignature,
    #[error("NES 2.0 format is not supported")]
    Ines2Unsupported,
    #[error("image truncated while reading {section} (need {needed} bytes, have {available})")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("unsupported mapper id: {0}")]
    UnsupportedMapper(u16),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CpuError {
    #[error("invalid opcode {opcode:02X} at {pc:04X}")]
    InvalidOpcode { opcode: u8, pc: u16 },
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("save state belongs to mapper {found}, cartridge uses mapper {expected}")]
    MapperMismatch { expected: u16, found: u16 },
    #[error("save state field {field} has length {found}, expected {expected}")]
    SizeMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("save state field {field} holds {value}, allowed {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("save state was taken with {found:?} mirroring, cartridge uses {expected:?}")]
    MirroringMismatch {
        expected: Mirroring,
        found: Mirroring,
    },
    #[error("save state encoding failed: {0}")]
    Encoding(#[from] bincode::Error),
}

/// Umbrella error for the console driver and binaries.
#[derive(Debug, Error)]
pub enum EmuError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Cpu(#[from] CpuError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

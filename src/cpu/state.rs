/*!
state.rs - 6502 architectural state (registers, flags, cycle counters).

Overview
========
`CpuState` owns every architecturally visible register plus the two
counters the core needs for timing: the running cycle count and the extra
cycles accumulated by the instruction being executed (page crossings,
taken branches). It holds no bus and no decode logic.

Status Register Bit Layout
==========================
Bit: 7 6 5 4 3 2 1 0
     N V 1 B D I Z C

Only the six real flags (N V D I Z C) are stored. Bit 5 reads as 1 and
bit 4 exists only in the byte pushed by PHP/BRK; PLP and RTI drop both.
*/

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::bits;
use crate::bus::CpuBus;

bitflags! {
    /// Processor status flags.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Status: u8 {
        const CARRY = 0b0000_0001;
        const ZERO = 0b0000_0010;
        const IRQ_DISABLE = 0b0000_0100;
        const DECIMAL = 0b0000_1000;
        const BREAK = 0b0001_0000;
        const UNUSED = 0b0010_0000;
        const OVERFLOW = 0b0100_0000;
        const NEGATIVE = 0b1000_0000;
    }
}

const STACK_PAGE: u16 = 0x0100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: Status,
    /// Total cycles executed since power-on.
    pub cycles: u64,
    /// Penalty cycles charged by the instruction currently executing.
    pub extra_cycles: u32,
}

impl Default for CpuState {
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: Status::IRQ_DISABLE,
            cycles: 0,
            extra_cycles: 0,
        }
    }
}

impl CpuState {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Flags
    // ---------------------------------------------------------------------

    #[inline]
    pub fn flag(&self, f: Status) -> bool {
        self.status.contains(f)
    }

    #[inline]
    pub fn set_flag(&mut self, f: Status, on: bool) {
        self.status.set(f, on);
    }

    /// ZERO + NEGATIVE from a produced value.
    #[inline]
    pub fn update_zn(&mut self, value: u8) {
        self.status.set(Status::ZERO, value == 0);
        self.status.set(Status::NEGATIVE, bits::is_negative(value));
    }

    /// Status byte as pushed to the stack. Bit 5 is always set.
    pub fn status_for_push(&self, with_break: bool) -> u8 {
        let mut v = self.status | Status::UNUSED;
        v.set(Status::BREAK, with_break);
        v.bits()
    }

    /// Load flags from a pulled byte, ignoring bits 4 and 5.
    pub fn set_status_from_stack(&mut self, value: u8) {
        self.status = Status::from_bits_truncate(value) - (Status::BREAK | Status::UNUSED);
    }

    // ---------------------------------------------------------------------
    // Stack
    // ---------------------------------------------------------------------
    //   Push: write at $0100 | SP, then SP -= 1
    //   Pull: SP += 1, then read at $0100 | SP

    #[inline]
    pub fn push(&mut self, bus: &mut dyn CpuBus, value: u8) {
        bus.write(STACK_PAGE | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    #[inline]
    pub fn pop(&mut self, bus: &mut dyn CpuBus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_PAGE | self.sp as u16)
    }

    /// High byte first, so the word reads back little-endian.
    pub fn push_word(&mut self, bus: &mut dyn CpuBus, value: u16) {
        self.push(bus, bits::high_byte(value));
        self.push(bus, bits::low_byte(value));
    }

    pub fn pop_word(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let lo = self.pop(bus);
        let hi = self.pop(bus);
        bits::build_u16(hi, lo)
    }
}

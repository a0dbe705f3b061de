/*!
addressing.rs - 6502 addressing modes and operand resolution

Overview
========
Each `AddressingMode` knows how many operand bytes follow the opcode and
how to turn those bytes (`input`) into an effective address or a value.

- Zero-page forms wrap inside page zero.
- `Indirect` reproduces the JMP page-wrap quirk: a pointer at $xxFF takes
  its high byte from $xx00.
- Indexed absolute and `(zp),Y` charge one extra cycle when the index
  carries into the next page, but only for operations flagged with the
  page-cross penalty. The charge accumulates in `CpuState::extra_cycles`.
- `Relative` resolves the branch target from the address of the next
  instruction; branch instructions charge their own taken/page penalties.

Caller Assumptions
==================
PC already points past the operand bytes when `address`/`value` run.
*/

use crate::bits;
use crate::bus::CpuBus;
use crate::cpu::state::CpuState;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirect,
    IndirectIndexed,
    Relative,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    pub const fn operand_bytes(self) -> u16 {
        use AddressingMode::*;
        match self {
            Implied | Accumulator => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndexedIndirect | IndirectIndexed
            | Relative => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }

    /// Effective address for `input`. Modes without an address return 0.
    pub fn address(
        self,
        cpu: &mut CpuState,
        bus: &mut dyn CpuBus,
        input: u16,
        page_penalty: bool,
    ) -> u16 {
        use AddressingMode::*;
        match self {
            Implied | Accumulator | Immediate => 0,
            ZeroPage => input & 0x00FF,
            ZeroPageX => (input as u8).wrapping_add(cpu.x) as u16,
            ZeroPageY => (input as u8).wrapping_add(cpu.y) as u16,
            Absolute => input,
            AbsoluteX => {
                let x = cpu.x;
                indexed(cpu, input, x, page_penalty)
            }
            AbsoluteY => {
                let y = cpu.y;
                indexed(cpu, input, y, page_penalty)
            }
            Indirect => read_word_page_wrapped(bus, input),
            IndexedIndirect => {
                let zp = (input as u8).wrapping_add(cpu.x);
                read_word_zero_page(bus, zp)
            }
            IndirectIndexed => {
                let base = read_word_zero_page(bus, input as u8);
                let y = cpu.y;
                indexed(cpu, base, y, page_penalty)
            }
            Relative => {
                let offset = bits::to_signed(input as u8) as i16;
                cpu.pc.wrapping_add(offset as u16)
            }
        }
    }

    /// Operand value for `input`: the inline byte for immediate mode, A for
    /// accumulator mode, otherwise the byte at the effective address.
    pub fn value(
        self,
        cpu: &mut CpuState,
        bus: &mut dyn CpuBus,
        input: u16,
        page_penalty: bool,
    ) -> u8 {
        match self {
            AddressingMode::Immediate => input as u8,
            AddressingMode::Accumulator => cpu.a,
            AddressingMode::Implied => 0,
            _ => {
                let addr = self.address(cpu, bus, input, page_penalty);
                bus.read(addr)
            }
        }
    }
}

#[inline]
fn indexed(cpu: &mut CpuState, base: u16, index: u8, page_penalty: bool) -> u16 {
    let addr = base.wrapping_add(index as u16);
    if page_penalty && bits::page_crossed(base, addr) {
        cpu.extra_cycles += 1;
    }
    addr
}

/// Little-endian word from page zero; the high byte wraps to $00.
pub(crate) fn read_word_zero_page(bus: &mut dyn CpuBus, ptr: u8) -> u16 {
    let lo = bus.read(ptr as u16);
    let hi = bus.read(ptr.wrapping_add(1) as u16);
    bits::build_u16(hi, lo)
}

/// Little-endian word whose high byte never leaves the pointer's page.
pub(crate) fn read_word_page_wrapped(bus: &mut dyn CpuBus, ptr: u16) -> u16 {
    let lo = bus.read(ptr);
    let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
    let hi = bus.read(hi_addr);
    bits::build_u16(hi, lo)
}

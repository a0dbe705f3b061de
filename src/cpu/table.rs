/*!
table.rs - 256-entry opcode table.

Each populated entry pairs an `Instruction` with its addressing mode, the
base cycle count, and whether indexed page crossings (or taken branches)
may add cycles. Undocumented opcodes are left empty; the decoder reports
them as invalid.

The table is built once at compile time by `build`.
*/

use crate::cpu::addressing::AddressingMode;
use crate::cpu::execute::{self as ex, Instruction};

#[derive(Copy, Clone, Debug)]
pub struct Operation {
    pub instruction: Instruction,
    pub mode: AddressingMode,
    pub cycles: u8,
    pub page_penalty: bool,
}

pub static OPERATIONS: [Option<Operation>; 256] = build();

#[inline]
pub fn lookup(opcode: u8) -> Option<&'static Operation> {
    OPERATIONS[opcode as usize].as_ref()
}

const fn op(instruction: Instruction, mode: AddressingMode, cycles: u8) -> Option<Operation> {
    Some(Operation {
        instruction,
        mode,
        cycles,
        page_penalty: false,
    })
}

// Base cost plus one on an indexed page crossing / taken branch
const fn op_p(instruction: Instruction, mode: AddressingMode, cycles: u8) -> Option<Operation> {
    Some(Operation {
        instruction,
        mode,
        cycles,
        page_penalty: true,
    })
}

/// Fill the eight standard slots of a group-one ALU read instruction.
const fn alu(t: &mut [Option<Operation>; 256], i: Instruction, base: usize) {
    use AddressingMode::*;
    t[base + 0x09] = op(i, Immediate, 2);
    t[base + 0x05] = op(i, ZeroPage, 3);
    t[base + 0x15] = op(i, ZeroPageX, 4);
    t[base + 0x0D] = op(i, Absolute, 4);
    t[base + 0x1D] = op_p(i, AbsoluteX, 4);
    t[base + 0x19] = op_p(i, AbsoluteY, 4);
    t[base + 0x01] = op(i, IndexedIndirect, 6);
    t[base + 0x11] = op_p(i, IndirectIndexed, 5);
}

/// Shift/rotate slots: accumulator, zp, zp,X, abs, abs,X.
const fn shift(t: &mut [Option<Operation>; 256], i: Instruction, base: usize) {
    use AddressingMode::*;
    t[base + 0x0A] = op(i, Accumulator, 2);
    t[base + 0x06] = op(i, ZeroPage, 5);
    t[base + 0x16] = op(i, ZeroPageX, 6);
    t[base + 0x0E] = op(i, Absolute, 6);
    t[base + 0x1E] = op(i, AbsoluteX, 7);
}

const fn build() -> [Option<Operation>; 256] {
    use AddressingMode::*;
    let mut t: [Option<Operation>; 256] = [None; 256];

    alu(&mut t, ex::ORA, 0x00);
    alu(&mut t, ex::AND, 0x20);
    alu(&mut t, ex::EOR, 0x40);
    alu(&mut t, ex::ADC, 0x60);
    alu(&mut t, ex::LDA, 0xA0);
    alu(&mut t, ex::CMP, 0xC0);
    alu(&mut t, ex::SBC, 0xE0);

    // STA has no immediate form and never takes the page penalty
    t[0x85] = op(ex::STA, ZeroPage, 3);
    t[0x95] = op(ex::STA, ZeroPageX, 4);
    t[0x8D] = op(ex::STA, Absolute, 4);
    t[0x9D] = op(ex::STA, AbsoluteX, 5);
    t[0x99] = op(ex::STA, AbsoluteY, 5);
    t[0x81] = op(ex::STA, IndexedIndirect, 6);
    t[0x91] = op(ex::STA, IndirectIndexed, 6);

    shift(&mut t, ex::ASL, 0x00);
    shift(&mut t, ex::ROL, 0x20);
    shift(&mut t, ex::LSR, 0x40);
    shift(&mut t, ex::ROR, 0x60);

    t[0xC6] = op(ex::DEC, ZeroPage, 5);
    t[0xD6] = op(ex::DEC, ZeroPageX, 6);
    t[0xCE] = op(ex::DEC, Absolute, 6);
    t[0xDE] = op(ex::DEC, AbsoluteX, 7);
    t[0xE6] = op(ex::INC, ZeroPage, 5);
    t[0xF6] = op(ex::INC, ZeroPageX, 6);
    t[0xEE] = op(ex::INC, Absolute, 6);
    t[0xFE] = op(ex::INC, AbsoluteX, 7);

    t[0xA2] = op(ex::LDX, Immediate, 2);
    t[0xA6] = op(ex::LDX, ZeroPage, 3);
    t[0xB6] = op(ex::LDX, ZeroPageY, 4);
    t[0xAE] = op(ex::LDX, Absolute, 4);
    t[0xBE] = op_p(ex::LDX, AbsoluteY, 4);
    t[0xA0] = op(ex::LDY, Immediate, 2);
    t[0xA4] = op(ex::LDY, ZeroPage, 3);
    t[0xB4] = op(ex::LDY, ZeroPageX, 4);
    t[0xAC] = op(ex::LDY, Absolute, 4);
    t[0xBC] = op_p(ex::LDY, AbsoluteX, 4);

    t[0x86] = op(ex::STX, ZeroPage, 3);
    t[0x96] = op(ex::STX, ZeroPageY, 4);
    t[0x8E] = op(ex::STX, Absolute, 4);
    t[0x84] = op(ex::STY, ZeroPage, 3);
    t[0x94] = op(ex::STY, ZeroPageX, 4);
    t[0x8C] = op(ex::STY, Absolute, 4);

    t[0xE0] = op(ex::CPX, Immediate, 2);
    t[0xE4] = op(ex::CPX, ZeroPage, 3);
    t[0xEC] = op(ex::CPX, Absolute, 4);
    t[0xC0] = op(ex::CPY, Immediate, 2);
    t[0xC4] = op(ex::CPY, ZeroPage, 3);
    t[0xCC] = op(ex::CPY, Absolute, 4);

    t[0x24] = op(ex::BIT, ZeroPage, 3);
    t[0x2C] = op(ex::BIT, Absolute, 4);

    t[0x10] = op_p(ex::BPL, Relative, 2);
    t[0x30] = op_p(ex::BMI, Relative, 2);
    t[0x50] = op_p(ex::BVC, Relative, 2);
    t[0x70] = op_p(ex::BVS, Relative, 2);
    t[0x90] = op_p(ex::BCC, Relative, 2);
    t[0xB0] = op_p(ex::BCS, Relative, 2);
    t[0xD0] = op_p(ex::BNE, Relative, 2);
    t[0xF0] = op_p(ex::BEQ, Relative, 2);

    t[0x4C] = op(ex::JMP, Absolute, 3);
    t[0x6C] = op(ex::JMP, Indirect, 5);
    t[0x20] = op(ex::JSR, Absolute, 6);
    t[0x60] = op(ex::RTS, Implied, 6);
    t[0x40] = op(ex::RTI, Implied, 6);
    t[0x00] = op(ex::BRK, Implied, 7);

    t[0x48] = op(ex::PHA, Implied, 3);
    t[0x08] = op(ex::PHP, Implied, 3);
    t[0x68] = op(ex::PLA, Implied, 4);
    t[0x28] = op(ex::PLP, Implied, 4);

    t[0x18] = op(ex::CLC, Implied, 2);
    t[0x38] = op(ex::SEC, Implied, 2);
    t[0x58] = op(ex::CLI, Implied, 2);
    t[0x78] = op(ex::SEI, Implied, 2);
    t[0xB8] = op(ex::CLV, Implied, 2);
    t[0xD8] = op(ex::CLD, Implied, 2);
    t[0xF8] = op(ex::SED, Implied, 2);

    t[0xAA] = op(ex::TAX, Implied, 2);
    t[0xA8] = op(ex::TAY, Implied, 2);
    t[0x8A] = op(ex::TXA, Implied, 2);
    t[0x98] = op(ex::TYA, Implied, 2);
    t[0xBA] = op(ex::TSX, Implied, 2);
    t[0x9A] = op(ex::TXS, Implied, 2);

    t[0xE8] = op(ex::INX, Implied, 2);
    t[0xC8] = op(ex::INY, Implied, 2);
    t[0xCA] = op(ex::DEX, Implied, 2);
    t[0x88] = op(ex::DEY, Implied, 2);

    t[0xEA] = op(ex::NOP, Implied, 2);

    t
}

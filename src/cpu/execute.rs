/*!
execute.rs - 6502 instruction semantics

Purpose
=======
Every documented mnemonic is an immutable `Instruction` descriptor: its
name, the operand kind it consumes, and a plain function pointer that
applies its effect to `CpuState` (and the bus, for stores, read-modify-write
and stack traffic). The opcode table pairs these with addressing modes.

Operand kinds
-------------
- `None`: implied instructions (flags, transfers, stack, returns).
- `Value`: the addressing mode resolves a byte (loads, ALU, compares).
- `Address`: the addressing mode resolves an effective address (stores,
  jumps, branches, read-modify-write). Shifts and rotates in accumulator
  mode receive `Operand::Accumulator` instead.

Design Notes
============
- Decimal mode is ignored by ADC/SBC, as on the console's CPU.
- Branches add 1 cycle when taken and 1 more when the target lies on a
  different page than the next instruction.
*/

use crate::bits;
use crate::bus::CpuBus;
use crate::cpu::state::{CpuState, Status};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperandKind {
    None,
    Value,
    Address,
}

/// Operand handed to an execution function after address resolution.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    None,
    Value(u8),
    Address(u16),
    Accumulator,
}

impl Operand {
    #[inline]
    fn value(self) -> u8 {
        match self {
            Operand::Value(v) => v,
            _ => 0,
        }
    }

    #[inline]
    fn address(self) -> u16 {
        match self {
            Operand::Address(a) => a,
            _ => 0,
        }
    }
}

pub type ExecFn = fn(&mut CpuState, &mut dyn CpuBus, Operand);

#[derive(Copy, Clone)]
pub struct Instruction {
    pub name: &'static str,
    pub operand: OperandKind,
    pub execute: ExecFn,
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

const fn instr(name: &'static str, operand: OperandKind, execute: ExecFn) -> Instruction {
    Instruction {
        name,
        operand,
        execute,
    }
}

// ---------------------------------------------------------------------------
// Interrupt entry (shared with BRK)
// ---------------------------------------------------------------------------

/// Push PC and status, set I, and jump through `vector`.
pub(crate) fn enter_interrupt(
    cpu: &mut CpuState,
    bus: &mut dyn CpuBus,
    vector: u16,
    with_break: bool,
) {
    let pc = cpu.pc;
    cpu.push_word(bus, pc);
    let status = cpu.status_for_push(with_break);
    cpu.push(bus, status);
    cpu.set_flag(Status::IRQ_DISABLE, true);
    cpu.pc = bus.read_word(vector);
}

// ---------------------------------------------------------------------------
// ALU helpers
// ---------------------------------------------------------------------------

fn add_with_carry(cpu: &mut CpuState, value: u8) {
    let a = cpu.a;
    let sum = a as u16 + value as u16 + cpu.flag(Status::CARRY) as u16;
    let result = sum as u8;
    cpu.set_flag(Status::CARRY, sum > 0xFF);
    // Signed overflow: both inputs share a sign the result does not
    cpu.set_flag(Status::OVERFLOW, (!(a ^ value) & (a ^ result) & 0x80) != 0);
    cpu.a = result;
    cpu.update_zn(result);
}

fn compare(cpu: &mut CpuState, register: u8, value: u8) {
    cpu.set_flag(Status::CARRY, register >= value);
    cpu.update_zn(register.wrapping_sub(value));
}

/// Read-modify-write on memory or A, returning nothing; `f` yields
/// (result, carry-out).
fn modify(
    cpu: &mut CpuState,
    bus: &mut dyn CpuBus,
    op: Operand,
    f: impl Fn(u8, bool) -> (u8, bool),
) {
    let carry_in = cpu.flag(Status::CARRY);
    let result = match op {
        Operand::Accumulator => {
            let (r, c) = f(cpu.a, carry_in);
            cpu.a = r;
            cpu.set_flag(Status::CARRY, c);
            r
        }
        _ => {
            let addr = op.address();
            let (r, c) = f(bus.read(addr), carry_in);
            bus.write(addr, r);
            cpu.set_flag(Status::CARRY, c);
            r
        }
    };
    cpu.update_zn(result);
}

fn step_memory(cpu: &mut CpuState, bus: &mut dyn CpuBus, op: Operand, delta: u8) {
    let addr = op.address();
    let result = bus.read(addr).wrapping_add(delta);
    bus.write(addr, result);
    cpu.update_zn(result);
}

fn branch(cpu: &mut CpuState, op: Operand, taken: bool) {
    if !taken {
        return;
    }
    let target = op.address();
    cpu.extra_cycles += 1;
    if bits::page_crossed(cpu.pc, target) {
        cpu.extra_cycles += 1;
    }
    cpu.pc = target;
}

// ---------------------------------------------------------------------------
// Execution functions
// ---------------------------------------------------------------------------

fn adc(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    add_with_carry(cpu, op.value());
}

fn sbc(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    add_with_carry(cpu, op.value() ^ 0xFF);
}

fn and(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    cpu.a &= op.value();
    cpu.update_zn(cpu.a);
}

fn ora(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    cpu.a |= op.value();
    cpu.update_zn(cpu.a);
}

fn eor(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    cpu.a ^= op.value();
    cpu.update_zn(cpu.a);
}

fn bit(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let v = op.value();
    cpu.set_flag(Status::ZERO, cpu.a & v == 0);
    cpu.set_flag(Status::OVERFLOW, v & 0x40 != 0);
    cpu.set_flag(Status::NEGATIVE, v & 0x80 != 0);
}

fn cmp(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let a = cpu.a;
    compare(cpu, a, op.value());
}

fn cpx(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let x = cpu.x;
    compare(cpu, x, op.value());
}

fn cpy(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let y = cpu.y;
    compare(cpu, y, op.value());
}

fn lda(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    cpu.a = op.value();
    cpu.update_zn(cpu.a);
}

fn ldx(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    cpu.x = op.value();
    cpu.update_zn(cpu.x);
}

fn ldy(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    cpu.y = op.value();
    cpu.update_zn(cpu.y);
}

fn sta(cpu: &mut CpuState, bus: &mut dyn CpuBus, op: Operand) {
    bus.write(op.address(), cpu.a);
}

fn stx(cpu: &mut CpuState, bus: &mut dyn CpuBus, op: Operand) {
    bus.write(op.address(), cpu.x);
}

fn sty(cpu: &mut CpuState, bus: &mut dyn CpuBus, op: Operand) {
    bus.write(op.address(), cpu.y);
}

fn asl(cpu: &mut CpuState, bus: &mut dyn CpuBus, op: Operand) {
    modify(cpu, bus, op, |v, _| (v << 1, v & 0x80 != 0));
}

fn lsr(cpu: &mut CpuState, bus: &mut dyn CpuBus, op: Operand) {
    modify(cpu, bus, op, |v, _| (v >> 1, v & 0x01 != 0));
}

fn rol(cpu: &mut CpuState, bus: &mut dyn CpuBus, op: Operand) {
    modify(cpu, bus, op, |v, c| ((v << 1) | c as u8, v & 0x80 != 0));
}

fn ror(cpu: &mut CpuState, bus: &mut dyn CpuBus, op: Operand) {
    modify(cpu, bus, op, |v, c| ((v >> 1) | ((c as u8) << 7), v & 0x01 != 0));
}

fn inc(cpu: &mut CpuState, bus: &mut dyn CpuBus, op: Operand) {
    step_memory(cpu, bus, op, 1);
}

fn dec(cpu: &mut CpuState, bus: &mut dyn CpuBus, op: Operand) {
    step_memory(cpu, bus, op, 0xFF);
}

fn inx(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.x = cpu.x.wrapping_add(1);
    cpu.update_zn(cpu.x);
}

fn iny(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.y = cpu.y.wrapping_add(1);
    cpu.update_zn(cpu.y);
}

fn dex(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.x = cpu.x.wrapping_sub(1);
    cpu.update_zn(cpu.x);
}

fn dey(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.y = cpu.y.wrapping_sub(1);
    cpu.update_zn(cpu.y);
}

fn tax(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.x = cpu.a;
    cpu.update_zn(cpu.x);
}

fn tay(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.y = cpu.a;
    cpu.update_zn(cpu.y);
}

fn txa(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.a = cpu.x;
    cpu.update_zn(cpu.a);
}

fn tya(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.a = cpu.y;
    cpu.update_zn(cpu.a);
}

fn tsx(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.x = cpu.sp;
    cpu.update_zn(cpu.x);
}

// TXS leaves the flags alone
fn txs(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.sp = cpu.x;
}

fn pha(cpu: &mut CpuState, bus: &mut dyn CpuBus, _: Operand) {
    let a = cpu.a;
    cpu.push(bus, a);
}

fn php(cpu: &mut CpuState, bus: &mut dyn CpuBus, _: Operand) {
    let p = cpu.status_for_push(true);
    cpu.push(bus, p);
}

fn pla(cpu: &mut CpuState, bus: &mut dyn CpuBus, _: Operand) {
    cpu.a = cpu.pop(bus);
    cpu.update_zn(cpu.a);
}

fn plp(cpu: &mut CpuState, bus: &mut dyn CpuBus, _: Operand) {
    let p = cpu.pop(bus);
    cpu.set_status_from_stack(p);
}

fn jmp(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    cpu.pc = op.address();
}

fn jsr(cpu: &mut CpuState, bus: &mut dyn CpuBus, op: Operand) {
    let ret = cpu.pc.wrapping_sub(1);
    cpu.push_word(bus, ret);
    cpu.pc = op.address();
}

fn rts(cpu: &mut CpuState, bus: &mut dyn CpuBus, _: Operand) {
    cpu.pc = cpu.pop_word(bus).wrapping_add(1);
}

fn rti(cpu: &mut CpuState, bus: &mut dyn CpuBus, _: Operand) {
    let p = cpu.pop(bus);
    cpu.set_status_from_stack(p);
    cpu.pc = cpu.pop_word(bus);
}

fn brk(cpu: &mut CpuState, bus: &mut dyn CpuBus, _: Operand) {
    // Skip the padding byte after the opcode
    cpu.pc = cpu.pc.wrapping_add(1);
    enter_interrupt(cpu, bus, super::IRQ_VECTOR, true);
}

fn bcc(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let taken = !cpu.flag(Status::CARRY);
    branch(cpu, op, taken);
}

fn bcs(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let taken = cpu.flag(Status::CARRY);
    branch(cpu, op, taken);
}

fn beq(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let taken = cpu.flag(Status::ZERO);
    branch(cpu, op, taken);
}

fn bne(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let taken = !cpu.flag(Status::ZERO);
    branch(cpu, op, taken);
}

fn bmi(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let taken = cpu.flag(Status::NEGATIVE);
    branch(cpu, op, taken);
}

fn bpl(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let taken = !cpu.flag(Status::NEGATIVE);
    branch(cpu, op, taken);
}

fn bvs(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let taken = cpu.flag(Status::OVERFLOW);
    branch(cpu, op, taken);
}

fn bvc(cpu: &mut CpuState, _: &mut dyn CpuBus, op: Operand) {
    let taken = !cpu.flag(Status::OVERFLOW);
    branch(cpu, op, taken);
}

fn clc(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.set_flag(Status::CARRY, false);
}

fn sec(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.set_flag(Status::CARRY, true);
}

fn cli(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.set_flag(Status::IRQ_DISABLE, false);
}

fn sei(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.set_flag(Status::IRQ_DISABLE, true);
}

fn cld(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.set_flag(Status::DECIMAL, false);
}

fn sed(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.set_flag(Status::DECIMAL, true);
}

fn clv(cpu: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {
    cpu.set_flag(Status::OVERFLOW, false);
}

fn nop(_: &mut CpuState, _: &mut dyn CpuBus, _: Operand) {}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

use OperandKind::{Address as A, None as N, Value as V};

pub const ADC: Instruction = instr("ADC", V, adc);
pub const AND: Instruction = instr("AND", V, and);
pub const ASL: Instruction = instr("ASL", A, asl);
pub const BCC: Instruction = instr("BCC", A, bcc);
pub const BCS: Instruction = instr("BCS", A, bcs);
pub const BEQ: Instruction = instr("BEQ", A, beq);
pub const BIT: Instruction = instr("BIT", V, bit);
pub const BMI: Instruction = instr("BMI", A, bmi);
pub const BNE: Instruction = instr("BNE", A, bne);
pub const BPL: Instruction = instr("BPL", A, bpl);
pub const BRK: Instruction = instr("BRK", N, brk);
pub const BVC: Instruction = instr("BVC", A, bvc);
pub const BVS: Instruction = instr("BVS", A, bvs);
pub const CLC: Instruction = instr("CLC", N, clc);
pub const CLD: Instruction = instr("CLD", N, cld);
pub const CLI: Instruction = instr("CLI", N, cli);
pub const CLV: Instruction = instr("CLV", N, clv);
pub const CMP: Instruction = instr("CMP", V, cmp);
pub const CPX: Instruction = instr("CPX", V, cpx);
pub const CPY: Instruction = instr("CPY", V, cpy);
pub const DEC: Instruction = instr("DEC", A, dec);
pub const DEX: Instruction = instr("DEX", N, dex);
pub const DEY: Instruction = instr("DEY", N, dey);
pub const EOR: Instruction = instr("EOR", V, eor);
pub const INC: Instruction = instr("INC", A, inc);
pub const INX: Instruction = instr("INX", N, inx);
pub const INY: Instruction = instr("INY", N, iny);
pub const JMP: Instruction = instr("JMP", A, jmp);
pub const JSR: Instruction = instr("JSR", A, jsr);
pub const LDA: Instruction = instr("LDA", V, lda);
pub const LDX: Instruction = instr("LDX", V, ldx);
pub const LDY: Instruction = instr("LDY", V, ldy);
pub const LSR: Instruction = instr("LSR", A, lsr);
pub const NOP: Instruction = instr("NOP", N, nop);
pub const ORA: Instruction = instr("ORA", V, ora);
pub const PHA: Instruction = instr("PHA", N, pha);
pub const PHP: Instruction = instr("PHP", N, php);
pub const PLA: Instruction = instr("PLA", N, pla);
pub const PLP: Instruction = instr("PLP", N, plp);
pub const ROL: Instruction = instr("ROL", A, rol);
pub const ROR: Instruction = instr("ROR", A, ror);
pub const RTI: Instruction = instr("RTI", N, rti);
pub const RTS: Instruction = instr("RTS", N, rts);
pub const SBC: Instruction = instr("SBC", V, sbc);
pub const SEC: Instruction = instr("SEC", N, sec);
pub const SED: Instruction = instr("SED", N, sed);
pub const SEI: Instruction = instr("SEI", N, sei);
pub const STA: Instruction = instr("STA", A, sta);
pub const STX: Instruction = instr("STX", A, stx);
pub const STY: Instruction = instr("STY", A, sty);
pub const TAX: Instruction = instr("TAX", N, tax);
pub const TAY: Instruction = instr("TAY", N, tay);
pub const TSX: Instruction = instr("TSX", N, tsx);
pub const TXA: Instruction = instr("TXA", N, txa);
pub const TXS: Instruction = instr("TXS", N, txs);
pub const TYA: Instruction = instr("TYA", N, tya);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FlatBus;

    fn run(i: Instruction, cpu: &mut CpuState, bus: &mut FlatBus, op: Operand) {
        (i.execute)(cpu, bus, op);
    }

    #[test]
    fn adc_carry_and_overflow() {
        let mut bus = FlatBus::new();
        let mut cpu = CpuState::new();

        cpu.a = 0x50;
        run(ADC, &mut cpu, &mut bus, Operand::Value(0x50));
        assert_eq!(cpu.a, 0xA0);
        assert!(cpu.flag(Status::OVERFLOW), "pos + pos = neg overflows");
        assert!(cpu.flag(Status::NEGATIVE));
        assert!(!cpu.flag(Status::CARRY));

        cpu.a = 0xD0;
        run(ADC, &mut cpu, &mut bus, Operand::Value(0x90));
        assert_eq!(cpu.a, 0x60);
        assert!(cpu.flag(Status::OVERFLOW), "neg + neg = pos overflows");
        assert!(cpu.flag(Status::CARRY));

        cpu.a = 0xFF;
        run(ADC, &mut cpu, &mut bus, Operand::Value(0x00));
        assert_eq!(cpu.a, 0x00, "carry in wraps to zero");
        assert!(cpu.flag(Status::ZERO) && cpu.flag(Status::CARRY));
        assert!(!cpu.flag(Status::OVERFLOW));
    }

    #[test]
    fn sbc_borrow_and_overflow() {
        let mut bus = FlatBus::new();
        let mut cpu = CpuState::new();

        cpu.set_flag(Status::CARRY, true);
        cpu.a = 0x05;
        run(SBC, &mut cpu, &mut bus, Operand::Value(0x03));
        assert_eq!(cpu.a, 0x02);
        assert!(cpu.flag(Status::CARRY), "no borrow keeps carry set");

        run(SBC, &mut cpu, &mut bus, Operand::Value(0x03));
        assert_eq!(cpu.a, 0xFF);
        assert!(!cpu.flag(Status::CARRY));
        assert!(cpu.flag(Status::NEGATIVE));

        cpu.set_flag(Status::CARRY, true);
        cpu.a = 0x80;
        run(SBC, &mut cpu, &mut bus, Operand::Value(0x01));
        assert_eq!(cpu.a, 0x7F);
        assert!(cpu.flag(Status::OVERFLOW), "neg - pos = pos overflows");
    }

    #[test]
    fn compare_flags() {
        let mut bus = FlatBus::new();
        let mut cpu = CpuState::new();
        cpu.a = 0x40;
        run(CMP, &mut cpu, &mut bus, Operand::Value(0x40));
        assert!(cpu.flag(Status::ZERO) && cpu.flag(Status::CARRY));
        run(CMP, &mut cpu, &mut bus, Operand::Value(0x41));
        assert!(!cpu.flag(Status::CARRY) && cpu.flag(Status::NEGATIVE));
    }

    #[test]
    fn bit_copies_high_bits() {
        let mut bus = FlatBus::new();
        let mut cpu = CpuState::new();
        cpu.a = 0x01;
        run(BIT, &mut cpu, &mut bus, Operand::Value(0xC0));
        assert!(cpu.flag(Status::ZERO));
        assert!(cpu.flag(Status::OVERFLOW) && cpu.flag(Status::NEGATIVE));
    }

    #[test]
    fn rotate_memory_and_accumulator() {
        let mut bus = FlatBus::new();
        let mut cpu = CpuState::new();
        bus.mem[0x10] = 0x81;
        cpu.set_flag(Status::CARRY, false);
        run(ROL, &mut cpu, &mut bus, Operand::Address(0x10));
        assert_eq!(bus.mem[0x10], 0x02);
        assert!(cpu.flag(Status::CARRY));

        cpu.a = 0x01;
        run(ROR, &mut cpu, &mut bus, Operand::Accumulator);
        assert_eq!(cpu.a, 0x80, "carry rotates into bit 7");
        assert!(cpu.flag(Status::CARRY) && cpu.flag(Status::NEGATIVE));
    }

    #[test]
    fn branch_penalties() {
        let mut bus = FlatBus::new();
        let mut cpu = CpuState::new();
        cpu.pc = 0x80F0;
        cpu.set_flag(Status::ZERO, false);
        run(BEQ, &mut cpu, &mut bus, Operand::Address(0x8100));
        assert_eq!((cpu.pc, cpu.extra_cycles), (0x80F0, 0), "not taken");

        run(BNE, &mut cpu, &mut bus, Operand::Address(0x80F8));
        assert_eq!((cpu.pc, cpu.extra_cycles), (0x80F8, 1), "taken, same page");

        cpu.extra_cycles = 0;
        run(BNE, &mut cpu, &mut bus, Operand::Address(0x8104));
        assert_eq!((cpu.pc, cpu.extra_cycles), (0x8104, 2), "taken, new page");
    }

    #[test]
    fn jsr_rts_round_trip() {
        let mut bus = FlatBus::new();
        let mut cpu = CpuState::new();
        cpu.pc = 0x8003; // after a 3-byte JSR at $8000
        run(JSR, &mut cpu, &mut bus, Operand::Address(0x9000));
        assert_eq!(cpu.pc, 0x9000);
        assert_eq!((bus.mem[0x01FD], bus.mem[0x01FC]), (0x80, 0x02));
        run(RTS, &mut cpu, &mut bus, Operand::None);
        assert_eq!(cpu.pc, 0x8003);
    }

    #[test]
    fn php_plp_break_bits() {
        let mut bus = FlatBus::new();
        let mut cpu = CpuState::new();
        cpu.set_flag(Status::CARRY, true);
        run(PHP, &mut cpu, &mut bus, Operand::None);
        assert_eq!(bus.mem[0x01FD], 0x35);
        cpu.set_flag(Status::CARRY, false);
        run(PLP, &mut cpu, &mut bus, Operand::None);
        assert!(cpu.flag(Status::CARRY));
        assert!(!cpu.status.contains(Status::BREAK));
    }

    #[test]
    fn brk_pushes_and_vectors() {
        let mut bus = FlatBus::new();
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0x90;
        let mut cpu = CpuState::new();
        cpu.pc = 0x8001; // after the opcode
        cpu.set_flag(Status::IRQ_DISABLE, false);
        run(BRK, &mut cpu, &mut bus, Operand::None);
        assert_eq!(cpu.pc, 0x9000);
        assert_eq!((bus.mem[0x01FD], bus.mem[0x01FC]), (0x80, 0x02));
        assert_eq!(bus.mem[0x01FB] & 0x30, 0x30, "B and bit 5 pushed");
        assert!(cpu.flag(Status::IRQ_DISABLE));

        run(RTI, &mut cpu, &mut bus, Operand::None);
        assert_eq!(cpu.pc, 0x8002);
        assert!(!cpu.flag(Status::IRQ_DISABLE));
    }
}

/*!
cpu - 6502 core (no decimal mode).

Layout:

```text
state.rs       - Registers, status flags, stack helpers.
addressing.rs  - Addressing modes and operand resolution.
execute.rs     - Instruction descriptors and their semantics.
table.rs       - 256-entry opcode table.
```

`Cpu` is the facade. `step` runs one whole instruction against any
`CpuBus` and returns the cycles it took, including page-cross and branch
penalties plus whatever stall the bus reports (OAM DMA). The CPU never
advances other devices; the console ticks them with the returned count.

Interrupts are entered through `interrupt`. A maskable IRQ is ignored
while I is set; NMI and RESET are not.
*/

pub mod addressing;
pub mod execute;
pub mod state;
pub mod table;

use log::trace;

use crate::bits;
use crate::bus::CpuBus;
use crate::cpu::execute::{Operand, OperandKind};
use crate::error::CpuError;

pub use crate::cpu::state::{CpuState, Status};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycles spent entering any interrupt handler.
pub const INTERRUPT_CYCLES: u32 = 7;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interrupt {
    Nmi,
    Reset,
    Irq,
}

impl Interrupt {
    pub const fn vector(self) -> u16 {
        match self {
            Interrupt::Nmi => NMI_VECTOR,
            Interrupt::Reset => RESET_VECTOR,
            Interrupt::Irq => IRQ_VECTOR,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cpu {
    state: CpuState,
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CpuState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.state
    }

    /// Replace the whole register file (save-state restore).
    pub fn restore(&mut self, state: CpuState) {
        self.state = state;
    }

    /// Power-up registers, PC from the RESET vector. Costs 7 cycles.
    pub fn reset(&mut self, bus: &mut dyn CpuBus) -> u32 {
        self.state = CpuState::new();
        self.state.pc = bus.read_word(RESET_VECTOR);
        self.state.cycles = INTERRUPT_CYCLES as u64;
        trace!("cpu reset: pc={:#06X}", self.state.pc);
        INTERRUPT_CYCLES
    }

    /// Execute one instruction and return the cycles it consumed.
    pub fn step(&mut self, bus: &mut dyn CpuBus) -> Result<u32, CpuError> {
        let cpu = &mut self.state;
        let pc = cpu.pc;
        let opcode = bus.read(pc);
        cpu.pc = pc.wrapping_add(1);

        let Some(operation) = table::lookup(opcode) else {
            return Err(CpuError::InvalidOpcode { opcode, pc });
        };

        let input = match operation.mode.operand_bytes() {
            0 => 0,
            1 => bus.read(cpu.pc) as u16,
            _ => {
                let lo = bus.read(cpu.pc);
                let hi = bus.read(cpu.pc.wrapping_add(1));
                bits::build_u16(hi, lo)
            }
        };
        cpu.pc = cpu.pc.wrapping_add(operation.mode.operand_bytes());

        let instruction = operation.instruction;
        trace!(
            "{:04X}  {:02X}  {} {:?} {:#06X}",
            pc, opcode, instruction.name, operation.mode, input
        );

        let operand = match (instruction.operand, operation.mode) {
            (_, addressing::AddressingMode::Accumulator) => Operand::Accumulator,
            (OperandKind::None, _) => Operand::None,
            (OperandKind::Value, mode) => {
                Operand::Value(mode.value(cpu, bus, input, operation.page_penalty))
            }
            (OperandKind::Address, mode) => {
                Operand::Address(mode.address(cpu, bus, input, operation.page_penalty))
            }
        };

        (instruction.execute)(cpu, bus, operand);

        let cycles = operation.cycles as u32 + cpu.extra_cycles + bus.take_stall_cycles();
        cpu.extra_cycles = 0;
        cpu.cycles += cycles as u64;
        Ok(cycles)
    }

    /// Enter an interrupt handler. Returns the cycles spent, or 0 when a
    /// maskable IRQ is blocked by the I flag.
    ///
    /// `with_break` sets bit 4 of the pushed status, the way BRK does;
    /// hardware NMI and IRQ lines push it clear.
    pub fn interrupt(&mut self, bus: &mut dyn CpuBus, kind: Interrupt, with_break: bool) -> u32 {
        if kind == Interrupt::Reset {
            return self.reset(bus);
        }
        if kind == Interrupt::Irq && self.state.flag(Status::IRQ_DISABLE) {
            return 0;
        }
        trace!("cpu interrupt {:?} at pc={:#06X}", kind, self.state.pc);
        execute::enter_interrupt(&mut self.state, bus, kind.vector(), with_break);
        self.state.cycles += INTERRUPT_CYCLES as u64;
        INTERRUPT_CYCLES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FlatBus;

    fn cpu_with(program: &[u8]) -> (Cpu, FlatBus) {
        let mut bus = FlatBus::with_program(0x8000, program);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    fn run(cpu: &mut Cpu, bus: &mut FlatBus, n: usize) -> u32 {
        (0..n).map(|_| cpu.step(bus).expect("valid opcode")).sum()
    }

    #[test]
    fn reset_loads_vector() {
        let (cpu, _) = cpu_with(&[0xEA]);
        assert_eq!(cpu.state().pc, 0x8000);
        assert_eq!(cpu.state().sp, 0xFD);
        assert_eq!(cpu.state().cycles, 7);
    }

    #[test]
    fn load_store_program() {
        // LDA #$05; STA $0200
        let (mut cpu, mut bus) = cpu_with(&[0xA9, 0x05, 0x8D, 0x00, 0x02]);
        assert_eq!(run(&mut cpu, &mut bus, 2), 6);
        assert_eq!(cpu.state().a, 5);
        assert!(!cpu.state().flag(Status::ZERO));
        assert!(!cpu.state().flag(Status::NEGATIVE));
        assert_eq!(bus.mem[0x0200], 5);
        assert_eq!(cpu.state().pc, 0x8005);
    }

    #[test]
    fn page_cross_read_costs_one() {
        // LDX #$01; LDA $80FF,X ; LDA $8000,X
        let (mut cpu, mut bus) = cpu_with(&[0xA2, 0x01, 0xBD, 0xFF, 0x80, 0xBD, 0x00, 0x80]);
        run(&mut cpu, &mut bus, 1);
        assert_eq!(cpu.step(&mut bus), Ok(5));
        assert_eq!(cpu.step(&mut bus), Ok(4));
    }

    #[test]
    fn store_indexed_has_fixed_cost() {
        // LDX #$01; STA $02FF,X
        let (mut cpu, mut bus) = cpu_with(&[0xA2, 0x01, 0x9D, 0xFF, 0x02]);
        run(&mut cpu, &mut bus, 1);
        assert_eq!(cpu.step(&mut bus), Ok(5));
    }

    #[test]
    fn branch_cycle_counts() {
        // LDX #$00 (Z=1); BNE +2 (not taken); BEQ -6 (taken, back to $8000)
        let (mut cpu, mut bus) = cpu_with(&[0xA2, 0x00, 0xD0, 0x02, 0xF0, 0xFA]);
        run(&mut cpu, &mut bus, 1);
        assert_eq!(cpu.step(&mut bus), Ok(2));
        assert_eq!(cpu.step(&mut bus), Ok(3));
        assert_eq!(cpu.state().pc, 0x8000);
    }

    #[test]
    fn branch_across_page() {
        let mut bus = FlatBus::with_program(0x80F0, &[]);
        // BEQ +$10 at $80FD lands on $810F
        bus.mem[0x80FD] = 0xF0;
        bus.mem[0x80FE] = 0x10;
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.state_mut().pc = 0x80FD;
        cpu.state_mut().set_flag(Status::ZERO, true);
        assert_eq!(cpu.step(&mut bus), Ok(4));
        assert_eq!(cpu.state().pc, 0x810F);
    }

    #[test]
    fn invalid_opcode_reports_pc() {
        let (mut cpu, mut bus) = cpu_with(&[0xEA, 0x02]);
        run(&mut cpu, &mut bus, 1);
        assert_eq!(
            cpu.step(&mut bus),
            Err(CpuError::InvalidOpcode { opcode: 0x02, pc: 0x8001 })
        );
    }

    #[test]
    fn jsr_rts_cycles() {
        // JSR $8004; (BRK padding); RTS at $8004
        let (mut cpu, mut bus) = cpu_with(&[0x20, 0x04, 0x80, 0xEA, 0x60]);
        assert_eq!(cpu.step(&mut bus), Ok(6));
        assert_eq!(cpu.state().pc, 0x8004);
        assert_eq!(cpu.step(&mut bus), Ok(6));
        assert_eq!(cpu.state().pc, 0x8003);
    }

    #[test]
    fn brk_then_rti() {
        let (mut cpu, mut bus) = cpu_with(&[0x00, 0xFF, 0xEA]);
        bus.mem[0xFFFE..].copy_from_slice(&0x9000u16.to_le_bytes());
        bus.mem[0x9000] = 0x40; // RTI
        assert_eq!(cpu.step(&mut bus), Ok(7), "BRK fires even with I set");
        assert_eq!(cpu.state().pc, 0x9000);
        assert_eq!(cpu.step(&mut bus), Ok(6));
        assert_eq!(cpu.state().pc, 0x8002, "padding byte skipped");
    }

    #[test]
    fn irq_masked_by_i_flag() {
        let (mut cpu, mut bus) = cpu_with(&[0xEA]);
        bus.mem[0xFFFE..].copy_from_slice(&0x9000u16.to_le_bytes());
        assert_eq!(cpu.interrupt(&mut bus, Interrupt::Irq, false), 0);
        assert_eq!(cpu.state().pc, 0x8000);

        cpu.state_mut().set_flag(Status::IRQ_DISABLE, false);
        assert_eq!(cpu.interrupt(&mut bus, Interrupt::Irq, false), 7);
        assert_eq!(cpu.state().pc, 0x9000);
        assert_eq!(bus.mem[0x01FB] & 0x30, 0x20, "hardware IRQ pushes B clear");
        assert!(cpu.state().flag(Status::IRQ_DISABLE));
    }

    #[test]
    fn nmi_ignores_i_flag() {
        let (mut cpu, mut bus) = cpu_with(&[0xEA]);
        bus.mem[0xFFFA..0xFFFC].copy_from_slice(&0x9100u16.to_le_bytes());
        let before = cpu.state().cycles;
        assert_eq!(cpu.interrupt(&mut bus, Interrupt::Nmi, false), 7);
        assert_eq!(cpu.state().pc, 0x9100);
        assert_eq!(cpu.state().cycles, before + 7);
    }

    #[test]
    fn break_flag_lands_on_the_stack_only() {
        let (mut cpu, mut bus) = cpu_with(&[0xEA]);
        cpu.state_mut().set_flag(Status::IRQ_DISABLE, false);
        assert_eq!(cpu.interrupt(&mut bus, Interrupt::Irq, true), 7);
        assert_eq!(bus.mem[0x01FB] & 0x30, 0x30);
        assert!(!cpu.state().flag(Status::BREAK));
    }

    #[test]
    fn countdown_loop_terminates() {
        // LDX #$03; loop: DEX; BNE loop; NOP
        let (mut cpu, mut bus) = cpu_with(&[0xA2, 0x03, 0xCA, 0xD0, 0xFD, 0xEA]);
        let cycles = run(&mut cpu, &mut bus, 1 + 3 * 2);
        assert_eq!(cpu.state().x, 0);
        assert_eq!(cpu.state().pc, 0x8005);
        // 2 + 3*DEX(2) + 2*BNE taken(3) + BNE not taken(2)
        assert_eq!(cycles, 2 + 6 + 6 + 2);
    }
}

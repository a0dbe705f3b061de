/*!
Console driver.

`Nes` owns the CPU and the bus (which owns every other device) and runs
the machine one instruction at a time:

1. the CPU executes one instruction (including any OAM DMA halt),
2. the bus advances the PPU 3 dots and the APU 1 step per CPU cycle,
3. a pending NMI is serviced; otherwise a raised IRQ line is serviced
   when the I flag allows it, and those cycles are ticked as well.

Finished frames and mixed samples go to the callbacks installed with
`set_frame_callback` / `set_sample_callback`. They run synchronously
inside `step` and cannot reach back into the console.
*/

use std::path::Path;

use log::{info, warn};

use crate::bus::{Bus, CpuBus};
use crate::cartridge::Cartridge;
use crate::controller::Button;
use crate::cpu::{Cpu, Interrupt};
use crate::error::{CpuError, EmuError, LoadError, StateError};
use crate::save_state::SaveState;

pub type FrameCallback = Box<dyn FnMut(&[u32])>;
pub type SampleCallback = Box<dyn FnMut(f32)>;

pub struct Nes {
    cpu: Cpu,
    bus: Bus,
    on_frame: FrameCallback,
    on_sample: SampleCallback,
}

impl Nes {
    /// Insert `cartridge` and reset the console.
    pub fn new(cartridge: Cartridge) -> Self {
        let mut nes = Self {
            cpu: Cpu::new(),
            bus: Bus::new(cartridge),
            on_frame: Box::new(|_| {}),
            on_sample: Box::new(|_| {}),
        };
        nes.reset();
        nes
    }

    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, LoadError> {
        Ok(Self::new(Cartridge::from_ines_bytes(data)?))
    }

    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, EmuError> {
        Ok(Self::new(Cartridge::from_ines_file(path)?))
    }

    pub fn set_frame_callback(&mut self, callback: impl FnMut(&[u32]) + 'static) {
        self.on_frame = Box::new(callback);
    }

    pub fn set_sample_callback(&mut self, callback: impl FnMut(f32) + 'static) {
        self.on_sample = Box::new(callback);
    }

    /// RESET line: mapper back to power-on banking, CPU through the vector.
    pub fn reset(&mut self) {
        self.bus.cartridge.mapper.reset();
        let cycles = self.cpu.reset(&mut self.bus);
        self.bus.tick(cycles, &mut *self.on_frame, &mut *self.on_sample);
    }

    /// Run one instruction (plus any interrupt entry it leads to) and
    /// return the CPU cycles consumed.
    pub fn step(&mut self) -> Result<u32, CpuError> {
        let mut cycles = self.cpu.step(&mut self.bus)?;
        self.bus.tick(cycles, &mut *self.on_frame, &mut *self.on_sample);

        let taken = if self.bus.ppu.take_nmi() {
            self.cpu.interrupt(&mut self.bus, Interrupt::Nmi, false)
        } else if self.bus.irq_line() {
            self.cpu.interrupt(&mut self.bus, Interrupt::Irq, false)
        } else {
            0
        };
        if taken > 0 {
            self.bus.tick(taken, &mut *self.on_frame, &mut *self.on_sample);
            cycles += taken;
        }
        Ok(cycles)
    }

    /// Step until the PPU completes the current frame.
    pub fn run_frame(&mut self) -> Result<u64, CpuError> {
        let frame = self.bus.ppu.frame();
        let mut cycles = 0u64;
        while self.bus.ppu.frame() == frame {
            cycles += self.step()? as u64;
        }
        Ok(cycles)
    }

    /// Press or release `button` on pad `controller` (0 or 1).
    pub fn set_button(&mut self, controller: usize, button: Button, pressed: bool) {
        match self.bus.controller_mut(controller) {
            Some(pad) => pad.set_button(button, pressed),
            None => warn!("ignoring input for controller {}", controller),
        }
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Current picture, packed `0xAABBGGRR`.
    pub fn frame_buffer(&self) -> &[u32] {
        self.bus.ppu.frame_buffer()
    }

    /// CPU-visible read with side effects, for debuggers and tests.
    pub fn peek(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    pub fn save_state(&self) -> SaveState {
        let state = SaveState {
            cpu: self.cpu.state().clone(),
            ram: self.bus.ram.clone(),
            controllers: self.bus.controllers.clone(),
            cpu_cycle: self.bus.cpu_cycle,
            stall_cycles: self.bus.stall_cycles,
            ppu: self.bus.ppu.clone(),
            apu: self.bus.apu.clone(),
            mapper: self.bus.cartridge.mapper.save_state(),
        };
        info!(
            "captured save state at frame {} (cpu cycle {})",
            state.ppu.frame(),
            state.cpu_cycle
        );
        state
    }

    /// Restore a snapshot taken from a console running the same cartridge.
    /// Every check runs before anything is replaced, so a failed restore
    /// leaves the console untouched.
    pub fn load_state(&mut self, state: &SaveState) -> Result<(), StateError> {
        self.bus.ram.check_compatible(&state.ram)?;
        self.bus.ppu.check_compatible(&state.ppu)?;
        state.apu.validate()?;
        self.bus.cartridge.mapper.load_state(&state.mapper)?;

        self.cpu.restore(state.cpu.clone());
        self.bus.ram = state.ram.clone();
        self.bus.controllers = state.controllers.clone();
        self.bus.cpu_cycle = state.cpu_cycle;
        self.bus.stall_cycles = state.stall_cycles;
        self.bus.ppu = state.ppu.clone();
        self.bus.apu = state.apu.clone();
        info!(
            "restored save state at frame {} (cpu cycle {})",
            state.ppu.frame(),
            state.cpu_cycle
        );
        Ok(())
    }
}

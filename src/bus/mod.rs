#![doc = r#"
Bus module: the CPU-visible address space and the devices behind it.

Modules and responsibilities
- Bus: owns CPU RAM, the PPU, the APU, both controllers and the cartridge,
  and decodes CPU reads/writes to them.
- ram: 2 KiB work RAM with mirroring.
- dma: OAM DMA stall accounting.
- clock: per-CPU-cycle device scheduling (PPU x3, APU x1).

Address map
- $0000-$1FFF: 2 KiB internal RAM, mirrored every $0800
- $2000-$3FFF: PPU registers, mirrored every 8 bytes
- $4000-$4013, $4015: APU
- $4014: OAM DMA (write)
- $4016: controller 1 read, strobe write for both pads
- $4017: controller 2 read, APU frame counter write
- $4018-$401F: unused
- $4020-$FFFF: cartridge (mapper)

Unmapped reads return 0 and unmapped writes are dropped.
"#]

pub mod clock;
pub mod dma;
pub mod ram;

use log::{debug, trace};

use crate::apu::Apu;
use crate::cartridge::Cartridge;
use crate::controller::Controller;
use crate::mapper::Mapper;
use crate::ppu::Ppu;
use ram::Ram;

/// CPU view of memory. The CPU core runs against this trait so it can be
/// tested on a flat memory as well as the real console bus.
pub trait CpuBus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);

    /// Little-endian word at `addr`, `addr + 1`.
    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Cycles the CPU was halted by bus activity since the last call.
    fn take_stall_cycles(&mut self) -> u32 {
        0
    }
}

pub struct Bus {
    pub(crate) ram: Ram,
    pub(crate) ppu: Ppu,
    pub(crate) apu: Apu,
    pub(crate) controllers: [Controller; 2],
    pub(crate) cartridge: Cartridge,
    pub(crate) cpu_cycle: u64,
    pub(crate) stall_cycles: u32,
}

impl Bus {
    pub fn new(cartridge: Cartridge) -> Self {
        let ppu = Ppu::new(cartridge.mirroring());
        Self {
            ram: Ram::new(),
            ppu,
            apu: Apu::new(),
            controllers: [Controller::new(), Controller::new()],
            cartridge,
            cpu_cycle: 0,
            stall_cycles: 0,
        }
    }

    /// Advance the PPU and APU by `cycles` CPU cycles.
    pub fn tick(
        &mut self,
        cycles: u32,
        on_frame: &mut dyn FnMut(&[u32]),
        on_sample: &mut dyn FnMut(f32),
    ) {
        clock::tick(self, cycles, on_frame, on_sample);
    }

    /// Level of the shared IRQ line (APU frame/DMC or cartridge).
    pub fn irq_line(&self) -> bool {
        self.apu.irq_pending() || self.cartridge.mapper.irq_pending()
    }

    pub fn cpu_cycles(&self) -> u64 {
        self.cpu_cycle
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn apu(&self) -> &Apu {
        &self.apu
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn controller_mut(&mut self, index: usize) -> Option<&mut Controller> {
        self.controllers.get_mut(index)
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn mapper(&self) -> &dyn Mapper {
        self.cartridge.mapper.as_ref()
    }

    /// Copy CPU page `page` into OAM and charge the CPU halt.
    fn oam_dma(&mut self, page: u8) {
        let base = dma::source_base(page);
        let mut buf = [0u8; 256];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.read(base + i as u16);
        }
        self.ppu.oam_dma(&buf);
        let stall = dma::stall_cycles(self.cpu_cycle);
        debug!("OAM DMA from {:#06X}, {} stall cycles", base, stall);
        self.stall_cycles += stall;
    }
}

impl CpuBus for Bus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram.read(addr),
            0x2000..=0x3FFF => self.ppu.read_reg(addr, self.cartridge.mapper.as_ref()),
            0x4015 => self.apu.read_reg(addr),
            0x4016 => self.controllers[0].read(),
            0x4017 => self.controllers[1].read(),
            0x4020..=0xFFFF => self.cartridge.mapper.cpu_read(addr),
            _ => {
                trace!("unmapped read {:#06X}", addr);
                0
            }
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram.write(addr, value),
            0x2000..=0x3FFF => {
                self.ppu
                    .write_reg(addr, value, self.cartridge.mapper.as_mut());
            }
            0x4014 => self.oam_dma(value),
            0x4016 => {
                for pad in &mut self.controllers {
                    pad.write_strobe(value);
                }
            }
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write_reg(addr, value),
            0x4020..=0xFFFF => self.cartridge.mapper.cpu_write(addr, value),
            _ => trace!("unmapped write {:#06X} = {:#04X}", addr, value),
        }
    }

    fn take_stall_cycles(&mut self) -> u32 {
        std::mem::take(&mut self.stall_cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Button;
    use crate::cpu::{Cpu, Status};
    use crate::test_utils::{build_nrom_with_prg, cartridge_with_prg};

    fn bus_with(prg: &[u8]) -> Bus {
        Bus::new(cartridge_with_prg(prg))
    }

    #[test]
    fn ram_mirrors_through_1fff() {
        let mut b = bus_with(&[]);
        b.write(0x0002, 0x7E);
        assert_eq!(b.read(0x0802), 0x7E);
        assert_eq!(b.read(0x1802), 0x7E);
    }

    #[test]
    fn ppu_registers_mirror_every_eight_bytes() {
        let mut b = bus_with(&[]);
        // PPUADDR through a mirror, PPUDATA through another
        b.write(0x3FFE, 0x21);
        b.write(0x2006, 0x00);
        b.write(0x200F, 0x99);
        assert_eq!(b.ppu().peek_vram(0x2100, b.mapper()), 0x99);
    }

    #[test]
    fn unmapped_io_reads_zero() {
        let mut b = bus_with(&[]);
        assert_eq!(b.read(0x4000), 0);
        assert_eq!(b.read(0x4018), 0);
        b.write(0x401A, 0xFF);
    }

    #[test]
    fn cartridge_space_reaches_prg() {
        let mut b = bus_with(&[0xA9, 0x05]);
        assert_eq!(b.read(0x8000), 0xA9);
        assert_eq!(b.read(0xC001), 0x05, "16 KiB PRG is mirrored");
        assert_eq!(b.read_word(0xFFFC), 0x8000);
    }

    #[test]
    fn controller_strobe_and_serial_read() {
        let mut b = bus_with(&[]);
        b.controllers[0].set_button(Button::A, true);
        b.controllers[1].set_button(Button::B, true);
        b.write(0x4016, 1);
        b.write(0x4016, 0);
        assert_eq!(b.read(0x4016) & 1, 1);
        assert_eq!(b.read(0x4016) & 1, 0);
        assert_eq!(b.read(0x4017) & 1, 0);
        assert_eq!(b.read(0x4017) & 1, 1);
    }

    #[test]
    fn oam_dma_copies_page_and_stalls() {
        let mut b = bus_with(&[]);
        for i in 0..256u16 {
            b.write(0x0300 + i, i as u8);
        }
        b.write(0x4014, 0x03);
        assert_eq!(b.ppu().peek_oam(0x10), 0x10);
        assert_eq!(b.ppu().peek_oam(0xFF), 0xFF);
        assert_eq!(b.take_stall_cycles(), 513);
        assert_eq!(b.take_stall_cycles(), 0);

        b.tick(1, &mut |_| {}, &mut |_| {});
        b.write(0x4014, 0x03);
        assert_eq!(b.take_stall_cycles(), 514);
    }

    #[test]
    fn lda_sta_end_to_end() {
        // LDA #$05; STA $0200
        let rom = build_nrom_with_prg(&[0xA9, 0x05, 0x8D, 0x00, 0x02], None);
        let cart = Cartridge::from_ines_bytes(&rom).expect("valid image");
        let mut b = Bus::new(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut b);

        let mut cycles = cpu.step(&mut b).expect("LDA");
        cycles += cpu.step(&mut b).expect("STA");

        let s = cpu.state();
        assert_eq!(s.a, 5);
        assert!(!s.flag(Status::ZERO) && !s.flag(Status::NEGATIVE));
        assert_eq!(b.read(0x0200), 5);
        assert_eq!(cycles, 6);
    }

    #[test]
    fn dma_stall_is_charged_to_writing_instruction() {
        // LDA #$02; STA $4014
        let mut b = bus_with(&[0xA9, 0x02, 0x8D, 0x14, 0x40]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut b);
        cpu.step(&mut b).expect("LDA");
        assert_eq!(cpu.step(&mut b).expect("STA"), 4 + 513);
    }

    #[test]
    fn apu_status_visible_at_4015() {
        let mut b = bus_with(&[]);
        b.write(0x4015, 0x01);
        b.write(0x4003, 0x08);
        assert_eq!(b.read(0x4015) & 0x01, 0x01);
        assert!(!b.irq_line());
    }
}

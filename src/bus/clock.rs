/*!
Clock/timing orchestrator for the Bus.

Order of operations for a single CPU cycle:
- increment the CPU cycle counter
- step the PPU three times (it reaches the cartridge through the mapper)
- step the APU once (DMC sample fetches go through the mapper)

Interrupt lines are not latched here. The PPU keeps its NMI request until
the console takes it, and the IRQ line is computed on demand from the
APU and the mapper.
*/

use crate::bus::Bus;

/// Advance every device by `cycles` CPU cycles.
pub fn tick(
    bus: &mut Bus,
    cycles: u32,
    on_frame: &mut dyn FnMut(&[u32]),
    on_sample: &mut dyn FnMut(f32),
) {
    for _ in 0..cycles {
        bus.cpu_cycle = bus.cpu_cycle.wrapping_add(1);

        let mapper = bus.cartridge.mapper.as_mut();
        for _ in 0..3 {
            bus.ppu.step(&mut *mapper, on_frame);
        }
        bus.apu.step(mapper, on_sample);
    }
}

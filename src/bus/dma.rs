/*!
OAM DMA ($4014).

A write of page `$XX` copies `$XX00..=$XXFF` into OAM through OAMDATA and
halts the CPU for 513 cycles, plus one alignment cycle when the transfer
starts on an odd CPU cycle. The copy happens at once; the halt is charged
to the CPU as stall cycles added to the writing instruction, during which
the PPU and APU keep running.
*/

/// Halt length for a transfer started with an even CPU cycle count.
pub const DMA_STALL_CYCLES: u32 = 513;

/// CPU cycles the CPU is halted for a transfer started at `cpu_cycle`.
#[inline]
pub fn stall_cycles(cpu_cycle: u64) -> u32 {
    DMA_STALL_CYCLES + (cpu_cycle % 2) as u32
}

/// First byte of the source page.
#[inline]
pub fn source_base(page: u8) -> u16 {
    (page as u16) << 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_cycle_adds_alignment() {
        assert_eq!(stall_cycles(0), 513);
        assert_eq!(stall_cycles(7), 514);
    }

    #[test]
    fn page_base() {
        assert_eq!(source_base(0x02), 0x0200);
        assert_eq!(source_base(0xFF), 0xFF00);
    }
}

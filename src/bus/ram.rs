/*!
RAM module: the 2 KiB CPU work RAM with mirrored access.

CPU address map for internal RAM:
- $0000-$07FF: 2 KiB internal RAM
- $0800-$1FFF: Mirrors of $0000-$07FF (mask with & 0x07FF)
*/

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::save_state::check_len;

/// Size of CPU internal RAM (in bytes).
pub const CPU_RAM_SIZE: usize = 0x0800;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ram {
    data: Vec<u8>,
}

impl Default for Ram {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Ram {
    pub fn new() -> Self {
        Self {
            data: vec![0; CPU_RAM_SIZE],
        }
    }

    /// Read a byte from CPU-visible RAM space ($0000-$1FFF).
    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.data[Self::mirror_index(addr)]
    }

    /// Write a byte to CPU-visible RAM space ($0000-$1FFF).
    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        let idx = Self::mirror_index(addr);
        self.data[idx] = value;
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Saved RAM must have the physical size before it replaces this one.
    pub fn check_compatible(&self, saved: &Ram) -> Result<(), StateError> {
        check_len("cpu ram", &self.data, &saved.data)
    }

    #[inline]
    pub fn mirror_index(addr: u16) -> usize {
        (addr as usize) & (CPU_RAM_SIZE - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrored_reads_and_writes() {
        let mut r = Ram::new();
        r.write(0x0001, 0xAA);
        assert_eq!(r.read(0x0801), 0xAA);
        assert_eq!(r.read(0x1801), 0xAA);

        r.write(0x1801, 0x55);
        assert_eq!(r.read(0x0001), 0x55);
        assert_eq!(r.as_slice().len(), CPU_RAM_SIZE);
    }

    #[test]
    fn truncated_ram_is_rejected() {
        let r = Ram::new();
        let short = Ram { data: vec![0; 16] };
        assert!(r.check_compatible(&short).is_err());
        assert!(r.check_compatible(&Ram::new()).is_ok());
    }
}

#![doc = r#"
Memory-mapped register building blocks.

Purpose
- Give every 8-bit hardware register a value type (`Reg8`) and a `Register`
  trait with named sub-field accessors.
- Sub-fields are declared once as `BitField` constants (offset + width), so
  field layouts are checked at compile time and read back identically to
  the raw byte.

Notes
- Side effects of a register access (reloading a length counter, resetting
  a sequencer, clearing a status bit) live in the owning component's
  `write_reg`/`read_reg` functions, never in these accessors.
"#]

use serde::{Deserialize, Serialize};

use crate::bits;

/// A named sub-field of an 8-bit register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitField {
    offset: u8,
    width: u8,
}

impl BitField {
    pub const fn new(offset: u8, width: u8) -> Self {
        assert!(width >= 1 && offset + width <= 8, "bit field must fit in a byte");
        Self { offset, width }
    }

    /// Single-bit field at `offset`.
    pub const fn bit(offset: u8) -> Self {
        Self::new(offset, 1)
    }

    #[inline]
    pub const fn get(self, value: u8) -> u8 {
        bits::get_bits(value, self.offset, self.width)
    }

    #[inline]
    pub const fn is_set(self, value: u8) -> bool {
        self.get(value) != 0
    }

    #[inline]
    pub const fn set(self, value: u8, field: u8) -> u8 {
        bits::set_bits(value, self.offset, self.width, field)
    }
}

/// Common interface for an 8-bit register value.
pub trait Register {
    fn read(&self) -> u8;
    fn write(&mut self, value: u8);

    fn field(&self, f: BitField) -> u8 {
        f.get(self.read())
    }

    fn flag(&self, f: BitField) -> bool {
        f.is_set(self.read())
    }

    fn set_field(&mut self, f: BitField, value: u8) {
        let v = f.set(self.read(), value);
        self.write(v);
    }
}

/// Plain 8-bit register storage.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reg8(u8);

impl Reg8 {
    pub const fn new(value: u8) -> Self {
        Self(value)
    }
}

impl Register for Reg8 {
    #[inline]
    fn read(&self) -> u8 {
        self.0
    }

    #[inline]
    fn write(&mut self, value: u8) {
        self.0 = value;
    }
}

/*!
Bit and byte helpers shared by the CPU, PPU and APU.

All helpers are pure and `const` where possible. 16-bit results wrap at
the 16-bit boundary and 8-bit results wrap at 8 bits; callers never see an
out-of-range value.
*/

/// Assemble a little-endian word from its high and low bytes.
#[inline]
pub const fn build_u16(high: u8, low: u8) -> u16 {
    ((high as u16) << 8) | low as u16
}

/// Assemble a 2-bit value (used for pattern-table color indices).
#[inline]
pub const fn build_u2(high_bit: u8, low_bit: u8) -> u8 {
    ((high_bit & 1) << 1) | (low_bit & 1)
}

#[inline]
pub const fn high_byte(value: u16) -> u8 {
    (value >> 8) as u8
}

#[inline]
pub const fn low_byte(value: u16) -> u8 {
    (value & 0x00FF) as u8
}

/// Interpret an 8-bit value as a two's-complement signed byte.
#[inline]
pub const fn to_signed(value: u8) -> i8 {
    value as i8
}

/// Bit `n` (0 = least significant) of `value`, as 0 or 1.
#[inline]
pub const fn get_bit(value: u8, n: u8) -> u8 {
    (value >> n) & 1
}

/// `width` bits of `value` starting at bit `offset`.
#[inline]
pub const fn get_bits(value: u8, offset: u8, width: u8) -> u8 {
    (value >> offset) & mask(width)
}

/// Replace `width` bits of `value` starting at `offset` with `field`.
#[inline]
pub const fn set_bits(value: u8, offset: u8, width: u8, field: u8) -> u8 {
    let m = mask(width) << offset;
    (value & !m) | ((field << offset) & m)
}

/// Low `width` bits set. `width` of 8 yields 0xFF.
#[inline]
pub const fn mask(width: u8) -> u8 {
    if width >= 8 { 0xFF } else { (1u8 << width) - 1 }
}

/// Whether bit 7 is set.
#[inline]
pub const fn is_negative(value: u8) -> bool {
    value & 0x80 != 0
}

/// Whether `a` and `b` fall on different 256-byte pages.
#[inline]
pub const fn page_crossed(a: u16, b: u16) -> bool {
    (a & 0xFF00) != (b & 0xFF00)
}

/// Reverse the bit order of a byte (horizontal sprite flip).
#[inline]
pub const fn reverse8(value: u8) -> u8 {
    value.reverse_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_split_and_join() {
        let w = build_u16(0x12, 0x34);
        assert_eq!(w, 0x1234);
        assert_eq!(high_byte(w), 0x12);
        assert_eq!(low_byte(w), 0x34);
    }

    #[test]
    fn bit_fields() {
        assert_eq!(get_bit(0b1000_0000, 7), 1);
        assert_eq!(get_bits(0b1101_0110, 4, 3), 0b101);
        assert_eq!(set_bits(0xFF, 2, 2, 0b01), 0b1111_0111);
        assert_eq!(mask(8), 0xFF);
        assert_eq!(build_u2(1, 0), 2);
    }

    #[test]
    fn signed_and_pages() {
        assert_eq!(to_signed(0xFE), -2);
        assert_eq!(to_signed(0x7F), 127);
        assert!(page_crossed(0x80FF, 0x8100));
        assert!(!page_crossed(0x8000, 0x80FF));
        assert_eq!(reverse8(0b0000_0001), 0b1000_0000);
    }
}

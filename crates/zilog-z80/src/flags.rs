//! Flag bits and the lookup tables behind the ALU.

/// Carry.
pub const CF: u8 = 0x01;
/// Add/subtract.
pub const NF: u8 = 0x02;
/// Parity/overflow.
pub const PF: u8 = 0x04;
/// Parity/overflow, read as overflow.
pub const VF: u8 = PF;
/// Undocumented bit 3.
pub const XF: u8 = 0x08;
/// Half carry.
pub const HF: u8 = 0x10;
/// Undocumented bit 5.
pub const YF: u8 = 0x20;
/// Zero.
pub const ZF: u8 = 0x40;
/// Sign.
pub const SF: u8 = 0x80;

/// Sign, zero and bits 3/5 of a result.
pub static SZ53: [u8; 256] = build_sz53();

/// `SZ53` plus even parity.
pub static SZ53P: [u8; 256] = build_sz53p();

/// `PF` for bytes with an even number of set bits.
pub static PARITY: [u8; 256] = build_parity();

// The following four are indexed by a 3-bit hash of one bit from each of
// the two operands and the result: bit 3 for half carry, bit 7 for
// overflow.
pub(crate) const HALFCARRY_ADD: [u8; 8] = [0, HF, HF, HF, 0, 0, 0, HF];
pub(crate) const HALFCARRY_SUB: [u8; 8] = [0, 0, HF, 0, HF, 0, HF, HF];
pub(crate) const OVERFLOW_ADD: [u8; 8] = [0, 0, 0, VF, VF, 0, 0, 0];
pub(crate) const OVERFLOW_SUB: [u8; 8] = [0, VF, 0, 0, 0, 0, VF, 0];

const fn build_sz53() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8) & (XF | YF | SF);
        i += 1;
    }
    table[0] |= ZF;
    table
}

const fn build_parity() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        if (i as u8).count_ones() % 2 == 0 {
            table[i] = PF;
        }
        i += 1;
    }
    table
}

const fn build_sz53p() -> [u8; 256] {
    let sz53 = build_sz53();
    let parity = build_parity();
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = sz53[i] | parity[i];
        i += 1;
    }
    table
}

/// Hash bit 3 (or 11 for 16-bit ops) of both operands and the result into
/// the low nibble, bit 7 (or 15) into the high nibble.
#[inline]
pub(crate) fn lookup8(a: u8, value: u8, result: u8) -> usize {
    (((a & 0x88) >> 3) | ((value & 0x88) >> 2) | ((result & 0x88) >> 1)) as usize
}

#[inline]
pub(crate) fn lookup16(a: u16, value: u16, result: u16) -> usize {
    (((a & 0x8800) >> 11) | ((value & 0x8800) >> 10) | ((result & 0x8800) >> 9)) as usize
}

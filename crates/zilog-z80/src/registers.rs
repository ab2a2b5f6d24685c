//! Z80 register file.
//!
//! Every 8-bit register is its own field. 16-bit pairs are composed on
//! demand, either by value (`bc()`, `set_bc()`) or through a
//! [`RegisterPair`] that borrows both halves.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Z80 register file, including the alternate set and interrupt state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    pub ixh: u8,
    pub ixl: u8,
    pub iyh: u8,
    pub iyl: u8,

    pub sp: u16,
    pub pc: u16,

    /// Interrupt vector base.
    pub i: u8,
    /// Refresh counter. Only the low 7 bits count.
    pub r: u8,
    /// Bit 7 of R as last written by `LD R,A` or a snapshot.
    pub r7: u8,

    pub iff1: bool,
    pub iff2: bool,
    /// Interrupt mode, 0 to 2.
    pub im: u8,
}

/// Mutable view of two 8-bit registers as one 16-bit value.
///
/// The high byte is the first register of the pair (B in BC).
pub struct RegisterPair<'a> {
    high: &'a mut u8,
    low: &'a mut u8,
}

impl<'a> RegisterPair<'a> {
    pub fn new(high: &'a mut u8, low: &'a mut u8) -> Self {
        Self { high, low }
    }

    #[must_use]
    pub fn get(&self) -> u16 {
        u16::from_be_bytes([*self.high, *self.low])
    }

    pub fn set(&mut self, value: u16) {
        let [high, low] = value.to_be_bytes();
        *self.high = high;
        *self.low = low;
    }

    pub fn inc(&mut self) {
        let value = self.get().wrapping_add(1);
        self.set(value);
    }

    pub fn dec(&mut self) {
        let value = self.get().wrapping_sub(1);
        self.set(value);
    }
}

macro_rules! pair_accessors {
    ($($get:ident, $set:ident, $pair:ident => $hi:ident, $lo:ident;)*) => {
        $(
            #[must_use]
            pub fn $get(&self) -> u16 {
                u16::from_be_bytes([self.$hi, self.$lo])
            }

            pub fn $set(&mut self, value: u16) {
                [self.$hi, self.$lo] = value.to_be_bytes();
            }

            pub fn $pair(&mut self) -> RegisterPair<'_> {
                RegisterPair::new(&mut self.$hi, &mut self.$lo)
            }
        )*
    };
}

impl Registers {
    pair_accessors! {
        af, set_af, af_pair => a, f;
        bc, set_bc, bc_pair => b, c;
        de, set_de, de_pair => d, e;
        hl, set_hl, hl_pair => h, l;
        ix, set_ix, ix_pair => ixh, ixl;
        iy, set_iy, iy_pair => iyh, iyl;
        af_alt, set_af_alt, af_alt_pair => a_alt, f_alt;
        bc_alt, set_bc_alt, bc_alt_pair => b_alt, c_alt;
        de_alt, set_de_alt, de_alt_pair => d_alt, e_alt;
        hl_alt, set_hl_alt, hl_alt_pair => h_alt, l_alt;
    }

    /// The 8-bit R value as the CPU would read it.
    #[must_use]
    pub fn r_full(&self) -> u8 {
        (self.r & 0x7F) | (self.r7 & 0x80)
    }

    pub fn set_r_full(&mut self, value: u8) {
        self.r = value & 0x7F;
        self.r7 = value & 0x80;
    }

    /// Advance the refresh counter, keeping bit 7.
    pub fn inc_r(&mut self) {
        self.r = self.r.wrapping_add(1) & 0x7F;
    }

    /// I and R as they appear on the address bus during refresh.
    #[must_use]
    pub fn ir(&self) -> u16 {
        u16::from_be_bytes([self.i, self.r_full()])
    }

    pub(crate) fn exchange_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_alt);
        std::mem::swap(&mut self.f, &mut self.f_alt);
    }

    pub(crate) fn exchange_main(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_alt);
        std::mem::swap(&mut self.c, &mut self.c_alt);
        std::mem::swap(&mut self.d, &mut self.d_alt);
        std::mem::swap(&mut self.e, &mut self.e_alt);
        std::mem::swap(&mut self.h, &mut self.h_alt);
        std::mem::swap(&mut self.l, &mut self.l_alt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_preserves_byte_order() {
        let mut regs = Registers::default();
        regs.set_bc(0x1234);
        assert_eq!(regs.b, 0x12);
        assert_eq!(regs.c, 0x34);
        assert_eq!(regs.bc_pair().get(), 0x1234);
    }

    #[test]
    fn pair_inc_dec_wrap() {
        let mut regs = Registers::default();
        regs.set_hl(0xFFFF);
        regs.hl_pair().inc();
        assert_eq!(regs.hl(), 0x0000);
        regs.hl_pair().dec();
        assert_eq!((regs.h, regs.l), (0xFF, 0xFF));
    }

    #[test]
    fn r_keeps_bit_7() {
        let mut regs = Registers::default();
        regs.set_r_full(0xFF);
        regs.inc_r();
        assert_eq!(regs.r_full(), 0x80, "low 7 bits wrap, bit 7 held");
    }

    #[test]
    fn ir_combines_i_and_r() {
        let mut regs = Registers::default();
        regs.i = 0x3F;
        regs.set_r_full(0x81);
        assert_eq!(regs.ir(), 0x3F81);
    }
}

//! Arithmetic, logic, rotate and bit-test operations.
//!
//! These update F exactly as the hardware does, including the undocumented
//! bits 3 and 5. Operations on A write A directly; operations on an
//! arbitrary operand return the new value for the caller to store.

use crate::Z80;
use crate::flags::{
    CF, HALFCARRY_ADD, HALFCARRY_SUB, HF, NF, OVERFLOW_ADD, OVERFLOW_SUB, PARITY, PF, SF, SZ53,
    SZ53P, VF, XF, YF, ZF, lookup8, lookup16,
};

/// Operation selector for the `ALU A,r` block (bits 3-5 of the opcode).
pub(crate) mod op {
    pub const ADD: u8 = 0;
    pub const ADC: u8 = 1;
    pub const SUB: u8 = 2;
    pub const SBC: u8 = 3;
    pub const AND: u8 = 4;
    pub const XOR: u8 = 5;
    pub const OR: u8 = 6;
    pub const CP: u8 = 7;
}

impl Z80 {
    pub(crate) fn alu(&mut self, operation: u8, value: u8) {
        match operation {
            op::ADD => self.add_a(value, 0),
            op::ADC => self.add_a(value, self.regs.f & CF),
            op::SUB => self.sub_a(value, 0),
            op::SBC => self.sub_a(value, self.regs.f & CF),
            op::AND => {
                self.regs.a &= value;
                self.regs.f = HF | SZ53P[self.regs.a as usize];
            }
            op::XOR => {
                self.regs.a ^= value;
                self.regs.f = SZ53P[self.regs.a as usize];
            }
            op::OR => {
                self.regs.a |= value;
                self.regs.f = SZ53P[self.regs.a as usize];
            }
            op::CP => self.cp(value),
            _ => unreachable!(),
        }
    }

    fn add_a(&mut self, value: u8, carry: u8) {
        let a = self.regs.a;
        let sum = u16::from(a) + u16::from(value) + u16::from(carry);
        let result = sum as u8;
        let lookup = lookup8(a, value, result);
        self.regs.a = result;
        self.regs.f = (if sum & 0x100 != 0 { CF } else { 0 })
            | HALFCARRY_ADD[lookup & 0x07]
            | OVERFLOW_ADD[lookup >> 4]
            | SZ53[result as usize];
    }

    fn sub_a(&mut self, value: u8, carry: u8) {
        let a = self.regs.a;
        let diff = u16::from(a)
            .wrapping_sub(u16::from(value))
            .wrapping_sub(u16::from(carry));
        let result = diff as u8;
        let lookup = lookup8(a, value, result);
        self.regs.a = result;
        self.regs.f = (if diff & 0x100 != 0 { CF } else { 0 })
            | NF
            | HALFCARRY_SUB[lookup & 0x07]
            | OVERFLOW_SUB[lookup >> 4]
            | SZ53[result as usize];
    }

    /// Compare: flags as for SUB, but bits 3/5 come from the operand.
    fn cp(&mut self, value: u8) {
        let a = self.regs.a;
        let diff = u16::from(a).wrapping_sub(u16::from(value));
        let result = diff as u8;
        let lookup = lookup8(a, value, result);
        let carry_or_zero = if diff & 0x100 != 0 {
            CF
        } else if result == 0 {
            ZF
        } else {
            0
        };
        self.regs.f = carry_or_zero
            | NF
            | HALFCARRY_SUB[lookup & 0x07]
            | OVERFLOW_SUB[lookup >> 4]
            | (value & (XF | YF))
            | (result & SF);
    }

    pub(crate) fn neg(&mut self) {
        let value = self.regs.a;
        self.regs.a = 0;
        self.sub_a(value, 0);
    }

    pub(crate) fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.regs.f = (self.regs.f & CF)
            | (if result == 0x80 { VF } else { 0 })
            | (if result & 0x0F == 0 { HF } else { 0 })
            | SZ53[result as usize];
        result
    }

    pub(crate) fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.regs.f = (self.regs.f & CF)
            | (if value & 0x0F == 0 { HF } else { 0 })
            | NF
            | (if result == 0x7F { VF } else { 0 })
            | SZ53[result as usize];
        result
    }

    /// `ADD rr,rr'`: S, Z and P/V are preserved.
    pub(crate) fn add16(&mut self, a: u16, value: u16) -> u16 {
        let sum = u32::from(a) + u32::from(value);
        let result = sum as u16;
        let lookup = lookup16(a & 0x0800, value & 0x0800, result & 0x0800);
        self.regs.f = (self.regs.f & (VF | ZF | SF))
            | (if sum & 0x10000 != 0 { CF } else { 0 })
            | ((result >> 8) as u8 & (XF | YF))
            | HALFCARRY_ADD[lookup];
        result
    }

    pub(crate) fn adc16(&mut self, value: u16) {
        let hl = self.regs.hl();
        let sum = u32::from(hl) + u32::from(value) + u32::from(self.regs.f & CF);
        let result = sum as u16;
        let lookup = lookup16(hl, value, result);
        self.regs.set_hl(result);
        self.regs.f = (if sum & 0x10000 != 0 { CF } else { 0 })
            | OVERFLOW_ADD[lookup >> 4]
            | (self.regs.h & (XF | YF | SF))
            | HALFCARRY_ADD[lookup & 0x07]
            | (if result == 0 { ZF } else { 0 });
    }

    pub(crate) fn sbc16(&mut self, value: u16) {
        let hl = self.regs.hl();
        let diff = u32::from(hl)
            .wrapping_sub(u32::from(value))
            .wrapping_sub(u32::from(self.regs.f & CF));
        let result = diff as u16;
        let lookup = lookup16(hl, value, result);
        self.regs.set_hl(result);
        self.regs.f = (if diff & 0x10000 != 0 { CF } else { 0 })
            | NF
            | OVERFLOW_SUB[lookup >> 4]
            | (self.regs.h & (XF | YF | SF))
            | HALFCARRY_SUB[lookup & 0x07]
            | (if result == 0 { ZF } else { 0 });
    }

    /// CB-page rotate/shift selected by bits 3-5: RLC RRC RL RR SLA SRA SLL SRL.
    pub(crate) fn rotate(&mut self, operation: u8, value: u8) -> u8 {
        let (result, carry) = match operation {
            0 => (value.rotate_left(1), value >> 7),
            1 => (value.rotate_right(1), value & CF),
            2 => ((value << 1) | (self.regs.f & CF), value >> 7),
            3 => ((value >> 1) | (self.regs.f << 7), value & CF),
            4 => (value << 1, value >> 7),
            5 => ((value & 0x80) | (value >> 1), value & CF),
            6 => ((value << 1) | 0x01, value >> 7),
            _ => (value >> 1, value & CF),
        };
        self.regs.f = carry | SZ53P[result as usize];
        result
    }

    pub(crate) fn bit(&mut self, bit: u8, value: u8) {
        self.test_bit(bit, value, value);
    }

    /// `BIT n,(IX+d)`: bits 3/5 come from the high byte of the address.
    pub(crate) fn biti(&mut self, bit: u8, value: u8, address: u16) {
        self.test_bit(bit, value, (address >> 8) as u8);
    }

    fn test_bit(&mut self, bit: u8, value: u8, undocumented: u8) {
        let mut f = (self.regs.f & CF) | HF | (undocumented & (XF | YF));
        if value & (1 << bit) == 0 {
            f |= PF | ZF;
        }
        if bit == 7 && value & 0x80 != 0 {
            f |= SF;
        }
        self.regs.f = f;
    }

    pub(crate) fn rlca(&mut self) {
        self.regs.a = self.regs.a.rotate_left(1);
        self.regs.f = (self.regs.f & (PF | ZF | SF)) | (self.regs.a & (CF | XF | YF));
    }

    pub(crate) fn rrca(&mut self) {
        let carry = self.regs.a & CF;
        self.regs.a = self.regs.a.rotate_right(1);
        self.regs.f = (self.regs.f & (PF | ZF | SF)) | carry | (self.regs.a & (XF | YF));
    }

    pub(crate) fn rla(&mut self) {
        let old = self.regs.a;
        self.regs.a = (old << 1) | (self.regs.f & CF);
        self.regs.f = (self.regs.f & (PF | ZF | SF)) | (self.regs.a & (XF | YF)) | (old >> 7);
    }

    pub(crate) fn rra(&mut self) {
        let old = self.regs.a;
        self.regs.a = (old >> 1) | (self.regs.f << 7);
        self.regs.f = (self.regs.f & (PF | ZF | SF)) | (self.regs.a & (XF | YF)) | (old & CF);
    }

    pub(crate) fn daa(&mut self) {
        let a = self.regs.a;
        let mut correction = 0;
        let mut carry = self.regs.f & CF;
        if self.regs.f & HF != 0 || a & 0x0F > 9 {
            correction = 6;
        }
        if carry != 0 || a > 0x99 {
            correction |= 0x60;
        }
        if a > 0x99 {
            carry = CF;
        }
        if self.regs.f & NF != 0 {
            self.sub_a(correction, 0);
        } else {
            self.add_a(correction, 0);
        }
        self.regs.f = (self.regs.f & !(CF | PF)) | carry | PARITY[self.regs.a as usize];
    }

    pub(crate) fn cpl(&mut self) {
        self.regs.a ^= 0xFF;
        self.regs.f =
            (self.regs.f & (CF | PF | ZF | SF)) | (self.regs.a & (XF | YF)) | NF | HF;
    }

    pub(crate) fn scf(&mut self) {
        self.regs.f = (self.regs.f & (PF | ZF | SF)) | (self.regs.a & (XF | YF)) | CF;
    }

    pub(crate) fn ccf(&mut self) {
        let carry_or_half = if self.regs.f & CF != 0 { HF } else { CF };
        self.regs.f = (self.regs.f & (PF | ZF | SF)) | carry_or_half | (self.regs.a & (XF | YF));
    }

    /// Flags after `IN r,(C)`.
    pub(crate) fn in_flags(&mut self, value: u8) {
        self.regs.f = (self.regs.f & CF) | SZ53P[value as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_with_a(a: u8) -> Z80 {
        let mut cpu = Z80::new();
        cpu.regs.a = a;
        cpu
    }

    #[test]
    fn add_sets_half_carry() {
        let mut cpu = cpu_with_a(0x0F);
        cpu.alu(op::ADD, 0x01);
        assert_eq!(cpu.regs.a, 0x10);
        assert_eq!(cpu.regs.f, HF, "only H expected");
    }

    #[test]
    fn add_signed_overflow() {
        let mut cpu = cpu_with_a(0x7F);
        cpu.alu(op::ADD, 0x01);
        assert_eq!(cpu.regs.a, 0x80);
        assert_eq!(cpu.regs.f, SF | HF | VF);
    }

    #[test]
    fn adc_uses_carry_in() {
        let mut cpu = cpu_with_a(0xFF);
        cpu.regs.f = CF;
        cpu.alu(op::ADC, 0x00);
        assert_eq!(cpu.regs.a, 0x00);
        assert_eq!(cpu.regs.f, ZF | HF | CF);
    }

    #[test]
    fn sub_borrow() {
        let mut cpu = cpu_with_a(0x00);
        cpu.alu(op::SUB, 0x01);
        assert_eq!(cpu.regs.a, 0xFF);
        assert_eq!(cpu.regs.f, SF | YF | HF | XF | NF | CF);
    }

    #[test]
    fn cp_takes_undocumented_bits_from_operand() {
        let mut cpu = cpu_with_a(0x40);
        cpu.alu(op::CP, 0x28);
        assert_eq!(cpu.regs.a, 0x40, "CP leaves A alone");
        assert_eq!(cpu.regs.f & (XF | YF), XF | YF);
        assert_eq!(cpu.regs.f & (NF | HF), NF | HF);
    }

    #[test]
    fn inc_and_dec_keep_carry() {
        let mut cpu = Z80::new();
        cpu.regs.f = CF;
        assert_eq!(cpu.inc(0x7F), 0x80);
        assert_eq!(cpu.regs.f, SF | HF | VF | CF);
        assert_eq!(cpu.dec(0x80), 0x7F);
        assert_eq!(cpu.regs.f, YF | HF | XF | VF | NF | CF);
    }

    #[test]
    fn sll_shifts_in_one() {
        let mut cpu = Z80::new();
        assert_eq!(cpu.rotate(6, 0x80), 0x01);
        assert_eq!(cpu.regs.f, CF);
    }

    #[test]
    fn bit_on_index_uses_address_high_byte() {
        let mut cpu = Z80::new();
        cpu.biti(0, 0x01, 0x2800);
        assert_eq!(cpu.regs.f, HF | YF | XF);
    }

    #[test]
    fn daa_after_bcd_add() {
        let mut cpu = cpu_with_a(0x15);
        cpu.alu(op::ADD, 0x27);
        cpu.daa();
        assert_eq!(cpu.regs.a, 0x42);
        assert_eq!(cpu.regs.f & CF, 0);
    }

    #[test]
    fn sbc16_zero_result() {
        let mut cpu = Z80::new();
        cpu.regs.set_hl(0x1000);
        cpu.regs.f = CF;
        cpu.sbc16(0x0FFF);
        assert_eq!(cpu.regs.hl(), 0x0000);
        assert_eq!(cpu.regs.f & (ZF | NF | CF), ZF | NF);
    }

    #[test]
    fn add16_preserves_szp() {
        let mut cpu = Z80::new();
        cpu.regs.f = SF | ZF | PF;
        let result = cpu.add16(0x0FFF, 0x0001);
        assert_eq!(result, 0x1000);
        assert_eq!(cpu.regs.f, SF | ZF | PF | HF);
    }
}

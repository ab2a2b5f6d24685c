//! CB-prefixed opcodes: rotates, shifts and single-bit operations.

use super::{Page, op};
use crate::cpu::{Z80, Z80Bus};

pub(super) const fn page() -> Page {
    let mut p: Page = [None; 256];
    rows!(p[0x00] = rotate_r, rotate_hl);
    rows!(p[0x40] = bit_r, bit_hl);
    rows!(p[0x80] = res_r, res_hl);
    rows!(p[0xC0] = set_r, set_hl);
    p
}

/// RLC RRC RL RR SLA SRA SLL SRL, selected by `OP`.
fn rotate_r<const OP: u8, const R: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    let value = cpu.rotate(OP, cpu.reg(R));
    cpu.set_reg(R, value);
}

fn rotate_hl<const OP: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let hl = cpu.regs.hl();
    let value = bus.read_byte(hl);
    bus.contend_read_no_mreq(hl, 1);
    let value = cpu.rotate(OP, value);
    bus.write_byte(hl, value);
}

fn bit_r<const B: u8, const R: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.bit(B, cpu.reg(R));
}

fn bit_hl<const B: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let hl = cpu.regs.hl();
    let value = bus.read_byte(hl);
    bus.contend_read_no_mreq(hl, 1);
    cpu.bit(B, value);
}

fn res_r<const B: u8, const R: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.set_reg(R, cpu.reg(R) & !(1 << B));
}

fn res_hl<const B: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    modify_hl(cpu, bus, |value| value & !(1 << B));
}

fn set_r<const B: u8, const R: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.set_reg(R, cpu.reg(R) | (1 << B));
}

fn set_hl<const B: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    modify_hl(cpu, bus, |value| value | (1 << B));
}

/// Read-modify-write of (HL) with one internal cycle before the write.
fn modify_hl(cpu: &Z80, bus: &mut dyn Z80Bus, f: impl FnOnce(u8) -> u8) {
    let hl = cpu.regs.hl();
    let value = bus.read_byte(hl);
    bus.contend_read_no_mreq(hl, 1);
    bus.write_byte(hl, f(value));
}

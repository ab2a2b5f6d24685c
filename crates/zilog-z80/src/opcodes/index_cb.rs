//! DD CB / FD CB opcodes.
//!
//! The effective address is formed before dispatch and left in
//! `Z80::tempaddr`, so one page serves IX and IY. Every form is a
//! read-modify-write of (IX+d) with one internal cycle before the write.
//! The undocumented register slots also copy the result into that register.

use super::{Page, op};
use crate::cpu::{Z80, Z80Bus};

pub(super) const fn page() -> Page {
    let mut p: Page = [None; 256];
    rows!(p[0x00] = rotate_to, rotate);
    // BIT ignores the register field, so every column is the same test.
    eight!(p[0x40; 8] = bit);
    eight!(p[0x41; 8] = bit);
    eight!(p[0x42; 8] = bit);
    eight!(p[0x43; 8] = bit);
    eight!(p[0x44; 8] = bit);
    eight!(p[0x45; 8] = bit);
    eight!(p[0x46; 8] = bit);
    eight!(p[0x47; 8] = bit);
    rows!(p[0x80] = res_to, res);
    rows!(p[0xC0] = set_to, set);
    p
}

fn modify(cpu: &mut Z80, bus: &mut dyn Z80Bus, f: impl FnOnce(&mut Z80, u8) -> u8) -> u8 {
    let address = cpu.tempaddr;
    let value = bus.read_byte(address);
    bus.contend_read_no_mreq(address, 1);
    let value = f(cpu, value);
    bus.write_byte(address, value);
    value
}

fn rotate<const OP: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    modify(cpu, bus, |cpu, value| cpu.rotate(OP, value));
}

fn rotate_to<const OP: u8, const R: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = modify(cpu, bus, |cpu, value| cpu.rotate(OP, value));
    cpu.set_reg(R, value);
}

fn bit<const B: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let address = cpu.tempaddr;
    let value = bus.read_byte(address);
    bus.contend_read_no_mreq(address, 1);
    cpu.biti(B, value, address);
}

fn res<const B: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    modify(cpu, bus, |_, value| value & !(1 << B));
}

fn res_to<const B: u8, const R: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = modify(cpu, bus, |_, value| value & !(1 << B));
    cpu.set_reg(R, value);
}

fn set<const B: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    modify(cpu, bus, |_, value| value | (1 << B));
}

fn set_to<const B: u8, const R: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = modify(cpu, bus, |_, value| value | (1 << B));
    cpu.set_reg(R, value);
}

//! DD- and FD-prefixed opcodes.
//!
//! One generic page serves both prefixes: `IY = false` is the DD page (IX),
//! `IY = true` the FD page. Slots left empty redispatch as unprefixed.

use super::{Page, Prefix, op, prefix};
use crate::cpu::{Z80, Z80Bus};

/// `ALU A,IXH` / `ALU A,IXL` for each operation.
macro_rules! alu_halves {
    ($p:ident, $iy:tt, $($op:literal),*) => {
        $(
            $p[0x84 + 8 * $op] = op(alu_hr::<$iy, $op, 4>);
            $p[0x85 + 8 * $op] = op(alu_hr::<$iy, $op, 5>);
        )*
    };
}

pub(super) const fn page<const IY: bool>() -> Page {
    let mut p: Page = [None; 256];

    p[0x09] = op(add_ix_rr::<IY, 0>);
    p[0x19] = op(add_ix_rr::<IY, 1>);
    p[0x29] = op(add_ix_rr::<IY, 2>);
    p[0x39] = op(add_ix_rr::<IY, 3>);
    p[0x21] = op(ld_ix_nn::<IY>);
    p[0x22] = op(ld_nn_ix::<IY>);
    p[0x2A] = op(ld_ix_nn_ind::<IY>);
    p[0x23] = op(inc_ix::<IY>);
    p[0x2B] = op(dec_ix::<IY>);
    p[0x24] = op(inc_hr::<IY, 4>);
    p[0x2C] = op(inc_hr::<IY, 5>);
    p[0x25] = op(dec_hr::<IY, 4>);
    p[0x2D] = op(dec_hr::<IY, 5>);
    p[0x26] = op(ld_hr_n::<IY, 4>);
    p[0x2E] = op(ld_hr_n::<IY, 5>);
    p[0x34] = op(inc_ixd::<IY>);
    p[0x35] = op(dec_ixd::<IY>);
    p[0x36] = op(ld_ixd_n::<IY>);

    // LD r,IXH / LD r,IXL
    p[0x44] = op(ld_hr::<IY, 0, 4>);
    p[0x45] = op(ld_hr::<IY, 0, 5>);
    p[0x4C] = op(ld_hr::<IY, 1, 4>);
    p[0x4D] = op(ld_hr::<IY, 1, 5>);
    p[0x54] = op(ld_hr::<IY, 2, 4>);
    p[0x55] = op(ld_hr::<IY, 2, 5>);
    p[0x5C] = op(ld_hr::<IY, 3, 4>);
    p[0x5D] = op(ld_hr::<IY, 3, 5>);
    p[0x7C] = op(ld_hr::<IY, 7, 4>);
    p[0x7D] = op(ld_hr::<IY, 7, 5>);
    // LD IXH,r / LD IXL,r
    regs!(p[0x60; 1] = ld_hr::<IY, 4>);
    regs!(p[0x68; 1] = ld_hr::<IY, 5>);

    regs!(p[0x46; 8] = ld_r_ixd::<IY>);
    regs!(p[0x70; 1] = ld_ixd_r::<IY>);

    alu_halves!(p, IY, 0, 1, 2, 3, 4, 5, 6, 7);
    eight!(p[0x86; 8] = alu_ixd::<IY>);

    p[0xCB] = if IY { prefix(Prefix::FdCb) } else { prefix(Prefix::DdCb) };
    p[0xE1] = op(pop_ix::<IY>);
    p[0xE3] = op(ex_sp_ix::<IY>);
    p[0xE5] = op(push_ix::<IY>);
    p[0xE9] = op(jp_ix::<IY>);
    p[0xF9] = op(ld_sp_ix::<IY>);
    p
}

/// ADD IX,rr with rr in BC DE IX SP.
fn add_ix_rr<const IY: bool, const P: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 7);
    let index = cpu.index::<IY>();
    let value = if P == 2 { index } else { cpu.pair(P) };
    let result = cpu.add16(index, value);
    cpu.set_index::<IY>(result);
}

fn ld_ix_nn<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = cpu.read_pc16(bus);
    cpu.set_index::<IY>(value);
}

fn ld_nn_ix<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.store16(bus, cpu.index::<IY>());
}

fn ld_ix_nn_ind<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = cpu.load16(bus);
    cpu.set_index::<IY>(value);
}

fn inc_ix<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 2);
    cpu.set_index::<IY>(cpu.index::<IY>().wrapping_add(1));
}

fn dec_ix<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 2);
    cpu.set_index::<IY>(cpu.index::<IY>().wrapping_sub(1));
}

fn inc_hr<const IY: bool, const R: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    let value = cpu.inc(cpu.index_reg::<IY>(R));
    cpu.set_index_reg::<IY>(R, value);
}

fn dec_hr<const IY: bool, const R: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    let value = cpu.dec(cpu.index_reg::<IY>(R));
    cpu.set_index_reg::<IY>(R, value);
}

fn ld_hr_n<const IY: bool, const R: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = cpu.read_pc(bus);
    cpu.set_index_reg::<IY>(R, value);
}

fn inc_ixd<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let address = cpu.index_address::<IY>(bus);
    let value = bus.read_byte(address);
    bus.contend_read_no_mreq(address, 1);
    let value = cpu.inc(value);
    bus.write_byte(address, value);
}

fn dec_ixd<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let address = cpu.index_address::<IY>(bus);
    let value = bus.read_byte(address);
    bus.contend_read_no_mreq(address, 1);
    let value = cpu.dec(value);
    bus.write_byte(address, value);
}

/// `LD (IX+d),n`: the operand follows the displacement, so only two
/// internal cycles remain after it.
fn ld_ixd_n<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let displacement = cpu.read_pc(bus) as i8;
    let address = cpu.index::<IY>().wrapping_add_signed(i16::from(displacement));
    let pc = cpu.regs.pc;
    let value = bus.read_byte(pc);
    bus.contend_read_no_mreq_loop(pc, 2);
    cpu.regs.pc = pc.wrapping_add(1);
    bus.write_byte(address, value);
}

/// LD between B C D E A and the index halves; H and L mean IXH and IXL on
/// both sides.
fn ld_hr<const IY: bool, const D: u8, const S: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.set_index_reg::<IY>(D, cpu.index_reg::<IY>(S));
}

/// `LD r,(IX+d)`: H and L here are the real H and L.
fn ld_r_ixd<const IY: bool, const R: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let address = cpu.index_address::<IY>(bus);
    let value = bus.read_byte(address);
    cpu.set_reg(R, value);
}

fn ld_ixd_r<const IY: bool, const R: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let address = cpu.index_address::<IY>(bus);
    bus.write_byte(address, cpu.reg(R));
}

fn alu_hr<const IY: bool, const OP: u8, const R: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.alu(OP, cpu.index_reg::<IY>(R));
}

fn alu_ixd<const IY: bool, const OP: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let address = cpu.index_address::<IY>(bus);
    let value = bus.read_byte(address);
    cpu.alu(OP, value);
}

fn pop_ix<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = cpu.pop16(bus);
    cpu.set_index::<IY>(value);
}

fn ex_sp_ix<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let sp = cpu.regs.sp;
    let low = bus.read_byte(sp);
    let high = bus.read_byte(sp.wrapping_add(1));
    bus.contend_read_no_mreq(sp.wrapping_add(1), 1);
    let [index_high, index_low] = cpu.index::<IY>().to_be_bytes();
    bus.write_byte(sp.wrapping_add(1), index_high);
    bus.write_byte(sp, index_low);
    bus.contend_write_no_mreq_loop(sp, 2);
    cpu.set_index::<IY>(u16::from_le_bytes([low, high]));
}

fn push_ix<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 1);
    cpu.push16(bus, cpu.index::<IY>());
}

fn jp_ix<const IY: bool>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.regs.pc = cpu.index::<IY>();
}

fn ld_sp_ix<const IY: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 2);
    cpu.regs.sp = cpu.index::<IY>();
}

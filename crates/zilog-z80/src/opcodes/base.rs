//! Unprefixed opcodes.
//!
//! Timings assume the opcode fetch (4 T-states) has already been charged.

use super::{Page, Prefix, op, prefix};
use crate::cpu::{Z80, Z80Bus};

pub(super) const fn page() -> Page {
    let mut p: Page = [None; 256];

    p[0x00] = op(nop);
    p[0x01] = op(ld_rr_nn::<0>);
    p[0x11] = op(ld_rr_nn::<1>);
    p[0x21] = op(ld_rr_nn::<2>);
    p[0x31] = op(ld_rr_nn::<3>);
    p[0x02] = op(ld_bc_a);
    p[0x12] = op(ld_de_a);
    p[0x03] = op(inc_rr::<0>);
    p[0x13] = op(inc_rr::<1>);
    p[0x23] = op(inc_rr::<2>);
    p[0x33] = op(inc_rr::<3>);
    p[0x0B] = op(dec_rr::<0>);
    p[0x1B] = op(dec_rr::<1>);
    p[0x2B] = op(dec_rr::<2>);
    p[0x3B] = op(dec_rr::<3>);
    regs!(p[0x04; 8] = inc_r);
    p[0x34] = op(inc_hl_ind);
    regs!(p[0x05; 8] = dec_r);
    p[0x35] = op(dec_hl_ind);
    regs!(p[0x06; 8] = ld_r_n);
    p[0x36] = op(ld_hl_ind_n);
    p[0x07] = op(rlca);
    p[0x0F] = op(rrca);
    p[0x17] = op(rla);
    p[0x1F] = op(rra);
    p[0x08] = op(ex_af_af);
    p[0x09] = op(add_hl_rr::<0>);
    p[0x19] = op(add_hl_rr::<1>);
    p[0x29] = op(add_hl_rr::<2>);
    p[0x39] = op(add_hl_rr::<3>);
    p[0x0A] = op(ld_a_bc);
    p[0x1A] = op(ld_a_de);
    p[0x10] = op(djnz);
    p[0x18] = op(jr);
    p[0x20] = op(jr_cc::<0>);
    p[0x28] = op(jr_cc::<1>);
    p[0x30] = op(jr_cc::<2>);
    p[0x38] = op(jr_cc::<3>);
    p[0x22] = op(ld_nn_hl);
    p[0x2A] = op(ld_hl_nn);
    p[0x32] = op(ld_nn_a);
    p[0x3A] = op(ld_a_nn);
    p[0x27] = op(daa);
    p[0x2F] = op(cpl);
    p[0x37] = op(scf);
    p[0x3F] = op(ccf);

    regs!(p[0x40; 1] = ld_r_r::<0>);
    regs!(p[0x48; 1] = ld_r_r::<1>);
    regs!(p[0x50; 1] = ld_r_r::<2>);
    regs!(p[0x58; 1] = ld_r_r::<3>);
    regs!(p[0x60; 1] = ld_r_r::<4>);
    regs!(p[0x68; 1] = ld_r_r::<5>);
    regs!(p[0x78; 1] = ld_r_r::<7>);
    regs!(p[0x46; 8] = ld_r_hl);
    regs!(p[0x70; 1] = ld_hl_r);
    p[0x76] = op(halt);

    rows!(p[0x80] = alu_r, alu_hl);
    eight!(p[0xC6; 8] = alu_n);

    eight!(p[0xC0; 8] = ret_cc);
    eight!(p[0xC2; 8] = jp_cc);
    eight!(p[0xC4; 8] = call_cc);
    eight!(p[0xC7; 8] = rst);
    p[0xC1] = op(pop_rr::<0>);
    p[0xD1] = op(pop_rr::<1>);
    p[0xE1] = op(pop_rr::<2>);
    p[0xF1] = op(pop_rr::<3>);
    p[0xC5] = op(push_rr::<0>);
    p[0xD5] = op(push_rr::<1>);
    p[0xE5] = op(push_rr::<2>);
    p[0xF5] = op(push_rr::<3>);

    p[0xC3] = op(jp);
    p[0xC9] = op(ret);
    p[0xCD] = op(call);
    p[0xD3] = op(out_n_a);
    p[0xD9] = op(exx);
    p[0xDB] = op(in_a_n);
    p[0xE3] = op(ex_sp_hl);
    p[0xE9] = op(jp_hl);
    p[0xEB] = op(ex_de_hl);
    p[0xF3] = op(di);
    p[0xF9] = op(ld_sp_hl);
    p[0xFB] = op(ei);

    p[0xCB] = prefix(Prefix::Cb);
    p[0xDD] = prefix(Prefix::Dd);
    p[0xED] = prefix(Prefix::Ed);
    p[0xFD] = prefix(Prefix::Fd);
    p
}

fn nop(_cpu: &mut Z80, _bus: &mut dyn Z80Bus) {}

// LD rr,nn (01=BC, 11=DE, 21=HL, 31=SP)
fn ld_rr_nn<const P: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = cpu.read_pc16(bus);
    cpu.set_pair(P, value);
}

fn ld_bc_a(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    bus.write_byte(cpu.regs.bc(), cpu.regs.a);
}

fn ld_de_a(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    bus.write_byte(cpu.regs.de(), cpu.regs.a);
}

fn inc_rr<const P: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 2);
    let value = cpu.pair(P).wrapping_add(1);
    cpu.set_pair(P, value);
}

fn dec_rr<const P: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 2);
    let value = cpu.pair(P).wrapping_sub(1);
    cpu.set_pair(P, value);
}

fn inc_r<const R: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    let value = cpu.inc(cpu.reg(R));
    cpu.set_reg(R, value);
}

fn dec_r<const R: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    let value = cpu.dec(cpu.reg(R));
    cpu.set_reg(R, value);
}

fn inc_hl_ind(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let hl = cpu.regs.hl();
    let value = bus.read_byte(hl);
    bus.contend_read_no_mreq(hl, 1);
    let value = cpu.inc(value);
    bus.write_byte(hl, value);
}

fn dec_hl_ind(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let hl = cpu.regs.hl();
    let value = bus.read_byte(hl);
    bus.contend_read_no_mreq(hl, 1);
    let value = cpu.dec(value);
    bus.write_byte(hl, value);
}

fn ld_r_n<const R: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = cpu.read_pc(bus);
    cpu.set_reg(R, value);
}

fn ld_hl_ind_n(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = cpu.read_pc(bus);
    bus.write_byte(cpu.regs.hl(), value);
}

fn rlca(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.rlca();
}

fn rrca(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.rrca();
}

fn rla(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.rla();
}

fn rra(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.rra();
}

fn ex_af_af(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.regs.exchange_af();
}

fn add_hl_rr<const P: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 7);
    let result = cpu.add16(cpu.regs.hl(), cpu.pair(P));
    cpu.regs.set_hl(result);
}

fn ld_a_bc(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.regs.a = bus.read_byte(cpu.regs.bc());
}

fn ld_a_de(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.regs.a = bus.read_byte(cpu.regs.de());
}

fn djnz(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 1);
    cpu.regs.b = cpu.regs.b.wrapping_sub(1);
    if cpu.regs.b == 0 {
        cpu.skip_e(bus);
    } else {
        cpu.jr(bus);
    }
}

fn jr(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.jr(bus);
}

fn jr_cc<const CC: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    if cpu.condition(CC) {
        cpu.jr(bus);
    } else {
        cpu.skip_e(bus);
    }
}

fn ld_nn_hl(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.store16(bus, cpu.regs.hl());
}

fn ld_hl_nn(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = cpu.load16(bus);
    cpu.regs.set_hl(value);
}

fn ld_nn_a(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let address = cpu.read_pc16(bus);
    bus.write_byte(address, cpu.regs.a);
}

fn ld_a_nn(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let address = cpu.read_pc16(bus);
    cpu.regs.a = bus.read_byte(address);
}

fn daa(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.daa();
}

fn cpl(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.cpl();
}

fn scf(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.scf();
}

fn ccf(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.ccf();
}

fn ld_r_r<const D: u8, const S: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.set_reg(D, cpu.reg(S));
}

fn ld_r_hl<const R: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = bus.read_byte(cpu.regs.hl());
    cpu.set_reg(R, value);
}

fn ld_hl_r<const R: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    bus.write_byte(cpu.regs.hl(), cpu.reg(R));
}

/// Re-executes itself until an interrupt moves PC past it.
fn halt(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.halted = true;
    cpu.regs.pc = cpu.regs.pc.wrapping_sub(1);
}

fn alu_r<const OP: u8, const R: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.alu(OP, cpu.reg(R));
}

fn alu_hl<const OP: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = bus.read_byte(cpu.regs.hl());
    cpu.alu(OP, value);
}

fn alu_n<const OP: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = cpu.read_pc(bus);
    cpu.alu(OP, value);
}

fn ret_cc<const CC: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 1);
    if cpu.condition(CC) {
        cpu.ret(bus);
    }
}

fn jp_cc<const CC: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    if cpu.condition(CC) {
        cpu.jp(bus);
    } else {
        cpu.skip_nn(bus);
    }
}

fn call_cc<const CC: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    if cpu.condition(CC) {
        cpu.call(bus);
    } else {
        cpu.skip_nn(bus);
    }
}

fn rst<const N: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 1);
    cpu.push16(bus, cpu.regs.pc);
    cpu.regs.pc = u16::from(N) * 8;
}

// POP rr (C1=BC, D1=DE, E1=HL, F1=AF)
fn pop_rr<const P: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = cpu.pop16(bus);
    match P {
        0 => cpu.regs.set_bc(value),
        1 => cpu.regs.set_de(value),
        2 => cpu.regs.set_hl(value),
        _ => cpu.regs.set_af(value),
    }
}

fn push_rr<const P: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 1);
    let value = match P {
        0 => cpu.regs.bc(),
        1 => cpu.regs.de(),
        2 => cpu.regs.hl(),
        _ => cpu.regs.af(),
    };
    cpu.push16(bus, value);
}

fn jp(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.jp(bus);
}

fn ret(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.ret(bus);
}

fn call(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.call(bus);
}

fn out_n_a(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let port = u16::from_be_bytes([cpu.regs.a, cpu.read_pc(bus)]);
    bus.write_port(port, cpu.regs.a);
}

fn in_a_n(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let port = u16::from_be_bytes([cpu.regs.a, cpu.read_pc(bus)]);
    cpu.regs.a = bus.read_port(port);
}

fn exx(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.regs.exchange_main();
}

fn ex_sp_hl(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let sp = cpu.regs.sp;
    let low = bus.read_byte(sp);
    let high = bus.read_byte(sp.wrapping_add(1));
    bus.contend_read_no_mreq(sp.wrapping_add(1), 1);
    bus.write_byte(sp.wrapping_add(1), cpu.regs.h);
    bus.write_byte(sp, cpu.regs.l);
    bus.contend_write_no_mreq_loop(sp, 2);
    cpu.regs.l = low;
    cpu.regs.h = high;
}

fn jp_hl(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.regs.pc = cpu.regs.hl();
}

fn ex_de_hl(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    let de = cpu.regs.de();
    cpu.regs.set_de(cpu.regs.hl());
    cpu.regs.set_hl(de);
}

fn di(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.regs.iff1 = false;
    cpu.regs.iff2 = false;
}

fn ei(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.regs.iff1 = true;
    cpu.regs.iff2 = true;
}

fn ld_sp_hl(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 2);
    cpu.regs.sp = cpu.regs.hl();
}

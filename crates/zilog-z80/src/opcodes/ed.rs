//! ED-prefixed opcodes.
//!
//! Unassigned ED slots execute as an 8 T-state NOP. The mirrored slots of
//! NEG, RETN/RETI and IM share one handler each.

use super::{Page, op};
use crate::cpu::{Z80, Z80Bus};
use crate::flags::{CF, HALFCARRY_SUB, HF, NF, PARITY, PF, SF, SZ53, VF, XF, YF, ZF};

pub(super) const fn page() -> Page {
    let mut p: Page = [op(nop); 256];

    regs!(p[0x40; 8] = in_r_c);
    p[0x70] = op(in_f_c);
    regs!(p[0x41; 8] = out_c_r);
    p[0x71] = op(out_c_0);

    p[0x42] = op(sbc_hl_rr::<0>);
    p[0x52] = op(sbc_hl_rr::<1>);
    p[0x62] = op(sbc_hl_rr::<2>);
    p[0x72] = op(sbc_hl_rr::<3>);
    p[0x4A] = op(adc_hl_rr::<0>);
    p[0x5A] = op(adc_hl_rr::<1>);
    p[0x6A] = op(adc_hl_rr::<2>);
    p[0x7A] = op(adc_hl_rr::<3>);
    p[0x43] = op(ld_nn_rr::<0>);
    p[0x53] = op(ld_nn_rr::<1>);
    p[0x63] = op(ld_nn_rr::<2>);
    p[0x73] = op(ld_nn_rr::<3>);
    p[0x4B] = op(ld_rr_nn::<0>);
    p[0x5B] = op(ld_rr_nn::<1>);
    p[0x6B] = op(ld_rr_nn::<2>);
    p[0x7B] = op(ld_rr_nn::<3>);

    let mut i = 0;
    while i < 8 {
        p[0x44 + 8 * i] = op(neg);
        p[0x45 + 8 * i] = op(retn);
        i += 1;
    }
    p[0x46] = op(im::<0>);
    p[0x4E] = op(im::<0>);
    p[0x66] = op(im::<0>);
    p[0x6E] = op(im::<0>);
    p[0x56] = op(im::<1>);
    p[0x76] = op(im::<1>);
    p[0x5E] = op(im::<2>);
    p[0x7E] = op(im::<2>);

    p[0x47] = op(ld_i_a);
    p[0x4F] = op(ld_r_a);
    p[0x57] = op(ld_a_i);
    p[0x5F] = op(ld_a_r);
    p[0x67] = op(rrd);
    p[0x6F] = op(rld);

    p[0xA0] = op(block_ld::<false, false>);
    p[0xA8] = op(block_ld::<true, false>);
    p[0xB0] = op(block_ld::<false, true>);
    p[0xB8] = op(block_ld::<true, true>);
    p[0xA1] = op(block_cp::<false, false>);
    p[0xA9] = op(block_cp::<true, false>);
    p[0xB1] = op(block_cp::<false, true>);
    p[0xB9] = op(block_cp::<true, true>);
    p[0xA2] = op(block_in::<false, false>);
    p[0xAA] = op(block_in::<true, false>);
    p[0xB2] = op(block_in::<false, true>);
    p[0xBA] = op(block_in::<true, true>);
    p[0xA3] = op(block_out::<false, false>);
    p[0xAB] = op(block_out::<true, false>);
    p[0xB3] = op(block_out::<false, true>);
    p[0xBB] = op(block_out::<true, true>);
    p
}

fn nop(_cpu: &mut Z80, _bus: &mut dyn Z80Bus) {}

fn in_r_c<const R: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = bus.read_port(cpu.regs.bc());
    cpu.set_reg(R, value);
    cpu.in_flags(value);
}

/// `IN (C)`: flags only, the value is discarded.
fn in_f_c(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = bus.read_port(cpu.regs.bc());
    cpu.in_flags(value);
}

fn out_c_r<const R: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    bus.write_port(cpu.regs.bc(), cpu.reg(R));
}

fn out_c_0(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    bus.write_port(cpu.regs.bc(), 0);
}

fn sbc_hl_rr<const P: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 7);
    cpu.sbc16(cpu.pair(P));
}

fn adc_hl_rr<const P: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 7);
    cpu.adc16(cpu.pair(P));
}

fn ld_nn_rr<const P: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.store16(bus, cpu.pair(P));
}

fn ld_rr_nn<const P: u8>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let value = cpu.load16(bus);
    cpu.set_pair(P, value);
}

fn neg(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.neg();
}

/// RETN and RETI behave identically here.
fn retn(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.regs.iff1 = cpu.regs.iff2;
    cpu.ret(bus);
}

fn im<const M: u8>(cpu: &mut Z80, _bus: &mut dyn Z80Bus) {
    cpu.regs.im = M;
}

fn ld_i_a(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 1);
    cpu.regs.i = cpu.regs.a;
}

fn ld_r_a(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 1);
    cpu.regs.set_r_full(cpu.regs.a);
}

fn ld_a_i(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 1);
    cpu.regs.a = cpu.regs.i;
    ir_flags(cpu);
}

fn ld_a_r(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 1);
    cpu.regs.a = cpu.regs.r_full();
    ir_flags(cpu);
}

/// P/V reflects IFF2 after `LD A,I` and `LD A,R`.
fn ir_flags(cpu: &mut Z80) {
    let iff2 = if cpu.regs.iff2 { VF } else { 0 };
    cpu.regs.f = (cpu.regs.f & CF) | SZ53[cpu.regs.a as usize] | iff2;
}

fn rrd(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let hl = cpu.regs.hl();
    let value = bus.read_byte(hl);
    bus.contend_read_no_mreq_loop(hl, 4);
    bus.write_byte(hl, (cpu.regs.a << 4) | (value >> 4));
    cpu.regs.a = (cpu.regs.a & 0xF0) | (value & 0x0F);
    cpu.in_flags(cpu.regs.a);
}

fn rld(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let hl = cpu.regs.hl();
    let value = bus.read_byte(hl);
    bus.contend_read_no_mreq_loop(hl, 4);
    bus.write_byte(hl, (value << 4) | (cpu.regs.a & 0x0F));
    cpu.regs.a = (cpu.regs.a & 0xF0) | (value >> 4);
    cpu.in_flags(cpu.regs.a);
}

fn step(value: u16, dec: bool) -> u16 {
    if dec {
        value.wrapping_sub(1)
    } else {
        value.wrapping_add(1)
    }
}

/// LDI LDD LDIR LDDR.
fn block_ld<const DEC: bool, const REPEAT: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let hl = cpu.regs.hl();
    let de = cpu.regs.de();
    let value = bus.read_byte(hl);
    bus.write_byte(de, value);
    bus.contend_write_no_mreq_loop(de, 2);
    let bc = cpu.regs.bc().wrapping_sub(1);
    cpu.regs.set_bc(bc);
    let n = value.wrapping_add(cpu.regs.a);
    cpu.regs.f = (cpu.regs.f & (CF | ZF | SF))
        | (if bc != 0 { VF } else { 0 })
        | (n & XF)
        | (if n & 0x02 != 0 { YF } else { 0 });
    if REPEAT && bc != 0 {
        bus.contend_write_no_mreq_loop(de, 5);
        cpu.regs.pc = cpu.regs.pc.wrapping_sub(2);
    }
    cpu.regs.set_hl(step(hl, DEC));
    cpu.regs.set_de(step(de, DEC));
}

/// CPI CPD CPIR CPDR. The repeat stops on a match or when BC runs out.
fn block_cp<const DEC: bool, const REPEAT: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    let hl = cpu.regs.hl();
    let value = bus.read_byte(hl);
    let a = cpu.regs.a;
    let mut result = a.wrapping_sub(value);
    let lookup = (((a & 0x08) >> 3) | ((value & 0x08) >> 2) | ((result & 0x08) >> 1)) as usize;
    bus.contend_read_no_mreq_loop(hl, 5);
    let bc = cpu.regs.bc().wrapping_sub(1);
    cpu.regs.set_bc(bc);
    let mut f = (cpu.regs.f & CF)
        | (if bc != 0 { VF | NF } else { NF })
        | HALFCARRY_SUB[lookup]
        | (if result == 0 { ZF } else { 0 })
        | (result & SF);
    if f & HF != 0 {
        result = result.wrapping_sub(1);
    }
    f |= (result & XF) | (if result & 0x02 != 0 { YF } else { 0 });
    cpu.regs.f = f;
    if REPEAT && f & (VF | ZF) == VF {
        bus.contend_read_no_mreq_loop(hl, 5);
        cpu.regs.pc = cpu.regs.pc.wrapping_sub(2);
    }
    cpu.regs.set_hl(step(hl, DEC));
}

/// Flags shared by the block I/O group. `k` is the transferred byte plus
/// the adjusted C (input) or the new L (output).
fn block_io_flags(cpu: &mut Z80, value: u8, k: u8) {
    let b = cpu.regs.b;
    cpu.regs.f = (if value & 0x80 != 0 { NF } else { 0 })
        | (if k < value { HF | CF } else { 0 })
        | (if PARITY[((k & 0x07) ^ b) as usize] != 0 { PF } else { 0 })
        | SZ53[b as usize];
}

/// INI IND INIR INDR.
fn block_in<const DEC: bool, const REPEAT: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 1);
    let value = bus.read_port(cpu.regs.bc());
    let hl = cpu.regs.hl();
    bus.write_byte(hl, value);
    cpu.regs.b = cpu.regs.b.wrapping_sub(1);
    let c = if DEC {
        cpu.regs.c.wrapping_sub(1)
    } else {
        cpu.regs.c.wrapping_add(1)
    };
    block_io_flags(cpu, value, value.wrapping_add(c));
    if REPEAT && cpu.regs.b != 0 {
        bus.contend_write_no_mreq_loop(hl, 5);
        cpu.regs.pc = cpu.regs.pc.wrapping_sub(2);
    }
    cpu.regs.set_hl(step(hl, DEC));
}

/// OUTI OUTD OTIR OTDR. B is decremented before the port write.
fn block_out<const DEC: bool, const REPEAT: bool>(cpu: &mut Z80, bus: &mut dyn Z80Bus) {
    cpu.contend_ir(bus, 1);
    let hl = cpu.regs.hl();
    let value = bus.read_byte(hl);
    cpu.regs.b = cpu.regs.b.wrapping_sub(1);
    bus.write_port(cpu.regs.bc(), value);
    cpu.regs.set_hl(step(hl, DEC));
    block_io_flags(cpu, value, value.wrapping_add(cpu.regs.l));
    if REPEAT && cpu.regs.b != 0 {
        bus.contend_read_no_mreq_loop(cpu.regs.bc(), 5);
        cpu.regs.pc = cpu.regs.pc.wrapping_sub(2);
    }
}

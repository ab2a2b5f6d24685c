//! Flag results of representative instructions.

mod common;

use common::run_one;
use zilog_z80::{CF, HF, NF, PF, SF, VF, XF, YF, ZF};

fn with_a(program: &[u8], a: u8, f: u8) -> (u8, u8) {
    let (mut cpu, mut bus) = common::machine(program);
    cpu.regs.a = a;
    cpu.regs.f = f;
    common::step(&mut cpu, &mut bus);
    (cpu.regs.a, cpu.regs.f)
}

#[test]
fn add_half_carry() {
    let (a, f) = with_a(&[0xC6, 0x01], 0x0F, 0);
    assert_eq!(a, 0x10);
    assert_eq!(f, HF);
}

#[test]
fn add_overflow_to_negative() {
    let (a, f) = with_a(&[0xC6, 0x01], 0x7F, 0);
    assert_eq!(a, 0x80);
    assert_eq!(f, SF | HF | VF);
}

#[test]
fn sub_to_zero() {
    let (a, f) = with_a(&[0xD6, 0x42], 0x42, 0);
    assert_eq!(a, 0);
    assert_eq!(f, ZF | NF);
}

#[test]
fn cp_copies_undocumented_bits_from_operand() {
    let (a, f) = with_a(&[0xFE, 0x28], 0x00, 0);
    assert_eq!(a, 0x00);
    assert_eq!(f & (XF | YF), XF | YF);
    assert_ne!(f & CF, 0);
}

#[test]
fn xor_a_clears_and_sets_parity() {
    let (a, f) = with_a(&[0xAF], 0x5A, CF);
    assert_eq!(a, 0);
    assert_eq!(f, ZF | PF);
}

#[test]
fn and_sets_half_carry() {
    let (_, f) = with_a(&[0xE6, 0xFF], 0x01, 0);
    assert_eq!(f & HF, HF);
}

#[test]
fn inc_keeps_carry() {
    let (mut cpu, mut bus) = common::machine(&[0x04]);
    cpu.regs.b = 0xFF;
    cpu.regs.f = CF;
    common::step(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.b, 0);
    assert_eq!(cpu.regs.f, ZF | HF | CF);
}

#[test]
fn dec_from_0x80_overflows() {
    let (mut cpu, mut bus) = common::machine(&[0x05]);
    cpu.regs.b = 0x80;
    common::step(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.b, 0x7F);
    assert_eq!(cpu.regs.f, VF | NF | HF | XF | YF);
}

#[test]
fn daa_corrects_bcd_sum() {
    // 0x15 + 0x27 = 0x3C, adjusted to 0x42.
    let (mut cpu, mut bus) = common::machine(&[0xC6, 0x27, 0x27]);
    cpu.regs.a = 0x15;
    common::step(&mut cpu, &mut bus);
    common::step(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x42);
    assert_eq!(cpu.regs.f & CF, 0);
}

#[test]
fn scf_and_ccf() {
    let (_, f) = with_a(&[0x37], 0x00, 0);
    assert_eq!(f, CF);
    let (_, f) = with_a(&[0x3F], 0x00, CF);
    assert_eq!(f, HF);
}

#[test]
fn neg_of_0x80_overflows() {
    let (a, f) = with_a(&[0xED, 0x44], 0x80, 0);
    assert_eq!(a, 0x80);
    assert_eq!(f & (VF | CF | NF), VF | CF | NF);
}

#[test]
fn sbc_hl_to_zero() {
    let (mut cpu, mut bus) = common::machine(&[0xED, 0x52]);
    cpu.regs.set_hl(0x1000);
    cpu.regs.set_de(0x0FFF);
    cpu.regs.f = CF;
    common::step(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.hl(), 0);
    assert_eq!(cpu.regs.f & (ZF | NF | CF), ZF | NF);
}

#[test]
fn ld_a_i_reports_iff2() {
    let (mut cpu, mut bus) = common::machine(&[0xED, 0x57]);
    cpu.regs.i = 0x80;
    cpu.regs.iff2 = true;
    common::step(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x80);
    assert_eq!(cpu.regs.f, SF | PF);
}

#[test]
fn bit_on_index_takes_undocumented_bits_from_address() {
    let (mut cpu, mut bus) = common::machine(&[0xDD, 0xCB, 0x00, 0x46]);
    cpu.regs.set_ix(0x2800);
    cpu.regs.f = CF;
    common::step(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.f, ZF | PF | HF | XF | YF | CF);
}

#[test]
fn index_cb_register_copy() {
    let (mut cpu, mut bus) = common::machine(&[0xFD, 0xCB, 0x01, 0xC0]);
    bus.load(0x9001, &[0x10]);
    cpu.regs.set_iy(0x9000);
    common::step(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x9001], 0x11);
    assert_eq!(cpu.regs.b, 0x11);
}

#[test]
fn cpir_stops_on_match() {
    let (mut cpu, mut bus) = common::machine(&[0xED, 0xB1]);
    bus.load(0x9000, &[1, 2, 3, 4]);
    cpu.regs.a = 3;
    cpu.regs.set_hl(0x9000);
    cpu.regs.set_bc(4);
    while cpu.regs.pc == common::ORIGIN {
        common::step(&mut cpu, &mut bus);
    }
    assert_eq!(cpu.regs.hl(), 0x9003);
    assert_eq!(cpu.regs.bc(), 1);
    assert_ne!(cpu.regs.f & ZF, 0);
    assert_ne!(cpu.regs.f & VF, 0);
}

#[test]
fn in_r_c_sets_parity() {
    let (cpu, _, _) = run_one(&[0xED, 0x78]);
    // SimpleBus ports read 0xFF.
    assert_eq!(cpu.regs.a, 0xFF);
    assert_eq!(cpu.regs.f, SF | PF | XF | YF);
}

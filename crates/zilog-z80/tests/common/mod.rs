//! Shared helpers for Z80 integration tests.

#![allow(dead_code)]

use emu_core::SimpleBus;
use zilog_z80::Z80;

pub const ORIGIN: u16 = 0x8000;
pub const STACK: u16 = 0xC000;

/// CPU at `ORIGIN` with `program` loaded and a stack in free memory.
pub fn machine(program: &[u8]) -> (Z80, SimpleBus) {
    let mut cpu = Z80::new();
    let mut bus = SimpleBus::new();
    bus.load(ORIGIN, program);
    cpu.regs.pc = ORIGIN;
    cpu.regs.sp = STACK;
    (cpu, bus)
}

/// Execute one instruction and return the T-states it took.
pub fn step(cpu: &mut Z80, bus: &mut SimpleBus) -> u32 {
    let start = bus.tstates;
    cpu.execute(bus);
    bus.tstates - start
}

/// Execute `program`'s first instruction on a fresh machine.
pub fn run_one(program: &[u8]) -> (Z80, SimpleBus, u32) {
    let (mut cpu, mut bus) = machine(program);
    let cycles = step(&mut cpu, &mut bus);
    (cpu, bus, cycles)
}

//! Cycle-accurate Z80 CPU emulator.
//!
//! Each call to `execute()` runs one instruction. Every memory and port
//! access is charged through the bus in the order the hardware performs it,
//! so contention delays land on the right T-states.

mod alu;
mod cpu;
mod flags;
pub mod opcodes;
mod registers;

pub use cpu::{INTERRUPT_LENGTH, Z80, Z80Bus};
pub use flags::{CF, HF, NF, PARITY, PF, SF, SZ53, SZ53P, VF, XF, YF, ZF};
pub use registers::{RegisterPair, Registers};

//! Core traits and types for cycle-accurate emulation.
//!
//! Every access a CPU makes goes through a bus that owns the frame's
//! T-state counter. The bus charges wait states; the CPU only decides the
//! order and the base cost of each access.

mod bus;
mod cpu;
mod observable;

pub use bus::{Bus, IoBus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};

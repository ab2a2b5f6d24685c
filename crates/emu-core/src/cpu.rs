//! CPU core trait.

use crate::{Bus, IoBus};

/// An instruction-stepped CPU.
///
/// The bus is borrowed for each call rather than owned, so the machine that
/// owns both can hand the same bus to the video and port logic between
/// instructions.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Execute exactly one instruction, including any prefix bytes.
    fn step<B: Bus + IoBus>(&mut self, bus: &mut B);

    /// Execute instructions until the bus clock reaches `limit`.
    ///
    /// A halted CPU keeps fetching at NOP cost, so the clock still reaches
    /// the limit.
    fn run_until<B: Bus + IoBus>(&mut self, bus: &mut B, limit: u32) {
        while bus.tstates() < limit {
            self.step(bus);
        }
    }

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a copy of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;

    /// Raise the maskable interrupt. Returns true if it was accepted.
    fn interrupt<B: Bus + IoBus>(&mut self, bus: &mut B) -> bool;

    /// Reset the CPU to its power-on state.
    fn reset(&mut self);
}

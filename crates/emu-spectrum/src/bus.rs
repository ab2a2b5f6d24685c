//! Spectrum bus: contended memory and I/O routing.
//!
//! The bus owns everything an instruction can touch: memory, the frame
//! clock, the screen shadow and the ports. The Z80 sees it through
//! `emu_core::Bus` and `emu_core::IoBus`.
//!
//! # Contention
//!
//! Accesses to $4000-$7FFF wait for the ULA according to
//! [`ContentionClock::delay`] at the T-state the access starts. CPU writes
//! into the bitmap or attribute area are reported to the [`ScreenShadow`]
//! before memory changes, so it can keep the value the ULA already fetched.

use emu_core::{Bus, IoBus};
use sinclair_ula::{ContentionClock, ScreenImage, ScreenShadow, is_attr, is_bitmap};

use crate::memory::Memory;
use crate::ports::Ports;

pub struct SpectrumBus {
    pub memory: Memory,
    pub clock: ContentionClock,
    pub shadow: ScreenShadow,
    pub ports: Ports,
}

impl SpectrumBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Memory::new(),
            clock: ContentionClock::new(),
            shadow: ScreenShadow::new(),
            ports: Ports::new(),
        }
    }

    /// Start a frame on the ports and the screen shadow.
    pub fn frame_begin(&mut self) {
        self.ports.frame_begin();
        self.shadow.frame_begin();
    }

    /// The screen as the ULA displayed it this frame.
    #[must_use]
    pub fn compose_screen(&self, diff_only: bool) -> ScreenImage {
        self.shadow.compose(diff_only, |addr| self.memory.at(addr))
    }

    fn contend(&mut self, address: u16, time: u32) {
        if Memory::contended(address) {
            self.clock.contend(time);
        } else {
            self.clock.add(time);
        }
    }
}

impl Default for SpectrumBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SpectrumBus {
    fn tstates(&self) -> u32 {
        self.clock.tstates()
    }

    fn add_tstates(&mut self, delta: u32) {
        self.clock.add(delta);
    }

    fn read_byte(&mut self, address: u16) -> u8 {
        self.contend(address, 3);
        self.memory.at(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.contend(address, 3);
        self.write_byte_internal(address, value);
    }

    fn read_byte_internal(&self, address: u16) -> u8 {
        self.memory.at(address)
    }

    fn write_byte_internal(&mut self, address: u16, value: u8) {
        if Memory::is_rom(address) {
            return;
        }
        let old = self.memory.at(address);
        if old != value {
            let tstates = self.clock.tstates();
            if is_bitmap(address) {
                self.shadow.bitmap_write(address, old, tstates);
            } else if is_attr(address) {
                self.shadow.attr_write(address, old, tstates);
            }
        }
        self.memory.set(address, value);
    }

    fn contend_read(&mut self, address: u16, time: u32) {
        self.contend(address, time);
    }

    fn contend_read_no_mreq(&mut self, address: u16, time: u32) {
        self.contend(address, time);
    }

    fn contend_write_no_mreq(&mut self, address: u16, time: u32) {
        self.contend(address, time);
    }
}

impl IoBus for SpectrumBus {
    fn read_port(&mut self, port: u16) -> u8 {
        self.ports.read_port(&mut self.clock, port)
    }

    fn write_port(&mut self, port: u16, value: u8) {
        self.ports.write_port(&mut self.clock, port, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinclair_ula::FIRST_SCREEN_BYTE;

    /// A bus in its second frame, so only touched cells are dirty.
    fn make_bus() -> SpectrumBus {
        let mut bus = SpectrumBus::new();
        bus.frame_begin();
        bus.frame_begin();
        bus
    }

    #[test]
    fn uncontended_read_costs_3() {
        let mut bus = make_bus();
        bus.clock.set_tstates(FIRST_SCREEN_BYTE);
        bus.read_byte(0x8000);
        assert_eq!(bus.tstates(), FIRST_SCREEN_BYTE + 3);
    }

    #[test]
    fn contended_read_waits_for_ula() {
        let mut bus = make_bus();
        bus.clock.set_tstates(FIRST_SCREEN_BYTE - 1);
        bus.read_byte(0x4000);
        assert_eq!(bus.tstates(), FIRST_SCREEN_BYTE - 1 + 6 + 3);

        // Outside the fetch window the same address is free.
        bus.clock.set_tstates(100);
        bus.read_byte(0x4000);
        assert_eq!(bus.tstates(), 103);
    }

    #[test]
    fn rom_writes_ignored() {
        let mut bus = make_bus();
        bus.memory.set(0x0000, 0xF3);
        bus.write_byte(0x0000, 0x00);
        assert_eq!(bus.memory.at(0x0000), 0xF3);
        assert_eq!(bus.tstates(), 3, "the cycle still happens");
    }

    #[test]
    fn late_screen_write_is_shadowed() {
        let mut bus = make_bus();
        bus.memory.set(0x4000, 0x81);
        bus.clock.set_tstates(FIRST_SCREEN_BYTE + 200);
        bus.write_byte(0x4000, 0xFF);
        assert_eq!(bus.memory.at(0x4000), 0xFF);
        let image = bus.compose_screen(true);
        assert_eq!(image.bitmap[0], 0x81);
    }

    #[test]
    fn early_screen_write_shows_immediately() {
        let mut bus = make_bus();
        bus.clock.set_tstates(10);
        bus.write_byte(0x5800, 0x38);
        let image = bus.compose_screen(true);
        assert_eq!(image.attr[0], 0x07);
        assert!(image.dirty[0]);
        assert!(!image.dirty[1]);
    }

    #[test]
    fn ports_share_the_clock() {
        let mut bus = make_bus();
        bus.clock.set_tstates(50);
        bus.write_port(0x00FE, 0x02);
        assert_eq!(bus.tstates(), 54);
        assert_eq!(bus.ports.border(), 2);
    }
}

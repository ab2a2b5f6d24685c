//! 48K memory: 16K ROM followed by 48K RAM in one flat array.
//!
//! Layout:
//! - $0000-$3FFF: ROM (ignored by CPU writes)
//! - $4000-$7FFF: contended RAM, shared with the ULA
//! - $8000-$FFFF: uncontended RAM

use sinclair_ula::{SCREEN_BASE, VIDEO_MEMORY_SIZE};

pub const ROM_SIZE: usize = 0x4000;
pub const RAM_SIZE: usize = 0xC000;
pub const RAM_BASE: u16 = 0x4000;

pub struct Memory {
    data: Box<[u8; 0x10000]>,
}

impl Memory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Box::new([0; 0x10000]),
        }
    }

    /// Zero RAM and copy `rom` into the bottom 16K.
    pub fn reset(&mut self, rom: &[u8; ROM_SIZE]) {
        self.data[..ROM_SIZE].copy_from_slice(rom);
        self.data[ROM_SIZE..].fill(0);
    }

    #[must_use]
    pub fn at(&self, addr: u16) -> u8 {
        self.data[usize::from(addr)]
    }

    /// Raw write, ROM included. For snapshot and test setup.
    pub fn set(&mut self, addr: u16, value: u8) {
        self.data[usize::from(addr)] = value;
    }

    #[must_use]
    pub fn data(&self) -> &[u8; 0x10000] {
        &self.data
    }

    #[must_use]
    pub fn ram(&self) -> &[u8] {
        &self.data[ROM_SIZE..]
    }

    /// Replace the whole of RAM.
    pub fn load_ram(&mut self, ram: &[u8; RAM_SIZE]) {
        self.data[ROM_SIZE..].copy_from_slice(ram);
    }

    /// Bitmap and attributes as they are in memory now.
    #[must_use]
    pub fn video_memory(&self) -> &[u8] {
        let start = usize::from(SCREEN_BASE);
        &self.data[start..start + VIDEO_MEMORY_SIZE]
    }

    /// Is `addr` in RAM the ULA contends?
    #[must_use]
    pub fn contended(addr: u16) -> bool {
        addr & 0xC000 == 0x4000
    }

    #[must_use]
    pub fn is_rom(addr: u16) -> bool {
        addr < RAM_BASE
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

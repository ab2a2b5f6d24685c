//! Memory and I/O bus interfaces.

/// Timed memory interface.
///
/// The bus owns the T-state counter. Timed accessors add the base cost plus
/// any contention delay for the current T-state; the `_internal` accessors
/// move data without touching the clock, for paths that charged their
/// timing separately (opcode fetch, snapshot I/O).
pub trait Bus {
    /// T-states elapsed since the start of the current frame.
    fn tstates(&self) -> u32;

    /// Advance the clock without a memory access.
    fn add_tstates(&mut self, delta: u32);

    /// Contended 3 T-state read.
    fn read_byte(&mut self, address: u16) -> u8;

    /// Contended 3 T-state write.
    fn write_byte(&mut self, address: u16, value: u8);

    /// Read without timing.
    fn read_byte_internal(&self, address: u16) -> u8;

    /// Write without timing. Screen-shadow capture still applies.
    fn write_byte_internal(&mut self, address: u16, value: u8);

    /// Contention for an access with MREQ asserted, then `time` T-states.
    fn contend_read(&mut self, address: u16, time: u32);

    /// Contention for an internal cycle that leaves `address` on the bus.
    fn contend_read_no_mreq(&mut self, address: u16, time: u32);

    /// Write-side counterpart of [`Bus::contend_read_no_mreq`].
    fn contend_write_no_mreq(&mut self, address: u16, time: u32);

    /// `count` back-to-back no-MREQ cycles of 1 T-state each.
    fn contend_read_no_mreq_loop(&mut self, address: u16, count: u32) {
        for _ in 0..count {
            self.contend_read_no_mreq(address, 1);
        }
    }

    /// `count` back-to-back write-side no-MREQ cycles of 1 T-state each.
    fn contend_write_no_mreq_loop(&mut self, address: u16, count: u32) {
        for _ in 0..count {
            self.contend_write_no_mreq(address, 1);
        }
    }
}

/// Timed I/O port interface.
///
/// Implementations charge the whole port cycle (pre-I/O and post-I/O
/// contention) inside these calls.
pub trait IoBus {
    fn read_port(&mut self, port: u16) -> u8;
    fn write_port(&mut self, port: u16, value: u8);
}

/// Flat 64K bus with fixed costs and no contention.
///
/// Reads cost 3 T-states, port accesses cost 4. Port reads return
/// `port_value`; port writes are recorded in order.
pub struct SimpleBus {
    pub memory: Box<[u8; 0x10000]>,
    pub tstates: u32,
    pub port_value: u8,
    pub port_writes: Vec<(u16, u8)>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            tstates: 0,
            port_value: 0xFF,
            port_writes: Vec::new(),
        }
    }

    /// Copy `bytes` into memory starting at `address`.
    pub fn load(&mut self, address: u16, bytes: &[u8]) {
        for (offset, &byte) in bytes.iter().enumerate() {
            let addr = address.wrapping_add(offset as u16);
            self.memory[addr as usize] = byte;
        }
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn tstates(&self) -> u32 {
        self.tstates
    }

    fn add_tstates(&mut self, delta: u32) {
        self.tstates += delta;
    }

    fn read_byte(&mut self, address: u16) -> u8 {
        self.tstates += 3;
        self.memory[address as usize]
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.tstates += 3;
        self.memory[address as usize] = value;
    }

    fn read_byte_internal(&self, address: u16) -> u8 {
        self.memory[address as usize]
    }

    fn write_byte_internal(&mut self, address: u16, value: u8) {
        self.memory[address as usize] = value;
    }

    fn contend_read(&mut self, _address: u16, time: u32) {
        self.tstates += time;
    }

    fn contend_read_no_mreq(&mut self, _address: u16, time: u32) {
        self.tstates += time;
    }

    fn contend_write_no_mreq(&mut self, _address: u16, time: u32) {
        self.tstates += time;
    }
}

impl IoBus for SimpleBus {
    fn read_port(&mut self, _port: u16) -> u8 {
        self.tstates += 4;
        self.port_value
    }

    fn write_port(&mut self, port: u16, value: u8) {
        self.tstates += 4;
        self.port_writes.push((port, value));
    }
}

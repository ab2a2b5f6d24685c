//! Machine state exchanged with snapshot codecs.

use std::path::Path;

use zilog_z80::Registers;

use crate::error::{SnapshotError, SnapshotResult};
use crate::memory::RAM_SIZE;
use crate::{sna, z80};

/// CPU registers plus the frame clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuState {
    pub registers: Registers,
    /// T-states into the current frame.
    pub tstates: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UlaState {
    pub border: u8,
}

/// A complete 48K machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub cpu: CpuState,
    pub ula: UlaState,
    /// RAM from $4000 to $FFFF.
    pub memory: Vec<u8>,
}

impl Snapshot {
    /// A zeroed state with 48K of RAM.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cpu: CpuState::default(),
            ula: UlaState::default(),
            memory: vec![0; RAM_SIZE],
        }
    }

    pub fn decode(data: &[u8], format: SnapshotFormat) -> SnapshotResult<Self> {
        match format {
            SnapshotFormat::Sna => sna::decode(data),
            SnapshotFormat::Z80 => z80::decode(data),
        }
    }

    /// Check the state can be applied to a machine.
    pub fn validate(&self) -> SnapshotResult<()> {
        if self.memory.len() != RAM_SIZE {
            return Err(SnapshotError::InvalidSize {
                expected: RAM_SIZE,
                actual: self.memory.len(),
            });
        }
        if self.cpu.registers.im > 2 {
            return Err(SnapshotError::InvalidInterruptMode(self.cpu.registers.im));
        }
        Ok(())
    }

    /// Byte at a 16-bit address in RAM. Addresses below $4000 read 0.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        addr.checked_sub(0x4000)
            .and_then(|offset| self.memory.get(usize::from(offset)))
            .copied()
            .unwrap_or(0)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Supported snapshot file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Sna,
    Z80,
}

impl SnapshotFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> SnapshotResult<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("sna") => Ok(Self::Sna),
            Some("z80") => Ok(Self::Z80),
            _ => Err(SnapshotError::UnknownFormat(path.display().to_string())),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sna => "SNA",
            Self::Z80 => "Z80",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(SnapshotFormat::from_path(Path::new("game.SNA")), Ok(SnapshotFormat::Sna));
        assert_eq!(SnapshotFormat::from_path(Path::new("a/b.z80")), Ok(SnapshotFormat::Z80));
        assert!(SnapshotFormat::from_path(Path::new("tape.tap")).is_err());
        assert!(SnapshotFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn validate_rejects_bad_state() {
        let mut snapshot = Snapshot::new();
        assert_eq!(snapshot.validate(), Ok(()));

        snapshot.cpu.registers.im = 3;
        assert_eq!(snapshot.validate(), Err(SnapshotError::InvalidInterruptMode(3)));

        snapshot.cpu.registers.im = 1;
        snapshot.memory.pop();
        assert!(matches!(snapshot.validate(), Err(SnapshotError::InvalidSize { .. })));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn state_survives_json() {
        use crate::ports::BorderEvent;

        let mut cpu = CpuState::default();
        cpu.registers.set_ix(0x1234);
        cpu.registers.set_af_alt(0xA5C3);
        cpu.registers.set_r_full(0x81);
        cpu.registers.im = 2;
        cpu.registers.iff1 = true;
        cpu.tstates = 12_345;
        let json = serde_json::to_string(&cpu).expect("serialize");
        assert_eq!(serde_json::from_str::<CpuState>(&json).expect("deserialize"), cpu);

        let ula = UlaState { border: 5 };
        let json = serde_json::to_string(&ula).expect("serialize");
        assert_eq!(serde_json::from_str::<UlaState>(&json).expect("deserialize"), ula);

        let events = vec![
            BorderEvent { tstate: 0, color: 7 },
            BorderEvent { tstate: 14_340, color: 2 },
        ];
        let json = serde_json::to_string(&events).expect("serialize");
        assert_eq!(
            serde_json::from_str::<Vec<BorderEvent>>(&json).expect("deserialize"),
            events
        );
    }

    #[test]
    fn peek_maps_ram() {
        let mut snapshot = Snapshot::new();
        snapshot.memory[0] = 0x11;
        snapshot.memory[RAM_SIZE - 1] = 0x22;
        assert_eq!(snapshot.peek(0x4000), 0x11);
        assert_eq!(snapshot.peek(0xFFFF), 0x22);
        assert_eq!(snapshot.peek(0x0000), 0);
    }
}

//! Cycle-accurate ZX Spectrum 48K emulator.
//!
//! The Z80 runs against [`SpectrumBus`], which charges ULA contention on
//! every access and keeps the screen shadow that lets a frame show what
//! the ULA actually fetched. [`Spectrum48k`] drives the frame cycle;
//! [`Emulator`] runs it on its own thread behind a command queue.

mod audio;
mod bus;
mod config;
mod display;
mod error;
mod keyboard;
mod memory;
mod ports;
pub mod sna;
mod snapshot;
mod spectrum;
pub mod task;
pub mod z80;

pub use audio::{
    AUDIO16_TABLE, AudioData, AudioReceiverInfo, MAX_AUDIO_LEVEL, VOLTAGE_ISSUE2, VOLTAGE_ISSUE3,
};
pub use bus::SpectrumBus;
pub use config::{DEFAULT_FPS, SpectrumConfig, effective_fps};
pub use display::{DisplayData, DisplayInfo, SendOutcome};
pub use error::{EmulatorError, EmulatorResult, SnapshotError, SnapshotResult};
pub use keyboard::{KeyboardState, SpectrumKey};
pub use memory::{Memory, RAM_BASE, RAM_SIZE, ROM_SIZE};
pub use ports::{
    BeeperEvent, BorderEvent, FrameStatus, JOYSTICK_DOWN, JOYSTICK_FIRE, JOYSTICK_LEFT,
    JOYSTICK_RIGHT, JOYSTICK_UP, Ports, TAPE_READS_THRESHOLD,
};
pub use snapshot::{CpuState, Snapshot, SnapshotFormat, UlaState};
pub use spectrum::{ROM_LOADED_PC, RomType, Spectrum48k, TAPE_COUNTDOWN_FRAMES};
pub use task::{Command, Emulator};

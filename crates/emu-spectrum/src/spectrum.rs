//! The 48K machine and its frame cycle.
//!
//! # Frame cycle
//!
//! [`Spectrum48k::render_frame`] runs one 69,888 T-state frame:
//!
//! 1. start the frame on the ports and the screen shadow
//! 2. wrap the clock, keeping any overrun from the last instruction
//! 3. raise the maskable interrupt (accepted only with IFF1 set)
//! 4. execute instructions until the clock reaches the end of the frame
//! 5. close the border and beeper logs
//!
//! Display and audio data for the frame are then available from
//! [`Spectrum48k::display_data`] and [`Spectrum48k::audio_data`].

use emu_core::{Cpu, Observable, Value};
use sinclair_ula::{TSTATES_PER_FRAME, VIDEO_MEMORY_SIZE};
use zilog_z80::Z80;

use crate::audio::AudioData;
use crate::bus::SpectrumBus;
use crate::config::{SpectrumConfig, effective_fps};
use crate::display::DisplayData;
use crate::error::{EmulatorError, EmulatorResult, SnapshotError, SnapshotResult};
use crate::keyboard::SpectrumKey;
use crate::memory::{RAM_SIZE, ROM_SIZE};
use crate::ports::FrameStatus;
use crate::snapshot::{CpuState, Snapshot, UlaState};

/// PC of the ROM's key-wait loop, reached once the system has booted.
pub const ROM_LOADED_PC: u16 = 0x10AC;

/// Frames the tape keeps running after the program stops polling it.
pub const TAPE_COUNTDOWN_FRAMES: u32 = 75;

/// Copyright string found in the OpenSE BASIC ROM, which never reaches
/// [`ROM_LOADED_PC`].
const OPENSE_SIGNATURE: &[u8] = b"1981 Nine Tiles Networks";

/// Which system ROM is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomType {
    Sinclair48,
    OpenSe,
}

/// A ZX Spectrum 48K.
pub struct Spectrum48k {
    cpu: Z80,
    bus: SpectrumBus,
    rom: Box<[u8; ROM_SIZE]>,
    rom_type: RomType,
    fps: f32,
    tape_countdown: u32,
}

impl Spectrum48k {
    /// Build a machine and reset it.
    ///
    /// # Errors
    ///
    /// Returns [`EmulatorError::Rom`] if the ROM is not exactly 16 KiB.
    pub fn new(config: SpectrumConfig) -> EmulatorResult<Self> {
        let rom: Box<[u8; ROM_SIZE]> = config
            .rom
            .into_boxed_slice()
            .try_into()
            .map_err(|rom: Box<[u8]>| EmulatorError::Rom {
                expected: ROM_SIZE,
                actual: rom.len(),
            })?;
        let rom_type = if rom
            .windows(OPENSE_SIGNATURE.len())
            .any(|w| w == OPENSE_SIGNATURE)
        {
            RomType::OpenSe
        } else {
            RomType::Sinclair48
        };

        let mut bus = SpectrumBus::new();
        bus.shadow.set_accurate(config.accurate_ula);
        bus.ports.accelerated_load = config.accelerated_load;
        bus.ports.tape_noise = config.tape_noise;

        let mut spectrum = Self {
            cpu: Z80::new(),
            bus,
            rom,
            rom_type,
            fps: effective_fps(config.fps),
            tape_countdown: 0,
        };
        spectrum.reset();
        Ok(spectrum)
    }

    /// Power-on reset. Options survive.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus.memory.reset(&self.rom);
        self.bus.clock.set_tstates(0);
        self.bus.shadow.reset();
        self.bus.ports.reset();
        self.tape_countdown = 0;
    }

    /// Run one frame.
    pub fn render_frame(&mut self) -> FrameStatus {
        self.bus.frame_begin();
        self.bus.clock.wrap_frame();
        self.cpu.interrupt(&mut self.bus);
        self.cpu.run_until(&mut self.bus, TSTATES_PER_FRAME);
        let status = self.bus.ports.frame_end();

        let was_active = self.tape_active();
        if status.should_play_tape {
            self.tape_countdown = TAPE_COUNTDOWN_FRAMES;
        } else {
            self.tape_countdown = self.tape_countdown.saturating_sub(1);
        }
        if was_active != self.tape_active() {
            log::debug!("tape activity: {}", self.tape_active());
        }
        status
    }

    /// Screen and border for the frame just run.
    #[must_use]
    pub fn display_data(&self, diff_only: bool) -> DisplayData {
        let events = self.bus.ports.border_events();
        DisplayData {
            screen: self.bus.compose_screen(diff_only),
            border: self.bus.ports.border(),
            // The start and end entries alone mean the border never changed.
            border_events: (events.len() > 2).then(|| events.to_vec()),
            frame: self.bus.shadow.frame(),
        }
    }

    #[must_use]
    pub fn audio_data(&self) -> AudioData {
        AudioData {
            fps: self.fps,
            beeper_events: self.bus.ports.beeper_events().to_vec(),
        }
    }

    /// Replace the machine state. Nothing changes if the snapshot is
    /// invalid.
    ///
    /// # Errors
    ///
    /// Returns the reason the snapshot cannot be applied.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> SnapshotResult<()> {
        snapshot.validate()?;
        let ram: &[u8; RAM_SIZE] =
            snapshot
                .memory
                .as_slice()
                .try_into()
                .map_err(|_| SnapshotError::InvalidSize {
                    expected: RAM_SIZE,
                    actual: snapshot.memory.len(),
                })?;

        self.reset();
        self.cpu.regs = snapshot.cpu.registers;
        self.bus.memory.load_ram(ram);
        self.bus.ports.set_border(snapshot.ula.border);
        self.bus.clock.set_tstates(snapshot.cpu.tstates);
        Ok(())
    }

    #[must_use]
    pub fn make_snapshot(&self) -> Snapshot {
        Snapshot {
            cpu: CpuState {
                registers: self.cpu.regs,
                tstates: self.bus.clock.tstates(),
            },
            ula: UlaState {
                border: self.bus.ports.border(),
            },
            memory: self.bus.memory.ram().to_vec(),
        }
    }

    /// Bitmap and attributes, 6912 bytes from $4000.
    #[must_use]
    pub fn video_memory_dump(&self) -> Vec<u8> {
        let dump = self.bus.memory.video_memory().to_vec();
        debug_assert_eq!(dump.len(), VIDEO_MEMORY_SIZE);
        dump
    }

    /// The running program polled the tape port recently.
    #[must_use]
    pub fn tape_active(&self) -> bool {
        self.tape_countdown > 0
    }

    #[must_use]
    pub fn rom_type(&self) -> RomType {
        self.rom_type
    }

    /// The system ROM has finished booting and waits for a key.
    #[must_use]
    pub fn at_rom_entry_loop(&self) -> bool {
        self.cpu.regs.pc == ROM_LOADED_PC
    }

    #[must_use]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Set the frame rate, returning the old one. Rates at or below 1
    /// select the default.
    pub fn set_fps(&mut self, fps: f32) -> f32 {
        std::mem::replace(&mut self.fps, effective_fps(fps))
    }

    pub fn set_ula_accuracy(&mut self, accurate: bool) {
        self.bus.shadow.set_accurate(accurate);
    }

    pub fn set_accelerated_load(&mut self, accelerated: bool) {
        self.bus.ports.accelerated_load = accelerated;
    }

    pub fn key_down(&mut self, key: SpectrumKey) {
        self.bus.ports.keyboard.key_down(key);
    }

    pub fn key_up(&mut self, key: SpectrumKey) {
        self.bus.ports.keyboard.key_up(key);
    }

    /// Kempston state, active high.
    pub fn set_joystick(&mut self, bits: u8) {
        self.bus.ports.joystick = bits;
    }

    pub fn set_tape_ear(&mut self, ear: Option<bool>) {
        self.bus.ports.set_tape_ear(ear);
    }

    #[must_use]
    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &SpectrumBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SpectrumBus {
        &mut self.bus
    }
}

impl Observable for Spectrum48k {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("ula.") {
            match rest {
                "tstate" => Some(self.bus.clock.tstates().into()),
                "frame" => Some(self.bus.shadow.frame().into()),
                "border" => Some(self.bus.ports.border().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("memory.") {
            let addr = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
                u16::from_str_radix(hex, 16).ok()
            } else if let Some(hex) = rest.strip_prefix('$') {
                u16::from_str_radix(hex, 16).ok()
            } else {
                rest.parse().ok()
            };
            addr.map(|a| Value::U8(self.bus.memory.at(a)))
        } else {
            match path {
                "tape_active" => Some(Value::Bool(self.tape_active())),
                _ => self.cpu.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<z80_paths>",
            "ula.tstate",
            "ula.frame",
            "ula.border",
            "memory.<address>",
            "tape_active",
        ]
    }
}

//! I/O ports: keyboard, Kempston joystick, tape EAR, border and beeper.
//!
//! The ULA answers every even port. A read returns the selected keyboard
//! half-rows with bit 6 taken from the EAR input; a write sets the border
//! colour (bits 0-2) and the MIC/EAR output (bits 3-4). The Kempston
//! interface answers odd ports with A5-A7 low.
//!
//! Border and beeper changes are logged with the T-state they happened at,
//! so a display or audio collaborator can reproduce them within the frame.

use sinclair_ula::{ContentionClock, TSTATES_PER_FRAME};

use crate::keyboard::KeyboardState;

pub const JOYSTICK_RIGHT: u8 = 0x01;
pub const JOYSTICK_LEFT: u8 = 0x02;
pub const JOYSTICK_DOWN: u8 = 0x04;
pub const JOYSTICK_UP: u8 = 0x08;
pub const JOYSTICK_FIRE: u8 = 0x10;

/// Port $FE reads in one frame above which the program is assumed to be
/// polling the tape.
pub const TAPE_READS_THRESHOLD: u32 = 100;

/// Border colour change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BorderEvent {
    pub tstate: u32,
    /// Colour 0-7.
    pub color: u8,
}

/// Beeper level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeeperEvent {
    pub tstate: u32,
    /// Bits 3-4 of the port write, 0-3.
    pub level: u8,
}

/// A timestamped value that only logs changes.
trait Event: Copy {
    fn tstate(&self) -> u32;
    fn value(&self) -> u8;
    fn at(tstate: u32, value: u8) -> Self;
}

impl Event for BorderEvent {
    fn tstate(&self) -> u32 {
        self.tstate
    }
    fn value(&self) -> u8 {
        self.color
    }
    fn at(tstate: u32, color: u8) -> Self {
        Self { tstate, color }
    }
}

impl Event for BeeperEvent {
    fn tstate(&self) -> u32 {
        self.tstate
    }
    fn value(&self) -> u8 {
        self.level
    }
    fn at(tstate: u32, level: u8) -> Self {
        Self { tstate, level }
    }
}

/// One frame's change log, oldest first.
///
/// The first entry is the value at T-state 0. After [`EventLog::frame_end`]
/// the last entry is at `TSTATES_PER_FRAME`.
#[derive(Debug, Clone)]
struct EventLog<E> {
    events: Vec<E>,
    /// Changes made after the end of the last frame.
    carried: Vec<E>,
}

impl<E: Event> EventLog<E> {
    fn new(value: u8) -> Self {
        Self {
            events: vec![E::at(0, value)],
            carried: Vec::new(),
        }
    }

    fn current(&self) -> u8 {
        self.events.last().map_or(0, Event::value)
    }

    /// Start a frame at `value`, replaying changes carried from the last one.
    fn frame_begin(&mut self, value: u8) {
        self.events.clear();
        self.events.push(E::at(0, value));
        for event in std::mem::take(&mut self.carried) {
            self.record(event.tstate(), event.value());
        }
    }

    /// Record `value` at `tstate` if it differs from the current one.
    fn record(&mut self, tstate: u32, value: u8) {
        let Some(head) = self.events.last_mut() else {
            self.events.push(E::at(tstate, value));
            return;
        };
        if head.value() == value {
            return;
        }
        if head.tstate() == tstate {
            *head = E::at(tstate, value);
        } else {
            self.events.push(E::at(tstate, value));
        }
    }

    /// Close the frame: move changes past its end to the next frame and
    /// terminate the log at `TSTATES_PER_FRAME`. Returns the value on the
    /// boundary.
    fn frame_end(&mut self) -> u8 {
        let split = self
            .events
            .iter()
            .position(|e| e.tstate() >= TSTATES_PER_FRAME)
            .unwrap_or(self.events.len());
        self.carried = self
            .events
            .drain(split..)
            .map(|e| E::at(e.tstate() - TSTATES_PER_FRAME, e.value()))
            .collect();
        let boundary = self.current();
        self.events.push(E::at(TSTATES_PER_FRAME, boundary));
        boundary
    }
}

/// What the ports saw during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStatus {
    /// The program read port $FE often enough to be loading from tape.
    pub should_play_tape: bool,
}

/// Port state for one machine.
#[derive(Debug, Clone)]
pub struct Ports {
    pub keyboard: KeyboardState,
    /// Kempston bits, active high.
    pub joystick: u8,
    /// EAR input from the tape, if one is playing.
    pub tape_ear: Option<bool>,
    pub accelerated_load: bool,
    pub tape_noise: bool,
    border: u8,
    /// Last MIC/EAR level written to port $FE.
    beeper: u8,
    border_events: EventLog<BorderEvent>,
    beeper_events: EventLog<BeeperEvent>,
    border_at_frame_start: u8,
    beeper_at_frame_start: u8,
    fe_reads: u32,
}

impl Ports {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keyboard: KeyboardState::new(),
            joystick: 0,
            tape_ear: None,
            accelerated_load: false,
            tape_noise: true,
            border: 7,
            beeper: 0,
            border_events: EventLog::new(7),
            beeper_events: EventLog::new(0),
            border_at_frame_start: 7,
            beeper_at_frame_start: 0,
            fe_reads: 0,
        }
    }

    /// Power-on state. Options (`accelerated_load`, `tape_noise`) survive.
    pub fn reset(&mut self) {
        self.keyboard.release_all();
        self.joystick = 0;
        self.set_border(7);
        self.beeper = 0;
        self.beeper_events = EventLog::new(0);
        self.beeper_at_frame_start = 0;
        self.fe_reads = 0;
    }

    #[must_use]
    pub fn border(&self) -> u8 {
        self.border
    }

    /// Set the border without logging an event, as a snapshot load does.
    pub fn set_border(&mut self, color: u8) {
        self.border = color & 0x07;
        self.border_events = EventLog::new(self.border);
        self.border_at_frame_start = self.border;
    }

    /// Drive the EAR input. `None` disconnects the tape.
    pub fn set_tape_ear(&mut self, ear: Option<bool>) {
        self.tape_ear = ear;
    }

    #[must_use]
    pub fn border_events(&self) -> &[BorderEvent] {
        &self.border_events.events
    }

    #[must_use]
    pub fn beeper_events(&self) -> &[BeeperEvent] {
        &self.beeper_events.events
    }

    #[must_use]
    pub fn fe_reads(&self) -> u32 {
        self.fe_reads
    }

    pub fn frame_begin(&mut self) {
        self.border_events.frame_begin(self.border_at_frame_start);
        self.beeper_events.frame_begin(self.beeper_at_frame_start);
        self.fe_reads = 0;
    }

    pub fn frame_end(&mut self) -> FrameStatus {
        self.border_at_frame_start = self.border_events.frame_end();
        self.beeper_at_frame_start = self.beeper_events.frame_end();
        FrameStatus {
            should_play_tape: self.fe_reads >= TAPE_READS_THRESHOLD,
        }
    }

    /// Contention before the I/O cycle: the high byte is on the address
    /// bus for one T-state.
    pub fn contend_port_pre_io(clock: &mut ContentionClock, port: u16) {
        if port & 0xC000 == 0x4000 {
            clock.contend(1);
        } else {
            clock.add(1);
        }
    }

    /// Contention for the rest of the I/O cycle. Even ports are always
    /// contended by the ULA; odd ports only when the high byte looks like
    /// contended RAM.
    pub fn contend_port_post_io(clock: &mut ContentionClock, port: u16) {
        if port & 0x0001 != 0 {
            if port & 0xC000 == 0x4000 {
                for _ in 0..3 {
                    clock.contend(1);
                }
            } else {
                clock.add(3);
            }
        } else {
            clock.contend(3);
        }
    }

    pub fn read_port(&mut self, clock: &mut ContentionClock, port: u16) -> u8 {
        Self::contend_port_pre_io(clock, port);
        let value = if port & 0x0001 == 0 {
            self.read_ula(clock.tstates(), port)
        } else if port & 0x00E0 == 0 {
            self.joystick
        } else {
            0xFF
        };
        Self::contend_port_post_io(clock, port);
        value
    }

    pub fn write_port(&mut self, clock: &mut ContentionClock, port: u16, value: u8) {
        Self::contend_port_pre_io(clock, port);
        if port & 0x0001 == 0 {
            let tstate = clock.tstates();
            self.border = value & 0x07;
            self.border_events.record(tstate, self.border);
            self.beeper = (value >> 3) & 0x03;
            self.beeper_events.record(tstate, self.beeper);
        }
        Self::contend_port_post_io(clock, port);
    }

    fn read_ula(&mut self, tstate: u32, port: u16) -> u8 {
        self.fe_reads += 1;
        let mut value = self.keyboard.read((port >> 8) as u8);
        if let Some(ear) = self.tape_ear {
            if !ear {
                value &= 0xBF;
            }
            if self.tape_noise && !self.accelerated_load {
                let level = if ear { self.beeper | 0x02 } else { self.beeper };
                self.beeper_events.record(tstate, level);
            }
        }
        value
    }
}

impl Default for Ports {
    fn default() -> Self {
        Self::new()
    }
}

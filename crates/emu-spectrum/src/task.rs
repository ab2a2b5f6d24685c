//! The emulator task.
//!
//! One named thread owns the [`Spectrum48k`]. Everything else talks to it
//! through a single command queue, so machine state is never shared or
//! locked. Displays and audio receivers hang off bounded channels and are
//! fed without blocking.
//!
//! Shutdown is two-phase: [`Emulator::pause`] stops frame production, then
//! [`Emulator::terminate`] ends the thread. Dropping the handle does both.

use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::audio::{AudioData, AudioReceiverInfo};
use crate::config::SpectrumConfig;
use crate::display::{DisplayData, DisplayInfo, SendOutcome};
use crate::error::{EmulatorError, EmulatorResult, SnapshotResult};
use crate::keyboard::SpectrumKey;
use crate::snapshot::{Snapshot, SnapshotFormat};
use crate::spectrum::{RomType, Spectrum48k};

/// Requests served by the emulator task, in arrival order.
#[derive(Debug)]
pub enum Command {
    /// Reset the machine. The sender, if any, is told `true` once the ROM
    /// has booted, or `false` if that never happens.
    Reset { rom_loaded: Option<Sender<bool>> },
    /// Run one frame and feed the receivers.
    RenderFrame { done: Option<Sender<Instant>> },
    /// Produce frames at the configured rate without `RenderFrame`.
    RunRealtime(bool),
    AddDisplay(SyncSender<DisplayData>),
    CloseAllDisplays { done: Sender<()> },
    /// Replies with the previous rate.
    SetFps { fps: f32, reply: Sender<f32> },
    SetUlaEmulationAccuracy(bool),
    AddAudioReceiver(SyncSender<AudioData>),
    CloseAllAudioReceivers { done: Sender<()> },
    LoadSnapshot {
        snapshot: Box<Snapshot>,
        format: SnapshotFormat,
        reply: Sender<SnapshotResult<()>>,
    },
    MakeSnapshot { reply: Sender<Snapshot> },
    MakeVideoMemoryDump { reply: Sender<Vec<u8>> },
    SetAcceleratedLoad(bool),
    KeyDown(SpectrumKey),
    KeyUp(SpectrumKey),
    SetJoystick(u8),
    SetTapeEar(Option<bool>),
    /// Stop producing frames. Only `Terminate` is served afterwards.
    Pause { ack: Sender<()> },
    Terminate { ack: Sender<()> },
}

/// Handle to a running emulator task.
pub struct Emulator {
    commands: Sender<Command>,
    thread: Option<JoinHandle<()>>,
}

impl Emulator {
    /// Build the machine and start its task.
    pub fn spawn(config: SpectrumConfig) -> EmulatorResult<Self> {
        let spectrum = Spectrum48k::new(config)?;
        let (commands, queue) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("spectrum".into())
            .spawn(move || EmulatorTask::new(spectrum, queue).run())?;
        Ok(Self {
            commands,
            thread: Some(thread),
        })
    }

    /// Queue a command without waiting for it.
    pub fn send(&self, command: Command) -> EmulatorResult<()> {
        self.commands
            .send(command)
            .map_err(|_| EmulatorError::Terminated)
    }

    fn request<T>(&self, command: impl FnOnce(Sender<T>) -> Command) -> EmulatorResult<T> {
        let (reply, response) = mpsc::channel();
        self.send(command(reply))?;
        response.recv().map_err(|_| EmulatorError::Terminated)
    }

    /// Reset the machine. The returned channel reports whether the ROM
    /// reached its key-wait loop.
    pub fn reset(&self) -> EmulatorResult<Receiver<bool>> {
        let (rom_loaded, notice) = mpsc::channel();
        self.send(Command::Reset {
            rom_loaded: Some(rom_loaded),
        })?;
        Ok(notice)
    }

    /// Run one frame and wait for it to finish.
    pub fn render_frame(&self) -> EmulatorResult<Instant> {
        self.request(|done| Command::RenderFrame { done: Some(done) })
    }

    pub fn run_realtime(&self, realtime: bool) -> EmulatorResult<()> {
        self.send(Command::RunRealtime(realtime))
    }

    pub fn add_display(&self, display: SyncSender<DisplayData>) -> EmulatorResult<()> {
        self.send(Command::AddDisplay(display))
    }

    pub fn close_all_displays(&self) -> EmulatorResult<()> {
        self.request(|done| Command::CloseAllDisplays { done })
    }

    /// Set the frame rate, returning the previous one.
    pub fn set_fps(&self, fps: f32) -> EmulatorResult<f32> {
        self.request(|reply| Command::SetFps { fps, reply })
    }

    pub fn set_ula_accuracy(&self, accurate: bool) -> EmulatorResult<()> {
        self.send(Command::SetUlaEmulationAccuracy(accurate))
    }

    pub fn add_audio_receiver(&self, receiver: SyncSender<AudioData>) -> EmulatorResult<()> {
        self.send(Command::AddAudioReceiver(receiver))
    }

    pub fn close_all_audio_receivers(&self) -> EmulatorResult<()> {
        self.request(|done| Command::CloseAllAudioReceivers { done })
    }

    /// Decode a snapshot file and apply it. A file that fails to decode
    /// never reaches the machine.
    pub fn load_snapshot(&self, data: &[u8], format: SnapshotFormat) -> EmulatorResult<()> {
        let snapshot = Box::new(Snapshot::decode(data, format)?);
        self.request(|reply| Command::LoadSnapshot {
            snapshot,
            format,
            reply,
        })?
        .map_err(EmulatorError::from)
    }

    pub fn make_snapshot(&self) -> EmulatorResult<Snapshot> {
        self.request(|reply| Command::MakeSnapshot { reply })
    }

    pub fn video_memory_dump(&self) -> EmulatorResult<Vec<u8>> {
        self.request(|reply| Command::MakeVideoMemoryDump { reply })
    }

    pub fn set_accelerated_load(&self, accelerated: bool) -> EmulatorResult<()> {
        self.send(Command::SetAcceleratedLoad(accelerated))
    }

    pub fn key_down(&self, key: SpectrumKey) -> EmulatorResult<()> {
        self.send(Command::KeyDown(key))
    }

    pub fn key_up(&self, key: SpectrumKey) -> EmulatorResult<()> {
        self.send(Command::KeyUp(key))
    }

    pub fn set_joystick(&self, bits: u8) -> EmulatorResult<()> {
        self.send(Command::SetJoystick(bits))
    }

    pub fn set_tape_ear(&self, ear: Option<bool>) -> EmulatorResult<()> {
        self.send(Command::SetTapeEar(ear))
    }

    /// First shutdown phase: stop producing frames.
    pub fn pause(&self) -> EmulatorResult<()> {
        self.request(|ack| Command::Pause { ack })
    }

    /// Second shutdown phase: stop the task and wait for its thread.
    pub fn terminate(&mut self) -> EmulatorResult<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        let acked = self.request(|ack| Command::Terminate { ack });
        if thread.join().is_err() {
            log::warn!("emulator thread panicked");
        }
        acked
    }
}

impl Drop for Emulator {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.pause();
            let _ = self.terminate();
        }
    }
}

/// State owned by the emulator thread.
struct EmulatorTask {
    spectrum: Spectrum48k,
    commands: Receiver<Command>,
    displays: Vec<DisplayInfo>,
    audio_receivers: Vec<AudioReceiverInfo>,
    rom_loaded: Option<Sender<bool>>,
    realtime: bool,
    paused: bool,
    next_frame: Instant,
}

impl EmulatorTask {
    fn new(spectrum: Spectrum48k, commands: Receiver<Command>) -> Self {
        Self {
            spectrum,
            commands,
            displays: Vec::new(),
            audio_receivers: Vec::new(),
            rom_loaded: None,
            realtime: false,
            paused: false,
            next_frame: Instant::now(),
        }
    }

    fn frame_duration(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.spectrum.fps())
    }

    fn run(mut self) {
        loop {
            let command = if self.realtime && !self.paused {
                let now = Instant::now();
                if now >= self.next_frame {
                    self.render_frame();
                    self.next_frame += self.frame_duration();
                    // More than a frame behind: drop the backlog.
                    if self.next_frame < now {
                        self.next_frame = now + self.frame_duration();
                    }
                    continue;
                }
                match self.commands.recv_timeout(self.next_frame - now) {
                    Ok(command) => command,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            } else {
                match self.commands.recv() {
                    Ok(command) => command,
                    Err(_) => break,
                }
            };

            if self.handle(command).is_break() {
                break;
            }
        }
        self.notify_rom_loaded(false);
        log::debug!("emulator task stopped");
    }

    fn handle(&mut self, command: Command) -> ControlFlow<()> {
        if self.paused {
            match command {
                Command::Terminate { ack } => {
                    let _ = ack.send(());
                    return ControlFlow::Break(());
                }
                other => {
                    log::trace!("paused, dropping {other:?}");
                    return ControlFlow::Continue(());
                }
            }
        }

        match command {
            Command::Reset { rom_loaded } => {
                self.notify_rom_loaded(false);
                self.spectrum.reset();
                log::info!("reset");
                self.rom_loaded = rom_loaded;
                // OpenSE BASIC never idles at the Sinclair key-wait loop.
                if self.spectrum.rom_type() == RomType::OpenSe {
                    self.notify_rom_loaded(true);
                }
            }
            Command::RenderFrame { done } => {
                self.render_frame();
                if let Some(done) = done {
                    let _ = done.send(Instant::now());
                }
            }
            Command::RunRealtime(realtime) => {
                self.realtime = realtime;
                self.next_frame = Instant::now();
            }
            Command::AddDisplay(sender) => {
                self.displays.push(DisplayInfo::new(sender));
                log::debug!("display attached ({} total)", self.displays.len());
            }
            Command::CloseAllDisplays { done } => {
                self.close_displays();
                let _ = done.send(());
            }
            Command::SetFps { fps, reply } => {
                let old = self.spectrum.set_fps(fps);
                log::info!("frame rate {old} -> {}", self.spectrum.fps());
                let _ = reply.send(old);
            }
            Command::SetUlaEmulationAccuracy(accurate) => {
                self.spectrum.set_ula_accuracy(accurate);
            }
            Command::AddAudioReceiver(sender) => {
                self.audio_receivers.push(AudioReceiverInfo::new(sender));
                log::debug!(
                    "audio receiver attached ({} total)",
                    self.audio_receivers.len()
                );
            }
            Command::CloseAllAudioReceivers { done } => {
                self.close_audio_receivers();
                let _ = done.send(());
            }
            Command::LoadSnapshot {
                snapshot,
                format,
                reply,
            } => {
                let result = self.spectrum.load_snapshot(&snapshot);
                match &result {
                    Ok(()) => log::info!("loaded {} snapshot", format.name()),
                    Err(err) => log::warn!("{} snapshot rejected: {err}", format.name()),
                }
                let _ = reply.send(result);
            }
            Command::MakeSnapshot { reply } => {
                let _ = reply.send(self.spectrum.make_snapshot());
            }
            Command::MakeVideoMemoryDump { reply } => {
                let _ = reply.send(self.spectrum.video_memory_dump());
            }
            Command::SetAcceleratedLoad(accelerated) => {
                self.spectrum.set_accelerated_load(accelerated);
            }
            Command::KeyDown(key) => self.spectrum.key_down(key),
            Command::KeyUp(key) => self.spectrum.key_up(key),
            Command::SetJoystick(bits) => self.spectrum.set_joystick(bits),
            Command::SetTapeEar(ear) => self.spectrum.set_tape_ear(ear),
            Command::Pause { ack } => {
                self.paused = true;
                self.notify_rom_loaded(false);
                self.log_receiver_stats();
                log::debug!("emulator paused");
                let _ = ack.send(());
            }
            Command::Terminate { ack } => {
                let _ = ack.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn render_frame(&mut self) {
        if self.rom_loaded.is_some() && self.spectrum.at_rom_entry_loop() {
            self.notify_rom_loaded(true);
        }

        self.spectrum.render_frame();

        let frame = self.spectrum.bus().shadow.frame();
        let spectrum = &self.spectrum;
        self.displays.retain_mut(|display| {
            let data = spectrum.display_data(display.wants_diff(frame));
            display.send(data) != SendOutcome::Closed
        });
        if !self.audio_receivers.is_empty() {
            let data = spectrum.audio_data();
            self.audio_receivers
                .retain_mut(|receiver| receiver.send(data.clone()) != SendOutcome::Closed);
        }
    }

    fn notify_rom_loaded(&mut self, loaded: bool) {
        if let Some(notice) = self.rom_loaded.take() {
            let _ = notice.send(loaded);
        }
    }

    fn log_receiver_stats(&self) {
        for (i, display) in self.displays.iter().enumerate() {
            log::debug!(
                "display {i}: {} frames sent, {} missed",
                display.sent_frames(),
                display.missed_frames()
            );
        }
        for (i, receiver) in self.audio_receivers.iter().enumerate() {
            log::debug!(
                "audio receiver {i}: {} frames sent, {} missed",
                receiver.sent_frames(),
                receiver.missed_frames()
            );
        }
    }

    fn close_displays(&mut self) {
        for display in self.displays.drain(..) {
            log::debug!(
                "display closed: {} frames sent, {} missed",
                display.sent_frames(),
                display.missed_frames()
            );
        }
    }

    fn close_audio_receivers(&mut self) {
        for receiver in self.audio_receivers.drain(..) {
            log::debug!(
                "audio receiver closed: {} frames sent, {} missed",
                receiver.sent_frames(),
                receiver.missed_frames()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ROM_SIZE;

    /// ROM: LD SP,$8000; EI; HALT; JR -3, with a bare EI; RET handler.
    fn make_emulator() -> Emulator {
        let mut rom = vec![0u8; ROM_SIZE];
        rom[..8].copy_from_slice(&[0x31, 0x00, 0x80, 0xFB, 0x76, 0x18, 0xFD, 0x00]);
        rom[0x38..0x3A].copy_from_slice(&[0xFB, 0xC9]);
        Emulator::spawn(SpectrumConfig::new(rom)).expect("spawn")
    }

    #[test]
    fn commands_are_served_in_order() {
        let emulator = make_emulator();
        emulator.render_frame().expect("frame");
        let snapshot = emulator.make_snapshot().expect("snapshot");
        assert_eq!(snapshot.cpu.registers.sp, 0x8000);
        assert_eq!(emulator.video_memory_dump().expect("dump").len(), 6912);
    }

    #[test]
    fn set_fps_returns_previous() {
        let emulator = make_emulator();
        let old = emulator.set_fps(25.0).expect("fps");
        assert!((old - crate::config::DEFAULT_FPS).abs() < f32::EPSILON);
        let old = emulator.set_fps(0.0).expect("fps");
        assert!((old - 25.0).abs() < f32::EPSILON);
    }

    #[test]
    fn displays_receive_frames() {
        let emulator = make_emulator();
        let (tx, rx) = mpsc::sync_channel(4);
        emulator.add_display(tx).expect("attach");
        emulator.render_frame().expect("frame");
        emulator.render_frame().expect("frame");

        let first = rx.try_recv().expect("first frame");
        assert!(first.screen.dirty.iter().all(|&d| d));
        let second = rx.try_recv().expect("second frame");
        assert_eq!(second.frame, first.frame + 1);
        assert!(second.screen.dirty.iter().all(|&d| !d), "nothing changed");

        emulator.close_all_displays().expect("close");
        emulator.render_frame().expect("frame");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn audio_receivers_get_fps() {
        let emulator = make_emulator();
        let (tx, rx) = mpsc::sync_channel(1);
        emulator.add_audio_receiver(tx).expect("attach");
        emulator.render_frame().expect("frame");
        let data = rx.try_recv().expect("audio");
        assert!((data.fps - crate::config::DEFAULT_FPS).abs() < f32::EPSILON);
        assert_eq!(data.beeper_events.first().map(|e| e.tstate), Some(0));
    }

    #[test]
    fn bad_snapshot_reports_error() {
        let emulator = make_emulator();
        let err = emulator.load_snapshot(&[0; 10], SnapshotFormat::Sna);
        assert!(matches!(err, Err(EmulatorError::Snapshot(_))));
    }

    #[test]
    fn rom_loaded_is_false_on_second_reset() {
        let emulator = make_emulator();
        let first = emulator.reset().expect("reset");
        let _second = emulator.reset().expect("reset");
        assert_eq!(first.recv(), Ok(false));
    }

    #[test]
    fn pause_then_terminate() {
        let mut emulator = make_emulator();
        let notice = emulator.reset().expect("reset");
        emulator.pause().expect("pause");
        assert_eq!(notice.recv(), Ok(false));
        assert!(matches!(
            emulator.render_frame(),
            Err(EmulatorError::Terminated)
        ));
        emulator.terminate().expect("terminate");
        assert!(matches!(
            emulator.make_snapshot(),
            Err(EmulatorError::Terminated)
        ));
    }
}

//! Beeper data handed to audio collaborators.

use std::sync::mpsc::{SyncSender, TrySendError};

use crate::display::SendOutcome;
use crate::ports::BeeperEvent;

/// Highest beeper level (both MIC and EAR bits set).
pub const MAX_AUDIO_LEVEL: u8 = 3;

/// Output voltage on ULA pin 28 per beeper level, issue 2 boards.
pub const VOLTAGE_ISSUE2: [f32; 4] = [0.39, 0.73, 3.66, 3.79];

/// Output voltage on ULA pin 28 per beeper level, issue 3 boards.
pub const VOLTAGE_ISSUE3: [f32; 4] = [0.34, 0.66, 3.56, 3.70];

/// 16-bit sample amplitude per beeper level, scaled from the issue 2
/// voltages so level 0 is silence.
pub const AUDIO16_TABLE: [f32; 4] = [
    0.0,
    0x7FFF as f32 * (VOLTAGE_ISSUE2[1] - VOLTAGE_ISSUE2[0])
        / (VOLTAGE_ISSUE2[3] - VOLTAGE_ISSUE2[0]),
    0x7FFF as f32 * (VOLTAGE_ISSUE2[2] - VOLTAGE_ISSUE2[0])
        / (VOLTAGE_ISSUE2[3] - VOLTAGE_ISSUE2[0]),
    0x7FFF as f32,
];

/// One frame of beeper activity.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    /// Frame rate the emulator is running at.
    pub fps: f32,
    /// Level changes, first at T-state 0, last at the end of the frame.
    pub beeper_events: Vec<BeeperEvent>,
}

/// Bookkeeping for one attached audio receiver.
#[derive(Debug)]
pub struct AudioReceiverInfo {
    sender: SyncSender<AudioData>,
    sent: u64,
    missed: u64,
}

impl AudioReceiverInfo {
    #[must_use]
    pub fn new(sender: SyncSender<AudioData>) -> Self {
        Self {
            sender,
            sent: 0,
            missed: 0,
        }
    }

    pub fn send(&mut self, data: AudioData) -> SendOutcome {
        match self.sender.try_send(data) {
            Ok(()) => {
                self.sent += 1;
                SendOutcome::Sent
            }
            Err(TrySendError::Full(_)) => {
                self.missed += 1;
                log::trace!("audio receiver missed a frame");
                SendOutcome::Missed
            }
            Err(TrySendError::Disconnected(_)) => SendOutcome::Closed,
        }
    }

    #[must_use]
    pub fn sent_frames(&self) -> u64 {
        self.sent
    }

    #[must_use]
    pub fn missed_frames(&self) -> u64 {
        self.missed
    }
}

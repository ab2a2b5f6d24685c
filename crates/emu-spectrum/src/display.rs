//! Frame data handed to display collaborators.
//!
//! Displays sit behind bounded channels. A full channel never blocks the
//! emulator: the frame is dropped, and its dirty grid is merged into the
//! next frame that does get through.

use std::sync::mpsc::{SyncSender, TrySendError};

use sinclair_ula::{ATTR_SIZE, ScreenImage};

use crate::ports::BorderEvent;

/// One frame for a display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayData {
    pub screen: ScreenImage,
    /// Border colour at the end of the frame.
    pub border: u8,
    /// Border changes during the frame, or `None` if the border did not
    /// change.
    pub border_events: Option<Vec<BorderEvent>>,
    /// Frame number, counted from the last reset.
    pub frame: u32,
}

/// Result of offering a frame to a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// The channel was full; the frame was dropped.
    Missed,
    /// The receiver has gone away.
    Closed,
}

/// Bookkeeping for one attached display.
#[derive(Debug)]
pub struct DisplayInfo {
    sender: SyncSender<DisplayData>,
    last_frame: Option<u32>,
    sent: u64,
    missed: u64,
    missed_changes: Option<[bool; ATTR_SIZE]>,
}

impl DisplayInfo {
    #[must_use]
    pub fn new(sender: SyncSender<DisplayData>) -> Self {
        Self {
            sender,
            last_frame: None,
            sent: 0,
            missed: 0,
            missed_changes: None,
        }
    }

    /// A display that was offered the previous frame only needs changes.
    #[must_use]
    pub fn wants_diff(&self, frame: u32) -> bool {
        self.last_frame == Some(frame.wrapping_sub(1))
    }

    /// Offer a frame without blocking.
    pub fn send(&mut self, mut data: DisplayData) -> SendOutcome {
        self.last_frame = Some(data.frame);
        if let Some(missed) = self.missed_changes.take() {
            for (dirty, was_missed) in data.screen.dirty.iter_mut().zip(missed) {
                *dirty |= was_missed;
            }
        }
        match self.sender.try_send(data) {
            Ok(()) => {
                self.sent += 1;
                SendOutcome::Sent
            }
            Err(TrySendError::Full(data)) => {
                self.missed += 1;
                self.missed_changes = Some(data.screen.dirty);
                log::trace!("display missed frame {}", data.frame);
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn make_frame(frame: u32, dirty_cell: usize) -> DisplayData {
        let mut screen = ScreenImage::new();
        screen.dirty[dirty_cell] = true;
        DisplayData {
            screen,
            border: 7,
            border_events: None,
            frame,
        }
    }

    #[test]
    fn diff_only_after_previous_frame() {
        let (tx, _rx) = mpsc::sync_channel(4);
        let mut info = DisplayInfo::new(tx);
        assert!(!info.wants_diff(1));
        info.send(make_frame(1, 0));
        assert!(info.wants_diff(2));
        assert!(!info.wants_diff(3));
    }

    #[test]
    fn missed_changes_are_merged() {
        let (tx, rx) = mpsc::sync_channel(1);
        let mut info = DisplayInfo::new(tx);

        assert_eq!(info.send(make_frame(1, 10)), SendOutcome::Sent);
        assert_eq!(info.send(make_frame(2, 20)), SendOutcome::Missed);
        assert_eq!(info.send(make_frame(3, 30)), SendOutcome::Missed);

        let first = rx.recv().expect("frame 1");
        assert_eq!(first.frame, 1);

        assert_eq!(info.send(make_frame(4, 40)), SendOutcome::Sent);
        let merged = rx.recv().expect("frame 4");
        let dirty: Vec<usize> = (0..ATTR_SIZE).filter(|&i| merged.screen.dirty[i]).collect();
        assert_eq!(dirty, [20, 30, 40]);
        assert_eq!(info.sent_frames(), 2);
        assert_eq!(info.missed_frames(), 2);
    }

    #[test]
    fn closed_receiver_reported() {
        let (tx, rx) = mpsc::sync_channel(1);
        drop(rx);
        let mut info = DisplayInfo::new(tx);
        assert_eq!(info.send(make_frame(1, 0)), SendOutcome::Closed);
    }
}

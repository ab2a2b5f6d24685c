//! Frame clock and memory contention.
//!
//! While the ULA fetches bitmap and attribute bytes it holds the CPU off
//! $4000-$7FFF (and off I/O cycles with A0 low). The wait depends only on
//! the T-state the access starts at, so it is looked up in a table built
//! once per clock.

use crate::{FIRST_SCREEN_BYTE, LINE_SCREEN, TSTATES_PER_FRAME, TSTATES_PER_LINE};

/// Wait states by T-state offset within an 8 T-state fetch group.
pub const CONTENTION_PATTERN: [u8; 8] = [6, 5, 4, 3, 2, 1, 0, 0];

/// Table length. An instruction that starts near the end of a frame may
/// run past it before the frame loop notices.
pub const DELAY_TABLE_LEN: usize = TSTATES_PER_FRAME as usize + 100;

/// Contention starts one T-state before the first byte is displayed.
const CONTENTION_START: u32 = FIRST_SCREEN_BYTE - 1;

/// T-state counter for the current frame plus the wait-state table.
#[derive(Debug, Clone)]
pub struct ContentionClock {
    tstates: u32,
    delay_table: Box<[u8]>,
}

impl ContentionClock {
    #[must_use]
    pub fn new() -> Self {
        let mut delay_table = vec![0u8; DELAY_TABLE_LEN].into_boxed_slice();
        for line in 0..192 {
            let start = CONTENTION_START + line * TSTATES_PER_LINE;
            for x in 0..LINE_SCREEN {
                delay_table[(start + x) as usize] = CONTENTION_PATTERN[(x % 8) as usize];
            }
        }
        Self {
            tstates: 0,
            delay_table,
        }
    }

    #[must_use]
    pub fn tstates(&self) -> u32 {
        self.tstates
    }

    pub fn set_tstates(&mut self, tstates: u32) {
        self.tstates = tstates;
    }

    pub fn add(&mut self, delta: u32) {
        self.tstates += delta;
    }

    /// Extra wait for an access starting at `tstate`. Zero past the table.
    #[must_use]
    pub fn delay(&self, tstate: u32) -> u32 {
        self.delay_table
            .get(tstate as usize)
            .map_or(0, |&delay| u32::from(delay))
    }

    /// Wait for the ULA, then spend `time` T-states.
    pub fn contend(&mut self, time: u32) {
        self.tstates += self.delay(self.tstates) + time;
    }

    /// Start a new frame, carrying any overrun from the last instruction.
    pub fn wrap_frame(&mut self) {
        self.tstates %= TSTATES_PER_FRAME;
    }

    #[must_use]
    pub fn delay_table(&self) -> &[u8] {
        &self.delay_table
    }
}

impl Default for ContentionClock {
    fn default() -> Self {
        Self::new()
    }
}

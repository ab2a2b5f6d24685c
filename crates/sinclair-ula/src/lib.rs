//! Standard Sinclair ULA timing model for the 48K Spectrum.
//!
//! The ULA fetches screen bytes at fixed T-states within each frame and
//! holds the CPU off video RAM while it does. This crate models both sides
//! of that race:
//!
//! - [`ContentionClock`] owns the frame's T-state counter and the
//!   precomputed wait-state table.
//! - [`ScreenShadow`] remembers which value the ULA actually sampled when
//!   the CPU overwrites a screen byte after the beam has passed it.
//!
//! # Standalone IC
//!
//! No dependencies. Screen memory is read through closures passed by the
//! caller, so the crate is decoupled from any particular memory model.
//!
//! # Timing (48K PAL)
//!
//! - 224 T-states per line: 128 screen, 24 right border, 48 retrace,
//!   24 left border
//! - 312 lines per frame, 64 of them above the first screen line
//! - 69,888 T-states per frame
//! - the byte at $4000 is displayed at T-state 14,336
//!
//! # Screen memory layout
//!
//! Bitmap at $4000-$57FF (6144 bytes), attributes at $5800-$5AFF (768 bytes).
//! Bitmap address: `010Y7 Y6Y2 Y1Y0 Y5Y4Y3 X4X3X2X1X0`
//! Attribute address: `0101 10Y7 Y6Y5 Y4Y3 X4X3X2X1X0`

mod contention;
mod palette;
mod screen;
mod shadow;

pub use contention::{CONTENTION_PATTERN, ContentionClock, DELAY_TABLE_LEN};
pub use palette::PALETTE;
pub use screen::{
    ATTR_BASE, ATTR_COLUMNS, ATTR_ROWS, ATTR_SIZE, BITMAP_SIZE, BORDER_X, BORDER_Y,
    BYTES_PER_LINE, SCREEN_BASE, SCREEN_HEIGHT, SCREEN_WIDTH, TOTAL_HEIGHT, TOTAL_WIDTH,
    VIDEO_MEMORY_SIZE, attr_addr, bitmap_addr, bitmap_xy, cell_of_bitmap, is_attr, is_bitmap,
    sample_tstate,
};
pub use shadow::{ScreenImage, ScreenShadow, attr_to_ink_paper};

/// T-states in one video frame.
pub const TSTATES_PER_FRAME: u32 = 69_888;

/// T-states in one scanline.
pub const TSTATES_PER_LINE: u32 = 224;

/// Scanlines in one frame.
pub const LINES_PER_FRAME: u32 = 312;

/// Scanlines before the first line of the bitmap.
pub const LINES_TOP: u32 = 64;

/// T-states of a line spent fetching screen bytes.
pub const LINE_SCREEN: u32 = 128;

/// T-state at which the byte at $4000 is displayed.
pub const FIRST_SCREEN_BYTE: u32 = 14_336;

/// Two pixels are shifted out per T-state.
pub const PIXELS_PER_TSTATE: u32 = 2;

/// T-state that corresponds to the top-left pixel of the bordered image.
pub const DISPLAY_START: u32 =
    FIRST_SCREEN_BYTE - TSTATES_PER_LINE * BORDER_Y - BORDER_X / PIXELS_PER_TSTATE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_312_lines_of_224() {
        assert_eq!(TSTATES_PER_LINE * LINES_PER_FRAME, TSTATES_PER_FRAME);
    }

    #[test]
    fn first_screen_byte_follows_top_lines() {
        assert_eq!(FIRST_SCREEN_BYTE, LINES_TOP * TSTATES_PER_LINE);
    }

    #[test]
    fn display_start_is_on_the_top_border() {
        // 24 border lines above the bitmap, 16 T-states of left border.
        assert_eq!(DISPLAY_START, 14_336 - 24 * 224 - 16);
    }
}

//! Screen geometry and address arithmetic.

use crate::{FIRST_SCREEN_BYTE, PIXELS_PER_TSTATE, TSTATES_PER_LINE};

pub const SCREEN_WIDTH: u32 = 256;
pub const SCREEN_HEIGHT: u32 = 192;

/// Border visible either side of the bitmap.
pub const BORDER_X: u32 = 32;
/// Border visible above and below the bitmap.
pub const BORDER_Y: u32 = 24;

pub const TOTAL_WIDTH: u32 = SCREEN_WIDTH + 2 * BORDER_X;
pub const TOTAL_HEIGHT: u32 = SCREEN_HEIGHT + 2 * BORDER_Y;

pub const BYTES_PER_LINE: usize = 32;
pub const ATTR_COLUMNS: usize = 32;
pub const ATTR_ROWS: usize = 24;

pub const SCREEN_BASE: u16 = 0x4000;
pub const ATTR_BASE: u16 = 0x5800;
pub const BITMAP_SIZE: usize = BYTES_PER_LINE * SCREEN_HEIGHT as usize;
pub const ATTR_SIZE: usize = ATTR_COLUMNS * ATTR_ROWS;
/// Bitmap plus attributes.
pub const VIDEO_MEMORY_SIZE: usize = BITMAP_SIZE + ATTR_SIZE;

#[must_use]
pub fn is_bitmap(addr: u16) -> bool {
    (SCREEN_BASE..ATTR_BASE).contains(&addr)
}

#[must_use]
pub fn is_attr(addr: u16) -> bool {
    (ATTR_BASE..ATTR_BASE + ATTR_SIZE as u16).contains(&addr)
}

/// Bitmap address of pixel `(x, y)`. Only the byte column of `x` counts.
#[must_use]
pub fn bitmap_addr(x: u8, y: u8) -> u16 {
    let (x, y) = (u16::from(x), u16::from(y));
    SCREEN_BASE | ((y & 0xC0) << 5) | ((y & 0x07) << 8) | ((y & 0x38) << 2) | (x >> 3)
}

/// Pixel position of the leftmost pixel of a bitmap byte.
#[must_use]
pub fn bitmap_xy(addr: u16) -> (u8, u8) {
    let x = (addr & 0x1F) << 3;
    let y = ((addr & 0x0700) >> 8) | ((addr & 0x00E0) >> 2) | ((addr & 0x1800) >> 5);
    (x as u8, y as u8)
}

/// Attribute address covering pixel `(x, y)`.
#[must_use]
pub fn attr_addr(x: u8, y: u8) -> u16 {
    ATTR_BASE + (u16::from(y) >> 3) * ATTR_COLUMNS as u16 + (u16::from(x) >> 3)
}

/// Index into the 32x24 cell grid for a bitmap address.
#[must_use]
pub fn cell_of_bitmap(addr: u16) -> usize {
    let (x, y) = bitmap_xy(addr);
    usize::from(y >> 3) * ATTR_COLUMNS + usize::from(x >> 3)
}

/// T-state at which the ULA fetches the byte under pixel `(x, y)`.
#[must_use]
pub fn sample_tstate(x: u8, y: u8) -> u32 {
    FIRST_SCREEN_BYTE + u32::from(y) * TSTATES_PER_LINE + u32::from(x) / PIXELS_PER_TSTATE
}

//! ZX Spectrum 16-colour palette.
//!
//! 3-bit GRB colour plus BRIGHT. Normal colours are driven at 0xC0,
//! bright ones at 0xFF. Black is the same in both halves.

/// ARGB32 palette: 16 entries (8 normal + 8 bright).
///
/// Index layout: `bright_bit << 3 | colour_3bit`, which is also the 4-bit
/// ink and paper value carried in [`crate::ScreenImage::attr`].
pub const PALETTE: [u32; 16] = [
    0xFF00_0000, // black
    0xFF00_00C0, // blue
    0xFFC0_0000, // red
    0xFFC0_00C0, // magenta
    0xFF00_C000, // green
    0xFF00_C0C0, // cyan
    0xFFC0_C000, // yellow
    0xFFC0_C0C0, // white
    0xFF00_0000,
    0xFF00_00FF,
    0xFFFF_0000,
    0xFFFF_00FF,
    0xFF00_FF00,
    0xFF00_FFFF,
    0xFFFF_FF00,
    0xFFFF_FFFF,
];

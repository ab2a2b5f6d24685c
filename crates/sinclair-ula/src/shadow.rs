//! Shadow cells for screen bytes the ULA has already sampled.
//!
//! The display is composed once per frame from final memory contents.
//! When the CPU overwrites a screen byte after the beam has fetched it,
//! the old value is captured here so the composed frame shows what the
//! ULA actually put on screen.
//!
//! A bitmap byte is fetched once per frame. An attribute byte is fetched
//! on each of the eight scanlines of its cell, so attribute shadows are
//! kept per scanline, in linear-Y order, with the T-state of the write
//! that captured them.

use crate::screen::{
    ATTR_BASE, ATTR_COLUMNS, ATTR_ROWS, ATTR_SIZE, BITMAP_SIZE, BYTES_PER_LINE, SCREEN_BASE,
    bitmap_addr, bitmap_xy, cell_of_bitmap, sample_tstate,
};

#[derive(Debug, Clone, Copy, Default)]
struct SampledByte {
    valid: bool,
    value: u8,
}

#[derive(Debug, Clone, Copy, Default)]
struct SampledAttr {
    valid: bool,
    value: u8,
    /// Clock at the write that captured `value`.
    tstate: u32,
}

/// One frame of screen data, as handed to a display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenImage {
    /// Cells whose pixels or colours may differ from the previous frame.
    pub dirty: [bool; ATTR_SIZE],
    /// Bitmap bytes in linear-Y order: row `y` starts at `y * 32`.
    pub bitmap: Box<[u8; BITMAP_SIZE]>,
    /// Per bitmap byte, `ink << 4 | paper` as palette indices, with
    /// flashing cells already swapped.
    pub attr: Box<[u8; BITMAP_SIZE]>,
    pub flash: bool,
}

impl ScreenImage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dirty: [false; ATTR_SIZE],
            bitmap: Box::new([0; BITMAP_SIZE]),
            attr: Box::new([0; BITMAP_SIZE]),
            flash: false,
        }
    }
}

impl Default for ScreenImage {
    fn default() -> Self {
        Self::new()
    }
}

/// Split an attribute byte into 4-bit ink and paper palette indices.
#[must_use]
pub fn attr_to_ink_paper(attr: u8, flash: bool) -> u8 {
    let mut ink = ((attr & 0x40) >> 3) | (attr & 0x07);
    let mut paper = (attr & 0x78) >> 3;
    if flash && attr & 0x80 != 0 {
        std::mem::swap(&mut ink, &mut paper);
    }
    (ink << 4) | paper
}

/// Screen-timing shadow state for one machine.
#[derive(Debug, Clone)]
pub struct ScreenShadow {
    frame: u32,
    accurate: bool,
    bitmap: Box<[SampledByte; BITMAP_SIZE]>,
    attr: Box<[SampledAttr; BITMAP_SIZE]>,
    dirty: [bool; ATTR_SIZE],
}

impl ScreenShadow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame: 0,
            accurate: true,
            bitmap: Box::new([SampledByte::default(); BITMAP_SIZE]),
            attr: Box::new([SampledAttr::default(); BITMAP_SIZE]),
            dirty: [true; ATTR_SIZE],
        }
    }

    /// Frames begun since the last reset.
    #[must_use]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    #[must_use]
    pub fn accurate(&self) -> bool {
        self.accurate
    }

    /// With accuracy off no shadow cells are captured and frames show
    /// final memory contents.
    pub fn set_accurate(&mut self, accurate: bool) {
        self.accurate = accurate;
    }

    #[must_use]
    pub fn dirty(&self) -> &[bool; ATTR_SIZE] {
        &self.dirty
    }

    pub fn reset(&mut self) {
        self.frame = 0;
        self.bitmap.fill(SampledByte::default());
        self.attr.fill(SampledAttr::default());
        self.dirty = [true; ATTR_SIZE];
    }

    /// Start a frame: clear the dirty grid, then mark every cell that
    /// showed a shadowed value last frame, since it will now show memory.
    pub fn frame_begin(&mut self) {
        self.frame = self.frame.wrapping_add(1);
        self.dirty = [self.frame == 1; ATTR_SIZE];

        for (ofs, cell) in self.bitmap.iter_mut().enumerate() {
            if cell.valid {
                self.dirty[cell_of_bitmap(SCREEN_BASE + ofs as u16)] = true;
                cell.valid = false;
            }
        }
        for (ofs, cell) in self.attr.iter_mut().enumerate() {
            if cell.valid {
                let y = ofs / BYTES_PER_LINE;
                let x = ofs % BYTES_PER_LINE;
                self.dirty[(y >> 3) * ATTR_COLUMNS + x] = true;
                cell.valid = false;
            }
        }
    }

    /// Record a CPU write to the bitmap byte at `addr`.
    ///
    /// `old` is the byte before the write and `tstates` the clock at the
    /// end of the write cycle. The first write after the byte was fetched
    /// keeps the fetched value; later writes in the same frame do not
    /// replace it.
    pub fn bitmap_write(&mut self, addr: u16, old: u8, tstates: u32) {
        self.dirty[cell_of_bitmap(addr)] = true;
        if !self.accurate {
            return;
        }
        let (x, y) = bitmap_xy(addr);
        let cell = &mut self.bitmap[usize::from(addr - SCREEN_BASE)];
        if tstates > sample_tstate(x, y) && !cell.valid {
            *cell = SampledByte {
                valid: true,
                value: old,
            };
        }
    }

    /// Record a CPU write to the attribute byte at `addr`.
    ///
    /// Each of the cell's eight scanlines that has already been fetched
    /// captures `old`, unless it already holds a value that was on screen
    /// when that scanline was fetched.
    pub fn attr_write(&mut self, addr: u16, old: u8, tstates: u32) {
        let cell = usize::from(addr - ATTR_BASE);
        self.dirty[cell] = true;
        if !self.accurate {
            return;
        }
        let attr_x = cell % ATTR_COLUMNS;
        let attr_y = cell / ATTR_COLUMNS;
        for row in 0..8 {
            let y = attr_y * 8 + row;
            let fetched_at = sample_tstate((attr_x * 8) as u8, y as u8);
            if tstates <= fetched_at {
                continue;
            }
            let entry = &mut self.attr[y * BYTES_PER_LINE + attr_x];
            if !entry.valid || fetched_at > entry.tstate {
                *entry = SampledAttr {
                    valid: true,
                    value: old,
                    tstate: tstates,
                };
            }
        }
    }

    /// Compose the frame as the ULA displayed it.
    ///
    /// With `diff_only` the dirty grid is this frame's changes, otherwise
    /// every cell is dirty. Cells with flashing attributes are dirty
    /// whenever the flash phase flips. Pixel and colour data are filled for
    /// every cell either way, so a receiver can merge dirty grids from
    /// frames it never saw.
    pub fn compose(&self, diff_only: bool, peek: impl Fn(u16) -> u8) -> ScreenImage {
        let flash = self.frame & 0x10 != 0;
        let flash_flipped = flash != (self.frame.wrapping_sub(1) & 0x10 != 0);

        let mut image = ScreenImage::new();
        image.flash = flash;
        image.dirty = if diff_only {
            self.dirty
        } else {
            [true; ATTR_SIZE]
        };

        for attr_y in 0..ATTR_ROWS {
            for attr_x in 0..ATTR_COLUMNS {
                let cell = attr_y * ATTR_COLUMNS + attr_x;
                let memory_attr = peek(ATTR_BASE + cell as u16);
                for row in 0..8 {
                    let y = attr_y * 8 + row;
                    let ofs = y * BYTES_PER_LINE + attr_x;

                    let addr = bitmap_addr((attr_x * 8) as u8, y as u8);
                    let pixels = self.bitmap[usize::from(addr - SCREEN_BASE)];
                    image.bitmap[ofs] = if pixels.valid {
                        pixels.value
                    } else {
                        peek(addr)
                    };

                    let sampled = self.attr[ofs];
                    let attr = if sampled.valid {
                        sampled.value
                    } else {
                        memory_attr
                    };
                    if flash_flipped && attr & 0x80 != 0 {
                        image.dirty[cell] = true;
                    }
                    image.attr[ofs] = attr_to_ink_paper(attr, flash);
                }
            }
        }
        image
    }
}

impl Default for ScreenShadow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FIRST_SCREEN_BYTE;

    struct TestMemory {
        data: Vec<u8>,
    }

    impl TestMemory {
        fn new() -> Self {
            Self {
                data: vec![0; 0x10000],
            }
        }

        fn peek(&self, addr: u16) -> u8 {
            self.data[addr as usize]
        }

        /// Write as the bus does: shadow first, then memory.
        fn write(&mut self, shadow: &mut ScreenShadow, addr: u16, value: u8, tstates: u32) {
            let old = self.data[addr as usize];
            if addr < ATTR_BASE {
                shadow.bitmap_write(addr, old, tstates);
            } else {
                shadow.attr_write(addr, old, tstates);
            }
            self.data[addr as usize] = value;
        }
    }

    fn make_shadow() -> ScreenShadow {
        let mut shadow = ScreenShadow::new();
        shadow.frame_begin();
        shadow
    }

    fn compose(shadow: &ScreenShadow, mem: &TestMemory) -> ScreenImage {
        shadow.compose(true, |addr| mem.peek(addr))
    }

    #[test]
    fn first_frame_is_all_dirty() {
        let mut shadow = make_shadow();
        assert_eq!(shadow.frame(), 1);
        assert!(shadow.dirty().iter().all(|&d| d));
        shadow.frame_begin();
        assert!(shadow.dirty().iter().all(|&d| !d));
    }

    #[test]
    fn write_before_fetch_shows_new_value() {
        let mut shadow = make_shadow();
        let mut mem = TestMemory::new();
        mem.write(&mut shadow, 0x4000, 0xAA, FIRST_SCREEN_BYTE - 10);
        let image = compose(&shadow, &mem);
        assert_eq!(image.bitmap[0], 0xAA);
    }

    #[test]
    fn write_after_fetch_shows_sampled_value() {
        let mut shadow = make_shadow();
        let mut mem = TestMemory::new();
        mem.data[0x4000] = 0x11;
        mem.write(&mut shadow, 0x4000, 0x22, FIRST_SCREEN_BYTE + 1);
        mem.write(&mut shadow, 0x4000, 0x33, FIRST_SCREEN_BYTE + 50);
        let image = compose(&shadow, &mem);
        assert_eq!(image.bitmap[0], 0x11, "first fetched value is kept");

        shadow.frame_begin();
        let image = compose(&shadow, &mem);
        assert_eq!(image.bitmap[0], 0x33, "next frame shows memory");
        assert!(image.dirty[0], "shadowed cell is redrawn");
        assert!(!image.dirty[1]);
    }

    #[test]
    fn bitmap_is_linear_y() {
        let shadow = make_shadow();
        let mut mem = TestMemory::new();
        // Pixel row 1, column 3 lives at $4103.
        mem.data[0x4103] = 0x5A;
        let image = compose(&shadow, &mem);
        assert_eq!(image.bitmap[32 + 3], 0x5A);
    }

    #[test]
    fn attribute_split_mid_cell() {
        let mut shadow = make_shadow();
        let mut mem = TestMemory::new();
        mem.data[0x5800] = 0x07;
        // Rows 0..=3 of cell (0, 0) have been fetched.
        let after_row_3 = FIRST_SCREEN_BYTE + 3 * 224 + 1;
        mem.write(&mut shadow, 0x5800, 0x38, after_row_3);

        let image = compose(&shadow, &mem);
        for row in 0..4 {
            assert_eq!(image.attr[row * 32], 0x70, "row {row} keeps ink 7 paper 0");
        }
        for row in 4..8 {
            assert_eq!(image.attr[row * 32], 0x07, "row {row} shows ink 0 paper 7");
        }
    }

    #[test]
    fn later_attribute_write_keeps_earlier_samples() {
        let mut shadow = make_shadow();
        let mut mem = TestMemory::new();
        mem.data[0x5800] = 0x01;
        mem.write(&mut shadow, 0x5800, 0x02, FIRST_SCREEN_BYTE + 3 * 224 + 1);
        mem.write(&mut shadow, 0x5800, 0x03, FIRST_SCREEN_BYTE + 5 * 224 + 1);

        let image = compose(&shadow, &mem);
        let inks: Vec<u8> = (0..8).map(|row| image.attr[row * 32] >> 4).collect();
        assert_eq!(inks, [1, 1, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn inaccurate_mode_captures_nothing() {
        let mut shadow = make_shadow();
        shadow.set_accurate(false);
        let mut mem = TestMemory::new();
        mem.write(&mut shadow, 0x4000, 0xFF, FIRST_SCREEN_BYTE + 100);
        mem.write(&mut shadow, 0x5800, 0x38, FIRST_SCREEN_BYTE + 1000);
        let image = compose(&shadow, &mem);
        assert_eq!(image.bitmap[0], 0xFF);
        assert_eq!(image.attr[0], 0x07);
        assert!(image.dirty[0], "writes still mark the cell");
    }

    #[test]
    fn flash_flip_marks_flashing_cells() {
        let mut shadow = make_shadow();
        let mut mem = TestMemory::new();
        mem.data[0x5805] = 0x80 | 0x38 | 0x02;
        while shadow.frame() < 15 {
            shadow.frame_begin();
        }
        let image = compose(&shadow, &mem);
        assert!(!image.flash);
        assert!(!image.dirty[5]);

        shadow.frame_begin();
        let image = compose(&shadow, &mem);
        assert!(image.flash);
        assert!(image.dirty[5], "flashing cell redrawn on flip");
        assert!(!image.dirty[4]);
        // Ink 2 and paper 7 swapped.
        assert_eq!(image.attr[5], 0x72);

        shadow.frame_begin();
        let image = compose(&shadow, &mem);
        assert!(!image.dirty[5], "no flip, no redraw");
    }

    #[test]
    fn full_send_marks_everything() {
        let mut shadow = make_shadow();
        shadow.frame_begin();
        let mem = TestMemory::new();
        let image = shadow.compose(false, |addr| mem.peek(addr));
        assert!(image.dirty.iter().all(|&d| d));
    }

    #[test]
    fn ink_paper_split() {
        assert_eq!(attr_to_ink_paper(0x47, false), 0xF8);
        assert_eq!(attr_to_ink_paper(0x38, false), 0x07);
        assert_eq!(attr_to_ink_paper(0x78, false), 0x8F);
        assert_eq!(attr_to_ink_paper(0xB9, true), 0x71);
        assert_eq!(attr_to_ink_paper(0xB9, false), 0x17);
    }

    #[test]
    fn reset_restarts_frame_count() {
        let mut shadow = make_shadow();
        shadow.frame_begin();
        shadow.reset();
        assert_eq!(shadow.frame(), 0);
        shadow.frame_begin();
        assert!(shadow.dirty().iter().all(|&d| d));
    }
}

//! ZX Spectrum keyboard.
//!
//! The keyboard is an 8×5 matrix of half-rows, read via port $FE. Each
//! cleared bit of the port's high byte (A8-A15) selects one half-row; every
//! selected row is ANDed into the result.
//!
//! # Half-row layout
//!
//! | Addr bit | Row | Keys (bit 0-4)                |
//! |----------|-----|-------------------------------|
//! | A8       | 0   | Shift, Z, X, C, V            |
//! | A9       | 1   | A, S, D, F, G                |
//! | A10      | 2   | Q, W, E, R, T                |
//! | A11      | 3   | 1, 2, 3, 4, 5                |
//! | A12      | 4   | 0, 9, 8, 7, 6                |
//! | A13      | 5   | P, O, I, U, Y                |
//! | A14      | 6   | Enter, L, K, J, H            |
//! | A15      | 7   | Space, Sym, M, N, B          |
//!
//! A pressed key reads as 0 (active low).

/// Logical key on the 48K Spectrum keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectrumKey {
    CapsShift,
    Z,
    X,
    C,
    V,
    A,
    S,
    D,
    F,
    G,
    Q,
    W,
    E,
    R,
    T,
    N1,
    N2,
    N3,
    N4,
    N5,
    N0,
    N9,
    N8,
    N7,
    N6,
    P,
    O,
    I,
    U,
    Y,
    Enter,
    L,
    K,
    J,
    H,
    Space,
    SymShift,
    M,
    N,
    B,
}

impl SpectrumKey {
    /// Every key, in matrix order.
    pub const ALL: [Self; 40] = [
        Self::CapsShift,
        Self::Z,
        Self::X,
        Self::C,
        Self::V,
        Self::A,
        Self::S,
        Self::D,
        Self::F,
        Self::G,
        Self::Q,
        Self::W,
        Self::E,
        Self::R,
        Self::T,
        Self::N1,
        Self::N2,
        Self::N3,
        Self::N4,
        Self::N5,
        Self::N0,
        Self::N9,
        Self::N8,
        Self::N7,
        Self::N6,
        Self::P,
        Self::O,
        Self::I,
        Self::U,
        Self::Y,
        Self::Enter,
        Self::L,
        Self::K,
        Self::J,
        Self::H,
        Self::Space,
        Self::SymShift,
        Self::M,
        Self::N,
        Self::B,
    ];

    /// Half-row and bit mask of this key.
    #[must_use]
    pub const fn matrix(self) -> (usize, u8) {
        let index = self as usize;
        (index / 5, 1 << (index % 5))
    }

    /// Key for a printable character, ignoring case. Digits map to the
    /// number row, `'\n'` to Enter and `' '` to Space.
    #[must_use]
    pub fn from_char(ch: char) -> Option<Self> {
        const LAYOUT: &str = "\0ZXCVASDFGQWERT1234509876POIUY\nLKJH \0MNB";
        let ch = ch.to_ascii_uppercase();
        if ch == '\0' {
            return None;
        }
        LAYOUT
            .chars()
            .position(|c| c == ch)
            .map(|index| Self::ALL[index])
    }
}

/// Keyboard state: 8 half-rows of 5 keys each, active low.
#[derive(Debug, Clone)]
pub struct KeyboardState {
    rows: [u8; 8],
}

impl KeyboardState {
    #[must_use]
    pub fn new() -> Self {
        Self { rows: [0xFF; 8] }
    }

    pub fn key_down(&mut self, key: SpectrumKey) {
        let (row, mask) = key.matrix();
        self.rows[row] &= !mask;
    }

    pub fn key_up(&mut self, key: SpectrumKey) {
        let (row, mask) = key.matrix();
        self.rows[row] |= mask;
    }

    #[must_use]
    pub fn is_pressed(&self, key: SpectrumKey) -> bool {
        let (row, mask) = key.matrix();
        self.rows[row] & mask == 0
    }

    #[must_use]
    pub fn row(&self, row: usize) -> u8 {
        self.rows[row]
    }

    /// AND of every half-row whose select bit in `addr_high` is low.
    #[must_use]
    pub fn read(&self, addr_high: u8) -> u8 {
        self.rows
            .iter()
            .enumerate()
            .filter(|&(row, _)| addr_high & (1 << row) == 0)
            .fold(0xFF, |acc, (_, &keys)| acc & keys)
    }

    pub fn release_all(&mut self) {
        self.rows = [0xFF; 8];
    }
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::new()
    }
}

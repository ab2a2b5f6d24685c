//! The opcode dispatch table.
//!
//! 1536 slots addressed by a shift offset plus the opcode byte:
//!
//! | offset | page |
//! |--------|------|
//! | 0      | unprefixed |
//! | 256    | CB |
//! | 512    | ED |
//! | 768    | DD |
//! | 1024   | DD CB and FD CB (shared, the effective address is precomputed) |
//! | 1280   | FD |
//!
//! The table is built in a `const` context. A page with an unfilled slot
//! fails compilation, so a missing handler can never surface at run time.
//! Only the DD and FD pages may leave slots open; those become
//! [`Opcode::Redispatch`].

use crate::cpu::{Z80, Z80Bus};

/// An opcode handler. Fetch and prefix bytes have already been charged.
pub type Handler = fn(&mut Z80, &mut dyn Z80Bus);

/// One slot of the dispatch table.
#[derive(Clone, Copy)]
pub enum Opcode {
    /// A complete instruction.
    Op(Handler),
    /// A prefix byte: fetch the next byte and continue in another page.
    Prefix(Prefix),
    /// DD/FD slot with no index form: run the same byte from the
    /// unprefixed page.
    Redispatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Cb,
    Ed,
    Dd,
    Fd,
    DdCb,
    FdCb,
}

pub const SHIFT_CB: usize = 256;
pub const SHIFT_ED: usize = 512;
pub const SHIFT_DD: usize = 768;
pub const SHIFT_DDCB: usize = 1024;
pub const SHIFT_FDCB: usize = 1024;
pub const SHIFT_FD: usize = 1280;
pub const TABLE_SIZE: usize = 1536;

type Page = [Option<Opcode>; 256];

const fn op(handler: Handler) -> Option<Opcode> {
    Some(Opcode::Op(handler))
}

const fn prefix(prefix: Prefix) -> Option<Opcode> {
    Some(Opcode::Prefix(prefix))
}

/// Seven register slots `$at + r * $step` for r in B C D E H L A, each bound
/// to `$f::<.., r>`. Slot 6 is the memory operand and is left to the caller.
macro_rules! regs {
    ($p:ident[$at:expr; $step:expr] = $f:ident) => {
        $p[$at] = op($f::<0>);
        $p[$at + $step] = op($f::<1>);
        $p[$at + 2 * $step] = op($f::<2>);
        $p[$at + 3 * $step] = op($f::<3>);
        $p[$at + 4 * $step] = op($f::<4>);
        $p[$at + 5 * $step] = op($f::<5>);
        $p[$at + 7 * $step] = op($f::<7>);
    };
    ($p:ident[$at:expr; $step:expr] = $f:ident::<$g:tt>) => {
        $p[$at] = op($f::<$g, 0>);
        $p[$at + $step] = op($f::<$g, 1>);
        $p[$at + 2 * $step] = op($f::<$g, 2>);
        $p[$at + 3 * $step] = op($f::<$g, 3>);
        $p[$at + 4 * $step] = op($f::<$g, 4>);
        $p[$at + 5 * $step] = op($f::<$g, 5>);
        $p[$at + 7 * $step] = op($f::<$g, 7>);
    };
    ($p:ident[$at:expr; $step:expr] = $f:ident::<$g:tt, $h:tt>) => {
        $p[$at] = op($f::<$g, $h, 0>);
        $p[$at + $step] = op($f::<$g, $h, 1>);
        $p[$at + 2 * $step] = op($f::<$g, $h, 2>);
        $p[$at + 3 * $step] = op($f::<$g, $h, 3>);
        $p[$at + 4 * $step] = op($f::<$g, $h, 4>);
        $p[$at + 5 * $step] = op($f::<$g, $h, 5>);
        $p[$at + 7 * $step] = op($f::<$g, $h, 7>);
    };
}

/// All eight slots `$at + n * $step`, each bound to `$f::<.., n>`.
macro_rules! eight {
    ($p:ident[$at:expr; $step:expr] = $f:ident) => {
        $p[$at] = op($f::<0>);
        $p[$at + $step] = op($f::<1>);
        $p[$at + 2 * $step] = op($f::<2>);
        $p[$at + 3 * $step] = op($f::<3>);
        $p[$at + 4 * $step] = op($f::<4>);
        $p[$at + 5 * $step] = op($f::<5>);
        $p[$at + 6 * $step] = op($f::<6>);
        $p[$at + 7 * $step] = op($f::<7>);
    };
    ($p:ident[$at:expr; $step:expr] = $f:ident::<$g:tt>) => {
        $p[$at] = op($f::<$g, 0>);
        $p[$at + $step] = op($f::<$g, 1>);
        $p[$at + 2 * $step] = op($f::<$g, 2>);
        $p[$at + 3 * $step] = op($f::<$g, 3>);
        $p[$at + 4 * $step] = op($f::<$g, 4>);
        $p[$at + 5 * $step] = op($f::<$g, 5>);
        $p[$at + 6 * $step] = op($f::<$g, 6>);
        $p[$at + 7 * $step] = op($f::<$g, 7>);
    };
}

/// Eight rows of eight (`$at + row * 8 + r`): register slots bound to
/// `$f::<row, r>`, and slot 6 of each row bound to `$mem::<row>`.
macro_rules! rows {
    ($p:ident[$at:expr] = $f:ident, $mem:ident) => {
        regs!($p[$at; 1] = $f::<0>);
        regs!($p[$at + 0x08; 1] = $f::<1>);
        regs!($p[$at + 0x10; 1] = $f::<2>);
        regs!($p[$at + 0x18; 1] = $f::<3>);
        regs!($p[$at + 0x20; 1] = $f::<4>);
        regs!($p[$at + 0x28; 1] = $f::<5>);
        regs!($p[$at + 0x30; 1] = $f::<6>);
        regs!($p[$at + 0x38; 1] = $f::<7>);
        eight!($p[$at + 6; 8] = $mem);
    };
}

mod base;
mod cb;
mod ed;
mod index;
mod index_cb;

/// The dispatch table.
pub static OPCODES: [Opcode; TABLE_SIZE] = build();

const fn build() -> [Opcode; TABLE_SIZE] {
    let mut table = [Opcode::Redispatch; TABLE_SIZE];
    install(&mut table, 0, &base::page(), false);
    install(&mut table, SHIFT_CB, &cb::page(), false);
    install(&mut table, SHIFT_ED, &ed::page(), false);
    install(&mut table, SHIFT_DD, &index::page::<false>(), true);
    install(&mut table, SHIFT_DDCB, &index_cb::page(), false);
    install(&mut table, SHIFT_FD, &index::page::<true>(), true);
    table
}

const fn install(table: &mut [Opcode; TABLE_SIZE], offset: usize, page: &Page, redispatch: bool) {
    let mut i = 0;
    while i < 256 {
        table[offset + i] = match page[i] {
            Some(entry) => entry,
            None if redispatch => Opcode::Redispatch,
            None => panic!("opcode page has an unfilled slot"),
        };
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_op(index: usize) -> bool {
        matches!(OPCODES[index], Opcode::Op(_))
    }

    #[test]
    fn unprefixed_page_has_four_prefixes() {
        let prefixes: Vec<usize> = (0..256)
            .filter(|&i| matches!(OPCODES[i], Opcode::Prefix(_)))
            .collect();
        assert_eq!(prefixes, vec![0xCB, 0xDD, 0xED, 0xFD]);
    }

    #[test]
    fn cb_ed_and_ddcb_pages_are_all_handlers() {
        for i in 0..256 {
            assert!(is_op(SHIFT_CB + i), "CB {i:02X}");
            assert!(is_op(SHIFT_ED + i), "ED {i:02X}");
            assert!(is_op(SHIFT_DDCB + i), "DDCB {i:02X}");
        }
    }

    #[test]
    fn index_pages_chain_into_shared_cb_page() {
        assert!(matches!(OPCODES[SHIFT_DD + 0xCB], Opcode::Prefix(Prefix::DdCb)));
        assert!(matches!(OPCODES[SHIFT_FD + 0xCB], Opcode::Prefix(Prefix::FdCb)));
        assert_eq!(SHIFT_DDCB, SHIFT_FDCB);
    }

    #[test]
    fn index_pages_redispatch_untouched_opcodes() {
        for byte in [0x00, 0x01, 0x3E, 0x40, 0x76, 0xC3, 0xED, 0xDD, 0xFD] {
            assert!(matches!(OPCODES[SHIFT_DD + byte], Opcode::Redispatch), "DD {byte:02X}");
            assert!(matches!(OPCODES[SHIFT_FD + byte], Opcode::Redispatch), "FD {byte:02X}");
        }
        for byte in [0x21, 0x24, 0x36, 0x46, 0x66, 0x7E, 0x86, 0xE1, 0xE9, 0xF9] {
            assert!(is_op(SHIFT_DD + byte), "DD {byte:02X}");
            assert!(is_op(SHIFT_FD + byte), "FD {byte:02X}");
        }
    }
}

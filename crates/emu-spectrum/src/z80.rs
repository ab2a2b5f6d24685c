//! .Z80 snapshot decoder (48K).
//!
//! Three versions share a 30-byte header:
//!
//! - **v1**: PC at offset 6 is non-zero. 48K of RAM follows, optionally
//!   compressed and terminated by `00 ED ED 00`.
//! - **v2**: PC = 0, 23-byte extended header.
//! - **v3**: PC = 0, 54- or 55-byte extended header, which also carries
//!   the T-state counter.
//!
//! v2 and v3 store RAM as 16K pages: `length (u16), page, data`, where a
//! length of `0xFFFF` marks an uncompressed page. A 48K snapshot carries
//! pages 8, 4 and 5, for $4000, $8000 and $C000.
//!
//! Compression replaces runs with `ED ED count value`.

use sinclair_ula::TSTATES_PER_FRAME;
use zilog_z80::Registers;

use crate::error::{SnapshotError, SnapshotResult};
use crate::memory::RAM_SIZE;
use crate::snapshot::{CpuState, Snapshot, UlaState};

const V1_HEADER_SIZE: usize = 30;
const V2_HEADER_SIZE: usize = V1_HEADER_SIZE + 2 + 23;
const V3_HEADER_SIZE: usize = V1_HEADER_SIZE + 2 + 54;
const V3X_HEADER_SIZE: usize = V1_HEADER_SIZE + 2 + 55;
const PAGE_SIZE: usize = 0x4000;

pub fn decode(data: &[u8]) -> SnapshotResult<Snapshot> {
    if data.len() < V1_HEADER_SIZE {
        return Err(SnapshotError::Truncated);
    }
    if word(data, 6) != 0 {
        return decode_v1(data);
    }
    if data.len() < V2_HEADER_SIZE {
        return Err(SnapshotError::Truncated);
    }
    let header_size = V1_HEADER_SIZE + 2 + usize::from(word(data, 30));
    match header_size {
        V2_HEADER_SIZE | V3_HEADER_SIZE | V3X_HEADER_SIZE => decode_extended(data, header_size),
        _ => Err(SnapshotError::UnsupportedVersion),
    }
}

fn word(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Flags byte 1. Old versions of some tools wrote 255 for 1.
fn flags1(data: &[u8]) -> u8 {
    if data[12] == 255 { 1 } else { data[12] }
}

/// Registers, border and feature checks common to every version.
fn read_header(data: &[u8]) -> SnapshotResult<(Registers, UlaState)> {
    let flags1 = flags1(data);
    let flags2 = data[29];

    let mut regs = Registers {
        a: data[0],
        f: data[1],
        c: data[2],
        b: data[3],
        l: data[4],
        h: data[5],
        pc: word(data, 6),
        sp: word(data, 8),
        i: data[10],
        e: data[13],
        d: data[14],
        c_alt: data[15],
        b_alt: data[16],
        e_alt: data[17],
        d_alt: data[18],
        l_alt: data[19],
        h_alt: data[20],
        a_alt: data[21],
        f_alt: data[22],
        iff1: data[27] != 0,
        iff2: data[28] != 0,
        im: flags2 & 0x03,
        ..Registers::default()
    };
    regs.set_r_full((data[11] & 0x7F) | ((flags1 & 0x01) << 7));
    regs.set_iy(word(data, 23));
    regs.set_ix(word(data, 25));

    if regs.im > 2 {
        return Err(SnapshotError::InvalidInterruptMode(regs.im));
    }
    if flags1 & 0x10 != 0 {
        return Err(SnapshotError::UnsupportedHardware("SamRom"));
    }
    if flags2 & 0x04 != 0 {
        return Err(SnapshotError::UnsupportedHardware("Issue 2 emulation"));
    }

    let ula = UlaState {
        border: (flags1 >> 1) & 0x07,
    };
    Ok((regs, ula))
}

fn decode_v1(data: &[u8]) -> SnapshotResult<Snapshot> {
    let (registers, ula) = read_header(data)?;
    let body = &data[V1_HEADER_SIZE..];

    let memory = if flags1(data) & 0x20 != 0 {
        let compressed = body
            .strip_suffix(&[0x00, 0xED, 0xED, 0x00])
            .ok_or(SnapshotError::MissingEndMarker)?;
        decompress(compressed)
    } else {
        body.to_vec()
    };
    if memory.len() != RAM_SIZE {
        return Err(SnapshotError::DecompressedLength {
            expected: RAM_SIZE,
            actual: memory.len(),
        });
    }

    Ok(Snapshot {
        cpu: CpuState {
            registers,
            tstates: 0,
        },
        ula,
        memory,
    })
}

fn decode_extended(data: &[u8], header_size: usize) -> SnapshotResult<Snapshot> {
    if data.len() < header_size {
        return Err(SnapshotError::Truncated);
    }
    let (mut registers, ula) = read_header(data)?;
    registers.pc = word(data, 32);

    let hardware_mode = data[34];
    if hardware_mode > 1 {
        return Err(SnapshotError::UnsupportedHardwareMode(hardware_mode));
    }
    if data[37] & 0x80 != 0 {
        return Err(SnapshotError::UnsupportedHardware("modified hardware"));
    }

    let mut tstates = 0;
    if header_size != V2_HEADER_SIZE {
        tstates = restore_tstates(word(data, 55), data[57]);
        for (offset, feature) in [
            (59, "MGT ROM paging"),
            (60, "Multiface ROM paging"),
            (61, "RAM at 0-8191"),
            (62, "RAM at 8192-16383"),
        ] {
            if data[offset] == 0xFF {
                return Err(SnapshotError::UnsupportedHardware(feature));
            }
        }
    }

    Ok(Snapshot {
        cpu: CpuState { registers, tstates },
        ula,
        memory: read_pages(&data[header_size..])?,
    })
}

/// Convert the v3 quarter-frame counter to T-states into the frame.
///
/// The low word counts down within a quarter, the high byte counts
/// quarters starting from 3.
fn restore_tstates(low: u16, high: u8) -> u32 {
    const QUARTER: u32 = TSTATES_PER_FRAME / 4;
    let quarter = (u32::from(high & 0x03) + 1) % 4;
    quarter * QUARTER + (QUARTER - u32::from(low) % QUARTER - 1)
}

fn read_pages(mut blocks: &[u8]) -> SnapshotResult<Vec<u8>> {
    let mut pages: [Option<Vec<u8>>; 3] = [None, None, None];
    let mut count = 0;

    while blocks.len() >= 3 {
        let length = word(blocks, 0);
        let page = blocks[2];
        blocks = &blocks[3..];

        let (stored, raw) = if length == 0xFFFF {
            (PAGE_SIZE, true)
        } else {
            (usize::from(length), false)
        };
        let block = blocks.get(..stored).ok_or(SnapshotError::Truncated)?;
        blocks = &blocks[stored..];

        let slot = match page {
            8 => 0,
            4 => 1,
            5 => 2,
            _ => return Err(SnapshotError::InvalidPage(page)),
        };
        let contents = if raw { block.to_vec() } else { decompress(block) };
        if contents.len() != PAGE_SIZE {
            return Err(SnapshotError::PageLength {
                page,
                length: contents.len(),
            });
        }
        pages[slot] = Some(contents);
        count += 1;
    }
    if !blocks.is_empty() {
        return Err(SnapshotError::TrailingData);
    }
    if count != 3 {
        return Err(SnapshotError::PageCount(count));
    }

    let mut memory = Vec::with_capacity(RAM_SIZE);
    for page in pages {
        memory.extend(page.ok_or(SnapshotError::PageCount(count))?);
    }
    Ok(memory)
}

/// Expand `ED ED count value` runs.
fn decompress(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(RAM_SIZE);
    let mut i = 0;
    while i < src.len() {
        if i + 4 <= src.len() && src[i] == 0xED && src[i + 1] == 0xED {
            let count = usize::from(src[i + 2]);
            out.extend(std::iter::repeat_n(src[i + 3], count));
            i += 4;
        } else {
            out.push(src[i]);
            i += 1;
        }
    }
    out
}

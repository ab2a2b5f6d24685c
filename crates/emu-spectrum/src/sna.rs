//! SNA snapshot codec (48K).
//!
//! 27-byte header followed by 48K of RAM. PC is not in the header: the
//! saving emulator pushed it on the stack, and loading pops it again as a
//! RETN would.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0      | 1    | I |
//! | 1      | 6    | HL', DE', BC' (little-endian pairs) |
//! | 7      | 2    | AF' (F first) |
//! | 9      | 6    | HL, DE, BC |
//! | 15     | 4    | IY, IX |
//! | 19     | 1    | bit 2 = IFF2 |
//! | 20     | 1    | R |
//! | 21     | 2    | AF (F first) |
//! | 23     | 2    | SP |
//! | 25     | 1    | interrupt mode |
//! | 26     | 1    | border colour |

use zilog_z80::{INTERRUPT_LENGTH, Registers};

use crate::error::{SnapshotError, SnapshotResult};
use crate::memory::RAM_SIZE;
use crate::snapshot::{CpuState, Snapshot, UlaState};

pub const HEADER_SIZE: usize = 27;
pub const SNA_SIZE: usize = HEADER_SIZE + RAM_SIZE;

/// Offset of the RAM image byte for `addr`, if the stack slot at `addr`
/// and `addr + 1` lies in RAM. Saving needs both bytes in the image.
fn stack_slot(addr: u16) -> Option<usize> {
    (0x4000..0xFFFF)
        .contains(&addr)
        .then(|| usize::from(addr - 0x4000))
}

pub fn decode(data: &[u8]) -> SnapshotResult<Snapshot> {
    if data.len() != SNA_SIZE {
        return Err(SnapshotError::InvalidSize {
            expected: SNA_SIZE,
            actual: data.len(),
        });
    }
    let word = |offset: usize| u16::from_le_bytes([data[offset], data[offset + 1]]);

    let mut regs = Registers {
        i: data[0],
        l_alt: data[1],
        h_alt: data[2],
        e_alt: data[3],
        d_alt: data[4],
        c_alt: data[5],
        b_alt: data[6],
        f_alt: data[7],
        a_alt: data[8],
        l: data[9],
        h: data[10],
        e: data[11],
        d: data[12],
        c: data[13],
        b: data[14],
        f: data[21],
        a: data[22],
        ..Registers::default()
    };
    regs.set_iy(word(15));
    regs.set_ix(word(17));
    regs.iff2 = data[19] & 0x04 != 0;
    regs.iff1 = regs.iff2;
    regs.set_r_full(data[20]);
    regs.im = data[25];
    if regs.im > 2 {
        return Err(SnapshotError::InvalidInterruptMode(regs.im));
    }

    let sp = word(23);
    if sp < 0x4000 {
        return Err(SnapshotError::RetnSimulation);
    }
    let mut snapshot = Snapshot {
        cpu: CpuState::default(),
        ula: UlaState {
            border: data[26] & 0x07,
        },
        memory: data[HEADER_SIZE..].to_vec(),
    };
    // With SP at $FFFF the high byte wraps to $0000, which reads as 0 here.
    regs.pc = u16::from_le_bytes([snapshot.peek(sp), snapshot.peek(sp.wrapping_add(1))]);
    regs.sp = sp.wrapping_add(2);
    snapshot.cpu = CpuState {
        registers: regs,
        tstates: if regs.iff1 { INTERRUPT_LENGTH } else { 0 },
    };
    Ok(snapshot)
}

pub fn encode(snapshot: &Snapshot) -> SnapshotResult<Vec<u8>> {
    snapshot.validate()?;
    let regs = &snapshot.cpu.registers;
    let sp = regs.sp.wrapping_sub(2);
    let slot = stack_slot(sp).ok_or(SnapshotError::RetnSimulation)?;

    let mut data = Vec::with_capacity(SNA_SIZE);
    data.extend_from_slice(&[
        regs.i, regs.l_alt, regs.h_alt, regs.e_alt, regs.d_alt, regs.c_alt, regs.b_alt,
        regs.f_alt, regs.a_alt, regs.l, regs.h, regs.e, regs.d, regs.c, regs.b,
    ]);
    data.extend_from_slice(&regs.iy().to_le_bytes());
    data.extend_from_slice(&regs.ix().to_le_bytes());
    data.push(if regs.iff1 { 0x04 } else { 0x00 });
    data.push(regs.r_full());
    data.push(regs.f);
    data.push(regs.a);
    data.extend_from_slice(&sp.to_le_bytes());
    data.push(regs.im);
    data.push(snapshot.ula.border & 0x07);

    let ram_start = data.len();
    data.extend_from_slice(&snapshot.memory);
    let [pc_low, pc_high] = regs.pc.to_le_bytes();
    data[ram_start + slot] = pc_low;
    data[ram_start + slot + 1] = pc_high;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_sna() -> Vec<u8> {
        let mut data = vec![0u8; SNA_SIZE];
        data[0] = 0x3F; // I
        data[1] = 0x11; // L'
        data[2] = 0x22; // H'
        data[7] = 0x44; // F'
        data[8] = 0x55; // A'
        data[13] = 0x34; // C
        data[14] = 0x12; // B
        data[15] = 0x3A; // IY low
        data[16] = 0x5C; // IY high
        data[19] = 0x04;
        data[20] = 0x85;
        data[21] = 0xFF; // F
        data[22] = 0x01; // A
        data[23] = 0x00; // SP = $8000
        data[24] = 0x80;
        data[25] = 1;
        data[26] = 0x02;
        // PC = $1234 on the stack.
        data[HEADER_SIZE + 0x4000] = 0x34;
        data[HEADER_SIZE + 0x4001] = 0x12;
        data
    }

    #[test]
    fn decode_header() {
        let snapshot = decode(&make_sna()).expect("valid SNA");
        let regs = snapshot.cpu.registers;
        assert_eq!(regs.i, 0x3F);
        assert_eq!(regs.hl_alt(), 0x2211);
        assert_eq!(regs.af_alt(), 0x5544);
        assert_eq!(regs.bc(), 0x1234);
        assert_eq!(regs.iy(), 0x5C3A);
        assert_eq!(regs.af(), 0x01FF);
        assert_eq!(regs.r_full(), 0x85);
        assert_eq!(regs.im, 1);
        assert!(regs.iff1 && regs.iff2);
        assert_eq!(snapshot.ula.border, 2);
    }

    #[test]
    fn decode_pops_pc() {
        let snapshot = decode(&make_sna()).expect("valid SNA");
        assert_eq!(snapshot.cpu.registers.pc, 0x1234);
        assert_eq!(snapshot.cpu.registers.sp, 0x8002);
        assert_eq!(snapshot.cpu.tstates, INTERRUPT_LENGTH);
    }

    #[test]
    fn disabled_interrupts_start_at_zero() {
        let mut data = make_sna();
        data[19] = 0;
        let snapshot = decode(&data).expect("valid SNA");
        assert!(!snapshot.cpu.registers.iff1);
        assert_eq!(snapshot.cpu.tstates, 0);
    }

    #[test]
    fn wrong_size_rejected() {
        assert_eq!(
            decode(&[0; 100]),
            Err(SnapshotError::InvalidSize {
                expected: SNA_SIZE,
                actual: 100
            })
        );
    }

    #[test]
    fn bad_interrupt_mode_rejected() {
        let mut data = make_sna();
        data[25] = 3;
        assert_eq!(decode(&data), Err(SnapshotError::InvalidInterruptMode(3)));
    }

    #[test]
    fn stack_in_rom_rejected() {
        let mut data = make_sna();
        data[23] = 0x00;
        data[24] = 0x10;
        assert_eq!(decode(&data), Err(SnapshotError::RetnSimulation));
    }

    #[test]
    fn stack_at_top_of_ram_wraps() {
        let mut data = make_sna();
        data[23] = 0xFF;
        data[24] = 0xFF;
        data[HEADER_SIZE + 0xBFFF] = 0x78;
        let snapshot = decode(&data).expect("SP $FFFF decodes");
        assert_eq!(snapshot.cpu.registers.pc, 0x0078);
        assert_eq!(snapshot.cpu.registers.sp, 0x0001);

        // Saving from there would need a push into ROM.
        assert_eq!(encode(&snapshot), Err(SnapshotError::RetnSimulation));
    }

    #[test]
    fn file_round_trip_is_exact() {
        let data = make_sna();
        let snapshot = decode(&data).expect("valid SNA");
        assert_eq!(encode(&snapshot).expect("encodable"), data);
    }

    #[test]
    fn encode_refuses_low_stack() {
        let mut snapshot = Snapshot::new();
        snapshot.cpu.registers.sp = 0x4001;
        assert_eq!(encode(&snapshot), Err(SnapshotError::RetnSimulation));
        snapshot.cpu.registers.sp = 0x0000;
        assert!(encode(&snapshot).is_ok(), "push wraps to $FFFE");
    }
}

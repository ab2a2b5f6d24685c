//! Z80 CPU core: fetch, prefix decoding, dispatch and interrupts.

use emu_core::{Bus, Cpu, IoBus, Observable, Value};

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::opcodes::{OPCODES, Opcode, Prefix, SHIFT_CB, SHIFT_DD, SHIFT_DDCB, SHIFT_ED, SHIFT_FD};
use crate::registers::Registers;

/// The bus an opcode handler sees: timed memory plus timed ports.
pub trait Z80Bus: Bus + IoBus {}

impl<T: Bus + IoBus + ?Sized> Z80Bus for T {}

/// T-states added when a maskable interrupt is accepted, on top of the
/// stack writes.
pub const INTERRUPT_LENGTH: u32 = 32;

/// Z80 CPU.
#[derive(Debug, Clone, Default)]
pub struct Z80 {
    pub regs: Registers,
    pub(crate) halted: bool,
    /// Effective address of the current DDCB/FDCB instruction.
    pub(crate) tempaddr: u16,
}

impl Z80 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute one instruction, prefixes included.
    pub fn execute(&mut self, bus: &mut dyn Z80Bus) {
        let opcode = self.fetch_opcode(bus);
        self.dispatch(bus, usize::from(opcode));
    }

    /// Run from table slot `index` until a complete handler has executed.
    fn dispatch(&mut self, bus: &mut dyn Z80Bus, mut index: usize) {
        loop {
            match OPCODES[index] {
                Opcode::Op(handler) => {
                    handler(self, bus);
                    return;
                }
                Opcode::Prefix(prefix) => index = self.fetch_prefixed(bus, prefix),
                // The prefix had no effect: run the byte as unprefixed.
                // PC and R have already moved past it.
                Opcode::Redispatch => index &= 0xFF,
            }
        }
    }

    /// M1 cycle: 4 contended T-states, R advances.
    fn fetch_opcode(&mut self, bus: &mut dyn Z80Bus) -> u8 {
        let pc = self.regs.pc;
        bus.contend_read(pc, 4);
        let opcode = bus.read_byte_internal(pc);
        self.regs.pc = pc.wrapping_add(1);
        self.regs.inc_r();
        opcode
    }

    fn fetch_prefixed(&mut self, bus: &mut dyn Z80Bus, prefix: Prefix) -> usize {
        match prefix {
            Prefix::Cb => SHIFT_CB + usize::from(self.fetch_opcode(bus)),
            Prefix::Ed => SHIFT_ED + usize::from(self.fetch_opcode(bus)),
            Prefix::Dd => SHIFT_DD + usize::from(self.fetch_opcode(bus)),
            Prefix::Fd => SHIFT_FD + usize::from(self.fetch_opcode(bus)),
            Prefix::DdCb => self.fetch_index_cb(bus, self.regs.ix()),
            Prefix::FdCb => self.fetch_index_cb(bus, self.regs.iy()),
        }
    }

    /// DD CB d op: the displacement comes before the opcode, and neither
    /// byte is an M1 cycle.
    fn fetch_index_cb(&mut self, bus: &mut dyn Z80Bus, base: u16) -> usize {
        let pc = self.regs.pc;
        bus.contend_read(pc, 3);
        let displacement = bus.read_byte_internal(pc) as i8;
        self.tempaddr = base.wrapping_add_signed(i16::from(displacement));
        let pc = pc.wrapping_add(1);
        bus.contend_read(pc, 3);
        let opcode = bus.read_byte_internal(pc);
        bus.contend_read_no_mreq_loop(pc, 2);
        self.regs.pc = pc.wrapping_add(1);
        SHIFT_DDCB + usize::from(opcode)
    }

    /// Accept a maskable interrupt if IFF1 is set.
    ///
    /// A halted CPU resumes after the HALT. PC is pushed through the timed
    /// bus, then `INTERRUPT_LENGTH` T-states are added.
    pub fn accept_interrupt(&mut self, bus: &mut dyn Z80Bus) -> bool {
        if !self.regs.iff1 {
            return false;
        }
        if self.halted {
            self.regs.pc = self.regs.pc.wrapping_add(1);
            self.halted = false;
        }
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.push16(bus, self.regs.pc);
        self.regs.inc_r();
        self.regs.pc = match self.regs.im {
            2 => {
                let vector = u16::from_be_bytes([self.regs.i, 0xFF]);
                let low = bus.read_byte(vector);
                let high = bus.read_byte(vector.wrapping_add(1));
                u16::from_le_bytes([low, high])
            }
            _ => 0x0038,
        };
        bus.add_tstates(INTERRUPT_LENGTH);
        true
    }

    // =========================================================================
    // Shared micro-sequences
    // =========================================================================

    /// Timed read of the byte at PC, advancing PC.
    pub(crate) fn read_pc(&mut self, bus: &mut dyn Z80Bus) -> u8 {
        let value = bus.read_byte(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    pub(crate) fn read_pc16(&mut self, bus: &mut dyn Z80Bus) -> u16 {
        let low = self.read_pc(bus);
        let high = self.read_pc(bus);
        u16::from_le_bytes([low, high])
    }

    pub(crate) fn push16(&mut self, bus: &mut dyn Z80Bus, value: u16) {
        let [high, low] = value.to_be_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write_byte(self.regs.sp, high);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write_byte(self.regs.sp, low);
    }

    pub(crate) fn pop16(&mut self, bus: &mut dyn Z80Bus) -> u16 {
        let low = bus.read_byte(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let high = bus.read_byte(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([low, high])
    }

    pub(crate) fn ret(&mut self, bus: &mut dyn Z80Bus) {
        self.regs.pc = self.pop16(bus);
    }

    /// `JP nn` target fetch. PC is replaced, so it is not advanced.
    pub(crate) fn jp(&mut self, bus: &mut dyn Z80Bus) {
        let pc = self.regs.pc;
        let low = bus.read_byte(pc);
        let high = bus.read_byte(pc.wrapping_add(1));
        self.regs.pc = u16::from_le_bytes([low, high]);
    }

    pub(crate) fn jr(&mut self, bus: &mut dyn Z80Bus) {
        let pc = self.regs.pc;
        let offset = bus.read_byte(pc) as i8;
        bus.contend_read_no_mreq_loop(pc, 5);
        self.regs.pc = pc.wrapping_add_signed(i16::from(offset)).wrapping_add(1);
    }

    pub(crate) fn call(&mut self, bus: &mut dyn Z80Bus) {
        let low = self.read_pc(bus);
        let high = bus.read_byte(self.regs.pc);
        bus.contend_read_no_mreq(self.regs.pc, 1);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.push16(bus, self.regs.pc);
        self.regs.pc = u16::from_le_bytes([low, high]);
    }

    /// Untaken `JR cc`/`DJNZ`: the offset is read but ignored.
    pub(crate) fn skip_e(&mut self, bus: &mut dyn Z80Bus) {
        bus.contend_read(self.regs.pc, 3);
        self.regs.pc = self.regs.pc.wrapping_add(1);
    }

    /// Untaken `JP cc`/`CALL cc`: both operand bytes are read but ignored.
    pub(crate) fn skip_nn(&mut self, bus: &mut dyn Z80Bus) {
        let pc = self.regs.pc;
        bus.contend_read(pc, 3);
        bus.contend_read(pc.wrapping_add(1), 3);
        self.regs.pc = pc.wrapping_add(2);
    }

    /// `LD (nn),rr`.
    pub(crate) fn store16(&mut self, bus: &mut dyn Z80Bus, value: u16) {
        let address = self.read_pc16(bus);
        let [high, low] = value.to_be_bytes();
        bus.write_byte(address, low);
        bus.write_byte(address.wrapping_add(1), high);
    }

    /// `LD rr,(nn)`.
    pub(crate) fn load16(&mut self, bus: &mut dyn Z80Bus) -> u16 {
        let address = self.read_pc16(bus);
        let low = bus.read_byte(address);
        let high = bus.read_byte(address.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }

    /// `n` internal cycles with IR on the address bus.
    pub(crate) fn contend_ir(&self, bus: &mut dyn Z80Bus, cycles: u32) {
        bus.contend_read_no_mreq_loop(self.regs.ir(), cycles);
    }

    /// Condition codes in opcode order: NZ Z NC C PO PE P M.
    pub(crate) fn condition(&self, cc: u8) -> bool {
        let f = self.regs.f;
        match cc {
            0 => f & ZF == 0,
            1 => f & ZF != 0,
            2 => f & CF == 0,
            3 => f & CF != 0,
            4 => f & PF == 0,
            5 => f & PF != 0,
            6 => f & SF == 0,
            _ => f & SF != 0,
        }
    }

    /// Pair by its 2-bit opcode index: BC DE HL SP.
    pub(crate) fn pair(&self, p: u8) -> u16 {
        match p {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    pub(crate) fn set_pair(&mut self, p: u8, value: u16) {
        match p {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            _ => self.regs.sp = value,
        }
    }

    /// Register by its 3-bit opcode index (B C D E H L - A). Index 6 is the
    /// memory operand and never reaches here.
    pub(crate) fn reg(&self, r: u8) -> u8 {
        match r {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            _ => self.regs.a,
        }
    }

    pub(crate) fn set_reg(&mut self, r: u8, value: u8) {
        match r {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            _ => self.regs.a = value,
        }
    }

    /// As [`Z80::reg`], with H and L replaced by the halves of IX or IY.
    pub(crate) fn index_reg<const IY: bool>(&self, r: u8) -> u8 {
        match (r, IY) {
            (4, false) => self.regs.ixh,
            (5, false) => self.regs.ixl,
            (4, true) => self.regs.iyh,
            (5, true) => self.regs.iyl,
            _ => self.reg(r),
        }
    }

    pub(crate) fn set_index_reg<const IY: bool>(&mut self, r: u8, value: u8) {
        match (r, IY) {
            (4, false) => self.regs.ixh = value,
            (5, false) => self.regs.ixl = value,
            (4, true) => self.regs.iyh = value,
            (5, true) => self.regs.iyl = value,
            _ => self.set_reg(r, value),
        }
    }

    pub(crate) fn index<const IY: bool>(&self) -> u16 {
        if IY { self.regs.iy() } else { self.regs.ix() }
    }

    pub(crate) fn set_index<const IY: bool>(&mut self, value: u16) {
        if IY {
            self.regs.set_iy(value);
        } else {
            self.regs.set_ix(value);
        }
    }

    /// Read `d` and form IX+d / IY+d, with the 5 internal cycles that
    /// follow the displacement in most indexed instructions.
    pub(crate) fn index_address<const IY: bool>(&mut self, bus: &mut dyn Z80Bus) -> u16 {
        let pc = self.regs.pc;
        let displacement = bus.read_byte(pc) as i8;
        bus.contend_read_no_mreq_loop(pc, 5);
        self.regs.pc = pc.wrapping_add(1);
        self.index::<IY>().wrapping_add_signed(i16::from(displacement))
    }
}

impl Cpu for Z80 {
    type Registers = Registers;

    fn step<B: Bus + IoBus>(&mut self, bus: &mut B) {
        self.execute(bus);
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn interrupt<B: Bus + IoBus>(&mut self, bus: &mut B) -> bool {
        self.accept_interrupt(bus)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

const QUERY_PATHS: &[&str] = &[
    "pc", "sp", "a", "f", "b", "c", "d", "e", "h", "l", "bc", "de", "hl", "ix", "iy", "af'",
    "bc'", "de'", "hl'", "i", "r", "iff1", "iff2", "im", "halted", "flags.c", "flags.n",
    "flags.p", "flags.h", "flags.z", "flags.s", "flags.x", "flags.y",
];

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        let flag = |mask: u8| Some(Value::Bool(r.f & mask != 0));
        match path {
            "pc" => Some(r.pc.into()),
            "sp" => Some(r.sp.into()),
            "a" => Some(r.a.into()),
            "f" => Some(r.f.into()),
            "b" => Some(r.b.into()),
            "c" => Some(r.c.into()),
            "d" => Some(r.d.into()),
            "e" => Some(r.e.into()),
            "h" => Some(r.h.into()),
            "l" => Some(r.l.into()),
            "bc" => Some(r.bc().into()),
            "de" => Some(r.de().into()),
            "hl" => Some(r.hl().into()),
            "ix" => Some(r.ix().into()),
            "iy" => Some(r.iy().into()),
            "af'" => Some(r.af_alt().into()),
            "bc'" => Some(r.bc_alt().into()),
            "de'" => Some(r.de_alt().into()),
            "hl'" => Some(r.hl_alt().into()),
            "i" => Some(r.i.into()),
            "r" => Some(r.r_full().into()),
            "iff1" => Some(r.iff1.into()),
            "iff2" => Some(r.iff2.into()),
            "im" => Some(r.im.into()),
            "halted" => Some(self.halted.into()),
            "flags.c" => flag(CF),
            "flags.n" => flag(NF),
            "flags.p" => flag(PF),
            "flags.h" => flag(HF),
            "flags.z" => flag(ZF),
            "flags.s" => flag(SF),
            "flags.x" => flag(XF),
            "flags.y" => flag(YF),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::SimpleBus;

    #[test]
    fn interrupt_ignored_when_disabled() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        assert!(!cpu.accept_interrupt(&mut bus));
        assert_eq!(bus.tstates, 0);
    }

    #[test]
    fn im1_interrupt_pushes_pc_and_jumps_to_38() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        cpu.regs.iff1 = true;
        cpu.regs.iff2 = true;
        cpu.regs.im = 1;
        cpu.regs.pc = 0x1234;
        cpu.regs.sp = 0x8000;
        assert!(cpu.accept_interrupt(&mut bus));
        assert_eq!(cpu.regs.pc, 0x0038);
        assert_eq!(cpu.regs.sp, 0x7FFE);
        assert_eq!(bus.memory[0x7FFF], 0x12);
        assert_eq!(bus.memory[0x7FFE], 0x34);
        assert!(!cpu.regs.iff1 && !cpu.regs.iff2);
        assert_eq!(bus.tstates, 6 + INTERRUPT_LENGTH);
    }

    #[test]
    fn im2_interrupt_reads_vector() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        bus.load(0x39FF, &[0x00, 0x80]);
        cpu.regs.iff1 = true;
        cpu.regs.im = 2;
        cpu.regs.i = 0x39;
        cpu.regs.sp = 0xC000;
        cpu.accept_interrupt(&mut bus);
        assert_eq!(cpu.regs.pc, 0x8000);
    }

    #[test]
    fn interrupt_leaves_halt() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        bus.load(0x8000, &[0x76]);
        cpu.regs.pc = 0x8000;
        cpu.regs.sp = 0xC000;
        cpu.regs.iff1 = true;
        cpu.execute(&mut bus);
        assert!(cpu.is_halted());
        assert_eq!(cpu.regs.pc, 0x8000, "HALT re-executes itself");
        cpu.accept_interrupt(&mut bus);
        assert!(!cpu.is_halted());
        assert_eq!(bus.memory[0xBFFE], 0x01, "return address is after HALT");
    }

    #[test]
    fn query_reports_flags() {
        let mut cpu = Z80::new();
        cpu.regs.f = ZF | CF;
        assert_eq!(cpu.query("flags.z"), Some(Value::Bool(true)));
        assert_eq!(cpu.query("flags.s"), Some(Value::Bool(false)));
        assert_eq!(cpu.query("nope"), None);
    }
}

//! Opcode dispatch. Both strategies drive the same addressing-mode and
//! operation helpers, so they differ only in how an opcode is decoded.

use std::fmt;
use std::str::FromStr;

use super::alu::{Mode, ReadOp, RmwOp, StoreOp};
use super::branch::Condition;
use super::implied::ImpliedOp;
use super::{CpuBus, M6502};
use crate::core::BusMaster;

/// Executes one post-fetch cycle of an instruction.
pub trait CpuDispatcher: Sync {
    fn name(&self) -> &'static str;

    /// Run `cycle` of `opcode`. Returns false when the opcode is unknown,
    /// in which case the CPU state is untouched.
    fn execute(
        &self,
        cpu: &mut M6502,
        opcode: u8,
        cycle: u8,
        bus: &mut CpuBus,
        master: BusMaster,
    ) -> bool;

    fn is_defined(&self, opcode: u8) -> bool;
}

/// Selects a dispatcher at startup (`--cpu direct|table`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchStrategy {
    #[default]
    Direct,
    Table,
}

static DIRECT: DirectDispatch = DirectDispatch;
static TABLE: TableDispatch = TableDispatch;

impl DispatchStrategy {
    pub fn dispatcher(self) -> &'static dyn CpuDispatcher {
        match self {
            DispatchStrategy::Direct => &DIRECT,
            DispatchStrategy::Table => &TABLE,
        }
    }
}

impl fmt::Display for DispatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dispatcher().name())
    }
}

impl FromStr for DispatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(DispatchStrategy::Direct),
            "table" | "generated" => Ok(DispatchStrategy::Table),
            other => Err(format!("unknown CPU dispatch strategy '{other}'")),
        }
    }
}

// -----------------------------------------------------------------------
// Direct dispatch: one match arm per opcode
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDispatch;

impl CpuDispatcher for DirectDispatch {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn execute(
        &self,
        cpu: &mut M6502,
        opcode: u8,
        cycle: u8,
        bus: &mut CpuBus,
        master: BusMaster,
    ) -> bool {
        match opcode {
            // ---- Loads and stores ----
            0xA1 => cpu.alu_ind_x(cycle, bus, master, M6502::lda),
            0xA5 => cpu.alu_zp(cycle, bus, master, M6502::lda),
            0xA9 => cpu.alu_imm(cycle, bus, master, M6502::lda),
            0xAD => cpu.alu_abs(cycle, bus, master, M6502::lda),
            0xB1 => cpu.alu_ind_y(cycle, bus, master, M6502::lda),
            0xB5 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::lda),
            0xB9 => cpu.alu_abs_idx(cycle, bus, master, cpu.y, M6502::lda),
            0xBD => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::lda),
            0xA2 => cpu.alu_imm(cycle, bus, master, M6502::ldx),
            0xA6 => cpu.alu_zp(cycle, bus, master, M6502::ldx),
            0xAE => cpu.alu_abs(cycle, bus, master, M6502::ldx),
            0xB6 => cpu.alu_zp_idx(cycle, bus, master, cpu.y, M6502::ldx),
            0xBE => cpu.alu_abs_idx(cycle, bus, master, cpu.y, M6502::ldx),
            0xA0 => cpu.alu_imm(cycle, bus, master, M6502::ldy),
            0xA4 => cpu.alu_zp(cycle, bus, master, M6502::ldy),
            0xAC => cpu.alu_abs(cycle, bus, master, M6502::ldy),
            0xB4 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::ldy),
            0xBC => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::ldy),
            0x81 => cpu.store_ind_x(cycle, bus, master, M6502::sta),
            0x85 => cpu.store_zp(cycle, bus, master, M6502::sta),
            0x8D => cpu.store_abs(cycle, bus, master, M6502::sta),
            0x91 => cpu.store_ind_y(cycle, bus, master, M6502::sta),
            0x95 => cpu.store_zp_idx(cycle, bus, master, cpu.x, M6502::sta),
            0x99 => cpu.store_abs_idx(cycle, bus, master, cpu.y, M6502::sta),
            0x9D => cpu.store_abs_idx(cycle, bus, master, cpu.x, M6502::sta),
            0x86 => cpu.store_zp(cycle, bus, master, M6502::stx),
            0x8E => cpu.store_abs(cycle, bus, master, M6502::stx),
            0x96 => cpu.store_zp_idx(cycle, bus, master, cpu.y, M6502::stx),
            0x84 => cpu.store_zp(cycle, bus, master, M6502::sty),
            0x8C => cpu.store_abs(cycle, bus, master, M6502::sty),
            0x94 => cpu.store_zp_idx(cycle, bus, master, cpu.x, M6502::sty),

            // ---- Arithmetic and logic ----
            0x61 => cpu.alu_ind_x(cycle, bus, master, M6502::adc),
            0x65 => cpu.alu_zp(cycle, bus, master, M6502::adc),
            0x69 => cpu.alu_imm(cycle, bus, master, M6502::adc),
            0x6D => cpu.alu_abs(cycle, bus, master, M6502::adc),
            0x71 => cpu.alu_ind_y(cycle, bus, master, M6502::adc),
            0x75 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::adc),
            0x79 => cpu.alu_abs_idx(cycle, bus, master, cpu.y, M6502::adc),
            0x7D => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::adc),
            0xE1 => cpu.alu_ind_x(cycle, bus, master, M6502::sbc),
            0xE5 => cpu.alu_zp(cycle, bus, master, M6502::sbc),
            0xE9 => cpu.alu_imm(cycle, bus, master, M6502::sbc),
            0xED => cpu.alu_abs(cycle, bus, master, M6502::sbc),
            0xF1 => cpu.alu_ind_y(cycle, bus, master, M6502::sbc),
            0xF5 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::sbc),
            0xF9 => cpu.alu_abs_idx(cycle, bus, master, cpu.y, M6502::sbc),
            0xFD => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::sbc),
            0x21 => cpu.alu_ind_x(cycle, bus, master, M6502::and),
            0x25 => cpu.alu_zp(cycle, bus, master, M6502::and),
            0x29 => cpu.alu_imm(cycle, bus, master, M6502::and),
            0x2D => cpu.alu_abs(cycle, bus, master, M6502::and),
            0x31 => cpu.alu_ind_y(cycle, bus, master, M6502::and),
            0x35 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::and),
            0x39 => cpu.alu_abs_idx(cycle, bus, master, cpu.y, M6502::and),
            0x3D => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::and),
            0x01 => cpu.alu_ind_x(cycle, bus, master, M6502::ora),
            0x05 => cpu.alu_zp(cycle, bus, master, M6502::ora),
            0x09 => cpu.alu_imm(cycle, bus, master, M6502::ora),
            0x0D => cpu.alu_abs(cycle, bus, master, M6502::ora),
            0x11 => cpu.alu_ind_y(cycle, bus, master, M6502::ora),
            0x15 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::ora),
            0x19 => cpu.alu_abs_idx(cycle, bus, master, cpu.y, M6502::ora),
            0x1D => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::ora),
            0x41 => cpu.alu_ind_x(cycle, bus, master, M6502::eor),
            0x45 => cpu.alu_zp(cycle, bus, master, M6502::eor),
            0x49 => cpu.alu_imm(cycle, bus, master, M6502::eor),
            0x4D => cpu.alu_abs(cycle, bus, master, M6502::eor),
            0x51 => cpu.alu_ind_y(cycle, bus, master, M6502::eor),
            0x55 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::eor),
            0x59 => cpu.alu_abs_idx(cycle, bus, master, cpu.y, M6502::eor),
            0x5D => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::eor),
            0xC1 => cpu.alu_ind_x(cycle, bus, master, M6502::cmp),
            0xC5 => cpu.alu_zp(cycle, bus, master, M6502::cmp),
            0xC9 => cpu.alu_imm(cycle, bus, master, M6502::cmp),
            0xCD => cpu.alu_abs(cycle, bus, master, M6502::cmp),
            0xD1 => cpu.alu_ind_y(cycle, bus, master, M6502::cmp),
            0xD5 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::cmp),
            0xD9 => cpu.alu_abs_idx(cycle, bus, master, cpu.y, M6502::cmp),
            0xDD => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::cmp),
            0xE0 => cpu.alu_imm(cycle, bus, master, M6502::cpx),
            0xE4 => cpu.alu_zp(cycle, bus, master, M6502::cpx),
            0xEC => cpu.alu_abs(cycle, bus, master, M6502::cpx),
            0xC0 => cpu.alu_imm(cycle, bus, master, M6502::cpy),
            0xC4 => cpu.alu_zp(cycle, bus, master, M6502::cpy),
            0xCC => cpu.alu_abs(cycle, bus, master, M6502::cpy),
            0x24 => cpu.alu_zp(cycle, bus, master, M6502::bit),
            0x2C => cpu.alu_abs(cycle, bus, master, M6502::bit),

            // ---- Read-modify-write ----
            0x06 => cpu.rmw_zp(cycle, bus, master, M6502::asl),
            0x0E => cpu.rmw_abs(cycle, bus, master, M6502::asl),
            0x16 => cpu.rmw_zp_x(cycle, bus, master, M6502::asl),
            0x1E => cpu.rmw_abs_idx(cycle, bus, master, cpu.x, M6502::asl),
            0x46 => cpu.rmw_zp(cycle, bus, master, M6502::lsr),
            0x4E => cpu.rmw_abs(cycle, bus, master, M6502::lsr),
            0x56 => cpu.rmw_zp_x(cycle, bus, master, M6502::lsr),
            0x5E => cpu.rmw_abs_idx(cycle, bus, master, cpu.x, M6502::lsr),
            0x26 => cpu.rmw_zp(cycle, bus, master, M6502::rol),
            0x2E => cpu.rmw_abs(cycle, bus, master, M6502::rol),
            0x36 => cpu.rmw_zp_x(cycle, bus, master, M6502::rol),
            0x3E => cpu.rmw_abs_idx(cycle, bus, master, cpu.x, M6502::rol),
            0x66 => cpu.rmw_zp(cycle, bus, master, M6502::ror),
            0x6E => cpu.rmw_abs(cycle, bus, master, M6502::ror),
            0x76 => cpu.rmw_zp_x(cycle, bus, master, M6502::ror),
            0x7E => cpu.rmw_abs_idx(cycle, bus, master, cpu.x, M6502::ror),
            0xE6 => cpu.rmw_zp(cycle, bus, master, M6502::inc),
            0xEE => cpu.rmw_abs(cycle, bus, master, M6502::inc),
            0xF6 => cpu.rmw_zp_x(cycle, bus, master, M6502::inc),
            0xFE => cpu.rmw_abs_idx(cycle, bus, master, cpu.x, M6502::inc),
            0xC6 => cpu.rmw_zp(cycle, bus, master, M6502::dec),
            0xCE => cpu.rmw_abs(cycle, bus, master, M6502::dec),
            0xD6 => cpu.rmw_zp_x(cycle, bus, master, M6502::dec),
            0xDE => cpu.rmw_abs_idx(cycle, bus, master, cpu.x, M6502::dec),

            // ---- Implied and accumulator ----
            0x0A => cpu.implied(bus, master, M6502::asl_a),
            0x4A => cpu.implied(bus, master, M6502::lsr_a),
            0x2A => cpu.implied(bus, master, M6502::rol_a),
            0x6A => cpu.implied(bus, master, M6502::ror_a),
            0xAA => cpu.implied(bus, master, M6502::tax),
            0x8A => cpu.implied(bus, master, M6502::txa),
            0xA8 => cpu.implied(bus, master, M6502::tay),
            0x98 => cpu.implied(bus, master, M6502::tya),
            0xBA => cpu.implied(bus, master, M6502::tsx),
            0x9A => cpu.implied(bus, master, M6502::txs),
            0xE8 => cpu.implied(bus, master, M6502::inx),
            0xC8 => cpu.implied(bus, master, M6502::iny),
            0xCA => cpu.implied(bus, master, M6502::dex),
            0x88 => cpu.implied(bus, master, M6502::dey),
            0x18 => cpu.implied(bus, master, M6502::clc),
            0x38 => cpu.implied(bus, master, M6502::sec),
            0x58 => cpu.implied(bus, master, M6502::cli),
            0x78 => cpu.implied(bus, master, M6502::sei),
            0xD8 => cpu.implied(bus, master, M6502::cld),
            0xF8 => cpu.implied(bus, master, M6502::sed),
            0xB8 => cpu.implied(bus, master, M6502::clv),
            0xEA => cpu.implied(bus, master, M6502::nop),

            // ---- Branches ----
            0x10 => cpu.branch(cycle, bus, master, M6502::if_plus),
            0x30 => cpu.branch(cycle, bus, master, M6502::if_minus),
            0x50 => cpu.branch(cycle, bus, master, M6502::if_overflow_clear),
            0x70 => cpu.branch(cycle, bus, master, M6502::if_overflow_set),
            0x90 => cpu.branch(cycle, bus, master, M6502::if_carry_clear),
            0xB0 => cpu.branch(cycle, bus, master, M6502::if_carry_set),
            0xD0 => cpu.branch(cycle, bus, master, M6502::if_not_equal),
            0xF0 => cpu.branch(cycle, bus, master, M6502::if_equal),

            // ---- Jumps, subroutines and stack ----
            0x4C => cpu.op_jmp_abs(cycle, bus, master),
            0x6C => cpu.op_jmp_ind(cycle, bus, master),
            0x20 => cpu.op_jsr(cycle, bus, master),
            0x60 => cpu.op_rts(cycle, bus, master),
            0x40 => cpu.op_rti(cycle, bus, master),
            0x00 => cpu.op_brk(cycle, bus, master),
            0x48 => cpu.op_pha(cycle, bus, master),
            0x08 => cpu.op_php(cycle, bus, master),
            0x68 => cpu.op_pla(cycle, bus, master),
            0x28 => cpu.op_plp(cycle, bus, master),

            // ---- Undocumented ----
            0x04 => cpu.alu_zp(cycle, bus, master, M6502::nop_read),
            0x0C => cpu.alu_abs(cycle, bus, master, M6502::nop_read),
            0x14 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0x1C => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0x34 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0x3C => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0x44 => cpu.alu_zp(cycle, bus, master, M6502::nop_read),
            0x54 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0x5C => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0x64 => cpu.alu_zp(cycle, bus, master, M6502::nop_read),
            0x74 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0x7C => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0x80 => cpu.alu_imm(cycle, bus, master, M6502::nop_read),
            0x82 => cpu.alu_imm(cycle, bus, master, M6502::nop_read),
            0x89 => cpu.alu_imm(cycle, bus, master, M6502::nop_read),
            0xC2 => cpu.alu_imm(cycle, bus, master, M6502::nop_read),
            0xD4 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0xDC => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0xE2 => cpu.alu_imm(cycle, bus, master, M6502::nop_read),
            0xF4 => cpu.alu_zp_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0xFC => cpu.alu_abs_idx(cycle, bus, master, cpu.x, M6502::nop_read),
            0x1A => cpu.implied(bus, master, M6502::nop),
            0x3A => cpu.implied(bus, master, M6502::nop),
            0x5A => cpu.implied(bus, master, M6502::nop),
            0x7A => cpu.implied(bus, master, M6502::nop),
            0xDA => cpu.implied(bus, master, M6502::nop),
            0xFA => cpu.implied(bus, master, M6502::nop),
            0xA3 => cpu.alu_ind_x(cycle, bus, master, M6502::lax),
            0xA7 => cpu.alu_zp(cycle, bus, master, M6502::lax),
            0xAF => cpu.alu_abs(cycle, bus, master, M6502::lax),
            0xB3 => cpu.alu_ind_y(cycle, bus, master, M6502::lax),
            0xB7 => cpu.alu_zp_idx(cycle, bus, master, cpu.y, M6502::lax),
            0xBF => cpu.alu_abs_idx(cycle, bus, master, cpu.y, M6502::lax),
            0x83 => cpu.store_ind_x(cycle, bus, master, M6502::sax),
            0x87 => cpu.store_zp(cycle, bus, master, M6502::sax),
            0x8F => cpu.store_abs(cycle, bus, master, M6502::sax),
            0x97 => cpu.store_zp_idx(cycle, bus, master, cpu.y, M6502::sax),
            0xC3 => cpu.rmw_ind_x(cycle, bus, master, M6502::dcp),
            0xC7 => cpu.rmw_zp(cycle, bus, master, M6502::dcp),
            0xCF => cpu.rmw_abs(cycle, bus, master, M6502::dcp),
            0xD3 => cpu.rmw_ind_y(cycle, bus, master, M6502::dcp),
            0xD7 => cpu.rmw_zp_x(cycle, bus, master, M6502::dcp),
            0xDB => cpu.rmw_abs_idx(cycle, bus, master, cpu.y, M6502::dcp),
            0xDF => cpu.rmw_abs_idx(cycle, bus, master, cpu.x, M6502::dcp),
            0xE3 => cpu.rmw_ind_x(cycle, bus, master, M6502::isb),
            0xE7 => cpu.rmw_zp(cycle, bus, master, M6502::isb),
            0xEF => cpu.rmw_abs(cycle, bus, master, M6502::isb),
            0xF3 => cpu.rmw_ind_y(cycle, bus, master, M6502::isb),
            0xF7 => cpu.rmw_zp_x(cycle, bus, master, M6502::isb),
            0xFB => cpu.rmw_abs_idx(cycle, bus, master, cpu.y, M6502::isb),
            0xFF => cpu.rmw_abs_idx(cycle, bus, master, cpu.x, M6502::isb),
            0xEB => cpu.alu_imm(cycle, bus, master, M6502::sbc),

            _ => return false,
        }
        true
    }

    fn is_defined(&self, opcode: u8) -> bool {
        // Both dispatchers cover the same opcode set; tests hold the match
        // arms to the table.
        OPCODES[opcode as usize].is_some()
    }
}

// -----------------------------------------------------------------------
// Table dispatch: decoded instruction descriptors indexed by opcode
// -----------------------------------------------------------------------

/// A decoded opcode: instruction family, addressing mode and operation.
#[derive(Clone, Copy)]
pub enum Instr {
    Read(Mode, ReadOp),
    Store(Mode, StoreOp),
    Rmw(Mode, RmwOp),
    Implied(ImpliedOp),
    Branch(Condition),
    Control(fn(&mut M6502, u8, &mut CpuBus, BusMaster)),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableDispatch;

impl TableDispatch {
    pub fn decode(opcode: u8) -> Option<Instr> {
        OPCODES[opcode as usize]
    }
}

impl CpuDispatcher for TableDispatch {
    fn name(&self) -> &'static str {
        "table"
    }

    fn execute(
        &self,
        cpu: &mut M6502,
        opcode: u8,
        cycle: u8,
        bus: &mut CpuBus,
        master: BusMaster,
    ) -> bool {
        let Some(instr) = OPCODES[opcode as usize] else {
            return false;
        };
        match instr {
            Instr::Read(mode, op) => cpu.read_mode(mode, cycle, bus, master, op),
            Instr::Store(mode, op) => cpu.store_mode(mode, cycle, bus, master, op),
            Instr::Rmw(mode, op) => cpu.rmw_mode(mode, cycle, bus, master, op),
            Instr::Implied(op) => cpu.implied(bus, master, op),
            Instr::Branch(cond) => cpu.branch(cycle, bus, master, cond),
            Instr::Control(op) => op(cpu, cycle, bus, master),
        }
        true
    }

    fn is_defined(&self, opcode: u8) -> bool {
        OPCODES[opcode as usize].is_some()
    }
}

static OPCODES: [Option<Instr>; 256] = build_table();

const fn build_table() -> [Option<Instr>; 256] {
    let mut t: [Option<Instr>; 256] = [None; 256];
    t[0x00] = Some(Instr::Control(M6502::op_brk));
    t[0x01] = Some(Instr::Read(Mode::IndX, M6502::ora));
    t[0x04] = Some(Instr::Read(Mode::Zp, M6502::nop_read));
    t[0x05] = Some(Instr::Read(Mode::Zp, M6502::ora));
    t[0x06] = Some(Instr::Rmw(Mode::Zp, M6502::asl));
    t[0x08] = Some(Instr::Control(M6502::op_php));
    t[0x09] = Some(Instr::Read(Mode::Imm, M6502::ora));
    t[0x0A] = Some(Instr::Implied(M6502::asl_a));
    t[0x0C] = Some(Instr::Read(Mode::Abs, M6502::nop_read));
    t[0x0D] = Some(Instr::Read(Mode::Abs, M6502::ora));
    t[0x0E] = Some(Instr::Rmw(Mode::Abs, M6502::asl));
    t[0x10] = Some(Instr::Branch(M6502::if_plus));
    t[0x11] = Some(Instr::Read(Mode::IndY, M6502::ora));
    t[0x14] = Some(Instr::Read(Mode::ZpX, M6502::nop_read));
    t[0x15] = Some(Instr::Read(Mode::ZpX, M6502::ora));
    t[0x16] = Some(Instr::Rmw(Mode::ZpX, M6502::asl));
    t[0x18] = Some(Instr::Implied(M6502::clc));
    t[0x19] = Some(Instr::Read(Mode::AbsY, M6502::ora));
    t[0x1A] = Some(Instr::Implied(M6502::nop));
    t[0x1C] = Some(Instr::Read(Mode::AbsX, M6502::nop_read));
    t[0x1D] = Some(Instr::Read(Mode::AbsX, M6502::ora));
    t[0x1E] = Some(Instr::Rmw(Mode::AbsX, M6502::asl));
    t[0x20] = Some(Instr::Control(M6502::op_jsr));
    t[0x21] = Some(Instr::Read(Mode::IndX, M6502::and));
    t[0x24] = Some(Instr::Read(Mode::Zp, M6502::bit));
    t[0x25] = Some(Instr::Read(Mode::Zp, M6502::and));
    t[0x26] = Some(Instr::Rmw(Mode::Zp, M6502::rol));
    t[0x28] = Some(Instr::Control(M6502::op_plp));
    t[0x29] = Some(Instr::Read(Mode::Imm, M6502::and));
    t[0x2A] = Some(Instr::Implied(M6502::rol_a));
    t[0x2C] = Some(Instr::Read(Mode::Abs, M6502::bit));
    t[0x2D] = Some(Instr::Read(Mode::Abs, M6502::and));
    t[0x2E] = Some(Instr::Rmw(Mode::Abs, M6502::rol));
    t[0x30] = Some(Instr::Branch(M6502::if_minus));
    t[0x31] = Some(Instr::Read(Mode::IndY, M6502::and));
    t[0x34] = Some(Instr::Read(Mode::ZpX, M6502::nop_read));
    t[0x35] = Some(Instr::Read(Mode::ZpX, M6502::and));
    t[0x36] = Some(Instr::Rmw(Mode::ZpX, M6502::rol));
    t[0x38] = Some(Instr::Implied(M6502::sec));
    t[0x39] = Some(Instr::Read(Mode::AbsY, M6502::and));
    t[0x3A] = Some(Instr::Implied(M6502::nop));
    t[0x3C] = Some(Instr::Read(Mode::AbsX, M6502::nop_read));
    t[0x3D] = Some(Instr::Read(Mode::AbsX, M6502::and));
    t[0x3E] = Some(Instr::Rmw(Mode::AbsX, M6502::rol));
    t[0x40] = Some(Instr::Control(M6502::op_rti));
    t[0x41] = Some(Instr::Read(Mode::IndX, M6502::eor));
    t[0x44] = Some(Instr::Read(Mode::Zp, M6502::nop_read));
    t[0x45] = Some(Instr::Read(Mode::Zp, M6502::eor));
    t[0x46] = Some(Instr::Rmw(Mode::Zp, M6502::lsr));
    t[0x48] = Some(Instr::Control(M6502::op_pha));
    t[0x49] = Some(Instr::Read(Mode::Imm, M6502::eor));
    t[0x4A] = Some(Instr::Implied(M6502::lsr_a));
    t[0x4C] = Some(Instr::Control(M6502::op_jmp_abs));
    t[0x4D] = Some(Instr::Read(Mode::Abs, M6502::eor));
    t[0x4E] = Some(Instr::Rmw(Mode::Abs, M6502::lsr));
    t[0x50] = Some(Instr::Branch(M6502::if_overflow_clear));
    t[0x51] = Some(Instr::Read(Mode::IndY, M6502::eor));
    t[0x54] = Some(Instr::Read(Mode::ZpX, M6502::nop_read));
    t[0x55] = Some(Instr::Read(Mode::ZpX, M6502::eor));
    t[0x56] = Some(Instr::Rmw(Mode::ZpX, M6502::lsr));
    t[0x58] = Some(Instr::Implied(M6502::cli));
    t[0x59] = Some(Instr::Read(Mode::AbsY, M6502::eor));
    t[0x5A] = Some(Instr::Implied(M6502::nop));
    t[0x5C] = Some(Instr::Read(Mode::AbsX, M6502::nop_read));
    t[0x5D] = Some(Instr::Read(Mode::AbsX, M6502::eor));
    t[0x5E] = Some(Instr::Rmw(Mode::AbsX, M6502::lsr));
    t[0x60] = Some(Instr::Control(M6502::op_rts));
    t[0x61] = Some(Instr::Read(Mode::IndX, M6502::adc));
    t[0x64] = Some(Instr::Read(Mode::Zp, M6502::nop_read));
    t[0x65] = Some(Instr::Read(Mode::Zp, M6502::adc));
    t[0x66] = Some(Instr::Rmw(Mode::Zp, M6502::ror));
    t[0x68] = Some(Instr::Control(M6502::op_pla));
    t[0x69] = Some(Instr::Read(Mode::Imm, M6502::adc));
    t[0x6A] = Some(Instr::Implied(M6502::ror_a));
    t[0x6C] = Some(Instr::Control(M6502::op_jmp_ind));
    t[0x6D] = Some(Instr::Read(Mode::Abs, M6502::adc));
    t[0x6E] = Some(Instr::Rmw(Mode::Abs, M6502::ror));
    t[0x70] = Some(Instr::Branch(M6502::if_overflow_set));
    t[0x71] = Some(Instr::Read(Mode::IndY, M6502::adc));
    t[0x74] = Some(Instr::Read(Mode::ZpX, M6502::nop_read));
    t[0x75] = Some(Instr::Read(Mode::ZpX, M6502::adc));
    t[0x76] = Some(Instr::Rmw(Mode::ZpX, M6502::ror));
    t[0x78] = Some(Instr::Implied(M6502::sei));
    t[0x79] = Some(Instr::Read(Mode::AbsY, M6502::adc));
    t[0x7A] = Some(Instr::Implied(M6502::nop));
    t[0x7C] = Some(Instr::Read(Mode::AbsX, M6502::nop_read));
    t[0x7D] = Some(Instr::Read(Mode::AbsX, M6502::adc));
    t[0x7E] = Some(Instr::Rmw(Mode::AbsX, M6502::ror));
    t[0x80] = Some(Instr::Read(Mode::Imm, M6502::nop_read));
    t[0x81] = Some(Instr::Store(Mode::IndX, M6502::sta));
    t[0x82] = Some(Instr::Read(Mode::Imm, M6502::nop_read));
    t[0x83] = Some(Instr::Store(Mode::IndX, M6502::sax));
    t[0x84] = Some(Instr::Store(Mode::Zp, M6502::sty));
    t[0x85] = Some(Instr::Store(Mode::Zp, M6502::sta));
    t[0x86] = Some(Instr::Store(Mode::Zp, M6502::stx));
    t[0x87] = Some(Instr::Store(Mode::Zp, M6502::sax));
    t[0x88] = Some(Instr::Implied(M6502::dey));
    t[0x89] = Some(Instr::Read(Mode::Imm, M6502::nop_read));
    t[0x8A] = Some(Instr::Implied(M6502::txa));
    t[0x8C] = Some(Instr::Store(Mode::Abs, M6502::sty));
    t[0x8D] = Some(Instr::Store(Mode::Abs, M6502::sta));
    t[0x8E] = Some(Instr::Store(Mode::Abs, M6502::stx));
    t[0x8F] = Some(Instr::Store(Mode::Abs, M6502::sax));
    t[0x90] = Some(Instr::Branch(M6502::if_carry_clear));
    t[0x91] = Some(Instr::Store(Mode::IndY, M6502::sta));
    t[0x94] = Some(Instr::Store(Mode::ZpX, M6502::sty));
    t[0x95] = Some(Instr::Store(Mode::ZpX, M6502::sta));
    t[0x96] = Some(Instr::Store(Mode::ZpY, M6502::stx));
    t[0x97] = Some(Instr::Store(Mode::ZpY, M6502::sax));
    t[0x98] = Some(Instr::Implied(M6502::tya));
    t[0x99] = Some(Instr::Store(Mode::AbsY, M6502::sta));
    t[0x9A] = Some(Instr::Implied(M6502::txs));
    t[0x9D] = Some(Instr::Store(Mode::AbsX, M6502::sta));
    t[0xA0] = Some(Instr::Read(Mode::Imm, M6502::ldy));
    t[0xA1] = Some(Instr::Read(Mode::IndX, M6502::lda));
    t[0xA2] = Some(Instr::Read(Mode::Imm, M6502::ldx));
    t[0xA3] = Some(Instr::Read(Mode::IndX, M6502::lax));
    t[0xA4] = Some(Instr::Read(Mode::Zp, M6502::ldy));
    t[0xA5] = Some(Instr::Read(Mode::Zp, M6502::lda));
    t[0xA6] = Some(Instr::Read(Mode::Zp, M6502::ldx));
    t[0xA7] = Some(Instr::Read(Mode::Zp, M6502::lax));
    t[0xA8] = Some(Instr::Implied(M6502::tay));
    t[0xA9] = Some(Instr::Read(Mode::Imm, M6502::lda));
    t[0xAA] = Some(Instr::Implied(M6502::tax));
    t[0xAC] = Some(Instr::Read(Mode::Abs, M6502::ldy));
    t[0xAD] = Some(Instr::Read(Mode::Abs, M6502::lda));
    t[0xAE] = Some(Instr::Read(Mode::Abs, M6502::ldx));
    t[0xAF] = Some(Instr::Read(Mode::Abs, M6502::lax));
    t[0xB0] = Some(Instr::Branch(M6502::if_carry_set));
    t[0xB1] = Some(Instr::Read(Mode::IndY, M6502::lda));
    t[0xB3] = Some(Instr::Read(Mode::IndY, M6502::lax));
    t[0xB4] = Some(Instr::Read(Mode::ZpX, M6502::ldy));
    t[0xB5] = Some(Instr::Read(Mode::ZpX, M6502::lda));
    t[0xB6] = Some(Instr::Read(Mode::ZpY, M6502::ldx));
    t[0xB7] = Some(Instr::Read(Mode::ZpY, M6502::lax));
    t[0xB8] = Some(Instr::Implied(M6502::clv));
    t[0xB9] = Some(Instr::Read(Mode::AbsY, M6502::lda));
    t[0xBA] = Some(Instr::Implied(M6502::tsx));
    t[0xBC] = Some(Instr::Read(Mode::AbsX, M6502::ldy));
    t[0xBD] = Some(Instr::Read(Mode::AbsX, M6502::lda));
    t[0xBE] = Some(Instr::Read(Mode::AbsY, M6502::ldx));
    t[0xBF] = Some(Instr::Read(Mode::AbsY, M6502::lax));
    t[0xC0] = Some(Instr::Read(Mode::Imm, M6502::cpy));
    t[0xC1] = Some(Instr::Read(Mode::IndX, M6502::cmp));
    t[0xC2] = Some(Instr::Read(Mode::Imm, M6502::nop_read));
    t[0xC3] = Some(Instr::Rmw(Mode::IndX, M6502::dcp));
    t[0xC4] = Some(Instr::Read(Mode::Zp, M6502::cpy));
    t[0xC5] = Some(Instr::Read(Mode::Zp, M6502::cmp));
    t[0xC6] = Some(Instr::Rmw(Mode::Zp, M6502::dec));
    t[0xC7] = Some(Instr::Rmw(Mode::Zp, M6502::dcp));
    t[0xC8] = Some(Instr::Implied(M6502::iny));
    t[0xC9] = Some(Instr::Read(Mode::Imm, M6502::cmp));
    t[0xCA] = Some(Instr::Implied(M6502::dex));
    t[0xCC] = Some(Instr::Read(Mode::Abs, M6502::cpy));
    t[0xCD] = Some(Instr::Read(Mode::Abs, M6502::cmp));
    t[0xCE] = Some(Instr::Rmw(Mode::Abs, M6502::dec));
    t[0xCF] = Some(Instr::Rmw(Mode::Abs, M6502::dcp));
    t[0xD0] = Some(Instr::Branch(M6502::if_not_equal));
    t[0xD1] = Some(Instr::Read(Mode::IndY, M6502::cmp));
    t[0xD3] = Some(Instr::Rmw(Mode::IndY, M6502::dcp));
    t[0xD4] = Some(Instr::Read(Mode::ZpX, M6502::nop_read));
    t[0xD5] = Some(Instr::Read(Mode::ZpX, M6502::cmp));
    t[0xD6] = Some(Instr::Rmw(Mode::ZpX, M6502::dec));
    t[0xD7] = Some(Instr::Rmw(Mode::ZpX, M6502::dcp));
    t[0xD8] = Some(Instr::Implied(M6502::cld));
    t[0xD9] = Some(Instr::Read(Mode::AbsY, M6502::cmp));
    t[0xDA] = Some(Instr::Implied(M6502::nop));
    t[0xDB] = Some(Instr::Rmw(Mode::AbsY, M6502::dcp));
    t[0xDC] = Some(Instr::Read(Mode::AbsX, M6502::nop_read));
    t[0xDD] = Some(Instr::Read(Mode::AbsX, M6502::cmp));
    t[0xDE] = Some(Instr::Rmw(Mode::AbsX, M6502::dec));
    t[0xDF] = Some(Instr::Rmw(Mode::AbsX, M6502::dcp));
    t[0xE0] = Some(Instr::Read(Mode::Imm, M6502::cpx));
    t[0xE1] = Some(Instr::Read(Mode::IndX, M6502::sbc));
    t[0xE2] = Some(Instr::Read(Mode::Imm, M6502::nop_read));
    t[0xE3] = Some(Instr::Rmw(Mode::IndX, M6502::isb));
    t[0xE4] = Some(Instr::Read(Mode::Zp, M6502::cpx));
    t[0xE5] = Some(Instr::Read(Mode::Zp, M6502::sbc));
    t[0xE6] = Some(Instr::Rmw(Mode::Zp, M6502::inc));
    t[0xE7] = Some(Instr::Rmw(Mode::Zp, M6502::isb));
    t[0xE8] = Some(Instr::Implied(M6502::inx));
    t[0xE9] = Some(Instr::Read(Mode::Imm, M6502::sbc));
    t[0xEA] = Some(Instr::Implied(M6502::nop));
    t[0xEB] = Some(Instr::Read(Mode::Imm, M6502::sbc));
    t[0xEC] = Some(Instr::Read(Mode::Abs, M6502::cpx));
    t[0xED] = Some(Instr::Read(Mode::Abs, M6502::sbc));
    t[0xEE] = Some(Instr::Rmw(Mode::Abs, M6502::inc));
    t[0xEF] = Some(Instr::Rmw(Mode::Abs, M6502::isb));
    t[0xF0] = Some(Instr::Branch(M6502::if_equal));
    t[0xF1] = Some(Instr::Read(Mode::IndY, M6502::sbc));
    t[0xF3] = Some(Instr::Rmw(Mode::IndY, M6502::isb));
    t[0xF4] = Some(Instr::Read(Mode::ZpX, M6502::nop_read));
    t[0xF5] = Some(Instr::Read(Mode::ZpX, M6502::sbc));
    t[0xF6] = Some(Instr::Rmw(Mode::ZpX, M6502::inc));
    t[0xF7] = Some(Instr::Rmw(Mode::ZpX, M6502::isb));
    t[0xF8] = Some(Instr::Implied(M6502::sed));
    t[0xF9] = Some(Instr::Read(Mode::AbsY, M6502::sbc));
    t[0xFA] = Some(Instr::Implied(M6502::nop));
    t[0xFB] = Some(Instr::Rmw(Mode::AbsY, M6502::isb));
    t[0xFC] = Some(Instr::Read(Mode::AbsX, M6502::nop_read));
    t[0xFD] = Some(Instr::Read(Mode::AbsX, M6502::sbc));
    t[0xFE] = Some(Instr::Rmw(Mode::AbsX, M6502::inc));
    t[0xFF] = Some(Instr::Rmw(Mode::AbsX, M6502::isb));
    t
}

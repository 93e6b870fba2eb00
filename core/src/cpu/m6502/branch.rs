use super::{CpuBus, ExecState, M6502, StatusFlag};
use crate::core::BusMaster;

/// Branch condition evaluated on the operand cycle.
pub type Condition = fn(&M6502) -> bool;

impl M6502 {
    // ---- Branch helper ----

    /// Conditional branch. Timing:
    /// - Not taken: 2 cycles
    /// - Taken, same page: 3 cycles (dummy read of the next opcode)
    /// - Taken, page cross: 4 cycles (extra dummy read at the unfixed address)
    pub(crate) fn branch(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, cond: Condition) {
        match cycle {
            0 => {
                let offset = bus.read(master, self.pc);
                self.pc = self.pc.wrapping_add(1);
                if cond(self) {
                    self.temp_addr = self.pc.wrapping_add(offset as i8 as u16);
                    self.state = ExecState::Execute(self.opcode, 1);
                } else {
                    self.state = ExecState::Fetch;
                }
            }
            1 => {
                let _ = bus.read(master, self.pc);
                if (self.pc ^ self.temp_addr) & 0xFF00 != 0 {
                    self.state = ExecState::Execute(self.opcode, 2);
                } else {
                    self.pc = self.temp_addr;
                    self.state = ExecState::Fetch;
                }
            }
            _ => {
                let _ = bus.read(master, (self.pc & 0xFF00) | (self.temp_addr & 0x00FF));
                self.pc = self.temp_addr;
                self.state = ExecState::Fetch;
            }
        }
    }

    // ---- Branch conditions ----

    pub(crate) fn if_plus(&self) -> bool {
        !self.flag(StatusFlag::N)
    }

    pub(crate) fn if_minus(&self) -> bool {
        self.flag(StatusFlag::N)
    }

    pub(crate) fn if_overflow_clear(&self) -> bool {
        !self.flag(StatusFlag::V)
    }

    pub(crate) fn if_overflow_set(&self) -> bool {
        self.flag(StatusFlag::V)
    }

    pub(crate) fn if_carry_clear(&self) -> bool {
        !self.flag(StatusFlag::C)
    }

    pub(crate) fn if_carry_set(&self) -> bool {
        self.flag(StatusFlag::C)
    }

    pub(crate) fn if_not_equal(&self) -> bool {
        !self.flag(StatusFlag::Z)
    }

    pub(crate) fn if_equal(&self) -> bool {
        self.flag(StatusFlag::Z)
    }

    // ---- Jumps and subroutines ----

    /// JMP Absolute (0x4C) - 3 cycles
    pub(crate) fn op_jmp_abs(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) {
        match cycle {
            0 => {
                self.temp_addr = bus.read(master, self.pc) as u16;
                self.pc = self.pc.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            _ => {
                self.temp_addr |= (bus.read(master, self.pc) as u16) << 8;
                self.pc = self.temp_addr;
                self.state = ExecState::Fetch;
            }
        }
    }

    /// JMP Indirect (0x6C) - 5 cycles
    /// NMOS bug: if the pointer is at $xxFF, the high byte comes from $xx00.
    pub(crate) fn op_jmp_ind(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) {
        match cycle {
            0 => {
                self.temp_addr = bus.read(master, self.pc) as u16;
                self.pc = self.pc.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            1 => {
                self.temp_addr |= (bus.read(master, self.pc) as u16) << 8;
                self.pc = self.pc.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 2);
            }
            2 => {
                self.temp_data = bus.read(master, self.temp_addr);
                self.state = ExecState::Execute(self.opcode, 3);
            }
            _ => {
                let hi_addr = (self.temp_addr & 0xFF00) | (self.temp_addr.wrapping_add(1) & 0x00FF);
                let hi = bus.read(master, hi_addr) as u16;
                self.pc = (hi << 8) | self.temp_data as u16;
                self.state = ExecState::Fetch;
            }
        }
    }

    /// JSR (0x20) - 6 cycles
    /// Pushes the address of the last byte of the JSR; RTS adds 1.
    pub(crate) fn op_jsr(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) {
        match cycle {
            0 => {
                self.temp_data = bus.read(master, self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            1 => {
                // Internal operation: stack pointer on the bus
                let _ = bus.read(master, 0x0100 | self.sp as u16);
                self.state = ExecState::Execute(self.opcode, 2);
            }
            2 => {
                bus.write(master, 0x0100 | self.sp as u16, (self.pc >> 8) as u8);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Execute(self.opcode, 3);
            }
            3 => {
                bus.write(master, 0x0100 | self.sp as u16, self.pc as u8);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Execute(self.opcode, 4);
            }
            _ => {
                let hi = bus.read(master, self.pc) as u16;
                self.pc = (hi << 8) | self.temp_data as u16;
                self.state = ExecState::Fetch;
            }
        }
    }

    /// RTS (0x60) - 6 cycles
    pub(crate) fn op_rts(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) {
        match cycle {
            0 => {
                let _ = bus.read(master, self.pc);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            1 => {
                let _ = bus.read(master, 0x0100 | self.sp as u16);
                self.sp = self.sp.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 2);
            }
            2 => {
                self.temp_addr = bus.read(master, 0x0100 | self.sp as u16) as u16;
                self.sp = self.sp.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 3);
            }
            3 => {
                let hi = bus.read(master, 0x0100 | self.sp as u16) as u16;
                self.pc = (hi << 8) | self.temp_addr;
                self.state = ExecState::Execute(self.opcode, 4);
            }
            _ => {
                let _ = bus.read(master, self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.state = ExecState::Fetch;
            }
        }
    }

    /// RTI (0x40) - 6 cycles. B is discarded and U forced on the pulled P.
    pub(crate) fn op_rti(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) {
        match cycle {
            0 => {
                let _ = bus.read(master, self.pc);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            1 => {
                let _ = bus.read(master, 0x0100 | self.sp as u16);
                self.sp = self.sp.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 2);
            }
            2 => {
                let p = bus.read(master, 0x0100 | self.sp as u16);
                self.p = (p & !(StatusFlag::B as u8)) | StatusFlag::U as u8;
                self.sp = self.sp.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 3);
            }
            3 => {
                self.temp_addr = bus.read(master, 0x0100 | self.sp as u16) as u16;
                self.sp = self.sp.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 4);
            }
            _ => {
                let hi = bus.read(master, 0x0100 | self.sp as u16) as u16;
                self.pc = (hi << 8) | self.temp_addr;
                self.state = ExecState::Fetch;
            }
        }
    }
}

use super::{CpuBus, ExecState, M6502, StatusFlag};
use crate::core::BusMaster;

impl M6502 {
    #[inline]
    fn stack_addr(&self) -> u16 {
        0x0100 | self.sp as u16
    }

    /// PHA (0x48) - 3 cycles
    pub(crate) fn op_pha(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) {
        self.push_register(cycle, bus, master, self.a);
    }

    /// PHP (0x08) - 3 cycles. Pushes P with B and U set.
    pub(crate) fn op_php(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) {
        let value = self.p | StatusFlag::B as u8 | StatusFlag::U as u8;
        self.push_register(cycle, bus, master, value);
    }

    fn push_register(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, value: u8) {
        match cycle {
            0 => {
                let _ = bus.read(master, self.pc);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            _ => {
                bus.write(master, self.stack_addr(), value);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Fetch;
            }
        }
    }

    /// PLA (0x68) - 4 cycles. N, Z affected.
    pub(crate) fn op_pla(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) {
        if let Some(value) = self.pull_register(cycle, bus, master) {
            self.a = value;
            self.set_nz(value);
        }
    }

    /// PLP (0x28) - 4 cycles. B ignored, U forced on.
    pub(crate) fn op_plp(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) {
        if let Some(value) = self.pull_register(cycle, bus, master) {
            self.p = (value & !(StatusFlag::B as u8)) | StatusFlag::U as u8;
        }
    }

    /// Returns the pulled byte on the final cycle.
    fn pull_register(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) -> Option<u8> {
        match cycle {
            0 => {
                let _ = bus.read(master, self.pc);
                self.state = ExecState::Execute(self.opcode, 1);
                None
            }
            1 => {
                let _ = bus.read(master, self.stack_addr());
                self.sp = self.sp.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 2);
                None
            }
            _ => {
                let value = bus.read(master, self.stack_addr());
                self.state = ExecState::Fetch;
                Some(value)
            }
        }
    }

    /// BRK (0x00) - 7 cycles. Pushes PC+2 and P|B|U, sets I, vectors through $FFFE.
    pub(crate) fn op_brk(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) {
        match cycle {
            0 => {
                // Padding byte
                let _ = bus.read(master, self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 1);
            }
            1 => {
                bus.write(master, self.stack_addr(), (self.pc >> 8) as u8);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Execute(self.opcode, 2);
            }
            2 => {
                bus.write(master, self.stack_addr(), self.pc as u8);
                self.sp = self.sp.wrapping_sub(1);
                self.state = ExecState::Execute(self.opcode, 3);
            }
            3 => {
                let p = self.p | StatusFlag::B as u8 | StatusFlag::U as u8;
                bus.write(master, self.stack_addr(), p);
                self.sp = self.sp.wrapping_sub(1);
                self.set_flag(StatusFlag::I, true);
                self.state = ExecState::Execute(self.opcode, 4);
            }
            4 => {
                self.temp_addr = bus.read(master, 0xFFFE) as u16;
                self.state = ExecState::Execute(self.opcode, 5);
            }
            _ => {
                let hi = bus.read(master, 0xFFFF) as u16;
                self.pc = (hi << 8) | self.temp_addr;
                self.state = ExecState::Fetch;
            }
        }
    }
}

use super::{CpuBus, ExecState, M6502, StatusFlag};
use crate::core::BusMaster;

/// Operation applied to a byte read from memory.
pub type ReadOp = fn(&mut M6502, u8);
/// Produces the byte a store instruction writes.
pub type StoreOp = fn(&M6502) -> u8;
/// Read-modify-write operation: old value in, new value out.
pub type RmwOp = fn(&mut M6502, u8) -> u8;

/// Memory addressing modes shared by the read, store and RMW families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Imm,
    Zp,
    ZpX,
    ZpY,
    Abs,
    AbsX,
    AbsY,
    IndX,
    IndY,
}

impl M6502 {
    // ---- Flag helpers ----

    /// Set N, Z flags from result (for loads, transfers, logical ops).
    #[inline]
    pub(crate) fn set_nz(&mut self, result: u8) {
        self.set_flag(StatusFlag::N, result & 0x80 != 0);
        self.set_flag(StatusFlag::Z, result == 0);
    }

    /// Set N, Z, C flags for shift/rotate operations.
    #[inline]
    pub(crate) fn set_flags_shift(&mut self, result: u8, carry: bool) {
        self.set_nz(result);
        self.set_flag(StatusFlag::C, carry);
    }

    // ---- ALU operations ----

    /// ADC. Sets N, Z, C, V. Handles NMOS decimal mode:
    /// N and V come from the intermediate sum, Z from the binary sum.
    pub(crate) fn adc(&mut self, operand: u8) {
        let a = self.a;
        let c = self.flag(StatusFlag::C) as u16;

        if self.flag(StatusFlag::D) {
            let mut al = (a & 0x0F) as u16 + (operand & 0x0F) as u16 + c;
            if al >= 0x0A {
                al = ((al + 0x06) & 0x0F) + 0x10;
            }
            let mut sum = (a as u16 & 0xF0) + (operand as u16 & 0xF0) + al;

            self.set_flag(StatusFlag::N, sum & 0x80 != 0);
            self.set_flag(
                StatusFlag::V,
                (!(a as u16 ^ operand as u16) & (a as u16 ^ sum)) & 0x80 != 0,
            );
            if sum >= 0xA0 {
                sum += 0x60;
            }
            self.set_flag(StatusFlag::C, sum >= 0x100);

            let binary = a as u16 + operand as u16 + c;
            self.set_flag(StatusFlag::Z, binary & 0xFF == 0);
            self.a = sum as u8;
        } else {
            let sum = a as u16 + operand as u16 + c;
            let result = sum as u8;
            self.set_flag(StatusFlag::C, sum > 0xFF);
            self.set_flag(StatusFlag::V, (!(a ^ operand) & (a ^ result)) & 0x80 != 0);
            self.a = result;
            self.set_nz(result);
        }
    }

    /// SBC. Flags always come from the binary result on NMOS parts;
    /// only A receives the decimal correction.
    pub(crate) fn sbc(&mut self, operand: u8) {
        let a = self.a;
        let c = self.flag(StatusFlag::C) as u8;

        let diff = a as u16 + (operand ^ 0xFF) as u16 + c as u16;
        let result = diff as u8;
        self.set_flag(StatusFlag::C, diff > 0xFF);
        self.set_flag(StatusFlag::V, ((a ^ operand) & (a ^ result)) & 0x80 != 0);
        self.set_nz(result);

        if self.flag(StatusFlag::D) {
            let borrow = 1 - c as i16;
            let mut lo = (a & 0x0F) as i16 - (operand & 0x0F) as i16 - borrow;
            let lo_borrow = lo < 0;
            if lo_borrow {
                lo -= 6;
            }
            let mut hi = (a >> 4) as i16 - (operand >> 4) as i16 - lo_borrow as i16;
            if hi < 0 {
                hi -= 6;
            }
            self.a = ((hi as u8 & 0x0F) << 4) | (lo as u8 & 0x0F);
        } else {
            self.a = result;
        }
    }

    /// CMP/CPX/CPY. Sets N, Z, C.
    #[inline]
    fn compare(&mut self, register: u8, operand: u8) {
        self.set_flag(StatusFlag::C, register >= operand);
        self.set_nz(register.wrapping_sub(operand));
    }

    pub(crate) fn lda(&mut self, operand: u8) {
        self.a = operand;
        self.set_nz(operand);
    }

    pub(crate) fn ldx(&mut self, operand: u8) {
        self.x = operand;
        self.set_nz(operand);
    }

    pub(crate) fn ldy(&mut self, operand: u8) {
        self.y = operand;
        self.set_nz(operand);
    }

    pub(crate) fn and(&mut self, operand: u8) {
        self.a &= operand;
        self.set_nz(self.a);
    }

    pub(crate) fn ora(&mut self, operand: u8) {
        self.a |= operand;
        self.set_nz(self.a);
    }

    pub(crate) fn eor(&mut self, operand: u8) {
        self.a ^= operand;
        self.set_nz(self.a);
    }

    pub(crate) fn cmp(&mut self, operand: u8) {
        self.compare(self.a, operand);
    }

    pub(crate) fn cpx(&mut self, operand: u8) {
        self.compare(self.x, operand);
    }

    pub(crate) fn cpy(&mut self, operand: u8) {
        self.compare(self.y, operand);
    }

    /// BIT. N = M7, V = M6, Z = (A & M) == 0. A is not modified.
    pub(crate) fn bit(&mut self, operand: u8) {
        self.set_flag(StatusFlag::N, operand & 0x80 != 0);
        self.set_flag(StatusFlag::V, operand & 0x40 != 0);
        self.set_flag(StatusFlag::Z, self.a & operand == 0);
    }

    /// LAX (undocumented). A = X = M.
    pub(crate) fn lax(&mut self, operand: u8) {
        self.a = operand;
        self.x = operand;
        self.set_nz(operand);
    }

    /// Undocumented NOPs still perform their operand read.
    pub(crate) fn nop_read(&mut self, _operand: u8) {}

    pub(crate) fn sta(&self) -> u8 {
        self.a
    }

    pub(crate) fn stx(&self) -> u8 {
        self.x
    }

    pub(crate) fn sty(&self) -> u8 {
        self.y
    }

    /// SAX (undocumented). Stores A & X, no flags.
    pub(crate) fn sax(&self) -> u8 {
        self.a & self.x
    }

    pub(crate) fn asl(&mut self, value: u8) -> u8 {
        let result = value << 1;
        self.set_flags_shift(result, value & 0x80 != 0);
        result
    }

    pub(crate) fn lsr(&mut self, value: u8) -> u8 {
        let result = value >> 1;
        self.set_flags_shift(result, value & 0x01 != 0);
        result
    }

    pub(crate) fn rol(&mut self, value: u8) -> u8 {
        let result = (value << 1) | self.flag(StatusFlag::C) as u8;
        self.set_flags_shift(result, value & 0x80 != 0);
        result
    }

    pub(crate) fn ror(&mut self, value: u8) -> u8 {
        let result = (value >> 1) | ((self.flag(StatusFlag::C) as u8) << 7);
        self.set_flags_shift(result, value & 0x01 != 0);
        result
    }

    pub(crate) fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.set_nz(result);
        result
    }

    pub(crate) fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.set_nz(result);
        result
    }

    /// DCP (undocumented). DEC memory, then CMP with A.
    pub(crate) fn dcp(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.compare(self.a, result);
        result
    }

    /// ISB (undocumented). INC memory, then SBC.
    pub(crate) fn isb(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.sbc(result);
        result
    }

    // ---- Operand fetch helpers ----

    #[inline]
    fn fetch_operand(&mut self, bus: &mut CpuBus, master: BusMaster) -> u8 {
        let value = bus.read(master, self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    #[inline]
    fn next(&mut self, cycle: u8) {
        self.state = ExecState::Execute(self.opcode, cycle);
    }

    /// Address with the index added to the low byte only, as the 6502
    /// presents it on the bus before the carry into the high byte is fixed.
    #[inline]
    fn unfixed(&self) -> u16 {
        ((self.temp_data as u16) << 8) | (self.temp_addr & 0x00FF)
    }

    /// Latch base + index into temp_addr, keeping the base page in temp_data.
    /// Returns true if the index carried into the high byte.
    #[inline]
    fn index_base(&mut self, base: u16, index: u8) -> bool {
        self.temp_data = (base >> 8) as u8;
        self.temp_addr = base.wrapping_add(index as u16);
        (base ^ self.temp_addr) & 0xFF00 != 0
    }

    // ---- Read family: load, ALU, compare, BIT ----

    /// Immediate - 2 cycles.
    pub(crate) fn alu_imm(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: ReadOp) {
        if cycle == 0 {
            let value = self.fetch_operand(bus, master);
            op(self, value);
        }
        self.state = ExecState::Fetch;
    }

    /// Zero Page - 3 cycles.
    pub(crate) fn alu_zp(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: ReadOp) {
        match cycle {
            0 => {
                self.temp_addr = self.fetch_operand(bus, master) as u16;
                self.next(1);
            }
            _ => {
                let value = bus.read(master, self.temp_addr);
                op(self, value);
                self.state = ExecState::Fetch;
            }
        }
    }

    /// Zero Page,X / Zero Page,Y - 4 cycles. The sum wraps within page zero.
    pub(crate) fn alu_zp_idx(
        &mut self,
        cycle: u8,
        bus: &mut CpuBus,
        master: BusMaster,
        index: u8,
        op: ReadOp,
    ) {
        match cycle {
            0 => {
                self.temp_addr = self.fetch_operand(bus, master) as u16;
                self.next(1);
            }
            1 => {
                let _ = bus.read(master, self.temp_addr);
                self.temp_addr = (self.temp_addr + index as u16) & 0x00FF;
                self.next(2);
            }
            _ => {
                let value = bus.read(master, self.temp_addr);
                op(self, value);
                self.state = ExecState::Fetch;
            }
        }
    }

    /// Absolute - 4 cycles.
    pub(crate) fn alu_abs(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: ReadOp) {
        match cycle {
            0 => {
                self.temp_addr = self.fetch_operand(bus, master) as u16;
                self.next(1);
            }
            1 => {
                let hi = self.fetch_operand(bus, master) as u16;
                self.temp_addr |= hi << 8;
                self.next(2);
            }
            _ => {
                let value = bus.read(master, self.temp_addr);
                op(self, value);
                self.state = ExecState::Fetch;
            }
        }
    }

    /// Absolute,X / Absolute,Y - 4 cycles, 5 when the index crosses a page.
    /// The crossing cycle reads the unfixed address first.
    pub(crate) fn alu_abs_idx(
        &mut self,
        cycle: u8,
        bus: &mut CpuBus,
        master: BusMaster,
        index: u8,
        op: ReadOp,
    ) {
        match cycle {
            0 => {
                self.temp_addr = self.fetch_operand(bus, master) as u16;
                self.next(1);
            }
            1 => {
                let hi = self.fetch_operand(bus, master) as u16;
                let base = self.temp_addr | hi << 8;
                if self.index_base(base, index) {
                    self.next(2);
                } else {
                    self.next(3);
                }
            }
            2 => {
                let _ = bus.read(master, self.unfixed());
                self.next(3);
            }
            _ => {
                let value = bus.read(master, self.temp_addr);
                op(self, value);
                self.state = ExecState::Fetch;
            }
        }
    }

    /// (Indirect,X) - 6 cycles. Pointer arithmetic wraps within page zero.
    pub(crate) fn alu_ind_x(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: ReadOp) {
        if cycle < 4 {
            self.ind_x_address(cycle, bus, master);
        } else {
            let value = bus.read(master, self.temp_addr);
            op(self, value);
            self.state = ExecState::Fetch;
        }
    }

    /// (Indirect),Y - 5 cycles, 6 when the index crosses a page.
    pub(crate) fn alu_ind_y(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: ReadOp) {
        match cycle {
            0..=2 => {
                if self.ind_y_address(cycle, bus, master) {
                    self.next(3);
                } else if cycle == 2 {
                    self.next(4);
                }
            }
            3 => {
                let _ = bus.read(master, self.unfixed());
                self.next(4);
            }
            _ => {
                let value = bus.read(master, self.temp_addr);
                op(self, value);
                self.state = ExecState::Fetch;
            }
        }
    }

    /// Cycles 0-3 of (Indirect,X): operand, dummy read, pointer low, pointer high.
    fn ind_x_address(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) {
        match cycle {
            0 => {
                self.temp_data = self.fetch_operand(bus, master);
                self.next(1);
            }
            1 => {
                let _ = bus.read(master, self.temp_data as u16);
                self.temp_data = self.temp_data.wrapping_add(self.x);
                self.next(2);
            }
            2 => {
                self.temp_addr = bus.read(master, self.temp_data as u16) as u16;
                self.next(3);
            }
            _ => {
                let hi = bus.read(master, self.temp_data.wrapping_add(1) as u16) as u16;
                self.temp_addr |= hi << 8;
                self.next(4);
            }
        }
    }

    /// Cycles 0-2 of (Indirect),Y: operand, pointer low, pointer high + Y.
    /// Returns true on the final cycle when Y carried into the high byte.
    fn ind_y_address(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster) -> bool {
        match cycle {
            0 => {
                self.temp_data = self.fetch_operand(bus, master);
                self.next(1);
                false
            }
            1 => {
                self.temp_addr = bus.read(master, self.temp_data as u16) as u16;
                self.next(2);
                false
            }
            _ => {
                let hi = bus.read(master, self.temp_data.wrapping_add(1) as u16) as u16;
                let base = self.temp_addr | hi << 8;
                self.index_base(base, self.y)
            }
        }
    }

    /// Mode-indexed entry for table dispatch.
    pub(crate) fn read_mode(
        &mut self,
        mode: Mode,
        cycle: u8,
        bus: &mut CpuBus,
        master: BusMaster,
        op: ReadOp,
    ) {
        match mode {
            Mode::Imm => self.alu_imm(cycle, bus, master, op),
            Mode::Zp => self.alu_zp(cycle, bus, master, op),
            Mode::ZpX => self.alu_zp_idx(cycle, bus, master, self.x, op),
            Mode::ZpY => self.alu_zp_idx(cycle, bus, master, self.y, op),
            Mode::Abs => self.alu_abs(cycle, bus, master, op),
            Mode::AbsX => self.alu_abs_idx(cycle, bus, master, self.x, op),
            Mode::AbsY => self.alu_abs_idx(cycle, bus, master, self.y, op),
            Mode::IndX => self.alu_ind_x(cycle, bus, master, op),
            Mode::IndY => self.alu_ind_y(cycle, bus, master, op),
        }
    }

    // ---- Store family ----

    /// Zero Page - 3 cycles.
    pub(crate) fn store_zp(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: StoreOp) {
        match cycle {
            0 => {
                self.temp_addr = self.fetch_operand(bus, master) as u16;
                self.next(1);
            }
            _ => {
                bus.write(master, self.temp_addr, op(self));
                self.state = ExecState::Fetch;
            }
        }
    }

    /// Zero Page,X / Zero Page,Y - 4 cycles.
    pub(crate) fn store_zp_idx(
        &mut self,
        cycle: u8,
        bus: &mut CpuBus,
        master: BusMaster,
        index: u8,
        op: StoreOp,
    ) {
        match cycle {
            0 => {
                self.temp_addr = self.fetch_operand(bus, master) as u16;
                self.next(1);
            }
            1 => {
                let _ = bus.read(master, self.temp_addr);
                self.temp_addr = (self.temp_addr + index as u16) & 0x00FF;
                self.next(2);
            }
            _ => {
                bus.write(master, self.temp_addr, op(self));
                self.state = ExecState::Fetch;
            }
        }
    }

    /// Absolute - 4 cycles.
    pub(crate) fn store_abs(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: StoreOp) {
        match cycle {
            0 => {
                self.temp_addr = self.fetch_operand(bus, master) as u16;
                self.next(1);
            }
            1 => {
                let hi = self.fetch_operand(bus, master) as u16;
                self.temp_addr |= hi << 8;
                self.next(2);
            }
            _ => {
                bus.write(master, self.temp_addr, op(self));
                self.state = ExecState::Fetch;
            }
        }
    }

    /// Absolute,X / Absolute,Y - always 5 cycles, with a dummy read of the
    /// unfixed address.
    pub(crate) fn store_abs_idx(
        &mut self,
        cycle: u8,
        bus: &mut CpuBus,
        master: BusMaster,
        index: u8,
        op: StoreOp,
    ) {
        match cycle {
            0 => {
                self.temp_addr = self.fetch_operand(bus, master) as u16;
                self.next(1);
            }
            1 => {
                let hi = self.fetch_operand(bus, master) as u16;
                let base = self.temp_addr | hi << 8;
                self.index_base(base, index);
                self.next(2);
            }
            2 => {
                let _ = bus.read(master, self.unfixed());
                self.next(3);
            }
            _ => {
                bus.write(master, self.temp_addr, op(self));
                self.state = ExecState::Fetch;
            }
        }
    }

    /// (Indirect,X) - 6 cycles.
    pub(crate) fn store_ind_x(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: StoreOp) {
        if cycle < 4 {
            self.ind_x_address(cycle, bus, master);
        } else {
            bus.write(master, self.temp_addr, op(self));
            self.state = ExecState::Fetch;
        }
    }

    /// (Indirect),Y - always 6 cycles.
    pub(crate) fn store_ind_y(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: StoreOp) {
        match cycle {
            0..=2 => {
                self.ind_y_address(cycle, bus, master);
                if cycle == 2 {
                    self.next(3);
                }
            }
            3 => {
                let _ = bus.read(master, self.unfixed());
                self.next(4);
            }
            _ => {
                bus.write(master, self.temp_addr, op(self));
                self.state = ExecState::Fetch;
            }
        }
    }

    pub(crate) fn store_mode(
        &mut self,
        mode: Mode,
        cycle: u8,
        bus: &mut CpuBus,
        master: BusMaster,
        op: StoreOp,
    ) {
        match mode {
            Mode::Zp => self.store_zp(cycle, bus, master, op),
            Mode::ZpX => self.store_zp_idx(cycle, bus, master, self.x, op),
            Mode::ZpY => self.store_zp_idx(cycle, bus, master, self.y, op),
            Mode::Abs => self.store_abs(cycle, bus, master, op),
            Mode::AbsX => self.store_abs_idx(cycle, bus, master, self.x, op),
            Mode::AbsY => self.store_abs_idx(cycle, bus, master, self.y, op),
            Mode::IndX => self.store_ind_x(cycle, bus, master, op),
            Mode::IndY => self.store_ind_y(cycle, bus, master, op),
            // No store instruction has an immediate form.
            Mode::Imm => self.state = ExecState::Fetch,
        }
    }

    // ---- Read-modify-write family ----

    /// Shared tail of every RMW mode: read, write the old value back while
    /// the ALU works, write the result. `first` is the cycle of the read.
    fn rmw_tail(&mut self, cycle: u8, first: u8, bus: &mut CpuBus, master: BusMaster, op: RmwOp) {
        match cycle - first {
            0 => {
                self.temp_data = bus.read(master, self.temp_addr);
                self.next(cycle + 1);
            }
            1 => {
                let old = self.temp_data;
                bus.write(master, self.temp_addr, old);
                self.temp_data = op(self, old);
                self.next(cycle + 1);
            }
            _ => {
                bus.write(master, self.temp_addr, self.temp_data);
                self.state = ExecState::Fetch;
            }
        }
    }

    /// Zero Page - 5 cycles.
    pub(crate) fn rmw_zp(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: RmwOp) {
        if cycle == 0 {
            self.temp_addr = self.fetch_operand(bus, master) as u16;
            self.next(1);
        } else {
            self.rmw_tail(cycle, 1, bus, master, op);
        }
    }

    /// Zero Page,X - 6 cycles.
    pub(crate) fn rmw_zp_x(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: RmwOp) {
        match cycle {
            0 => {
                self.temp_addr = self.fetch_operand(bus, master) as u16;
                self.next(1);
            }
            1 => {
                let _ = bus.read(master, self.temp_addr);
                self.temp_addr = (self.temp_addr + self.x as u16) & 0x00FF;
                self.next(2);
            }
            _ => self.rmw_tail(cycle, 2, bus, master, op),
        }
    }

    /// Absolute - 6 cycles.
    pub(crate) fn rmw_abs(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: RmwOp) {
        match cycle {
            0 => {
                self.temp_addr = self.fetch_operand(bus, master) as u16;
                self.next(1);
            }
            1 => {
                let hi = self.fetch_operand(bus, master) as u16;
                self.temp_addr |= hi << 8;
                self.next(2);
            }
            _ => self.rmw_tail(cycle, 2, bus, master, op),
        }
    }

    /// Absolute,X / Absolute,Y - always 7 cycles.
    pub(crate) fn rmw_abs_idx(
        &mut self,
        cycle: u8,
        bus: &mut CpuBus,
        master: BusMaster,
        index: u8,
        op: RmwOp,
    ) {
        match cycle {
            0 => {
                self.temp_addr = self.fetch_operand(bus, master) as u16;
                self.next(1);
            }
            1 => {
                let hi = self.fetch_operand(bus, master) as u16;
                let base = self.temp_addr | hi << 8;
                self.index_base(base, index);
                self.next(2);
            }
            2 => {
                let _ = bus.read(master, self.unfixed());
                self.next(3);
            }
            _ => self.rmw_tail(cycle, 3, bus, master, op),
        }
    }

    /// (Indirect,X) - 8 cycles (undocumented RMW forms only).
    pub(crate) fn rmw_ind_x(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: RmwOp) {
        if cycle < 4 {
            self.ind_x_address(cycle, bus, master);
        } else {
            self.rmw_tail(cycle, 4, bus, master, op);
        }
    }

    /// (Indirect),Y - 8 cycles (undocumented RMW forms only).
    pub(crate) fn rmw_ind_y(&mut self, cycle: u8, bus: &mut CpuBus, master: BusMaster, op: RmwOp) {
        match cycle {
            0..=2 => {
                self.ind_y_address(cycle, bus, master);
                if cycle == 2 {
                    self.next(3);
                }
            }
            3 => {
                let _ = bus.read(master, self.unfixed());
                self.next(4);
            }
            _ => self.rmw_tail(cycle, 4, bus, master, op),
        }
    }

    pub(crate) fn rmw_mode(
        &mut self,
        mode: Mode,
        cycle: u8,
        bus: &mut CpuBus,
        master: BusMaster,
        op: RmwOp,
    ) {
        match mode {
            Mode::Zp => self.rmw_zp(cycle, bus, master, op),
            Mode::ZpX => self.rmw_zp_x(cycle, bus, master, op),
            Mode::Abs => self.rmw_abs(cycle, bus, master, op),
            Mode::AbsX => self.rmw_abs_idx(cycle, bus, master, self.x, op),
            Mode::AbsY => self.rmw_abs_idx(cycle, bus, master, self.y, op),
            Mode::IndX => self.rmw_ind_x(cycle, bus, master, op),
            Mode::IndY => self.rmw_ind_y(cycle, bus, master, op),
            // No RMW instruction uses these modes.
            Mode::Imm | Mode::ZpY => self.state = ExecState::Fetch,
        }
    }
}

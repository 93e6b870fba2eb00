use super::{CpuBus, ExecState, M6502, StatusFlag};
use crate::core::BusMaster;

/// Register-only operation executed on the second cycle of an implied
/// or accumulator instruction.
pub type ImpliedOp = fn(&mut M6502);

impl M6502 {
    /// Implied / Accumulator - 2 cycles. The second cycle reads the byte
    /// after the opcode and discards it.
    pub(crate) fn implied(&mut self, bus: &mut CpuBus, master: BusMaster, op: ImpliedOp) {
        let _ = bus.read(master, self.pc);
        op(self);
        self.state = ExecState::Fetch;
    }

    // ---- Transfers ----

    pub(crate) fn tax(&mut self) {
        self.x = self.a;
        self.set_nz(self.x);
    }

    pub(crate) fn txa(&mut self) {
        self.a = self.x;
        self.set_nz(self.a);
    }

    pub(crate) fn tay(&mut self) {
        self.y = self.a;
        self.set_nz(self.y);
    }

    pub(crate) fn tya(&mut self) {
        self.a = self.y;
        self.set_nz(self.a);
    }

    pub(crate) fn tsx(&mut self) {
        self.x = self.sp;
        self.set_nz(self.x);
    }

    /// TXS does not touch flags.
    pub(crate) fn txs(&mut self) {
        self.sp = self.x;
    }

    // ---- Register increment / decrement ----

    pub(crate) fn inx(&mut self) {
        self.x = self.x.wrapping_add(1);
        self.set_nz(self.x);
    }

    pub(crate) fn iny(&mut self) {
        self.y = self.y.wrapping_add(1);
        self.set_nz(self.y);
    }

    pub(crate) fn dex(&mut self) {
        self.x = self.x.wrapping_sub(1);
        self.set_nz(self.x);
    }

    pub(crate) fn dey(&mut self) {
        self.y = self.y.wrapping_sub(1);
        self.set_nz(self.y);
    }

    // ---- Flags ----

    pub(crate) fn clc(&mut self) {
        self.set_flag(StatusFlag::C, false);
    }

    pub(crate) fn sec(&mut self) {
        self.set_flag(StatusFlag::C, true);
    }

    pub(crate) fn cli(&mut self) {
        self.set_flag(StatusFlag::I, false);
    }

    pub(crate) fn sei(&mut self) {
        self.set_flag(StatusFlag::I, true);
    }

    pub(crate) fn cld(&mut self) {
        self.set_flag(StatusFlag::D, false);
    }

    pub(crate) fn sed(&mut self) {
        self.set_flag(StatusFlag::D, true);
    }

    pub(crate) fn clv(&mut self) {
        self.set_flag(StatusFlag::V, false);
    }

    pub(crate) fn nop(&mut self) {}

    // ---- Accumulator shifts ----

    pub(crate) fn asl_a(&mut self) {
        self.a = self.asl(self.a);
    }

    pub(crate) fn lsr_a(&mut self) {
        self.a = self.lsr(self.a);
    }

    pub(crate) fn rol_a(&mut self) {
        self.a = self.rol(self.a);
    }

    pub(crate) fn ror_a(&mut self) {
        self.a = self.ror(self.a);
    }
}

use serde::{Deserialize, Serialize};

use crate::core::{Bus, BusMaster, component::BusMasterComponent};
use crate::cpu::{Cpu, CpuStateTrait, M6502State};

mod alu;
mod branch;
mod dispatch;
mod implied;
mod stack;

pub use dispatch::{CpuDispatcher, DirectDispatch, DispatchStrategy, TableDispatch};

/// 6502 status register flags
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusFlag {
    C = 0x01, // Carry
    Z = 0x02, // Zero
    I = 0x04, // Interrupt disable
    D = 0x08, // Decimal mode
    B = 0x10, // Break (only exists on the stack copy)
    U = 0x20, // Unused, always reads 1
    V = 0x40, // Overflow
    N = 0x80, // Negative
}

/// Bus shape every 6502 helper is written against.
pub type CpuBus = dyn Bus<Address = u16, Data = u8>;

/// Raised when the CPU fetches an opcode no dispatcher knows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpuFault {
    UnimplementedOpcode { pc: u16, opcode: u8 },
}

impl std::fmt::Display for CpuFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CpuFault::UnimplementedOpcode { pc, opcode } => {
                write!(f, "unimplemented opcode ${opcode:02X} at ${pc:04X}")
            }
        }
    }
}

impl std::error::Error for CpuFault {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecState {
    Fetch,
    Execute(u8, u8), // (opcode, cycle within the instruction after the fetch)
}

/// Cycle-stepped NMOS 6502, as used (in its 6507 package) by the Atari 2600.
///
/// Every bus access of the reference timing table is performed, including
/// the dummy reads of indexed addressing and the double write of
/// read-modify-write instructions. Cartridge hotspots and TIA strobes depend
/// on them.
#[derive(Clone, Debug)]
pub struct M6502 {
    // Registers
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub p: u8,

    // Internal state
    pub(crate) state: ExecState,
    pub(crate) opcode: u8,
    pub(crate) temp_addr: u16,
    pub(crate) temp_data: u8,
    dispatch: DispatchStrategy,
    fault: Option<CpuFault>,
}

impl Default for M6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl M6502 {
    pub fn new() -> Self {
        Self::with_dispatch(DispatchStrategy::default())
    }

    pub fn with_dispatch(dispatch: DispatchStrategy) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            p: StatusFlag::U as u8,
            state: ExecState::Fetch,
            opcode: 0,
            temp_addr: 0,
            temp_data: 0,
            dispatch,
            fault: None,
        }
    }

    pub fn dispatch(&self) -> DispatchStrategy {
        self.dispatch
    }

    pub fn set_dispatch(&mut self, dispatch: DispatchStrategy) {
        self.dispatch = dispatch;
    }

    /// Reset sequence: registers to their power-on values, then PC from
    /// the vector at $FFFC/$FFFD read through the bus.
    pub fn reset_with_bus(&mut self, bus: &mut CpuBus, master: BusMaster) {
        Cpu::reset(self);
        let lo = bus.read(master, 0xFFFC) as u16;
        let hi = bus.read(master, 0xFFFD) as u16;
        self.pc = (hi << 8) | lo;
    }

    /// Take the fault raised by the last completed instruction, if any.
    pub fn take_fault(&mut self) -> Option<CpuFault> {
        self.fault.take()
    }

    /// Restore registers from a snapshot. The CPU is left at an
    /// instruction boundary.
    pub fn restore(&mut self, state: &M6502State) {
        self.a = state.a;
        self.x = state.x;
        self.y = state.y;
        self.pc = state.pc;
        self.sp = state.sp;
        self.p = state.p;
        self.state = ExecState::Fetch;
        self.fault = None;
    }

    #[inline]
    pub(crate) fn set_flag(&mut self, flag: StatusFlag, set: bool) {
        if set {
            self.p |= flag as u8;
        } else {
            self.p &= !(flag as u8);
        }
    }

    #[inline]
    pub(crate) fn flag(&self, flag: StatusFlag) -> bool {
        self.p & (flag as u8) != 0
    }

    /// Advance one bus cycle.
    pub fn execute_cycle(&mut self, bus: &mut CpuBus, master: BusMaster) {
        if bus.is_halted_for(master) {
            return;
        }

        match self.state {
            ExecState::Fetch => {
                self.opcode = bus.read(master, self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.state = ExecState::Execute(self.opcode, 0);
            }
            ExecState::Execute(op, cycle) => {
                let dispatcher = self.dispatch.dispatcher();
                if !dispatcher.execute(self, op, cycle, bus, master) {
                    self.unimplemented(op, bus, master);
                }
            }
        }
    }

    /// Unknown opcodes take the implied 2-cycle bus pattern and raise a fault.
    fn unimplemented(&mut self, op: u8, bus: &mut CpuBus, master: BusMaster) {
        let _ = bus.read(master, self.pc);
        self.fault = Some(CpuFault::UnimplementedOpcode {
            pc: self.pc.wrapping_sub(1),
            opcode: op,
        });
        self.state = ExecState::Fetch;
    }
}

impl BusMasterComponent for M6502 {
    type Bus = CpuBus;

    fn tick_with_bus(&mut self, bus: &mut Self::Bus, master: BusMaster) -> bool {
        if bus.is_halted_for(master) {
            return false;
        }
        let was_executing = matches!(self.state, ExecState::Execute(..));
        self.execute_cycle(bus, master);
        was_executing && self.state == ExecState::Fetch
    }
}

impl CpuStateTrait for M6502 {
    type Snapshot = M6502State;

    fn snapshot(&self) -> M6502State {
        M6502State {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            p: self.p,
        }
    }
}

impl Cpu for M6502 {
    fn reset(&mut self) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        // The 6507 has no interrupt pins; I starts clear.
        self.p = StatusFlag::U as u8;
        self.state = ExecState::Fetch;
        self.fault = None;
    }

    fn at_instruction_boundary(&self) -> bool {
        self.state == ExecState::Fetch
    }
}

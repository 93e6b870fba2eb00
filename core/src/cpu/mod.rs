use crate::core::component::BusMasterComponent;

/// Generic CPU interface
pub trait Cpu: BusMasterComponent + CpuStateTrait {
    /// Return to the power-on register state. The reset vector is fetched
    /// separately because it needs the bus.
    fn reset(&mut self);

    /// True when the next cycle fetches an opcode.
    fn at_instruction_boundary(&self) -> bool;
}

// Re-export state types
pub mod state;
pub use state::{CpuStateTrait, M6502State};

pub mod m6502;
pub use m6502::M6502;

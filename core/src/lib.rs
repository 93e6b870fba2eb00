pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::{
        AudioSink, Bus, BusMaster, BusMasterComponent, Component, InputButton, Machine, PixelSink,
    };
    pub use crate::cpu::{Cpu, CpuStateTrait, M6502, M6502State};
    pub use crate::cpu::m6502::{CpuDispatcher, CpuFault, DispatchStrategy};
}

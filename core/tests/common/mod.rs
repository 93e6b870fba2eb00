#![allow(dead_code)]

use vcs_core::core::{Bus, BusMaster, BusMasterComponent};
use vcs_core::cpu::m6502::M6502;

/// One bus cycle as seen by the test bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read(u16, u8),
    Write(u16, u8),
}

/// Minimal bus for testing: flat 64KB read/write memory, no peripherals.
/// Every access is logged so tests can check dummy cycles.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub log: Vec<Access>,
    pub halted: bool,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            log: Vec::new(),
            halted: false,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    /// Point the reset vector at `addr`.
    pub fn set_reset_vector(&mut self, addr: u16) {
        self.memory[0xFFFC] = addr as u8;
        self.memory[0xFFFD] = (addr >> 8) as u8;
    }
}

impl Bus for TestBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        let value = self.memory[addr as usize];
        self.log.push(Access::Read(addr, value));
        value
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.log.push(Access::Write(addr, data));
        self.memory[addr as usize] = data;
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        self.halted
    }
}

/// Tick the CPU for `n` cycles.
pub fn tick(cpu: &mut M6502, bus: &mut TestBus, n: usize) {
    for _ in 0..n {
        cpu.tick_with_bus(bus, BusMaster::Cpu(0));
    }
}

/// Run one whole instruction and return the number of cycles it took.
pub fn run_instruction(cpu: &mut M6502, bus: &mut TestBus) -> usize {
    let mut cycles = 0;
    loop {
        cycles += 1;
        if cpu.tick_with_bus(bus, BusMaster::Cpu(0)) {
            return cycles;
        }
        assert!(cycles < 16, "instruction did not complete");
    }
}

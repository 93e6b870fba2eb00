/// Identifies who is accessing the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusMaster {
    Cpu(usize), // CPU 0 (the 6507 is the only bus master on the 2600)
    Debugger,   // Side-effect free inspection; cartridge writes patch ROM
}

impl BusMaster {
    /// True for accesses that must not disturb emulated state
    /// (hotspots, timer flags, strobes).
    pub fn is_debugger(self) -> bool {
        matches!(self, BusMaster::Debugger)
    }
}

/// Generic bus interface with a halt line (RDY).
pub trait Bus {
    type Address: Copy + Into<u64>; // u16 for the 6502 family
    type Data; // u8

    fn read(&mut self, master: BusMaster, addr: Self::Address) -> Self::Data;
    fn write(&mut self, master: BusMaster, addr: Self::Address, data: Self::Data);

    /// Check if the bus is halted for this master (RDY).
    /// Returns true if the master must not consume a cycle.
    fn is_halted_for(&self, master: BusMaster) -> bool;
}

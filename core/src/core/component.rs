use super::bus::BusMaster;

/// A device advanced by its own clock with no bus access of its own
/// (TIA color clock, RIOT timer clock).
pub trait Component {
    /// Advance one clock. Returns true when the device reached a boundary
    /// worth reporting (end of scanline for the TIA, timer underflow for the RIOT).
    fn tick(&mut self) -> bool;
}

/// A device that drives the bus (the CPU).
pub trait BusMasterComponent {
    type Bus: ?Sized;

    /// Execute one bus cycle. Returns true when an instruction completed
    /// on this cycle.
    fn tick_with_bus(&mut self, bus: &mut Self::Bus, master: BusMaster) -> bool;
}

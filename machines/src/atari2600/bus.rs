//! 2600 address decode.
//!
//! Only A0-A12 reach the chips, so the 64K CPU space is eight mirrors of
//! one 8K map:
//!
//! | A12 | A9 | A7 | Target                         |
//! |-----|----|----|--------------------------------|
//! |  1  |  x |  x | cartridge window ($1000-$1FFF) |
//! |  0  |  x |  0 | TIA                            |
//! |  0  |  0 |  1 | RIOT RAM (128 bytes)           |
//! |  0  |  1 |  1 | RIOT registers                 |

use vcs_core::core::{Bus, BusMaster};
use vcs_core::device::{Cartridge, Riot, Tia};

pub const RAM_SIZE: usize = 128;

/// Where an address lands. Every 16-bit address maps to exactly one region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Tia(u8),        // A0-A5
    Ram(u8),        // A0-A6
    Riot(u16),      // full address, the RIOT decodes A0-A4 itself
    Cartridge(u16), // full address, the cartridge decodes A0-A11
}

pub fn decode(addr: u16) -> Region {
    let addr = addr & 0x1FFF;
    if addr & 0x1000 != 0 {
        Region::Cartridge(addr)
    } else if addr & 0x0080 == 0 {
        Region::Tia((addr & 0x3F) as u8)
    } else if addr & 0x0200 == 0 {
        Region::Ram((addr & 0x7F) as u8)
    } else {
        Region::Riot(addr)
    }
}

/// Everything on the 6507's side of the bus except the CPU itself.
#[derive(Clone, Debug)]
pub struct SystemBus {
    pub(crate) ram: [u8; RAM_SIZE],
    pub(crate) tia: Tia,
    pub(crate) riot: Riot,
    pub(crate) cart: Cartridge,
}

impl SystemBus {
    pub fn new(tia: Tia, cart: Cartridge) -> Self {
        Self {
            ram: [0; RAM_SIZE],
            tia,
            riot: Riot::new(),
            cart,
        }
    }

    /// Side-effect free read for debugger views.
    pub fn peek(&self, addr: u16) -> u8 {
        match decode(addr) {
            Region::Tia(reg) => self.tia.read(reg),
            Region::Ram(i) => self.ram[i as usize],
            Region::Riot(a) => self.riot.peek(a),
            Region::Cartridge(a) => self.cart.peek(a),
        }
    }
}

impl Bus for SystemBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, master: BusMaster, addr: u16) -> u8 {
        if master.is_debugger() {
            return self.peek(addr);
        }
        let data = match decode(addr) {
            Region::Tia(reg) => self.tia.read(reg),
            Region::Ram(i) => self.ram[i as usize],
            Region::Riot(a) => self.riot.read(a),
            Region::Cartridge(a) => self.cart.read(master, a),
        };
        self.cart.snoop(addr, data);
        data
    }

    fn write(&mut self, master: BusMaster, addr: u16, data: u8) {
        if master.is_debugger() {
            // Editing primitive: RAM and cartridge only, never strobes.
            match decode(addr) {
                Region::Ram(i) => self.ram[i as usize] = data,
                Region::Cartridge(a) => self.cart.write(master, a, data),
                Region::Tia(_) | Region::Riot(_) => {}
            }
            return;
        }
        match decode(addr) {
            Region::Tia(reg) => self.tia.write(reg, data),
            Region::Ram(i) => self.ram[i as usize] = data,
            Region::Riot(a) => self.riot.write(a, data),
            Region::Cartridge(a) => self.cart.write(master, a, data),
        }
        self.cart.snoop(addr, data);
    }

    fn is_halted_for(&self, master: BusMaster) -> bool {
        matches!(master, BusMaster::Cpu(_)) && self.tia.rdy_halt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_regions() {
        assert_eq!(decode(0x0000), Region::Tia(0x00));
        assert_eq!(decode(0x002C), Region::Tia(0x2C));
        assert_eq!(decode(0x0080), Region::Ram(0x00));
        assert_eq!(decode(0x00FF), Region::Ram(0x7F));
        assert_eq!(decode(0x01FE), Region::Ram(0x7E)); // stack
        assert_eq!(decode(0x0280), Region::Riot(0x0280));
        assert_eq!(decode(0x0296), Region::Riot(0x0296));
        assert_eq!(decode(0x1000), Region::Cartridge(0x1000));
        assert_eq!(decode(0xFFFC), Region::Cartridge(0x1FFC));
    }

    #[test]
    fn decode_mirrors() {
        // TIA write registers repeat every 64 bytes below $80
        assert_eq!(decode(0x0040), Region::Tia(0x00));
        assert_eq!(decode(0x0142), Region::Tia(0x02));
        // RAM at $180-$1FF mirrors $80-$FF
        assert_eq!(decode(0x0185), decode(0x0085));
        // High mirrors of the whole 8K map
        assert_eq!(decode(0x2085), Region::Ram(0x05));
        assert_eq!(decode(0xE280), Region::Riot(0x0280));
    }
}

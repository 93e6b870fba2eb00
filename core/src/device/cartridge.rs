//! Cartridge window ($1000-$1FFF) and bank switching.
//!
//! Every scheme resolves a window address to exactly one ROM or RAM byte
//! through [`Cartridge::resolve`]. Banks change only as a side effect of a
//! CPU access to one of the scheme's hot addresses (or, for the Activision
//! scheme, of the stack snoop).
//!
//! | Scheme        | CLI           | Banks      | Hot addresses            | RAM    |
//! |---------------|---------------|------------|--------------------------|--------|
//! | `SingleBank`  | `single_bank` | 1 (2K/4K)  | none                     | none   |
//! | `Default`     | `default`     | up to 8x4K | ...$1FF9                 | none   |
//! | `F4`          | `f4`          | 8x4K       | $1FF4-$1FFB              | none   |
//! | `F4Sc`        | `fe`          | 8x4K       | $1FF4-$1FFB              | 128 B  |
//! | `Super`       | `super`       | 4x4K       | $1FF6-$1FF9              | 128 B  |
//! | `Cbs`         | `cbs`         | 3x4K       | $1FF8-$1FFA              | 256 B  |
//! | `Fe`          | `e`           | 2x4K       | stack snoop at $01FE     | none   |
//! | `ParkerBros`  | `pb`          | 8x1K       | $1FE0-$1FF7              | none   |
//! | `MNetwork`    | `mnet`        | 8x2K       | $1FE0-$1FEB              | 2K     |
//!
//! In the generic schemes the RAM write port sits at the window base and
//! the read port immediately after it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::BusMaster;

pub const WINDOW_SIZE: usize = 0x1000;

/// CRC-32 lookup table (reflected polynomial 0xEDB88320).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

/// CRC-32 as used by ZIP and PNG.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

// ---------------------------------------------------------------------------
// Scheme
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankScheme {
    Default,
    SingleBank,
    F4,
    F4Sc,
    Fe,
    Super,
    ParkerBros,
    MNetwork,
    Cbs,
}

impl BankScheme {
    pub const ALL: [BankScheme; 9] = [
        BankScheme::Default,
        BankScheme::SingleBank,
        BankScheme::F4,
        BankScheme::F4Sc,
        BankScheme::Fe,
        BankScheme::Super,
        BankScheme::ParkerBros,
        BankScheme::MNetwork,
        BankScheme::Cbs,
    ];

    /// Name used on the command line.
    pub fn cli_name(self) -> &'static str {
        match self {
            BankScheme::Default => "default",
            BankScheme::SingleBank => "single_bank",
            BankScheme::F4 => "f4",
            BankScheme::F4Sc => "fe",
            BankScheme::Fe => "e",
            BankScheme::Super => "super",
            BankScheme::ParkerBros => "pb",
            BankScheme::MNetwork => "mnet",
            BankScheme::Cbs => "cbs",
        }
    }

    /// Scheme picked when none is requested, from the image size alone.
    pub fn infer(size: usize) -> Option<BankScheme> {
        match size {
            1..=0x1000 => Some(BankScheme::SingleBank),
            0x2000 | 0x4000 => Some(BankScheme::Default),
            0x3000 => Some(BankScheme::Cbs),
            0x8000 => Some(BankScheme::F4),
            _ => None,
        }
    }

    /// (max banks, last hot address, RAM bytes) for the 4K-bank schemes.
    fn generic_params(self) -> Option<(usize, u16, usize)> {
        match self {
            BankScheme::Default => Some((8, 0xFF9, 0)),
            BankScheme::F4 => Some((8, 0xFFB, 0)),
            BankScheme::F4Sc => Some((8, 0xFFB, 0x80)),
            BankScheme::Super => Some((4, 0xFF9, 0x80)),
            BankScheme::Cbs => Some((3, 0xFFA, 0x100)),
            _ => None,
        }
    }
}

impl fmt::Display for BankScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for BankScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BankScheme::ALL
            .into_iter()
            .find(|scheme| scheme.cli_name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = BankScheme::ALL.iter().map(|s| s.cli_name()).collect();
                format!("unknown cartridge type '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Errors and identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartridgeError {
    /// Image size incompatible with the requested or inferred scheme.
    InvalidImage {
        scheme: Option<BankScheme>,
        size: usize,
        reason: &'static str,
    },
    /// Saved bank state does not fit this cartridge: another scheme or
    /// RAM size, a bank index out of range, or a patch past the image.
    StateMismatch,
}

impl fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidImage {
                scheme: Some(scheme),
                size,
                reason,
            } => write!(f, "invalid {scheme} cartridge image ({size} bytes): {reason}"),
            Self::InvalidImage {
                scheme: None,
                size,
                reason,
            } => write!(f, "invalid cartridge image ({size} bytes): {reason}"),
            Self::StateMismatch => write!(f, "bank state does not match the cartridge"),
        }
    }
}

impl std::error::Error for CartridgeError {}

/// What a snapshot must match before it may be restored into a machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartridgeIdentity {
    pub crc32: u32,
    pub size: usize,
    pub scheme: BankScheme,
}

impl fmt::Display for CartridgeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}K crc32 {:08X}", self.scheme, self.size / 1024, self.crc32)
    }
}

// ---------------------------------------------------------------------------
// Bank state
// ---------------------------------------------------------------------------

/// Scheme-specific switching state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mapper {
    Single,
    Generic {
        banks: u8,
        hot_end: u16,
        bank: u8,
    },
    Fe {
        bank: u8,
        snoop: bool, // previous access touched $01FE
    },
    ParkerBros {
        slices: [u8; 3], // 1K slices in segments 0-2; segment 3 is fixed
    },
    MNetwork {
        slice: u8, // 2K slice in the lower half
        ram_enabled: bool,
        ram_bank: u8, // 256-byte page at $1800-$19FF
    },
}

impl Mapper {
    /// Whether `self` could have been reached from `loaded` by bank
    /// switching on the same image.
    fn fits(&self, loaded: &Mapper) -> bool {
        match (self, loaded) {
            (Mapper::Single, Mapper::Single) => true,
            (
                Mapper::Generic {
                    banks,
                    hot_end,
                    bank,
                },
                Mapper::Generic {
                    banks: loaded_banks,
                    hot_end: loaded_hot_end,
                    ..
                },
            ) => banks == loaded_banks && hot_end == loaded_hot_end && bank < banks,
            (Mapper::Fe { bank, .. }, Mapper::Fe { .. }) => *bank < 2,
            (Mapper::ParkerBros { slices }, Mapper::ParkerBros { .. }) => {
                slices.iter().all(|&slice| slice < 8)
            }
            (Mapper::MNetwork { slice, ram_bank, .. }, Mapper::MNetwork { .. }) => {
                *slice < 7 && *ram_bank < 4
            }
            _ => false,
        }
    }
}

/// Mutable cartridge state: what a snapshot carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankState {
    pub mapper: Mapper,
    pub ram: Vec<u8>,
    /// ROM bytes changed by the editor, by image offset.
    #[serde(default)]
    pub patches: BTreeMap<u32, u8>,
}

/// Where a window address lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Rom(usize),
    RamRead(usize),
    RamWrite(usize),
}

// ---------------------------------------------------------------------------
// Cartridge
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Cartridge {
    /// The image as loaded.
    image: Vec<u8>,
    /// The image with `state.patches` applied; what the bus reads.
    rom: Vec<u8>,
    identity: CartridgeIdentity,
    state: BankState,
}

impl Cartridge {
    /// Build a cartridge from a ROM image. With no scheme the size decides.
    pub fn load(rom: &[u8], scheme: Option<BankScheme>) -> Result<Self, CartridgeError> {
        let size = rom.len();
        let invalid = |reason| CartridgeError::InvalidImage {
            scheme,
            size,
            reason,
        };
        if size == 0 {
            return Err(invalid("image is empty"));
        }
        let scheme = match scheme {
            Some(scheme) => scheme,
            None => BankScheme::infer(size).ok_or(invalid("no default scheme for this size"))?,
        };
        let invalid = |reason| CartridgeError::InvalidImage {
            scheme: Some(scheme),
            size,
            reason,
        };

        let (mapper, ram_size) = match scheme {
            BankScheme::SingleBank => {
                if size > WINDOW_SIZE || !size.is_power_of_two() {
                    return Err(invalid("expected a power of two up to 4K"));
                }
                (Mapper::Single, 0)
            }
            BankScheme::Fe => {
                if size != 0x2000 {
                    return Err(invalid("expected 8K"));
                }
                (Mapper::Fe { bank: 0, snoop: false }, 0)
            }
            BankScheme::ParkerBros => {
                if size != 0x2000 {
                    return Err(invalid("expected 8K"));
                }
                (Mapper::ParkerBros { slices: [4, 5, 6] }, 0)
            }
            BankScheme::MNetwork => {
                if size != 0x4000 {
                    return Err(invalid("expected 16K"));
                }
                let mapper = Mapper::MNetwork {
                    slice: 0,
                    ram_enabled: false,
                    ram_bank: 0,
                };
                (mapper, 0x800)
            }
            _ => {
                let Some((max_banks, hot_end, ram_size)) = scheme.generic_params() else {
                    return Err(invalid("unsupported scheme"));
                };
                let banks = size / WINDOW_SIZE;
                if size % WINDOW_SIZE != 0 || banks > max_banks {
                    return Err(invalid("expected whole 4K banks within the scheme's bank count"));
                }
                // Generic schemes power up in the last bank, where the reset vector lives.
                let mapper = Mapper::Generic {
                    banks: banks as u8,
                    hot_end,
                    bank: banks as u8 - 1,
                };
                (mapper, ram_size)
            }
        };

        debug!("cartridge: {size} bytes, scheme {scheme}, {ram_size} bytes RAM");
        Ok(Self {
            identity: CartridgeIdentity {
                crc32: crc32(rom),
                size,
                scheme,
            },
            image: rom.to_vec(),
            rom: rom.to_vec(),
            state: BankState {
                mapper,
                ram: vec![0; ram_size],
                patches: BTreeMap::new(),
            },
        })
    }

    pub fn scheme(&self) -> BankScheme {
        self.identity.scheme
    }

    pub fn identity(&self) -> CartridgeIdentity {
        self.identity
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn ram(&self) -> &[u8] {
        &self.state.ram
    }

    pub fn mapper(&self) -> &Mapper {
        &self.state.mapper
    }

    pub fn bank_state(&self) -> &BankState {
        &self.state
    }

    /// Replace the switching state, RAM and ROM patches. Every bank index
    /// and patch offset is checked first; on error nothing changes.
    pub fn restore_bank_state(&mut self, state: BankState) -> Result<(), CartridgeError> {
        let patches_fit = state
            .patches
            .keys()
            .all(|&offset| (offset as usize) < self.image.len());
        if !state.mapper.fits(&self.state.mapper)
            || state.ram.len() != self.state.ram.len()
            || !patches_fit
        {
            return Err(CartridgeError::StateMismatch);
        }
        self.rom.copy_from_slice(&self.image);
        for (&offset, &data) in &state.patches {
            self.rom[offset as usize] = data;
        }
        self.state = state;
        Ok(())
    }

    /// Power-on bank selection with cleared RAM. ROM patches are kept.
    pub fn reset(&mut self) {
        self.state.mapper = match self.state.mapper {
            Mapper::Single => Mapper::Single,
            Mapper::Generic { banks, hot_end, .. } => Mapper::Generic {
                banks,
                hot_end,
                bank: banks - 1,
            },
            Mapper::Fe { .. } => Mapper::Fe { bank: 0, snoop: false },
            Mapper::ParkerBros { .. } => Mapper::ParkerBros { slices: [4, 5, 6] },
            Mapper::MNetwork { .. } => Mapper::MNetwork {
                slice: 0,
                ram_enabled: false,
                ram_bank: 0,
            },
        };
        self.state.ram.fill(0);
    }

    /// Human-readable active bank selection.
    pub fn bank_label(&self) -> String {
        match &self.state.mapper {
            Mapper::Single => "fixed".to_string(),
            Mapper::Generic { banks, bank, .. } => format!("bank {bank}/{banks}"),
            Mapper::Fe { bank, .. } => format!("bank {bank}/2"),
            Mapper::ParkerBros { slices } => {
                format!("slices {} {} {} 7", slices[0], slices[1], slices[2])
            }
            Mapper::MNetwork {
                slice,
                ram_enabled,
                ram_bank,
            } => {
                let low = if *ram_enabled {
                    "ram".to_string()
                } else {
                    slice.to_string()
                };
                format!("slice {low}, ram page {ram_bank}")
            }
        }
    }

    /// Resolve a window address under the current bank selection.
    pub fn resolve(&self, addr: u16) -> Target {
        let off = (addr & 0x0FFF) as usize;
        let ram_size = self.state.ram.len();
        match self.state.mapper {
            Mapper::Single => Target::Rom(off % self.rom.len()),
            Mapper::Generic { bank, .. } => {
                if off < ram_size {
                    Target::RamWrite(off)
                } else if off < 2 * ram_size {
                    Target::RamRead(off - ram_size)
                } else {
                    Target::Rom(bank as usize * WINDOW_SIZE + off)
                }
            }
            Mapper::Fe { bank, .. } => Target::Rom(bank as usize * WINDOW_SIZE + off),
            Mapper::ParkerBros { slices } => {
                let segment = off >> 10;
                let slice = if segment == 3 { 7 } else { slices[segment] as usize };
                Target::Rom(slice * 0x400 + (off & 0x3FF))
            }
            Mapper::MNetwork {
                slice,
                ram_enabled,
                ram_bank,
            } => match off {
                0x000..=0x3FF if ram_enabled => Target::RamWrite(off),
                0x400..=0x7FF if ram_enabled => Target::RamRead(off - 0x400),
                0x000..=0x7FF => Target::Rom(slice as usize * 0x800 + off),
                0x800..=0x8FF => Target::RamWrite(0x400 + ram_bank as usize * 0x100 + (off & 0xFF)),
                0x900..=0x9FF => Target::RamRead(0x400 + ram_bank as usize * 0x100 + (off & 0xFF)),
                _ => Target::Rom(7 * 0x800 + (off & 0x7FF)),
            },
        }
    }

    /// Byte at a window address without any side effects.
    pub fn peek(&self, addr: u16) -> u8 {
        match self.resolve(addr) {
            Target::Rom(i) => self.rom[i],
            Target::RamRead(i) => self.state.ram[i],
            // The write port reads back the ROM underneath it.
            Target::RamWrite(_) => self.rom[self.rom_offset_under(addr)],
        }
    }

    /// Bus read. CPU reads trigger hot addresses before data is returned.
    pub fn read(&mut self, master: BusMaster, addr: u16) -> u8 {
        if !master.is_debugger() {
            self.hotspot(addr);
        }
        self.peek(addr)
    }

    /// Bus write. Debugger writes patch the byte under the active bank
    /// (ROM editor); CPU writes reach RAM ports and hot addresses only.
    pub fn write(&mut self, master: BusMaster, addr: u16, data: u8) {
        if master.is_debugger() {
            self.poke(addr, data);
            return;
        }
        self.hotspot(addr);
        if let Target::RamWrite(i) = self.resolve(addr) {
            self.state.ram[i] = data;
        }
    }

    /// Patch the byte an address currently resolves to. RAM ports write RAM.
    pub fn poke(&mut self, addr: u16, data: u8) {
        match self.resolve(addr) {
            Target::Rom(i) => {
                self.rom[i] = data;
                if self.image[i] == data {
                    self.state.patches.remove(&(i as u32));
                } else {
                    self.state.patches.insert(i as u32, data);
                }
            }
            Target::RamRead(i) | Target::RamWrite(i) => self.state.ram[i] = data,
        }
    }

    /// Observe every bus access, wherever it decodes. Only the Activision
    /// scheme watches: after an access to $01FE, bit 5 of the next access's
    /// data selects the bank (set = bank 0).
    pub fn snoop(&mut self, addr: u16, data: u8) {
        if let Mapper::Fe { bank, snoop } = &mut self.state.mapper {
            if *snoop {
                let next = if data & 0x20 != 0 { 0 } else { 1 };
                if next != *bank {
                    debug!("cartridge: FE bank {bank} -> {next}");
                    *bank = next;
                }
            }
            *snoop = addr & 0x1FFF == 0x01FE;
        }
    }

    fn rom_offset_under(&self, addr: u16) -> usize {
        let off = (addr & 0x0FFF) as usize;
        match self.state.mapper {
            Mapper::Generic { bank, .. } => bank as usize * WINDOW_SIZE + off,
            Mapper::MNetwork { slice, .. } if off < 0x800 => slice as usize * 0x800 + off,
            Mapper::MNetwork { .. } => 7 * 0x800 + (off & 0x7FF),
            _ => off % self.rom.len(),
        }
    }

    fn hotspot(&mut self, addr: u16) {
        let off = addr & 0x0FFF;
        match &mut self.state.mapper {
            Mapper::Generic {
                banks,
                hot_end,
                bank,
            } => {
                let first = *hot_end + 1 - *banks as u16;
                if (first..=*hot_end).contains(&off) {
                    let next = (off - first) as u8;
                    if next != *bank {
                        debug!("cartridge: bank {bank} -> {next} via ${:04X}", addr);
                        *bank = next;
                    }
                }
            }
            Mapper::ParkerBros { slices } => {
                if (0xFE0..=0xFF7).contains(&off) {
                    let segment = ((off - 0xFE0) >> 3) as usize;
                    slices[segment] = (off & 0x07) as u8;
                    debug!("cartridge: segment {segment} -> slice {}", slices[segment]);
                }
            }
            Mapper::MNetwork {
                slice,
                ram_enabled,
                ram_bank,
            } => match off {
                0xFE0..=0xFE6 => {
                    *slice = (off & 0x07) as u8;
                    *ram_enabled = false;
                    debug!("cartridge: lower slice {slice}");
                }
                0xFE7 => {
                    *ram_enabled = true;
                    debug!("cartridge: lower window RAM");
                }
                0xFE8..=0xFEB => {
                    *ram_bank = (off & 0x03) as u8;
                    debug!("cartridge: RAM page {ram_bank}");
                }
                _ => {}
            },
            Mapper::Single | Mapper::Fe { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_scheme_names_round_trip() {
        for scheme in BankScheme::ALL {
            assert_eq!(scheme.cli_name().parse::<BankScheme>(), Ok(scheme));
        }
        assert!("f8".parse::<BankScheme>().is_err());
    }

    #[test]
    fn test_inference_by_size() {
        assert_eq!(BankScheme::infer(0x800), Some(BankScheme::SingleBank));
        assert_eq!(BankScheme::infer(0x2000), Some(BankScheme::Default));
        assert_eq!(BankScheme::infer(0x3000), Some(BankScheme::Cbs));
        assert_eq!(BankScheme::infer(0x8000), Some(BankScheme::F4));
        assert_eq!(BankScheme::infer(0x5000), None);
    }

    #[test]
    fn test_write_port_reads_rom_underneath() {
        let mut rom = vec![0u8; 0x4000];
        rom[3 * WINDOW_SIZE + 0x10] = 0x77;
        let mut cart = Cartridge::load(&rom, Some(BankScheme::Super)).unwrap();
        cart.write(BusMaster::Cpu(0), 0x1010, 0x42);
        assert_eq!(cart.peek(0x1010), 0x77);
        assert_eq!(cart.peek(0x1090), 0x42);
    }
}

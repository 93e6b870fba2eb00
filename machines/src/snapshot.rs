//! Save states.
//!
//! A snapshot is the machine's complete mutable state at an instruction
//! boundary, serialized as JSON and compressed with zlib. The header
//! (version, cartridge identity) is checked before anything is applied.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use log::debug;
use serde::{Deserialize, Serialize};

use vcs_core::cpu::{CpuStateTrait, M6502State};
use vcs_core::device::cartridge::BankState;
use vcs_core::device::{CartridgeIdentity, Riot, Tia};

use crate::atari2600::{Atari2600, RAM_SIZE};
use crate::error::{MachineError, SnapshotMismatch};

/// Bumped whenever a field of any serialized chip changes meaning.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub version: u32,
    pub identity: CartridgeIdentity,
    pub cycles: u64,
    pub cpu: M6502State,
    pub ram: Vec<u8>,
    pub tia: Tia,
    pub riot: Riot,
    pub cart: BankState,
}

/// Leading fields, decoded on their own so a snapshot from another
/// version is reported as incompatible rather than as a decode error.
#[derive(Deserialize)]
struct Header {
    version: u32,
}

impl MachineSnapshot {
    /// Capture the machine. Refused while an instruction is in flight.
    pub fn capture(machine: &Atari2600) -> Result<Self, MachineError> {
        let (cpu, bus) = machine.parts();
        if !machine.at_instruction_boundary() {
            return Err(MachineError::MidInstruction { pc: cpu.pc });
        }
        Ok(Self {
            version: SNAPSHOT_VERSION,
            identity: bus.cart.identity(),
            cycles: machine.cycles(),
            cpu: cpu.snapshot(),
            ram: bus.ram.to_vec(),
            tia: bus.tia.clone(),
            riot: bus.riot.clone(),
            cart: bus.cart.bank_state().clone(),
        })
    }

    /// Replace the machine's state with this snapshot. Every check runs
    /// before the machine is touched; on error it is left as it was.
    pub fn restore(&self, machine: &mut Atari2600) -> Result<(), MachineError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotMismatch::Version {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            }
            .into());
        }
        let expected = machine.cartridge().identity();
        if self.identity != expected {
            return Err(SnapshotMismatch::Cartridge {
                found: self.identity,
                expected,
            }
            .into());
        }
        let ram: [u8; RAM_SIZE] = self
            .ram
            .as_slice()
            .try_into()
            .map_err(|_| SnapshotMismatch::Layout("RAM is not 128 bytes"))?;

        let (cpu, bus) = machine.parts();
        let mut cpu = cpu.clone();
        let mut bus = bus.clone();
        bus.cart
            .restore_bank_state(self.cart.clone())
            .map_err(|_| SnapshotMismatch::Layout("bank state does not fit the cartridge"))?;
        cpu.restore(&self.cpu);
        let mut tia = self.tia.clone();
        tia.adopt_host_state(&bus.tia);
        bus.tia = tia;
        bus.riot = self.riot.clone();
        bus.ram = ram;

        machine.replace_state(cpu, bus, self.cycles);
        debug!("restored snapshot at cycle {}", self.cycles);
        Ok(())
    }

    /// zlib-compressed JSON.
    pub fn encode(&self) -> Result<Vec<u8>, MachineError> {
        let json = serde_json::to_vec(self)?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MachineError> {
        let mut json = Vec::new();
        ZlibDecoder::new(bytes).read_to_end(&mut json)?;
        let header: Header = serde_json::from_slice(&json)?;
        if header.version != SNAPSHOT_VERSION {
            return Err(SnapshotMismatch::Version {
                found: header.version,
                expected: SNAPSHOT_VERSION,
            }
            .into());
        }
        Ok(serde_json::from_slice(&json)?)
    }
}

impl Atari2600 {
    /// Encoded snapshot of the current state.
    pub fn save_state(&self) -> Result<Vec<u8>, MachineError> {
        MachineSnapshot::capture(self)?.encode()
    }

    /// Decode and restore an encoded snapshot.
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), MachineError> {
        MachineSnapshot::decode(bytes)?.restore(self)
    }
}

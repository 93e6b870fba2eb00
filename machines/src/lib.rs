pub mod atari2600;
pub mod debug;
pub mod error;
pub mod rom_loader;
pub mod snapshot;

pub use atari2600::{Atari2600, MachineConfig, OpcodePolicy};
pub use error::{MachineError, SnapshotMismatch};
pub use snapshot::MachineSnapshot;

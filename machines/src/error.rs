use vcs_core::device::{CartridgeError, CartridgeIdentity};

/// Why a snapshot was refused before any machine state was touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotMismatch {
    Version { found: u32, expected: u32 },
    Cartridge {
        found: CartridgeIdentity,
        expected: CartridgeIdentity,
    },
    /// Well-formed JSON whose contents cannot belong to a 2600
    /// (wrong RAM size, foreign bank state).
    Layout(&'static str),
}

impl std::fmt::Display for SnapshotMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Version { found, expected } => {
                write!(f, "snapshot version {found}, expected {expected}")
            }
            Self::Cartridge { found, expected } => {
                write!(f, "snapshot taken with cartridge {found}, loaded cartridge is {expected}")
            }
            Self::Layout(what) => write!(f, "malformed snapshot: {what}"),
        }
    }
}

/// Errors surfaced by the 2600 machine and its snapshot format.
#[derive(Debug)]
pub enum MachineError {
    /// The CPU fetched an opcode with no defined behavior and the
    /// opcode policy is fatal.
    UnimplementedOpcode { pc: u16, opcode: u8 },

    /// ROM image rejected at load time. No machine is built.
    InvalidCartridgeImage(CartridgeError),

    /// Restore refused; the running machine is unchanged.
    IncompatibleSnapshot(SnapshotMismatch),

    /// Capture requested between two cycles of one instruction.
    MidInstruction { pc: u16 },

    /// Snapshot bytes are not a compressed JSON snapshot.
    SnapshotDecode(serde_json::Error),

    Io(std::io::Error),
}

impl std::fmt::Display for MachineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnimplementedOpcode { pc, opcode } => {
                write!(f, "unimplemented opcode ${opcode:02X} at ${pc:04X}")
            }
            Self::InvalidCartridgeImage(e) => write!(f, "{e}"),
            Self::IncompatibleSnapshot(why) => write!(f, "incompatible snapshot: {why}"),
            Self::MidInstruction { pc } => {
                write!(f, "cannot snapshot mid-instruction (PC ${pc:04X})")
            }
            Self::SnapshotDecode(e) => write!(f, "snapshot decode error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for MachineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidCartridgeImage(e) => Some(e),
            Self::SnapshotDecode(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CartridgeError> for MachineError {
    fn from(e: CartridgeError) -> Self {
        Self::InvalidCartridgeImage(e)
    }
}

impl From<SnapshotMismatch> for MachineError {
    fn from(e: SnapshotMismatch) -> Self {
        Self::IncompatibleSnapshot(e)
    }
}

impl From<serde_json::Error> for MachineError {
    fn from(e: serde_json::Error) -> Self {
        Self::SnapshotDecode(e)
    }
}

impl From<std::io::Error> for MachineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub mod cartridge;
pub mod riot;
pub mod tia;

pub use cartridge::{BankScheme, Cartridge, CartridgeError, CartridgeIdentity};
pub use riot::Riot;
pub use tia::Tia;

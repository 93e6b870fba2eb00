//! Cartridge image loading and validation.
//!
//! An image is a raw dump of the cartridge ROM (`.a26`/`.bin`). Loading
//! checks only what holds for every scheme; the scheme-specific size rules
//! live in [`Cartridge::load`](vcs_core::device::Cartridge::load).

use std::path::Path;

use vcs_core::device::cartridge::crc32;

/// Largest image any supported scheme accepts (F4, 8 x 4K).
pub const MAX_IMAGE_SIZE: usize = 0x8000;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a cartridge image.
#[derive(Debug)]
pub enum RomLoadError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io(std::io::Error),

    /// The image file is empty.
    Empty(String),

    /// The image is larger than any bank scheme can map.
    TooLarge { file: String, size: usize },

    /// CRC32 checksum does not match the expected value.
    ChecksumMismatch {
        file: String,
        expected: u32,
        actual: u32,
    },
}

impl std::fmt::Display for RomLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Empty(name) => write!(f, "ROM {name}: image is empty"),
            Self::TooLarge { file, size } => write!(
                f,
                "ROM {file}: {size} bytes exceeds the {MAX_IMAGE_SIZE}-byte maximum"
            ),
            Self::ChecksumMismatch {
                file,
                expected,
                actual,
            } => write!(
                f,
                "ROM {file}: CRC32 expected 0x{expected:08X}, got 0x{actual:08X}"
            ),
        }
    }
}

impl std::error::Error for RomLoadError {}

impl From<std::io::Error> for RomLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// RomImage
// ---------------------------------------------------------------------------

/// A cartridge image loaded from disk or provided programmatically.
#[derive(Clone, Debug)]
pub struct RomImage {
    name: String,
    data: Vec<u8>,
}

impl RomImage {
    /// Read an image file. The name kept is the file name without path.
    pub fn from_file(path: &Path) -> Result<Self, RomLoadError> {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let data = std::fs::read(path)?;
        Self::from_bytes(&name, data)
    }

    /// Wrap bytes already in memory (archives, tests).
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Result<Self, RomLoadError> {
        if data.is_empty() {
            return Err(RomLoadError::Empty(name.to_string()));
        }
        if data.len() > MAX_IMAGE_SIZE {
            return Err(RomLoadError::TooLarge {
                file: name.to_string(),
                size: data.len(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            data,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn crc32(&self) -> u32 {
        crc32(&self.data)
    }

    /// Check the image against a known checksum.
    pub fn verify(&self, expected: u32) -> Result<(), RomLoadError> {
        let actual = self.crc32();
        if actual != expected {
            return Err(RomLoadError::ChecksumMismatch {
                file: self.name.clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

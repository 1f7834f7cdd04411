//! Common type definitions.
//!
//! Core enums and structures shared between the cipher engine, the
//! worker pipeline, and the CLI shell.

use std::fmt::{Display, Formatter, Result};

/// The direction of a file operation.
///
/// Used to filter eligible files and derive output paths.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ProcessorMode {
    /// Encrypt the file, producing a `.xrv` output.
    Encrypt,

    /// Decrypt the file, removing the `.xrv` extension.
    Decrypt,
}

impl ProcessorMode {
    /// Human-readable label for the mode.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Encrypt => "Encrypt",
            Self::Decrypt => "Decrypt",
        }
    }
}

impl Display for ProcessorMode {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.label())
    }
}

/// An operation in progress, with labels for progress reporting.
#[derive(Clone, Copy)]
pub enum Processing {
    Encryption,
    Decryption,
}

impl Processing {
    /// Progress label shown while chunks are being transformed.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Encryption => "Encrypting",
            Self::Decryption => "Decrypting",
        }
    }

    /// The corresponding [`ProcessorMode`].
    #[inline]
    pub fn mode(self) -> ProcessorMode {
        match self {
            Self::Encryption => ProcessorMode::Encrypt,
            Self::Decryption => ProcessorMode::Decrypt,
        }
    }
}

impl Display for Processing {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.label())
    }
}

/// One chunk of payload handed to the transform stage.
///
/// The buffer is owned: it travels reader → worker → writer and is
/// dropped once the writer has flushed it.
pub struct Task {
    /// Chunk payload, exactly `chunk_len(index)` bytes.
    pub data: Vec<u8>,

    /// Zero-based chunk index; the writer restores this ordering.
    pub index: u64,
}

//! Global configuration constants.
//!
//! Cipher parameters, file-format values, and pipeline sizing shared
//! across the application.

/// Application name used in user-facing output.
pub const APP_NAME: &str = "XorVault";

/// File extension marking encrypted output.
pub const FILE_EXTENSION: &str = ".xrv";

/// Size of one payload chunk: 64 MiB.
///
/// Chunks are the unit of parallel work. The value must be even: the
/// transform consumes bytes in pairs and restarts its pairing at every
/// chunk boundary, so an odd chunk size would desynchronize the pairing
/// between encryption and decryption for every chunk but the last.
pub const CHUNK_SIZE: u64 = 64 * 1024 * 1024;

/// Length of the integrity tag written at the head of an encrypted file.
///
/// HMAC-SHA256 output. Recomputed and compared before any chunk of a
/// ciphertext is trusted, so a wrong key is rejected without processing
/// the payload.
pub const TAG_SIZE: usize = 32;

/// Minimum accepted key length in bytes.
///
/// The transform itself is total over any non-empty key; this floor is
/// hygiene enforced at every entry point.
pub const KEY_MIN_LENGTH: usize = 6;

/// Number of entries in the substitution tables (one per byte value).
pub const TABLE_SIZE: usize = 256;

/// Channel capacity per worker thread.
///
/// Bounded channels between the reader, the transform pool, and the
/// writer limit how far the reader can run ahead when transforms fall
/// behind.
pub const CHANNEL_DEPTH: usize = 2;

//! Keyed substitution cipher.
//!
//! [`Cipher`] derives all key material (substitution tables plus the
//! rotating key-mask stream) once and exposes the in-memory transform
//! entry points. The file pipeline in [`crate::worker`] shares one
//! instance read-only across all transform workers.

use crate::config::KEY_MIN_LENGTH;
use crate::error::{EngineError, EngineResult};
use crate::secret::SecretBytes;
use crate::types::Processing;

pub mod table;
pub mod tag;
pub mod transform;

use table::Tables;
use tag::IntegrityTag;

pub struct Cipher {
    key: SecretBytes,
    tables: Tables,
    masks: Vec<u8>,
}

impl Cipher {
    /// Derives the cipher state from a passphrase.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidInput`] when the key is shorter than
    /// [`KEY_MIN_LENGTH`] bytes.
    pub fn new(key: SecretBytes) -> EngineResult<Self> {
        if key.len() < KEY_MIN_LENGTH {
            return Err(EngineError::InvalidInput(format!(
                "key must be at least {KEY_MIN_LENGTH} bytes, got {}",
                key.len()
            )));
        }

        let tables = table::build();
        let masks = table::key_masks(key.expose_secret());

        Ok(Self { key, tables, masks })
    }

    /// Encrypts a caller-owned buffer in place. No chunking, no tag.
    pub fn encrypt_in_place(&self, buf: &mut [u8]) {
        transform::encrypt(buf, &self.tables, &self.masks);
    }

    /// Decrypts a caller-owned buffer in place.
    pub fn decrypt_in_place(&self, buf: &mut [u8]) {
        transform::decrypt(buf, &self.tables, &self.masks);
    }

    /// Copying variant of [`Self::encrypt_in_place`].
    pub fn encrypt_bytes(&self, data: &[u8]) -> Vec<u8> {
        let mut buf = data.to_vec();
        self.encrypt_in_place(&mut buf);
        buf
    }

    /// Copying variant of [`Self::decrypt_in_place`].
    pub fn decrypt_bytes(&self, data: &[u8]) -> Vec<u8> {
        let mut buf = data.to_vec();
        self.decrypt_in_place(&mut buf);
        buf
    }

    /// Applies the transform for the given direction.
    #[inline]
    pub fn apply(&self, mode: Processing, buf: &mut [u8]) {
        match mode {
            Processing::Encryption => self.encrypt_in_place(buf),
            Processing::Decryption => self.decrypt_in_place(buf),
        }
    }

    /// Computes the wrong-key detection tag for this key.
    pub fn tag(&self) -> EngineResult<IntegrityTag> {
        IntegrityTag::compute(self.key.expose_secret(), &self.tables.encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOREM: &[u8] = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit.";

    #[test]
    fn test_rejects_short_key() {
        let result = Cipher::new(SecretBytes::new(b"12345"));
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_accepts_minimum_key() {
        assert!(Cipher::new(SecretBytes::new(b"123456")).is_ok());
    }

    #[test]
    fn test_lorem_roundtrip() {
        let cipher = Cipher::new(SecretBytes::new(b"secret_key")).unwrap();

        let ciphertext = cipher.encrypt_bytes(LOREM);
        assert_eq!(ciphertext.len(), LOREM.len());
        assert_ne!(ciphertext.as_slice(), LOREM);

        assert_eq!(cipher.decrypt_bytes(&ciphertext), LOREM);
    }

    #[test]
    fn test_wrong_key_garbles_output() {
        let right = Cipher::new(SecretBytes::new(b"secret_key")).unwrap();
        let wrong = Cipher::new(SecretBytes::new(b"public_key")).unwrap();

        let ciphertext = right.encrypt_bytes(LOREM);
        assert_ne!(wrong.decrypt_bytes(&ciphertext), LOREM);
    }

    #[test]
    fn test_apply_matches_direct_calls() {
        let cipher = Cipher::new(SecretBytes::new(b"secret_key")).unwrap();

        let mut buf = LOREM.to_vec();
        cipher.apply(Processing::Encryption, &mut buf);
        assert_eq!(buf, cipher.encrypt_bytes(LOREM));

        cipher.apply(Processing::Decryption, &mut buf);
        assert_eq!(buf, LOREM);
    }
}

//! Wrong-key detection tag.
//!
//! A 32-byte HMAC-SHA256, keyed by the passphrase, over the encode
//! table. Written at the head of every encrypted file; recomputed and
//! compared before any chunk of a ciphertext is processed, so a wrong
//! key fails in constant work instead of producing garbage output.
//!
//! This is a detection aid, not an authentication guarantee: the tag
//! covers key material, never the payload.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::{TABLE_SIZE, TAG_SIZE};
use crate::error::{EngineError, EngineResult};

pub struct IntegrityTag {
    bytes: [u8; TAG_SIZE],
}

impl IntegrityTag {
    /// Computes the tag for a key and its derived encode table.
    pub fn compute(key: &[u8], encode: &[u8; TABLE_SIZE]) -> EngineResult<Self> {
        let mut mac = Hmac::<Sha256>::new_from_slice(key)
            .map_err(|_| EngineError::InvalidInput("empty tag key".into()))?;
        mac.update(encode);

        Ok(Self { bytes: mac.finalize().into_bytes().into() })
    }

    /// Constant-time comparison against a tag read from disk.
    ///
    /// # Errors
    ///
    /// [`EngineError::WrongKey`] when the tags differ.
    pub fn verify(&self, stored: &[u8; TAG_SIZE]) -> EngineResult<()> {
        if bool::from(self.bytes.ct_eq(stored)) {
            Ok(())
        } else {
            Err(EngineError::WrongKey)
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; TAG_SIZE] {
        &self.bytes
    }
}

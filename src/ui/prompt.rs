//! Interactive key entry.

use anyhow::{Context, Result, ensure};
use inquire::{Password, PasswordDisplayMode};

use crate::config::KEY_MIN_LENGTH;
use crate::secret::SecretBytes;
use crate::types::ProcessorMode;

/// Prompts for the key, masked.
///
/// Encryption asks twice; a typo here locks the data away for good.
/// Decryption asks once; a wrong key is caught by tag verification.
pub fn prompt_key(mode: ProcessorMode) -> Result<SecretBytes> {
    let prompt = match mode {
        ProcessorMode::Encrypt => Password::new("Enter encryption key:"),
        ProcessorMode::Decrypt => Password::new("Enter decryption key:").without_confirmation(),
    };

    let key = prompt
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("key input failed")?;

    validate_key(&key)?;
    Ok(SecretBytes::from_vec(key.into_bytes()))
}

/// Shared key validation for prompted and `--key` supplied values.
pub fn validate_key(key: &str) -> Result<()> {
    ensure!(!key.trim().is_empty(), "key cannot be empty or whitespace only");
    ensure!(
        key.len() >= KEY_MIN_LENGTH,
        "key must be at least {KEY_MIN_LENGTH} bytes, got {}",
        key.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_rejects_short_and_blank() {
        assert!(validate_key("12345").is_err());
        assert!(validate_key("      ").is_err());
        assert!(validate_key("secret_key").is_ok());
    }
}

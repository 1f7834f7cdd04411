//! Path derivation and target collection.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::config::FILE_EXTENSION;
use crate::types::ProcessorMode;

/// True when the path carries the encrypted-file extension.
#[inline]
#[must_use]
pub fn is_encrypted(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().ends_with(FILE_EXTENSION)
}

/// Derives the destination for an operation: append the extension on
/// encrypt, strip it on decrypt.
#[must_use]
pub fn output_path(input: &Path, mode: ProcessorMode) -> PathBuf {
    match mode {
        ProcessorMode::Encrypt => {
            let mut name = input.as_os_str().to_os_string();
            name.push(FILE_EXTENSION);
            PathBuf::from(name)
        }
        ProcessorMode::Decrypt => input
            .to_string_lossy()
            .strip_suffix(FILE_EXTENSION)
            .map_or_else(|| input.to_path_buf(), PathBuf::from),
    }
}

/// A file is eligible when it is not already in the target state:
/// encrypt skips `.xrv` files, decrypt takes only them.
#[inline]
#[must_use]
pub fn is_eligible(path: &Path, mode: ProcessorMode) -> bool {
    match mode {
        ProcessorMode::Encrypt => !is_encrypted(path),
        ProcessorMode::Decrypt => is_encrypted(path),
    }
}

/// Expands the command-line paths into the list of files to process.
///
/// Directories are walked only when `recursive` is set; otherwise they
/// are skipped with a warning. Ineligible files are dropped silently:
/// re-running encrypt over a tree must not double-encrypt it.
#[must_use]
pub fn collect_targets(paths: &[PathBuf], mode: ProcessorMode, recursive: bool) -> Vec<PathBuf> {
    let mut targets = Vec::new();

    for path in paths {
        if path.is_dir() {
            if !recursive {
                warn!(dir = %path.display(), "skipping directory (pass --recursive)");
                continue;
            }

            for entry in WalkDir::new(path).into_iter().filter_map(Result::ok) {
                let entry_path = entry.path();
                if entry.file_type().is_file() && is_eligible(entry_path, mode) {
                    targets.push(entry_path.to_path_buf());
                }
            }
        } else if is_eligible(path, mode) {
            targets.push(path.clone());
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_output_path_encrypt_appends_extension() {
        let out = output_path(Path::new("notes.txt"), ProcessorMode::Encrypt);
        assert_eq!(out, PathBuf::from("notes.txt.xrv"));
    }

    #[test]
    fn test_output_path_decrypt_strips_extension() {
        let out = output_path(Path::new("notes.txt.xrv"), ProcessorMode::Decrypt);
        assert_eq!(out, PathBuf::from("notes.txt"));
    }

    #[test]
    fn test_output_path_decrypt_without_extension_is_identity() {
        let out = output_path(Path::new("notes.txt"), ProcessorMode::Decrypt);
        assert_eq!(out, PathBuf::from("notes.txt"));
    }

    #[test]
    fn test_eligibility_by_mode() {
        assert!(is_eligible(Path::new("a.txt"), ProcessorMode::Encrypt));
        assert!(!is_eligible(Path::new("a.txt.xrv"), ProcessorMode::Encrypt));
        assert!(is_eligible(Path::new("a.txt.xrv"), ProcessorMode::Decrypt));
        assert!(!is_eligible(Path::new("a.txt"), ProcessorMode::Decrypt));
    }

    #[test]
    fn test_collect_skips_directories_without_recursive() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("inner.txt"), b"x").unwrap();

        let targets = collect_targets(&[dir.path().to_path_buf()], ProcessorMode::Encrypt, false);
        assert!(targets.is_empty());
    }

    #[test]
    fn test_collect_walks_directories_recursively() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
        std::fs::write(nested.join("b.txt"), b"x").unwrap();
        std::fs::write(nested.join("done.xrv"), b"x").unwrap();

        let mut targets =
            collect_targets(&[dir.path().to_path_buf()], ProcessorMode::Encrypt, true);
        targets.sort();

        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|t| !is_encrypted(t)));
    }
}

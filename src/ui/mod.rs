//! Terminal output for the CLI shell.
//!
//! - [`progress`]: indicatif listener for engine progress
//! - [`prompt`]: masked key entry

pub mod progress;
pub mod prompt;

use std::path::Path;

use console::style;

use crate::types::ProcessorMode;

/// Prints a per-file success line.
pub fn show_success(mode: ProcessorMode, path: &Path) {
    let action = match mode {
        ProcessorMode::Encrypt => "encrypted",
        ProcessorMode::Decrypt => "decrypted",
    };

    println!("{} {}", style("✓").green(), style(format!("{action}: {}", path.display())).bold());
}

/// Prints a per-file failure line; the batch keeps going.
pub fn show_failure(path: &Path, reason: &str) {
    eprintln!("{} {}: {reason}", style("✗").red(), style(path.display()).bold());
}

/// Prints the end-of-batch summary.
pub fn show_summary(succeeded: usize, failed: usize) {
    println!();
    if failed == 0 {
        println!("{} {succeeded} file(s) processed", style("✓").green());
    } else {
        println!(
            "{} {succeeded} file(s) processed, {failed} failed",
            style("!").yellow()
        );
    }
}

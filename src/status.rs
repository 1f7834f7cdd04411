//! Status and progress reporting seam.
//!
//! The engine never talks to a terminal directly. It pushes phase
//! messages and per-chunk progress through this trait; the CLI installs
//! an indicatif-backed implementation, tests and embedders use
//! [`Silent`].

/// Receiver for engine status lines and progress updates.
///
/// Implementations are free to throttle, render, or ignore every call.
/// Progress updates arrive from worker threads and are eventually
/// consistent only; two consecutive calls may report the same count.
pub trait StatusListener: Send + Sync {
    /// A phase-boundary or summary message.
    fn on_status(&self, message: &str);

    /// `processed` out of `total` units are done for the phase `label`.
    fn on_progress(&self, label: &str, processed: u64, total: u64);
}

/// Listener that discards everything.
pub struct Silent;

impl StatusListener for Silent {
    fn on_status(&self, _message: &str) {}

    fn on_progress(&self, _label: &str, _processed: u64, _total: u64) {}
}

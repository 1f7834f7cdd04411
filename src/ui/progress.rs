//! Indicatif-backed implementation of the engine's status seam.

use std::sync::Mutex;

use hashbrown::HashMap;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::status::StatusListener;

/// Renders engine progress as one bar per phase label, with status
/// lines printed above the bars.
pub struct ProgressListener {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl ProgressListener {
    pub fn new() -> Self {
        Self { multi: MultiProgress::new(), bars: Mutex::new(HashMap::new()) }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{msg:18} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("●○ ")
    }
}

impl Default for ProgressListener {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusListener for ProgressListener {
    fn on_status(&self, message: &str) {
        let _ = self.multi.println(message);
    }

    fn on_progress(&self, label: &str, processed: u64, total: u64) {
        let Ok(mut bars) = self.bars.lock() else { return };

        let bar = bars.entry(label.to_string()).or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new(total));
            bar.set_style(Self::style());
            bar.set_message(label.to_string());
            bar
        });

        bar.set_position(processed);
        if processed >= total && !bar.is_finished() {
            bar.finish();
        }
    }
}

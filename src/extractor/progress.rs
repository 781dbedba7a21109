// file: src/extractor/progress.rs
// description: page progress and counters for the OCR fallback pass
// reference: uses indicatif for progress bars and tracks processing metrics

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OcrStats {
    pub pages_scanned: usize,
    pub images_found: usize,
    pub images_recognized: usize,
    pub images_skipped: usize,
}

impl OcrStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_rate(&self) -> f64 {
        if self.images_found == 0 {
            return 0.0;
        }
        (self.images_recognized as f64 / self.images_found as f64) * 100.0
    }
}

pub struct ProgressTracker {
    bar: ProgressBar,
    stats: OcrStats,
}

impl ProgressTracker {
    pub fn new(total_pages: usize, visible: bool) -> Self {
        let bar = if visible {
            create_progress_bar(total_pages as u64)
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            stats: OcrStats::new(),
        }
    }

    pub fn page_done(&mut self) {
        self.stats.pages_scanned += 1;
        self.bar.inc(1);
        self.update_message();
    }

    pub fn image_found(&mut self) {
        self.stats.images_found += 1;
    }

    pub fn image_recognized(&mut self) {
        self.stats.images_recognized += 1;
        self.update_message();
    }

    pub fn image_skipped(&mut self) {
        self.stats.images_skipped += 1;
        self.update_message();
    }

    pub fn finish(self) -> OcrStats {
        self.bar.finish_and_clear();
        self.stats
    }

    fn update_message(&self) {
        self.bar.set_message(format!(
            "Images: {} | Skipped: {}",
            self.stats.images_recognized, self.stats.images_skipped
        ));
    }
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} OCR [{elapsed_precise}] [{bar:40.cyan/blue}] page {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("█▓▒░"));
    }
    bar
}

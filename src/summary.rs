//! Per-run download statistics.

use crate::utils::http::DownloadOutcome;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: usize,
    /// Already on disk
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Count one outcome, logging failures as they happen.
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded(path) => {
                tracing::debug!("Downloaded {}", path.display());
                self.downloaded += 1;
            }
            DownloadOutcome::Skipped(path) => {
                tracing::debug!("Skipped existing {}", path.display());
                self.skipped += 1;
            }
            DownloadOutcome::Failed { url, reason } => {
                tracing::warn!("Failed to download {}: {}", url, reason);
                self.failed += 1;
            }
        }
    }

    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }
}

/// Progress bar for a batch of `len` downloads
pub fn download_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

pub fn print_summary(title: &str, summary: &RunSummary) {
    println!();
    println!("{} ({} items):", title, summary.total());
    println!("  Downloaded: {}", summary.downloaded);
    if summary.skipped > 0 {
        println!("  Skipped:    {} (already existed)", summary.skipped);
    }
    if summary.failed > 0 {
        println!("  Failed:     {}", summary.failed);
    }
}

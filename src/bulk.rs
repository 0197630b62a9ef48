//! Paginated keyword download.

use crate::config::BulkConfig;
use crate::error::Result;
use crate::summary::{download_progress_bar, RunSummary};
use crate::utils::files::{ensure_directory, extension_from_url};
use crate::utils::http::download_to_file;
use crate::wallhaven::{SearchQuery, WallhavenApi};
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// Randomized pause between page requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDelay {
    min_ms: u64,
    max_ms: u64,
}

impl PageDelay {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    pub fn from_config(config: &BulkConfig) -> Self {
        Self::new(config.delay_min_ms, config.delay_max_ms)
    }

    pub fn sample(&self) -> Duration {
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }

    /// Sleep for a sampled delay and return it
    pub async fn wait(&self) -> Duration {
        let delay = self.sample();
        if !delay.is_zero() {
            tracing::debug!("Sleeping {} ms before the next page", delay.as_millis());
            sleep(delay).await;
        }
        delay
    }
}

#[derive(Debug)]
pub struct BulkReport {
    pub summary: RunSummary,
    pub pages_requested: u32,
    /// One entry per pause taken between page requests
    pub pauses: Vec<Duration>,
}

/// Download up to `total_images` keyword results into `wallpaper_<n>.<ext>` files
pub async fn run_bulk(api: &WallhavenApi, config: &BulkConfig) -> Result<BulkReport> {
    ensure_directory(&config.output_dir)?;

    let delay = PageDelay::from_config(config);
    let mut summary = RunSummary::default();
    let mut pages_requested = 0;
    let mut pauses = Vec::new();
    let pb = download_progress_bar(config.total_images as u64);

    for page in 1..=config.max_pages {
        let query = SearchQuery::new(config.sorting, config.order)
            .page(page)
            .keyword(config.keyword.as_str());
        pages_requested += 1;

        let wallpapers = match api.search(&query).await {
            Ok(wallpapers) => wallpapers,
            Err(e) => {
                tracing::warn!("Page {} failed, moving on: {}", page, e);
                if page < config.max_pages {
                    pauses.push(delay.wait().await);
                }
                continue;
            }
        };

        if wallpapers.is_empty() {
            tracing::info!("Page {} returned no results, stopping", page);
            break;
        }
        tracing::info!("Page {}: {} results", page, wallpapers.len());

        for wallpaper in wallpapers.iter().take(config.per_page) {
            if summary.downloaded >= config.total_images {
                break;
            }
            let index = summary.downloaded + 1;
            let extension = extension_from_url(&wallpaper.path);
            let target = config
                .output_dir
                .join(format!("wallpaper_{}.{}", index, extension));

            tracing::debug!("Wallpaper {} -> {}", wallpaper.id, target.display());
            let outcome = download_to_file(api.client(), &wallpaper.path, &target).await;
            summary.record(&outcome);
            pb.set_position(summary.downloaded as u64);
        }

        if summary.downloaded >= config.total_images {
            break;
        }
        if page < config.max_pages {
            pauses.push(delay.wait().await);
        }
    }
    pb.finish_and_clear();

    if summary.downloaded < config.total_images {
        tracing::info!(
            "Reached the end after {} pages with {} of {} images",
            pages_requested,
            summary.downloaded,
            config.total_images
        );
    }

    Ok(BulkReport {
        summary,
        pages_requested,
        pauses,
    })
}

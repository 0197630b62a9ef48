//! Configuration structures, loading and validation.
//!
//! Every field has a default so a missing or partial `wallfetch.toml` is
//! fine; command-line flags are applied on top by `main`.

use crate::collage::{GridLayout, MAX_CANVAS_SIDE};
use crate::error::{Error, Result};
use crate::wallhaven::{Order, Sorting};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub daily: DailyConfig,
    pub collage: CollageConfig,
    pub bulk: BulkConfig,
}

/// Request shape shared by all utilities.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Search endpoint URL.
    pub endpoint: String,
    /// Category bitmask (general/anime/people).
    pub categories: String,
    /// Purity bitmask (sfw/sketchy/nsfw).
    pub purity: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://wallhaven.cc/api/v1/search".to_string(),
            categories: "111".to_string(),
            purity: "100".to_string(),
            timeout_secs: 30,
            user_agent: crate::utils::http::get_user_agent().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DailyConfig {
    pub sorting: Sorting,
    pub order: Order,
    /// Number of newest wallpapers saved per day.
    pub count: usize,
    /// Directory holding one sub-directory per date.
    pub base_dir: PathBuf,
    /// Dated directories older than this many days are removed.
    pub retention_days: i64,
    /// Offset from UTC used to decide what "today" is.
    pub utc_offset_hours: i32,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            sorting: Sorting::DateAdded,
            order: Order::Desc,
            count: 5,
            base_dir: PathBuf::from("daily_updates"),
            retention_days: 7,
            utc_offset_hours: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollageConfig {
    pub sorting: Sorting,
    pub order: Order,
    /// Tiles per row and per column.
    pub grid_size: u32,
    /// Side of one square tile in pixels.
    pub tile_size: u32,
    /// Gap between tiles in pixels.
    pub spacing: u32,
    /// Height of the title bar in pixels.
    pub bar_height: u32,
    pub caption: String,
    /// Caption font size in pixels.
    pub font_size: f32,
    /// TrueType/OpenType font for the caption; system fonts are tried when unset.
    pub font_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub jpeg_quality: u8,
    pub utc_offset_hours: i32,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            sorting: Sorting::Toplist,
            order: Order::Desc,
            grid_size: 3,
            tile_size: 300,
            spacing: 10,
            bar_height: 80,
            caption: "Wallhaven Top Picks".to_string(),
            font_size: 40.0,
            font_path: None,
            output_dir: PathBuf::from("results"),
            jpeg_quality: 90,
            utc_offset_hours: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    pub keyword: String,
    pub sorting: Sorting,
    pub order: Order,
    /// Items taken from each result page.
    pub per_page: usize,
    /// Upper bound on search requests.
    pub max_pages: u32,
    /// Stop after this many successful downloads.
    pub total_images: usize,
    pub output_dir: PathBuf,
    /// Lower bound of the randomized pause between pages.
    pub delay_min_ms: u64,
    /// Upper bound of the randomized pause between pages.
    pub delay_max_ms: u64,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            keyword: "nature".to_string(),
            sorting: Sorting::Relevance,
            order: Order::Desc,
            per_page: 24,
            max_pages: 10,
            total_images: 100,
            output_dir: PathBuf::from("downloads"),
            delay_min_ms: 1000,
            delay_max_ms: 3000,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(
                "Configuration file not found: {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.endpoint.trim().is_empty() {
            return Err(invalid("api.endpoint", "must not be empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(invalid("api.timeout_secs", "must be greater than zero"));
        }
        if self.daily.retention_days < 0 {
            return Err(invalid("daily.retention_days", "must not be negative"));
        }
        validate_offset("daily.utc_offset_hours", self.daily.utc_offset_hours)?;

        let collage = &self.collage;
        if collage.grid_size == 0 {
            return Err(invalid("collage.grid_size", "must be greater than zero"));
        }
        if collage.tile_size == 0 {
            return Err(invalid("collage.tile_size", "must be greater than zero"));
        }
        match GridLayout::from_config(collage).checked_canvas_side() {
            Some(side) if side <= MAX_CANVAS_SIDE => {}
            _ => {
                return Err(invalid(
                    "collage.grid_size",
                    &format!(
                        "{0}x{0} tiles of {1} px with {2} px spacing exceed the {3} px canvas limit",
                        collage.grid_size, collage.tile_size, collage.spacing, MAX_CANVAS_SIDE
                    ),
                ))
            }
        }
        if !(1..=100).contains(&collage.jpeg_quality) {
            return Err(invalid(
                "collage.jpeg_quality",
                &format!("must be within 1..=100 (got {})", collage.jpeg_quality),
            ));
        }
        if !(collage.font_size > 0.0) {
            return Err(invalid("collage.font_size", "must be positive"));
        }
        validate_offset("collage.utc_offset_hours", collage.utc_offset_hours)?;

        let bulk = &self.bulk;
        if bulk.per_page == 0 {
            return Err(invalid("bulk.per_page", "must be greater than zero"));
        }
        if bulk.max_pages == 0 {
            return Err(invalid("bulk.max_pages", "must be greater than zero"));
        }
        if bulk.total_images == 0 {
            return Err(invalid("bulk.total_images", "must be greater than zero"));
        }
        if bulk.delay_min_ms > bulk.delay_max_ms {
            return Err(invalid(
                "bulk.delay_min_ms",
                &format!(
                    "must not exceed delay_max_ms ({} > {})",
                    bulk.delay_min_ms, bulk.delay_max_ms
                ),
            ));
        }

        Ok(())
    }
}

fn validate_offset(field: &str, hours: i32) -> Result<()> {
    if !(-23..=23).contains(&hours) {
        return Err(invalid(field, &format!("must be within -23..=23 (got {})", hours)));
    }
    Ok(())
}

fn invalid(field: &str, message: &str) -> Error {
    Error::ConfigValidation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.daily.count, 5);
        assert_eq!(config.daily.retention_days, 7);
        assert_eq!(config.bulk.per_page, 24);
        assert_eq!(config.collage.sorting, Sorting::Toplist);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [collage]
            grid_size = 4
            caption = "Weekly"

            [bulk]
            keyword = "mountains"
            sorting = "date_added"
            "#,
        )
        .unwrap();

        assert_eq!(config.collage.grid_size, 4);
        assert_eq!(config.collage.caption, "Weekly");
        assert_eq!(config.collage.tile_size, 300);
        assert_eq!(config.bulk.keyword, "mountains");
        assert_eq!(config.bulk.sorting, Sorting::DateAdded);
        assert_eq!(config.api.categories, "111");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let result = Config::from_toml("[bulk]\nper_page = \"many\"");
        assert!(matches!(result, Err(Error::TomlParse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.collage.grid_size = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigValidation { ref field, .. }) if field == "collage.grid_size"
        ));

        let mut config = Config::default();
        config.bulk.delay_min_ms = 5000;
        config.bulk.delay_max_ms = 100;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.collage.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.daily.utc_offset_hours = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_canvas() {
        let mut config = Config::default();
        config.collage.grid_size = 70_000;
        assert!(matches!(config.validate(), Err(Error::ConfigValidation { .. })));

        let mut config = Config::default();
        config.collage.tile_size = 100_000;
        assert!(matches!(config.validate(), Err(Error::ConfigValidation { .. })));

        let mut config = Config::default();
        config.collage.grid_size = 2;
        config.collage.spacing = u32::MAX;
        assert!(config.validate().is_err());

        // 4 * 4096 lands exactly on the limit
        let mut config = Config::default();
        config.collage.grid_size = 4;
        config.collage.tile_size = 4096;
        config.collage.spacing = 0;
        assert!(config.validate().is_ok());
        config.collage.spacing = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.daily.base_dir, PathBuf::from("daily_updates"));
    }
}

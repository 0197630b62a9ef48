use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

mod bulk;
mod collage;
mod config;
mod daily;
mod error;
mod summary;
mod utils;
mod wallhaven;

use config::Config;
use error::{exit_codes, Error, Result};
use wallhaven::{Sorting, WallhavenApi};

/// Fetch wallpapers from Wallhaven, build collages and keep dated archives tidy
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "wallfetch.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save today's newest wallpapers and prune old dated directories
    Daily {
        /// Number of wallpapers to save
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Base directory holding one directory per date
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Keep dated directories for this many days
        #[arg(short, long)]
        keep_days: Option<i64>,

        /// Run as if today were this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Compose the top-ranked wallpapers into a captioned grid
    Collage {
        /// Tiles per row and column
        #[arg(short, long)]
        grid: Option<u32>,

        /// Tile side in pixels
        #[arg(long)]
        tile_size: Option<u32>,

        /// Gap between tiles in pixels
        #[arg(long)]
        spacing: Option<u32>,

        /// Directory for the generated collage
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Text drawn on the title bar
        #[arg(long)]
        caption: Option<String>,

        /// Font file used for the caption
        #[arg(long)]
        font: Option<PathBuf>,

        /// Date used in the output file name (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Download keyword search results page by page
    Bulk {
        /// Search keyword
        #[arg(short, long)]
        keyword: Option<String>,

        /// Sort order of the search
        #[arg(long, value_enum)]
        sorting: Option<Sorting>,

        /// Items taken from each page
        #[arg(long)]
        per_page: Option<usize>,

        /// Maximum number of search requests
        #[arg(long)]
        max_pages: Option<u32>,

        /// Stop after this many images
        #[arg(short, long)]
        total: Option<usize>,

        /// Directory for downloaded images
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    match run(args).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// A bad config file, an out-of-range value or an unusable font is the user's to fix
fn exit_code(error: &Error) -> u8 {
    match error {
        Error::Config(_) | Error::ConfigValidation { .. } | Error::TomlParse(_) | Error::Font(_) => {
            exit_codes::CONFIG_ERROR
        }
        _ => exit_codes::RUN_ERROR,
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load_or_default(&args.config)?;
    apply_overrides(&mut config, args.command.overrides());
    config.validate()?;

    let client = utils::http::build_client(&config.api)?;
    let api = WallhavenApi::new(client, &config.api);

    match args.command {
        Commands::Daily { date, .. } => {
            let today =
                date.unwrap_or_else(|| utils::files::today_at_offset(config.daily.utc_offset_hours));
            let report = daily::run_daily(&api, &config.daily, today).await?;

            println!("Daily wallpapers: {}", report.target_dir.display());
            summary::print_summary("Daily update", &report.summary);
            for dir in &report.removed {
                println!("  Removed: {}", dir.display());
            }
        }
        Commands::Collage { date, .. } => {
            let date = date
                .unwrap_or_else(|| utils::files::today_at_offset(config.collage.utc_offset_hours));
            let report = collage::run_collage(&api, &config.collage, date).await?;

            println!("Collage written to {}", report.output.display());
            summary::print_summary("Collage tiles", &report.summary);
        }
        Commands::Bulk { .. } => {
            println!(
                "Downloading up to {} images for '{}' into {}",
                config.bulk.total_images,
                config.bulk.keyword,
                config.bulk.output_dir.display()
            );
            let report = bulk::run_bulk(&api, &config.bulk).await?;

            let paused: std::time::Duration = report.pauses.iter().sum();
            println!(
                "Search pages requested: {} ({} pauses, {:.1}s waited)",
                report.pages_requested,
                report.pauses.len(),
                paused.as_secs_f64()
            );
            summary::print_summary("Bulk download", &report.summary);
        }
    }

    Ok(())
}

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Default)]
struct Overrides {
    daily_count: Option<usize>,
    daily_dir: Option<PathBuf>,
    keep_days: Option<i64>,
    grid: Option<u32>,
    tile_size: Option<u32>,
    spacing: Option<u32>,
    collage_output: Option<PathBuf>,
    caption: Option<String>,
    font: Option<PathBuf>,
    keyword: Option<String>,
    sorting: Option<Sorting>,
    per_page: Option<usize>,
    max_pages: Option<u32>,
    total: Option<usize>,
    bulk_output: Option<PathBuf>,
}

impl Commands {
    fn overrides(&self) -> Overrides {
        match self {
            Commands::Daily {
                count,
                dir,
                keep_days,
                ..
            } => Overrides {
                daily_count: *count,
                daily_dir: dir.clone(),
                keep_days: *keep_days,
                ..Default::default()
            },
            Commands::Collage {
                grid,
                tile_size,
                spacing,
                output,
                caption,
                font,
                ..
            } => Overrides {
                grid: *grid,
                tile_size: *tile_size,
                spacing: *spacing,
                collage_output: output.clone(),
                caption: caption.clone(),
                font: font.clone(),
                ..Default::default()
            },
            Commands::Bulk {
                keyword,
                sorting,
                per_page,
                max_pages,
                total,
                output,
            } => Overrides {
                keyword: keyword.clone(),
                sorting: *sorting,
                per_page: *per_page,
                max_pages: *max_pages,
                total: *total,
                bulk_output: output.clone(),
                ..Default::default()
            },
        }
    }
}

fn apply_overrides(config: &mut Config, overrides: Overrides) {
    if let Some(count) = overrides.daily_count {
        config.daily.count = count;
    }
    if let Some(dir) = overrides.daily_dir {
        config.daily.base_dir = dir;
    }
    if let Some(keep_days) = overrides.keep_days {
        config.daily.retention_days = keep_days;
    }
    if let Some(grid) = overrides.grid {
        config.collage.grid_size = grid;
    }
    if let Some(tile_size) = overrides.tile_size {
        config.collage.tile_size = tile_size;
    }
    if let Some(spacing) = overrides.spacing {
        config.collage.spacing = spacing;
    }
    if let Some(output) = overrides.collage_output {
        config.collage.output_dir = output;
    }
    if let Some(caption) = overrides.caption {
        config.collage.caption = caption;
    }
    if let Some(font) = overrides.font {
        config.collage.font_path = Some(font);
    }
    if let Some(keyword) = overrides.keyword {
        config.bulk.keyword = keyword;
    }
    if let Some(sorting) = overrides.sorting {
        config.bulk.sorting = sorting;
    }
    if let Some(per_page) = overrides.per_page {
        config.bulk.per_page = per_page;
    }
    if let Some(max_pages) = overrides.max_pages {
        config.bulk.max_pages = max_pages;
    }
    if let Some(total) = overrides.total {
        config.bulk.total_images = total;
    }
    if let Some(output) = overrides.bulk_output {
        config.bulk.output_dir = output;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_bulk_overrides() {
        let args = Args::try_parse_from([
            "wallfetch",
            "bulk",
            "--keyword",
            "forest",
            "--total",
            "12",
            "--sorting",
            "toplist",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("wallfetch.toml"));

        let mut config = Config::default();
        apply_overrides(&mut config, args.command.overrides());
        assert_eq!(config.bulk.keyword, "forest");
        assert_eq!(config.bulk.total_images, 12);
        assert_eq!(config.bulk.sorting, Sorting::Toplist);
        assert_eq!(config.bulk.per_page, 24);
    }

    #[test]
    fn test_cli_parses_daily_date() {
        let args =
            Args::try_parse_from(["wallfetch", "daily", "--keep-days", "3", "--date", "2024-02-29"])
                .unwrap();
        match args.command {
            Commands::Daily {
                keep_days, date, ..
            } => {
                assert_eq!(keep_days, Some(3));
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_exit_codes_by_error_kind() {
        let dir = tempfile::tempdir().unwrap();
        match collage::load_caption_font(Some(dir.path().join("missing.ttf").as_path())) {
            Err(e) => assert_eq!(exit_code(&e), exit_codes::CONFIG_ERROR),
            Ok(_) => panic!("a missing font file must not load"),
        }

        let mut config = Config::default();
        config.collage.grid_size = 0;
        assert_eq!(exit_code(&config.validate().unwrap_err()), exit_codes::CONFIG_ERROR);

        let io_error = Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only output directory",
        ));
        assert_eq!(exit_code(&io_error), exit_codes::RUN_ERROR);
    }

    #[test]
    fn test_collage_overrides_leave_other_sections() {
        let args = Args::try_parse_from([
            "wallfetch",
            "--config",
            "custom.toml",
            "collage",
            "--grid",
            "4",
            "--caption",
            "Best of the week",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("custom.toml"));

        let mut config = Config::default();
        apply_overrides(&mut config, args.command.overrides());
        assert_eq!(config.collage.grid_size, 4);
        assert_eq!(config.collage.caption, "Best of the week");
        assert_eq!(config.daily.count, 5);
        assert_eq!(config.bulk.keyword, "nature");
    }
}

//! Grid collage of top-ranked wallpapers with a captioned title bar.

use crate::config::CollageConfig;
use crate::error::{Error, Result};
use crate::summary::{download_progress_bar, RunSummary};
use crate::utils::files::{date_dir_name, ensure_directory};
use crate::utils::http::fetch_bytes;
use crate::utils::images::{decode_image, save_jpeg, square_crop};
use crate::wallhaven::{SearchQuery, WallhavenApi};
use ab_glyph::FontVec;
use chrono::NaiveDate;
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::fs;
use std::path::{Path, PathBuf};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BAR_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const CAPTION_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Tried in order when no font is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Largest canvas side accepted from configuration
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Canvas geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub grid_size: u32,
    pub tile_size: u32,
    pub spacing: u32,
}

impl GridLayout {
    pub fn from_config(config: &CollageConfig) -> Self {
        Self {
            grid_size: config.grid_size,
            tile_size: config.tile_size,
            spacing: config.spacing,
        }
    }

    /// `G * tile + (G - 1) * spacing`, or `None` when it does not fit in a u32
    pub fn checked_canvas_side(&self) -> Option<u32> {
        let tiles = self.grid_size.checked_mul(self.tile_size)?;
        let gaps = self.grid_size.saturating_sub(1).checked_mul(self.spacing)?;
        tiles.checked_add(gaps)
    }

    /// Saturates on overflow; configuration keeps the side under [`MAX_CANVAS_SIDE`].
    pub fn canvas_side(&self) -> u32 {
        self.checked_canvas_side().unwrap_or(u32::MAX)
    }

    pub fn capacity(&self) -> usize {
        let grid = self.grid_size as usize;
        grid.saturating_mul(grid)
    }

    /// `(column, row)` for the item at `index`
    pub fn cell(&self, index: usize) -> (u32, u32) {
        let index = index as u32;
        (index % self.grid_size, index / self.grid_size)
    }

    /// Top-left pixel of a cell
    pub fn cell_offset(&self, col: u32, row: u32) -> (u32, u32) {
        let stride = self.tile_size + self.spacing;
        (col * stride, row * stride)
    }

    pub fn blank_canvas(&self) -> RgbImage {
        let side = self.canvas_side();
        RgbImage::from_pixel(side, side, BACKGROUND)
    }

    /// Paste a tile into the cell belonging to `index`; indices past the grid are ignored
    pub fn place(&self, canvas: &mut RgbImage, index: usize, tile: &RgbImage) {
        if index >= self.capacity() {
            return;
        }
        let (col, row) = self.cell(index);
        let (x, y) = self.cell_offset(col, row);
        imageops::replace(canvas, tile, x as i64, y as i64);
    }
}

/// Draw the opaque bar across the vertical center and the centered caption on it.
pub fn draw_title_bar(
    canvas: &mut RgbImage,
    bar_height: u32,
    caption: &str,
    font: Option<&FontVec>,
    font_size: f32,
) {
    let (width, height) = canvas.dimensions();
    let bar_height = bar_height.min(height);
    if bar_height == 0 || width == 0 {
        return;
    }

    let bar_top = ((height - bar_height) / 2) as i32;
    draw_filled_rect_mut(
        canvas,
        Rect::at(0, bar_top).of_size(width, bar_height),
        BAR_COLOR,
    );

    let Some(font) = font else {
        return;
    };
    if caption.is_empty() {
        return;
    }

    let (text_width, text_height) = text_size(font_size, font, caption);
    let x = (width as i32 - text_width as i32) / 2;
    let y = bar_top + (bar_height as i32 - text_height as i32) / 2;
    draw_text_mut(canvas, CAPTION_COLOR, x, y, font_size, font, caption);
}

/// Load the caption font from `path`, or the first system font that parses
pub fn load_caption_font(path: Option<&Path>) -> Result<Option<FontVec>> {
    if let Some(path) = path {
        return read_font(path).map(Some);
    }

    for candidate in SYSTEM_FONTS.iter().map(Path::new) {
        if !candidate.exists() {
            continue;
        }
        match read_font(candidate) {
            Ok(font) => {
                tracing::debug!("Using caption font {}", candidate.display());
                return Ok(Some(font));
            }
            Err(e) => tracing::debug!("Skipping font {}: {}", candidate.display(), e),
        }
    }
    Ok(None)
}

fn read_font(path: &Path) -> Result<FontVec> {
    let bytes = fs::read(path)
        .map_err(|e| Error::Font(format!("Failed to read {}: {}", path.display(), e)))?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| Error::Font(format!("Invalid font {}: {}", path.display(), e)))
}

/// Where and how the collage run ended
#[derive(Debug)]
pub struct CollageReport {
    pub output: PathBuf,
    pub summary: RunSummary,
}

pub fn output_path(output_dir: &Path, date: NaiveDate) -> PathBuf {
    output_dir.join(format!("wallpaper_{}.jpg", date_dir_name(date)))
}

/// Fetch the top wallpapers, compose the grid and write `wallpaper_<date>.jpg`
pub async fn run_collage(
    api: &WallhavenApi,
    config: &CollageConfig,
    date: NaiveDate,
) -> Result<CollageReport> {
    let layout = GridLayout::from_config(config);
    let font = load_caption_font(config.font_path.as_deref())?;
    if font.is_none() && !config.caption.is_empty() {
        tracing::warn!("No usable font found, the caption will be omitted");
    }

    let query = SearchQuery::new(config.sorting, config.order);
    let mut wallpapers = api.search_or_empty(&query).await;
    wallpapers.truncate(layout.capacity());
    tracing::info!(
        "Composing {}x{} collage from {} wallpapers",
        layout.grid_size,
        layout.grid_size,
        wallpapers.len()
    );

    let mut canvas = layout.blank_canvas();
    let mut summary = RunSummary::default();
    let pb = download_progress_bar(wallpapers.len() as u64);

    for (index, wallpaper) in wallpapers.iter().enumerate() {
        let tile = fetch_bytes(api.client(), &wallpaper.path)
            .await
            .and_then(|bytes| decode_image(&bytes))
            .map(|img| square_crop(&img, layout.tile_size));

        match tile {
            Ok(tile) => {
                layout.place(&mut canvas, index, &tile);
                summary.downloaded += 1;
            }
            Err(e) => {
                tracing::warn!(
                    "Leaving cell {:?} blank, {}: {}",
                    layout.cell(index),
                    wallpaper.path,
                    e
                );
                summary.failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    draw_title_bar(
        &mut canvas,
        config.bar_height,
        &config.caption,
        font.as_ref(),
        config.font_size,
    );

    ensure_directory(&config.output_dir)?;
    let output = output_path(&config.output_dir, date);
    save_jpeg(&canvas, &output, config.jpeg_quality)?;
    tracing::info!("Collage saved to {}", output.display());

    Ok(CollageReport { output, summary })
}

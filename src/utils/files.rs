use crate::error::{Error, Result};
use chrono::{FixedOffset, NaiveDate, Utc};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// Directory names are calendar dates in this format
pub const DATE_DIR_FORMAT: &str = "%Y-%m-%d";

/// Make sure an output directory exists
pub fn ensure_directory(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        tracing::info!("Created directory: {}", path.display());
    }
    Ok(())
}

/// Today's date as seen from a fixed UTC offset
pub fn today_at_offset(offset_hours: i32) -> NaiveDate {
    match FixedOffset::east_opt(offset_hours * 3600) {
        Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
        None => Utc::now().date_naive(),
    }
}

pub fn date_dir_name(date: NaiveDate) -> String {
    date.format(DATE_DIR_FORMAT).to_string()
}

/// Last path segment of an image URL, e.g. `wallhaven-abc123.jpg`
pub fn filename_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidUrl(format!("{}: no file name in path", url)))
}

/// Lower-cased extension of the URL's file name, `jpg` when there is none
pub fn extension_from_url(url: &str) -> String {
    filename_from_url(url)
        .ok()
        .and_then(|name| {
            Path::new(&name)
                .extension()
                .and_then(|ext| ext.to_str())
                .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
                .map(|ext| ext.to_ascii_lowercase())
        })
        .unwrap_or_else(|| "jpg".to_string())
}

/// Remove dated sub-directories of `base_dir` older than `keep_days`.
///
/// Entries whose names are not dates, and plain files, are ignored.
/// Returns the directories that were deleted.
pub fn sweep_expired_directories(
    base_dir: &Path,
    keep_days: i64,
    today: NaiveDate,
) -> io::Result<Vec<PathBuf>> {
    if !base_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries: Vec<PathBuf> = fs::read_dir(base_dir)?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            if entry.file_type().ok()?.is_dir() {
                Some(entry.path())
            } else {
                None
            }
        })
        .collect();

    let mut expired: Vec<PathBuf> = entries
        .into_par_iter()
        .filter(|dir| {
            dir.file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| NaiveDate::parse_from_str(name, DATE_DIR_FORMAT).ok())
                .map_or(false, |date| (today - date).num_days() > keep_days)
        })
        .collect();
    expired.sort();

    for dir in &expired {
        fs::remove_dir_all(dir)?;
        tracing::info!("Removed expired directory: {}", dir.display());
    }

    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_DIR_FORMAT).unwrap()
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://w.wallhaven.cc/full/ab/wallhaven-ab12cd.jpg").unwrap(),
            "wallhaven-ab12cd.jpg"
        );
        assert_eq!(
            filename_from_url("https://example.com/img/photo.png?size=large").unwrap(),
            "photo.png"
        );
        assert!(filename_from_url("https://example.com/").is_err());
        assert!(filename_from_url("not a url").is_err());
    }

    #[test]
    fn test_extension_from_url() {
        assert_eq!(extension_from_url("https://x.cc/full/a/wallhaven-1.PNG"), "png");
        assert_eq!(extension_from_url("https://x.cc/full/a/wallhaven-1.jpg"), "jpg");
        assert_eq!(extension_from_url("https://x.cc/full/a/noext"), "jpg");
        assert_eq!(extension_from_url("garbage"), "jpg");
    }

    #[test]
    fn test_date_dir_name() {
        assert_eq!(date_dir_name(date("2024-03-07")), "2024-03-07");
    }

    #[test]
    fn test_sweep_retention_boundary() {
        let base = tempfile::tempdir().unwrap();
        let today = date("2024-05-20");
        let keep_days = 7;

        let expired = base
            .path()
            .join(date_dir_name(today - Duration::days(keep_days + 1)));
        let boundary = base.path().join(date_dir_name(today - Duration::days(keep_days)));
        let current = base.path().join(date_dir_name(today));
        for dir in [&expired, &boundary, &current] {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(expired.join("wallhaven-1.jpg"), b"x").unwrap();
        fs::create_dir_all(expired.join("nested")).unwrap();
        fs::write(expired.join("nested/inner.jpg"), b"x").unwrap();

        let removed = sweep_expired_directories(base.path(), keep_days, today).unwrap();

        assert_eq!(removed, vec![expired.clone()]);
        assert!(!expired.exists());
        assert!(boundary.exists());
        assert!(current.exists());
    }

    #[test]
    fn test_sweep_ignores_non_date_entries() {
        let base = tempfile::tempdir().unwrap();
        let today = date("2024-05-20");

        let other = base.path().join("favourites");
        let almost = base.path().join("2020-13-45");
        fs::create_dir_all(&other).unwrap();
        fs::create_dir_all(&almost).unwrap();
        // a file named like a date is not a directory
        fs::write(base.path().join("2001-01-01"), b"x").unwrap();
        let future = base.path().join("2030-01-01");
        fs::create_dir_all(&future).unwrap();

        let removed = sweep_expired_directories(base.path(), 7, today).unwrap();

        assert!(removed.is_empty());
        assert!(other.exists());
        assert!(almost.exists());
        assert!(future.exists());
        assert!(base.path().join("2001-01-01").exists());
    }

    #[test]
    fn test_sweep_missing_base_dir() {
        let base = tempfile::tempdir().unwrap();
        let removed =
            sweep_expired_directories(&base.path().join("absent"), 7, date("2024-05-20")).unwrap();
        assert!(removed.is_empty());
    }
}

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Result of handling one image
#[derive(Debug)]
pub enum DownloadOutcome {
    Downloaded(PathBuf),
    /// Already present on disk, nothing fetched
    Skipped(PathBuf),
    Failed { url: String, reason: String },
}

/// Browser-like user agent; the image CDN rejects unknown clients
pub fn get_user_agent() -> &'static str {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
}

/// Build the shared HTTP client with the configured timeout and user agent
pub fn build_client(api: &ApiConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&api.user_agent)
        .timeout(Duration::from_secs(api.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a URL into memory, failing on non-success status
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = get_checked(client, url).await?;
    Ok(response.bytes().await?.to_vec())
}

async fn get_checked(client: &Client, url: &str) -> Result<Response> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            status,
            url: url.to_string(),
        });
    }
    Ok(response)
}

/// Download a URL to `target`, staging through a `.part` file.
pub async fn download_to_file(client: &Client, url: &str, target: &Path) -> DownloadOutcome {
    match try_download(client, url, target).await {
        Ok(()) => DownloadOutcome::Downloaded(target.to_path_buf()),
        Err(e) => DownloadOutcome::Failed {
            url: url.to_string(),
            reason: e.to_string(),
        },
    }
}

/// Same as [`download_to_file`] but leaves a non-empty existing file alone
pub async fn download_if_missing(client: &Client, url: &str, target: &Path) -> DownloadOutcome {
    let existing_len = tokio::fs::metadata(target).await.map(|m| m.len()).ok();
    match existing_len {
        Some(len) if len > 0 => DownloadOutcome::Skipped(target.to_path_buf()),
        Some(_) => {
            tracing::info!("Re-downloading empty file {}", target.display());
            download_to_file(client, url, target).await
        }
        None => download_to_file(client, url, target).await,
    }
}

async fn try_download(client: &Client, url: &str, target: &Path) -> Result<()> {
    let response = get_checked(client, url).await?;

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    // The .part file never outlives a failed attempt
    let part_path = part_path(target);
    let written = match stream_to_file(response, &part_path).await {
        Ok(written) => written,
        Err(e) => {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(e);
        }
    };
    if let Err(e) = tokio::fs::rename(&part_path, target).await {
        let _ = tokio::fs::remove_file(&part_path).await;
        return Err(e.into());
    }

    tracing::debug!("Saved {} ({} bytes)", target.display(), written);
    Ok(())
}

/// Write the body to `path` chunk by chunk as it arrives
async fn stream_to_file(mut response: Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

use crate::config::DailyConfig;
use crate::error::Result;
use crate::summary::{download_progress_bar, RunSummary};
use crate::utils::files::{
    date_dir_name, ensure_directory, filename_from_url, sweep_expired_directories,
};
use crate::utils::http::{download_if_missing, DownloadOutcome};
use crate::wallhaven::{SearchQuery, WallhavenApi};
use chrono::NaiveDate;
use std::path::PathBuf;

/// What a daily run did
#[derive(Debug)]
pub struct DailyReport {
    pub target_dir: PathBuf,
    pub summary: RunSummary,
    pub removed: Vec<PathBuf>,
}

/// Save the newest wallpapers under `<base_dir>/<today>/` and prune old days
pub async fn run_daily(
    api: &WallhavenApi,
    config: &DailyConfig,
    today: NaiveDate,
) -> Result<DailyReport> {
    let target_dir = config.base_dir.join(date_dir_name(today));
    tracing::info!("Saving daily wallpapers to {}", target_dir.display());

    let query = SearchQuery::new(config.sorting, config.order);
    let mut wallpapers = api.search_or_empty(&query).await;
    wallpapers.truncate(config.count);
    tracing::info!("Found {} wallpapers", wallpapers.len());

    ensure_directory(&target_dir)?;

    let mut summary = RunSummary::default();
    let pb = download_progress_bar(wallpapers.len() as u64);
    for wallpaper in &wallpapers {
        let outcome = match filename_from_url(&wallpaper.path) {
            Ok(name) => {
                tracing::debug!("Wallpaper {} -> {}", wallpaper.id, name);
                download_if_missing(api.client(), &wallpaper.path, &target_dir.join(name)).await
            }
            Err(e) => DownloadOutcome::Failed {
                url: wallpaper.path.clone(),
                reason: e.to_string(),
            },
        };
        summary.record(&outcome);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let removed = sweep_expired_directories(&config.base_dir, config.retention_days, today)?;
    if !removed.is_empty() {
        tracing::info!("Removed {} expired directories", removed.len());
    }

    Ok(DailyReport {
        target_dir,
        summary,
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::utils::files::DATE_DIR_FORMAT;
    use crate::utils::http::build_client;
    use std::fs;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_api(server: &MockServer) -> WallhavenApi {
        let api = ApiConfig {
            endpoint: format!("{}/api/v1/search", server.uri()),
            ..ApiConfig::default()
        };
        WallhavenApi::new(build_client(&api).unwrap(), &api)
    }

    async fn mount_search(server: &MockServer, names: &[&str]) {
        let data: Vec<_> = names
            .iter()
            .map(|name| {
                serde_json::json!({
                    "id": name,
                    "path": format!("{}/full/xx/{}", server.uri(), name),
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/api/v1/search"))
            .and(query_param("sorting", "date_added"))
            .and(query_param("order", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": data })))
            .mount(server)
            .await;
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_DIR_FORMAT).unwrap()
    }

    #[tokio::test]
    async fn test_daily_saves_count_and_is_idempotent() {
        let server = MockServer::start().await;
        let names = ["wallhaven-a.jpg", "wallhaven-b.png", "wallhaven-c.jpg"];
        mount_search(&server, &names).await;
        Mock::given(method("GET"))
            .and(path("/full/xx/wallhaven-a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"aaaa".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/full/xx/wallhaven-b.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bbbb".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/full/xx/wallhaven-c.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"cccc".to_vec()))
            .expect(0)
            .mount(&server)
            .await;

        let base = tempfile::tempdir().unwrap();
        let config = DailyConfig {
            count: 2,
            base_dir: base.path().to_path_buf(),
            ..DailyConfig::default()
        };
        let api = test_api(&server);
        let today = day("2024-06-01");

        let first = run_daily(&api, &config, today).await.unwrap();
        assert_eq!(first.summary.downloaded, 2);
        assert_eq!(first.target_dir, base.path().join("2024-06-01"));
        assert_eq!(
            fs::read(first.target_dir.join("wallhaven-a.jpg")).unwrap(),
            b"aaaa"
        );
        assert!(first.target_dir.join("wallhaven-b.png").exists());
        assert!(!first.target_dir.join("wallhaven-c.jpg").exists());

        // second run: everything already present, no new image requests
        let second = run_daily(&api, &config, today).await.unwrap();
        assert_eq!(second.summary.downloaded, 0);
        assert_eq!(second.summary.skipped, 2);
    }

    #[tokio::test]
    async fn test_daily_search_failure_still_prunes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let base = tempfile::tempdir().unwrap();
        let old = base.path().join("2024-05-01");
        let recent = base.path().join("2024-05-28");
        fs::create_dir_all(&old).unwrap();
        fs::create_dir_all(&recent).unwrap();

        let config = DailyConfig {
            base_dir: base.path().to_path_buf(),
            retention_days: 7,
            ..DailyConfig::default()
        };
        let report = run_daily(&test_api(&server), &config, day("2024-06-01"))
            .await
            .unwrap();

        assert_eq!(report.summary.total(), 0);
        assert_eq!(report.removed, vec![old.clone()]);
        assert!(!old.exists());
        assert!(recent.exists());
        assert!(report.target_dir.exists());
    }

    #[tokio::test]
    async fn test_daily_failed_item_does_not_abort_batch() {
        let server = MockServer::start().await;
        mount_search(&server, &["wallhaven-bad.jpg", "wallhaven-good.jpg"]).await;
        Mock::given(method("GET"))
            .and(path("/full/xx/wallhaven-bad.jpg"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/full/xx/wallhaven-good.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let base = tempfile::tempdir().unwrap();
        let config = DailyConfig {
            base_dir: base.path().to_path_buf(),
            ..DailyConfig::default()
        };
        let report = run_daily(&test_api(&server), &config, day("2024-06-01"))
            .await
            .unwrap();

        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.downloaded, 1);
        assert!(!report.target_dir.join("wallhaven-bad.jpg").exists());
        assert!(report.target_dir.join("wallhaven-good.jpg").exists());
    }
}

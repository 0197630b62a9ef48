use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::wallhaven::{SearchQuery, Wallpaper};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Vec<Wallpaper>,
}

/// Client for the wallpaper search endpoint
pub struct WallhavenApi {
    client: Client,
    endpoint: String,
    categories: String,
    purity: String,
}

impl WallhavenApi {
    pub fn new(client: Client, api: &ApiConfig) -> Self {
        Self {
            client,
            endpoint: api.endpoint.clone(),
            categories: api.categories.clone(),
            purity: api.purity.clone(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn query_pairs(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("categories", self.categories.clone()),
            ("purity", self.purity.clone()),
            ("sorting", query.sorting.as_str().to_string()),
            ("order", query.order.as_str().to_string()),
            ("page", query.page.to_string()),
        ];
        if let Some(keyword) = query.keyword.as_deref().filter(|k| !k.is_empty()) {
            pairs.push(("q", keyword.to_string()));
        }
        pairs
    }

    /// Issue one search request and return the items of the result page
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Wallpaper>> {
        tracing::debug!(
            "GET {} page={} sorting={}",
            self.endpoint,
            query.page,
            query.sorting.as_str()
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query_pairs(query))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status,
                url: response.url().to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;
        Ok(parsed.data)
    }

    /// Like [`search`](Self::search), but a failed request yields an empty list
    pub async fn search_or_empty(&self, query: &SearchQuery) -> Vec<Wallpaper> {
        match self.search(query).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Search request failed: {}", e);
                Vec::new()
            }
        }
    }
}

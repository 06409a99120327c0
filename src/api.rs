//! Layout API client
//!
//! Fetches the full layout snapshot the viewer starts from (and re-fetches
//! after a long sync outage). Shares the JSON types in `floorplan_types`.

use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use floorplan_types::ExhibitionLayout;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone)]
pub struct LayoutClient {
    client: reqwest::Client,
    base_url: Url,
}

impl LayoutClient {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Ok(Self::with_client(reqwest::Client::new(), Url::parse(base_url)?))
    }

    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn url(&self, path: &str) -> ApiResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    /// `{base}/api/exhibitions/{id}/layout`
    pub fn layout_url(&self, exhibition_id: Uuid) -> ApiResult<Url> {
        self.url(&format!("/api/exhibitions/{exhibition_id}/layout"))
    }

    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// Fetch the layout snapshot for one exhibition
    pub async fn fetch_layout(&self, exhibition_id: Uuid) -> ApiResult<ExhibitionLayout> {
        let url = self.layout_url(exhibition_id)?;
        tracing::debug!(%url, "fetching layout");
        let layout: ExhibitionLayout = self.get(url).await?;
        tracing::info!(
            exhibition_id = %layout.exhibition_id,
            halls = layout.halls.len(),
            stalls = layout.stall_count(),
            "layout fetched"
        );
        Ok(layout)
    }
}

pub mod error;
mod parse;

pub use error::{HumbleError, Result};
pub use parse::{parse_catalog, parse_detail};

use std::time::Duration;

use tracing::debug;

use bundlewatch_common::{BundleDetail, BundleSummary};

/// HTTP client for the storefront. Catalog and detail pages are rendered
/// client-side, so fetching goes through a Browserless `/content` endpoint
/// when one is configured; plain GET otherwise (useful against fixtures or
/// a pre-rendered mirror).
pub struct HumbleClient {
    client: reqwest::Client,
    base_url: String,
    renderer_url: Option<String>,
    renderer_token: Option<String>,
}

impl HumbleClient {
    pub fn new(base_url: &str, renderer_url: Option<&str>, renderer_token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            renderer_url: renderer_url.map(|u| u.trim_end_matches('/').to_string()),
            renderer_token: renderer_token.map(String::from),
        }
    }

    /// Scrape one catalog category page into bundle summaries.
    pub async fn catalog(&self, category: &str) -> Result<Vec<BundleSummary>> {
        let page_url = format!("{}/{}", self.base_url, category);
        let html = self.content(&page_url).await?;
        parse_catalog(&html, &page_url, category)
    }

    /// Scrape one bundle's detail page.
    pub async fn bundle(&self, summary: &BundleSummary) -> Result<BundleDetail> {
        let html = self.content(&summary.id).await?;
        parse_detail(&html, summary)
    }

    /// Fetch rendered HTML for a URL.
    async fn content(&self, url: &str) -> Result<String> {
        match &self.renderer_url {
            Some(renderer) => self.rendered_content(renderer, url).await,
            None => self.direct_content(url).await,
        }
    }

    /// Fetch fully-rendered HTML via a Browserless /content endpoint.
    async fn rendered_content(&self, renderer: &str, url: &str) -> Result<String> {
        let mut endpoint = format!("{renderer}/content");
        if let Some(ref token) = self.renderer_token {
            endpoint.push_str(&format!("?token={token}"));
        }
        debug!(url, "Fetching via renderer");

        let body = serde_json::json!({ "url": url });

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(HumbleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }

    async fn direct_content(&self, url: &str) -> Result<String> {
        debug!(url, "Fetching directly");
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(HumbleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}

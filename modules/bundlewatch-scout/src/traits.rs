// Trait abstractions for the pipeline's external collaborators.
//
// BundleSource — the extraction session (catalog listing + detail pages).
// Ledger — the dedup store.
// WebhookTransport — the HTTP leg of dispatch.
//
// These enable deterministic testing with MockSource, MockLedger and
// MockTransport: no network, no database, no Docker.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use bundlewatch_common::{BundleDetail, BundleSummary};
use bundlewatch_store::Store;
use humble_client::HumbleClient;

use crate::dispatch::WebhookBody;

// ---------------------------------------------------------------------------
// BundleSource — the extraction session
// ---------------------------------------------------------------------------

#[async_trait]
pub trait BundleSource: Send + Sync {
    /// Produce the current catalog snapshot, page order preserved.
    /// Called once per run; any failure aborts the run — no partial
    /// catalog is trusted.
    async fn list_summaries(&self) -> Result<Vec<BundleSummary>>;

    /// Fetch one bundle's detail record. Called once per novel bundle,
    /// strictly sequentially; a failure skips that bundle only.
    async fn fetch_detail(&self, summary: &BundleSummary) -> Result<BundleDetail>;
}

/// The storefront session: one `HumbleClient` walking the configured
/// category pages.
pub struct HumbleSource {
    client: HumbleClient,
    categories: Vec<String>,
}

impl HumbleSource {
    pub fn new(client: HumbleClient, categories: Vec<String>) -> Self {
        Self { client, categories }
    }
}

#[async_trait]
impl BundleSource for HumbleSource {
    async fn list_summaries(&self) -> Result<Vec<BundleSummary>> {
        let mut summaries = Vec::new();
        for category in &self.categories {
            summaries.extend(self.client.catalog(category).await?);
        }
        Ok(summaries)
    }

    async fn fetch_detail(&self, summary: &BundleSummary) -> Result<BundleDetail> {
        Ok(self.client.bundle(summary).await?)
    }
}

// ---------------------------------------------------------------------------
// Ledger — dedup store
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Bundle ids already processed.
    async fn pushed(&self) -> Result<HashSet<String>>;

    /// Record a bundle as processed. Must be idempotent: recording an
    /// already-present id is success, not an error.
    async fn commit(&self, bundle_id: &str, category: &str) -> Result<()>;

    /// Remove a bundle that left the catalog. Must be idempotent: a
    /// missing row is success, not an error.
    async fn prune(&self, bundle_id: &str) -> Result<()>;
}

#[async_trait]
impl Ledger for Store {
    async fn pushed(&self) -> Result<HashSet<String>> {
        Ok(Store::pushed(self).await?)
    }

    async fn commit(&self, bundle_id: &str, category: &str) -> Result<()> {
        Ok(Store::commit(self, bundle_id, category).await?)
    }

    async fn prune(&self, bundle_id: &str) -> Result<()> {
        Ok(Store::prune(self, bundle_id).await?)
    }
}

// ---------------------------------------------------------------------------
// WebhookTransport — HTTP leg of dispatch
// ---------------------------------------------------------------------------

#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Deliver one rendered body to one endpoint. Non-2xx is an error.
    async fn deliver(&self, endpoint: &str, body: &WebhookBody) -> Result<()>;
}

// Test mocks for the pipeline.
//
// Three mocks matching the three trait boundaries:
// - MockSource (BundleSource) — fixed snapshot + HashMap id→detail
// - MockLedger (Ledger) — stateful in-memory ledger
// - MockTransport (WebhookTransport) — records every delivery
//
// All state is behind Arc so a clone kept by the test observes what the
// Scout did after the run.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use bundlewatch_common::{
    BundleDetail, BundleSummary, MentionPolicy, OfferOffset, WebhookSubscriber,
};

use crate::dispatch::WebhookBody;
use crate::traits::{BundleSource, Ledger, WebhookTransport};

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

pub fn summary(id: &str, category: &str) -> BundleSummary {
    BundleSummary {
        id: id.to_string(),
        title: format!("Bundle {id}"),
        category: category.to_string(),
    }
}

pub fn detail(summary: &BundleSummary, items: &[&str]) -> BundleDetail {
    BundleDetail {
        summary: summary.clone(),
        image_url: format!("{}/logo.png", summary.id),
        price_text: "$10".to_string(),
        currency_symbol: "$".to_string(),
        offer_offset: OfferOffset { days: 2, hours: 0, minutes: 0 },
        items: items.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn subscriber(endpoint: &str, categories: &[&str], mention: MentionPolicy) -> WebhookSubscriber {
    WebhookSubscriber {
        endpoint: endpoint.to_string(),
        mention,
        categories: categories.iter().map(|c| c.to_string()).collect(),
        currency: "$".to_string(),
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Fixed-snapshot bundle source. Returns `Err` for unregistered details.
/// Builder pattern: `.with_bundle()`, `.failing_listing()`,
/// `.failing_detail()`.
#[derive(Clone, Default)]
pub struct MockSource {
    summaries: Vec<BundleSummary>,
    details: HashMap<String, BundleDetail>,
    fail_listing: bool,
    fail_details: HashSet<String>,
    list_calls: Arc<Mutex<u32>>,
    detail_calls: Arc<Mutex<Vec<String>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog tile together with its detail page.
    pub fn with_bundle(mut self, summary: BundleSummary, detail: BundleDetail) -> Self {
        self.details.insert(summary.id.clone(), detail);
        self.summaries.push(summary);
        self
    }

    /// Register a catalog tile whose detail fetch fails.
    pub fn failing_detail(mut self, summary: BundleSummary) -> Self {
        self.fail_details.insert(summary.id.clone());
        self.summaries.push(summary);
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn list_calls(&self) -> u32 {
        *self.list_calls.lock().unwrap()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BundleSource for MockSource {
    async fn list_summaries(&self) -> Result<Vec<BundleSummary>> {
        *self.list_calls.lock().unwrap() += 1;
        if self.fail_listing {
            bail!("MockSource: listing failure");
        }
        Ok(self.summaries.clone())
    }

    async fn fetch_detail(&self, summary: &BundleSummary) -> Result<BundleDetail> {
        self.detail_calls.lock().unwrap().push(summary.id.clone());
        if self.fail_details.contains(&summary.id) {
            bail!("MockSource: detail failure for {}", summary.id);
        }
        self.details
            .get(&summary.id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockSource: no detail registered for {}", summary.id))
    }
}

// ---------------------------------------------------------------------------
// MockLedger
// ---------------------------------------------------------------------------

/// Stateful in-memory ledger with idempotent commit/prune semantics.
#[derive(Clone, Default)]
pub struct MockLedger {
    entries: Arc<Mutex<HashMap<String, String>>>,
    commit_calls: Arc<Mutex<u32>>,
    prune_calls: Arc<Mutex<u32>>,
    fail_commits: HashSet<String>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger with already-processed bundle ids.
    pub fn seeded(ids: &[(&str, &str)]) -> Self {
        let ledger = Self::default();
        {
            let mut entries = ledger.entries.lock().unwrap();
            for (id, category) in ids {
                entries.insert(id.to_string(), category.to_string());
            }
        }
        ledger
    }

    /// Make commits for one bundle id fail.
    pub fn failing_commit(mut self, bundle_id: &str) -> Self {
        self.fail_commits.insert(bundle_id.to_string());
        self
    }

    pub fn ids(&self) -> HashSet<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    pub fn commit_calls(&self) -> u32 {
        *self.commit_calls.lock().unwrap()
    }

    pub fn prune_calls(&self) -> u32 {
        *self.prune_calls.lock().unwrap()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn pushed(&self) -> Result<HashSet<String>> {
        Ok(self.ids())
    }

    async fn commit(&self, bundle_id: &str, category: &str) -> Result<()> {
        *self.commit_calls.lock().unwrap() += 1;
        if self.fail_commits.contains(bundle_id) {
            bail!("MockLedger: commit failure for {bundle_id}");
        }
        // Conflict is a no-op success.
        self.entries
            .lock()
            .unwrap()
            .entry(bundle_id.to_string())
            .or_insert_with(|| category.to_string());
        Ok(())
    }

    async fn prune(&self, bundle_id: &str) -> Result<()> {
        *self.prune_calls.lock().unwrap() += 1;
        self.entries.lock().unwrap().remove(bundle_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

/// Records every delivery attempt; selected endpoints can be made to fail.
#[derive(Clone, Default)]
pub struct MockTransport {
    delivered: Arc<Mutex<Vec<(String, WebhookBody)>>>,
    fail_endpoints: HashSet<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, endpoint: &str) -> Self {
        self.fail_endpoints.insert(endpoint.to_string());
        self
    }

    /// All successful deliveries, in completion order.
    pub fn delivered(&self) -> Vec<(String, WebhookBody)> {
        self.delivered.lock().unwrap().clone()
    }

    /// Endpoints that received a given bundle, identified by the embed URL.
    pub fn endpoints_for(&self, bundle_id: &str) -> HashSet<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, body)| {
                body.embeds
                    .first()
                    .and_then(|e| e.url.as_deref())
                    .is_some_and(|u| u == bundle_id)
            })
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }
}

#[async_trait]
impl WebhookTransport for MockTransport {
    async fn deliver(&self, endpoint: &str, body: &WebhookBody) -> Result<()> {
        if self.fail_endpoints.contains(endpoint) {
            bail!("MockTransport: delivery failure for {endpoint}");
        }
        self.delivered
            .lock()
            .unwrap()
            .push((endpoint.to_string(), body.clone()));
        Ok(())
    }
}

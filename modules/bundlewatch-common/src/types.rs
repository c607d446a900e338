use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tile from the storefront catalog page. Ephemeral, produced per run.
///
/// `id` is the bundle URL with the query string stripped, so two tiles that
/// differ only by tracking parameters resolve to the same bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSummary {
    pub id: String,
    pub title: String,
    pub category: String,
}

/// Countdown shown on a bundle's detail page. All components default to
/// zero when the page omits them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferOffset {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
}

/// Everything scraped from one bundle's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDetail {
    pub summary: BundleSummary,
    pub image_url: String,
    /// Currency-prefixed price string as it appears on the page.
    pub price_text: String,
    /// Currency symbol read from the page per-run, never hardcoded.
    pub currency_symbol: String,
    pub offer_offset: OfferOffset,
    /// Item titles in page order.
    pub items: Vec<String>,
}

/// How a subscriber wants to be mentioned when a bundle lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionPolicy {
    None,
    Everyone,
    Here,
    Role(String),
}

impl MentionPolicy {
    /// Parse the nullable `ping` column. Any value outside the enumerated
    /// set is a role identifier.
    pub fn from_ping(ping: Option<&str>) -> Self {
        match ping {
            None | Some("") | Some("none") => MentionPolicy::None,
            Some("everyone") => MentionPolicy::Everyone,
            Some("here") => MentionPolicy::Here,
            Some(role) => MentionPolicy::Role(role.to_string()),
        }
    }

    /// Render the mention text that goes into the message `content` field.
    pub fn mention_text(&self) -> String {
        match self {
            MentionPolicy::None => String::new(),
            MentionPolicy::Everyone => "@everyone".to_string(),
            MentionPolicy::Here => "@here".to_string(),
            MentionPolicy::Role(id) => format!("<@&{id}>"),
        }
    }
}

/// A registered webhook endpoint. Owned and mutated only by the
/// registration API; the pipeline treats it as read-only for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSubscriber {
    pub endpoint: String,
    pub mention: MentionPolicy,
    pub categories: HashSet<String>,
    pub currency: String,
}

/// Rendered notification for one bundle, built once and cloned per
/// subscriber with a resolved mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title_text: String,
    pub url: String,
    pub image_url: String,
    pub expiry_relative_text: String,
    pub expiry_absolute_text: String,
    pub price_line: String,
    pub items_line: String,
    pub category_label: String,
}

/// One row of the dedup ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub bundle_id: String,
    pub category: String,
    pub first_seen_at: DateTime<Utc>,
}

/// Strip the query string from a bundle URL so tracking parameters don't
/// split one bundle into many ledger identities.
pub fn normalize_bundle_url(raw: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(raw) else {
        return raw.split('?').next().unwrap_or(raw).to_string();
    };
    parsed.set_query(None);
    parsed.set_fragment(None);
    parsed.to_string()
}

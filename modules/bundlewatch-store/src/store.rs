// Postgres persistence for the ledger and the subscriber directory.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::warn;

use bundlewatch_common::{LedgerEntry, MentionPolicy, WebhookSubscriber};

use crate::error::Result;

/// Webhook endpoints must live under the notification platform's webhook
/// namespace.
const WEBHOOK_PREFIX: &str = "https://discord.com/api/webhooks/";

/// Outcome of registering a new subscriber endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Added,
    Duplicate,
    InvalidUrl,
}

/// Outcome of removing a subscriber endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// A row from the `webhooks` table, before boundary validation.
#[derive(Debug, Clone, sqlx::FromRow)]
struct WebhookRow {
    url: String,
    currency: String,
    ping: Option<String>,
    categories: Vec<String>,
}

/// A row from the `pushed_bundles` ledger.
#[derive(Debug, Clone, sqlx::FromRow)]
struct LedgerRow {
    bundle: String,
    category: String,
    first_seen_at: DateTime<Utc>,
}

pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // --- Ledger ---

    /// All ledger entries, validated into typed records.
    pub async fn ledger(&self) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            "SELECT bundle, category, first_seen_at FROM pushed_bundles",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LedgerEntry {
                bundle_id: r.bundle,
                category: r.category,
                first_seen_at: r.first_seen_at,
            })
            .collect())
    }

    /// Bundle ids already processed, for dedup.
    pub async fn pushed(&self) -> Result<HashSet<String>> {
        Ok(self.ledger().await?.into_iter().map(|e| e.bundle_id).collect())
    }

    /// Record a bundle as processed. Re-recording the same bundle is a
    /// no-op, not an error, so re-runs are safe.
    pub async fn commit(&self, bundle_id: &str, category: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO pushed_bundles (bundle, category) VALUES ($1, $2) \
             ON CONFLICT (bundle) DO NOTHING",
        )
        .bind(bundle_id)
        .bind(category)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Drop a ledger entry for a bundle that left the catalog. Deleting a
    /// missing row is a no-op.
    pub async fn prune(&self, bundle_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM pushed_bundles WHERE bundle = $1")
            .bind(bundle_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- Subscribers ---

    /// Load all registered subscribers. Malformed rows are logged and
    /// skipped rather than propagated into the pipeline.
    pub async fn subscribers(&self) -> Result<Vec<WebhookSubscriber>> {
        let rows = sqlx::query_as::<_, WebhookRow>(
            "SELECT url, currency, ping, categories FROM webhooks ORDER BY url",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut subscribers = Vec::with_capacity(rows.len());
        for row in rows {
            if row.url.is_empty() || !row.url.starts_with("https://") {
                warn!(url = %row.url, "Skipping malformed webhook row");
                continue;
            }
            subscribers.push(WebhookSubscriber {
                endpoint: row.url,
                mention: MentionPolicy::from_ping(row.ping.as_deref()),
                categories: row.categories.into_iter().collect(),
                currency: row.currency,
            });
        }
        Ok(subscribers)
    }

    /// Register a webhook endpoint. A duplicate URL maps to
    /// `RegisterOutcome::Duplicate` rather than an error.
    pub async fn add_subscriber(
        &self,
        url: &str,
        currency: &str,
        ping: Option<&str>,
        categories: &[String],
    ) -> Result<RegisterOutcome> {
        if !is_valid_webhook_url(url) {
            return Ok(RegisterOutcome::InvalidUrl);
        }

        let result = sqlx::query(
            "INSERT INTO webhooks (url, currency, ping, categories) VALUES ($1, $2, $3, $4)",
        )
        .bind(url)
        .bind(currency)
        .bind(ping)
        .bind(categories)
        .execute(&self.pool)
        .await;

        register_outcome(result.map(|_| ()))
    }

    pub async fn remove_subscriber(&self, url: &str) -> Result<RemoveOutcome> {
        let result = sqlx::query("DELETE FROM webhooks WHERE url = $1")
            .bind(url)
            .execute(&self.pool)
            .await?;

        Ok(remove_outcome(result.rows_affected()))
    }
}

/// Map an insert result to a registration outcome. A unique violation on
/// the url column means the endpoint is already registered; any other
/// database error propagates.
fn register_outcome(result: std::result::Result<(), sqlx::Error>) -> Result<RegisterOutcome> {
    match result {
        Ok(()) => Ok(RegisterOutcome::Added),
        Err(e) if is_unique_violation(&e) => Ok(RegisterOutcome::Duplicate),
        Err(e) => Err(e.into()),
    }
}

fn remove_outcome(rows_affected: u64) -> RemoveOutcome {
    if rows_affected == 0 {
        RemoveOutcome::NotFound
    } else {
        RemoveOutcome::Removed
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

fn is_valid_webhook_url(url: &str) -> bool {
    url.starts_with(WEBHOOK_PREFIX)
}

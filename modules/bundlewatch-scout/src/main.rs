use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use bundlewatch_common::{CancelFlag, Config};
use bundlewatch_scout::dispatch::{DispatchEngine, HttpTransport};
use bundlewatch_scout::logging::default_log_filter;
use bundlewatch_scout::scout::Scout;
use bundlewatch_scout::traits::HumbleSource;
use bundlewatch_store::Store;
use humble_client::HumbleClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(default_log_filter()?)
        .init();

    info!("BundleWatch starting...");

    // Load config
    let config = Config::from_env();
    config.log_redacted();

    // One storage connection for the run, released on every exit path.
    let store = Store::connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;
    store.migrate().await.context("Failed to run migrations")?;

    let subscribers = store.subscribers().await?;
    info!(subscribers = subscribers.len(), "Loaded webhook subscribers");

    // One extraction session for the run.
    let client = HumbleClient::new(
        &config.catalog_base_url,
        config.browserless_url.as_deref(),
        config.browserless_token.as_deref(),
    );
    let source = HumbleSource::new(client, config.catalog_categories.clone());

    let engine = DispatchEngine::new(
        Arc::new(HttpTransport::new()),
        config.dispatch_concurrency,
        config.webhook_username.clone(),
        config.webhook_avatar_url.clone(),
    );

    // Ctrl-C cancels between queue items, never mid-dispatch-batch.
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received, finishing the current bundle then stopping");
                cancel.cancel();
            }
        });
    }

    let scout = Scout::new(
        Box::new(source),
        Box::new(store),
        engine,
        subscribers,
        cancel,
    );

    let stats = tokio::time::timeout(
        Duration::from_secs(config.run_timeout_secs),
        scout.run(),
    )
    .await
    .context("Run exceeded RUN_TIMEOUT_SECS")??;

    info!(committed = stats.committed, pruned = stats.pruned, "All done");
    Ok(())
}

use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Storefront
    pub catalog_base_url: String,
    /// Catalog categories to scan, e.g. ["games", "books"].
    pub catalog_categories: Vec<String>,

    // Optional JS renderer (Browserless /content endpoint)
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,

    // Dispatch
    pub dispatch_concurrency: usize,
    pub webhook_username: String,
    pub webhook_avatar_url: String,

    // Run bounds
    pub run_timeout_secs: u64,
}

const DEFAULT_CATALOG_BASE: &str = "https://www.humblebundle.com";
const DEFAULT_USERNAME: &str = "Humble Bundle";
const DEFAULT_AVATAR_URL: &str =
    "https://cdn.freebiesupply.com/logos/large/2x/humblebundle-logo-png-transparent.png";

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            catalog_base_url: env::var("CATALOG_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_CATALOG_BASE.to_string()),
            catalog_categories: env::var("CATALOG_CATEGORIES")
                .unwrap_or_else(|_| "games".to_string())
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            browserless_url: env::var("BROWSERLESS_URL").ok(),
            browserless_token: env::var("BROWSERLESS_TOKEN").ok(),
            dispatch_concurrency: env::var("DISPATCH_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .expect("DISPATCH_CONCURRENCY must be a number"),
            webhook_username: env::var("WEBHOOK_USERNAME")
                .unwrap_or_else(|_| DEFAULT_USERNAME.to_string()),
            webhook_avatar_url: env::var("WEBHOOK_AVATAR_URL")
                .unwrap_or_else(|_| DEFAULT_AVATAR_URL.to_string()),
            run_timeout_secs: env::var("RUN_TIMEOUT_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .expect("RUN_TIMEOUT_SECS must be a number"),
        }
    }

    /// Log the loaded configuration without leaking the database password.
    pub fn log_redacted(&self) {
        tracing::info!(
            catalog = %self.catalog_base_url,
            categories = ?self.catalog_categories,
            renderer = self.browserless_url.as_deref().unwrap_or("direct"),
            dispatch_concurrency = self.dispatch_concurrency,
            run_timeout_secs = self.run_timeout_secs,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

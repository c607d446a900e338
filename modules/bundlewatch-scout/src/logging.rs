use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Crates whose info-level output is on by default. `RUST_LOG` still
/// overrides everything.
const DEFAULT_TARGETS: &[&str] = &[
    "bundlewatch_scout",
    "bundlewatch_store",
    "bundlewatch_common",
    "humble_client",
];

pub fn default_log_filter() -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();
    for target in DEFAULT_TARGETS {
        filter = filter.add_directive(format!("{target}=info").parse()?);
    }
    Ok(filter)
}

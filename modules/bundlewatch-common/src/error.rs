use thiserror::Error;

/// Error taxonomy for a watcher run.
///
/// Only `Extraction` aborts a run. `DetailFetch` skips one bundle,
/// `Dispatch` skips one subscriber, `Persistence` leaves the bundle
/// unprocessed for this run; all three self-heal on the next scheduled
/// run. A ledger conflict never surfaces here — it is an idempotent
/// no-op at the store.
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Catalog extraction failed: {0}")]
    Extraction(String),

    #[error("Detail fetch failed for {bundle_id}: {message}")]
    DetailFetch { bundle_id: String, message: String },

    #[error("Dispatch to {endpoint} failed: {message}")]
    Dispatch { endpoint: String, message: String },

    #[error("Persistence error: {0}")]
    Persistence(String),
}

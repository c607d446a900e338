use std::collections::HashSet;

use bundlewatch_common::BundleSummary;

/// Result of comparing the current catalog snapshot against the ledger.
#[derive(Debug, Clone, Default)]
pub struct CatalogDiff {
    /// Snapshot bundles not yet in the ledger, snapshot order preserved.
    pub novel: Vec<BundleSummary>,
    /// Ledger ids no longer in the snapshot. Sorted for deterministic
    /// prune order.
    pub expired: Vec<String>,
}

/// Pure diff of snapshot vs ledger. Pruning of `expired` always runs
/// before `novel` processing.
///
/// Bundle ids are unique within the result: a tile listed on more than one
/// category page keeps its first occurrence only, so one bundle is never
/// queued twice in a run.
pub fn diff(snapshot: &[BundleSummary], pushed: &HashSet<String>) -> CatalogDiff {
    let current_ids: HashSet<&str> = snapshot.iter().map(|s| s.id.as_str()).collect();

    let mut expired: Vec<String> = pushed
        .iter()
        .filter(|id| !current_ids.contains(id.as_str()))
        .cloned()
        .collect();
    expired.sort();

    let mut seen: HashSet<&str> = HashSet::new();
    let novel = snapshot
        .iter()
        .filter(|s| !pushed.contains(&s.id) && seen.insert(s.id.as_str()))
        .cloned()
        .collect();

    CatalogDiff { novel, expired }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str) -> BundleSummary {
        BundleSummary {
            id: id.to_string(),
            title: id.to_string(),
            category: "games".to_string(),
        }
    }

    #[test]
    fn splits_novel_and_expired() {
        let snapshot = vec![summary("a"), summary("b")];
        let pushed: HashSet<String> = ["b".to_string(), "c".to_string()].into();

        let diff = diff(&snapshot, &pushed);
        assert_eq!(diff.novel.len(), 1);
        assert_eq!(diff.novel[0].id, "a");
        assert_eq!(diff.expired, vec!["c".to_string()]);
    }

    #[test]
    fn preserves_snapshot_order_for_novel() {
        let snapshot = vec![summary("z"), summary("a"), summary("m")];
        let pushed = HashSet::new();

        let diff = diff(&snapshot, &pushed);
        let ids: Vec<&str> = diff.novel.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn unchanged_catalog_yields_empty_diff() {
        let snapshot = vec![summary("a"), summary("b")];
        let pushed: HashSet<String> = ["a".to_string(), "b".to_string()].into();

        let diff = diff(&snapshot, &pushed);
        assert!(diff.novel.is_empty());
        assert!(diff.expired.is_empty());
    }

    #[test]
    fn duplicate_snapshot_ids_collapse_to_one_novel_entry() {
        let mut cross_listed = summary("a");
        cross_listed.category = "books".to_string();
        let snapshot = vec![summary("a"), cross_listed, summary("b")];

        let diff = diff(&snapshot, &HashSet::new());
        let ids: Vec<&str> = diff.novel.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        // First occurrence wins.
        assert_eq!(diff.novel[0].category, "games");
    }

    #[test]
    fn empty_snapshot_expires_everything() {
        let pushed: HashSet<String> = ["a".to_string(), "b".to_string()].into();
        let diff = diff(&[], &pushed);
        assert!(diff.novel.is_empty());
        assert_eq!(diff.expired, vec!["a".to_string(), "b".to_string()]);
    }
}

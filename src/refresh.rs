//! Refresh orchestration: the timer gate and concurrent blame seeding.
//!
//! A refresh is "seed every visible document, then recompute and apply
//! buckets". Seeding is the only part that suspends; it runs off the event
//! loop and hands its results back as a batch.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::document::DocumentId;
use crate::history::{BlameLine, HistoryProvider};

/// Whether a refresh started by the timer is still in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshGate {
    #[default]
    Idle,
    Refreshing,
}

impl RefreshGate {
    /// Move to `Refreshing`. Returns false (and changes nothing) when a
    /// refresh is already running; the caller drops its tick.
    pub fn try_begin(&mut self) -> bool {
        match self {
            RefreshGate::Idle => {
                *self = RefreshGate::Refreshing;
                true
            }
            RefreshGate::Refreshing => false,
        }
    }

    pub fn finish(&mut self) {
        *self = RefreshGate::Idle;
    }

    pub fn is_refreshing(&self) -> bool {
        *self == RefreshGate::Refreshing
    }
}

/// One document to blame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedTarget {
    pub id: DocumentId,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedResult {
    pub id: DocumentId,
    pub lines: Vec<BlameLine>,
}

/// Work the event loop should start on behalf of a refresh trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Started by the timer, so the gate must be released on completion.
    pub scheduled: bool,
    pub targets: Vec<SeedTarget>,
}

impl RefreshRequest {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Blame every target concurrently. Results come back in target order; a
/// task that panics is logged and contributes an empty result.
pub async fn collect_seeds<H: HistoryProvider>(history: Arc<H>, targets: Vec<SeedTarget>) -> Vec<SeedResult> {
    let mut set = JoinSet::new();
    for (slot, target) in targets.iter().enumerate() {
        let history = Arc::clone(&history);
        let path = target.path.clone();
        set.spawn(async move { (slot, history.blame(&path).await) });
    }

    let mut lines: Vec<Vec<BlameLine>> = vec![Vec::new(); targets.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((slot, blame)) => lines[slot] = blame,
            Err(e) => tracing::warn!(error = %e, "blame task failed"),
        }
    }

    targets
        .into_iter()
        .zip(lines)
        .map(|(target, lines)| SeedResult { id: target.id, lines })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::RevisionId;
    use std::path::Path;
    use std::time::Duration;

    /// Answers with one line per path component, slowest for the first path.
    struct Components;

    impl HistoryProvider for Components {
        async fn blame(&self, path: &Path) -> Vec<BlameLine> {
            let n = path.components().count();
            tokio::time::sleep(Duration::from_millis(20 / n as u64)).await;
            (0..n)
                .map(|i| BlameLine::new(Some(RevisionId::from("abc")), Some(i as i64)))
                .collect()
        }
    }

    fn target(path: &str) -> SeedTarget {
        SeedTarget {
            id: DocumentId::for_path(Path::new(path)),
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn gate_drops_overlapping_ticks() {
        let mut gate = RefreshGate::default();
        assert!(gate.try_begin());
        assert!(gate.is_refreshing());
        assert!(!gate.try_begin());
        gate.finish();
        assert!(!gate.is_refreshing());
        assert!(gate.try_begin());
    }

    #[tokio::test]
    async fn seeds_come_back_in_target_order() {
        let targets = vec![target("/a"), target("/a/b"), target("/a/b/c")];
        let results = collect_seeds(Arc::new(Components), targets.clone()).await;
        assert_eq!(results.len(), 3);
        for (result, target) in results.iter().zip(&targets) {
            assert_eq!(result.id, target.id);
        }
        assert_eq!(results[0].lines.len(), 2);
        assert_eq!(results[2].lines.len(), 4);
    }

    #[tokio::test]
    async fn no_targets_no_work() {
        assert!(collect_seeds(Arc::new(Components), Vec::new()).await.is_empty());
        assert!(RefreshRequest::default().is_empty());
    }
}

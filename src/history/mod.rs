pub mod git;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Opaque revision identifier (a commit hash for git).
pub type RevisionId = Arc<str>;

/// Attribution of one source line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlameLine {
    pub revision: Option<RevisionId>,
    pub timestamp_ms: Option<i64>,
}

impl BlameLine {
    pub fn new(revision: Option<RevisionId>, timestamp_ms: Option<i64>) -> Self {
        Self {
            revision,
            timestamp_ms,
        }
    }
}

/// Source of per-line history.
/// Implement this to read history from something other than the `git` CLI.
pub trait HistoryProvider: Send + Sync + 'static {
    /// Per-line attribution for `path`, in file line order. Never fails:
    /// any problem yields an empty vector.
    fn blame(&self, path: &Path) -> impl Future<Output = Vec<BlameLine>> + Send;
}

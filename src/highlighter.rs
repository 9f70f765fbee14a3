//! The decoration pipeline: configuration snapshot, palette and line-age
//! store, driven by host events.
//!
//! Every method here is synchronous and runs to completion; the only
//! asynchronous work (blame) happens elsewhere and arrives through
//! [`Highlighter::apply_seed`].

use std::sync::Arc;

use crate::config::Config;
use crate::decorations::{DecorationHost, LineRange};
use crate::document::{Document, DocumentId, TextEdit};
use crate::history::BlameLine;
use crate::ranker;
use crate::refresh::SeedTarget;
use crate::store::{LineAgeStore, LineAges};
use crate::styles::Palette;

/// Wall-clock time in epoch milliseconds, the unit every line stamp uses.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug)]
pub struct Highlighter {
    config: Arc<Config>,
    palette: Palette,
    store: LineAgeStore,
}

impl Highlighter {
    pub fn new(config: Config, host: &mut impl DecorationHost) -> Self {
        let palette = Palette::build(&config, host);
        Self {
            config: Arc::new(config),
            palette,
            store: LineAgeStore::new(),
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn store(&self) -> &LineAgeStore {
        &self.store
    }

    /// Swap in a new configuration and rebuild the palette. The new bank is
    /// registered before the old one is released, so there is never a
    /// moment without a complete palette.
    pub fn on_config_changed(&mut self, config: Config, host: &mut impl DecorationHost) {
        let fresh = Palette::build(&config, host);
        let mut old = std::mem::replace(&mut self.palette, fresh);
        old.dispose(host);
        if config.debug_logging {
            let color = |index| self.palette.bucket_at(index).map(|b| b.color.to_css());
            tracing::debug!(
                oldest = ?color(1),
                newest = ?color(self.palette.bucket_count()),
                "palette rebuilt"
            );
        }
        self.config = Arc::new(config);
    }

    /// Track `doc` if it lives on disk. Returns true when it still needs a
    /// blame seed.
    pub fn ensure_tracked(&mut self, doc: &Document) -> bool {
        if doc.path().is_none() {
            return false;
        }
        self.store.ensure_tracked(doc.id(), doc.line_count())
    }

    /// Record an edit batch that has already been applied to `doc`.
    /// Ignored while disabled and for documents without a path.
    pub fn on_document_changed(&mut self, doc: &Document, edits: &[TextEdit], now_ms: i64) -> bool {
        if !self.config.enabled || doc.path().is_none() || edits.is_empty() {
            return false;
        }
        self.store
            .apply_edits(doc.id(), edits, doc.line_count(), now_ms);
        true
    }

    /// What to blame for `doc`, if seeding applies to it right now.
    pub fn seed_target(&self, doc: &Document) -> Option<SeedTarget> {
        if !self.config.use_git_blame {
            return None;
        }
        doc.path().map(|path| SeedTarget {
            id: doc.id().clone(),
            path: path.to_path_buf(),
        })
    }

    /// Replace `doc`'s ages with blame data. Skipped when seeding is turned
    /// off; an empty blame leaves the existing ages in place.
    pub fn apply_seed(&mut self, doc: &Document, blame: &[BlameLine]) {
        if !self.config.use_git_blame || doc.path().is_none() {
            return;
        }
        let debug = self.config.debug_logging;
        if debug {
            tracing::debug!(document = %doc.id(), lines = blame.len(), "blame");
        }
        if blame.is_empty() {
            if debug {
                tracing::debug!(document = %doc.id(), "no blame data returned");
            }
            return;
        }
        let outcome = self
            .store
            .replace_from_blame(doc.id(), blame, doc.line_count());
        if debug && outcome.mismatched() {
            tracing::debug!(
                document = %doc.id(),
                doc_lines = outcome.document_lines,
                blame_lines = outcome.blame_lines,
                "line count mismatch (tolerated)"
            );
        }
    }

    /// Recompute and apply decorations for `doc`. `open` lists every open
    /// document and only matters for repo-scoped commit ranking.
    pub fn render_document(
        &self,
        doc: &Document,
        open: &[&Document],
        host: &mut impl DecorationHost,
        now_ms: i64,
    ) {
        if !self.config.enabled {
            self.clear_document(doc.id(), host);
            return;
        }
        let Some(ages) = self.store.get(doc.id()) else {
            return;
        };
        let scope: Vec<Arc<LineAges>> = open
            .iter()
            .filter_map(|d| self.store.get(d.id()))
            .collect();
        let assignment = ranker::assign(
            &self.config,
            now_ms,
            &ages,
            &scope,
            self.palette.bucket_count(),
        );

        for bucket in self.palette.buckets() {
            let ranges = assignment
                .lines_in(bucket.index)
                .iter()
                .filter(|&&line| line < doc.line_count())
                .map(|&line| LineRange {
                    line,
                    end: doc.line_len(line),
                })
                .collect();
            host.set_ranges(doc.id(), bucket.handle, ranges);
        }
    }

    pub fn render_visible(&self, docs: &[&Document], host: &mut impl DecorationHost, now_ms: i64) {
        for doc in docs {
            self.render_document(doc, docs, host, now_ms);
        }
    }

    /// Empty every bucket's ranges for `id`. Stored ages are untouched.
    pub fn clear_document(&self, id: &DocumentId, host: &mut impl DecorationHost) {
        for bucket in self.palette.buckets() {
            host.set_ranges(id, bucket.handle, Vec::new());
        }
    }

    pub fn close_document(&mut self, id: &DocumentId, host: &mut impl DecorationHost) {
        self.clear_document(id, host);
        self.store.evict(id);
    }
}

//! Per-document line ages.
//!
//! Each tracked document owns one [`LineAges`]: a dense vector indexed by
//! line number holding the last-touched timestamp and owning revision of
//! that line. Timestamp and revision share one slot, so the two sequences
//! can never drift out of alignment.
//!
//! Ages live behind an `Arc`. Blame seeds build a fresh vector and swap it
//! in whole; edits copy-on-write through `Arc::make_mut`. A snapshot taken
//! for ranking therefore never observes a half-applied seed.

use std::collections::HashMap;
use std::sync::Arc;

use crate::document::{DocumentId, TextEdit, count_newlines};
use crate::history::{BlameLine, RevisionId};

/// Age data for one line. `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStamp {
    pub epoch_ms: Option<i64>,
    pub revision: Option<RevisionId>,
}

impl LineStamp {
    /// A line just typed by hand: known time, unknown provenance.
    pub fn edited(now_ms: i64) -> Self {
        Self {
            epoch_ms: Some(now_ms),
            revision: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineAges {
    stamps: Vec<LineStamp>,
}

impl LineAges {
    pub fn unknown(line_count: usize) -> Self {
        Self {
            stamps: vec![LineStamp::default(); line_count],
        }
    }

    pub fn from_stamps(stamps: Vec<LineStamp>) -> Self {
        Self { stamps }
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn get(&self, line: usize) -> Option<&LineStamp> {
        self.stamps.get(line)
    }

    pub fn stamps(&self) -> &[LineStamp] {
        &self.stamps
    }

    pub fn epochs(&self) -> impl Iterator<Item = Option<i64>> + '_ {
        self.stamps.iter().map(|s| s.epoch_ms)
    }

    pub fn revisions(&self) -> impl Iterator<Item = Option<&RevisionId>> + '_ {
        self.stamps.iter().map(|s| s.revision.as_ref())
    }

    /// Pad with unknown lines or truncate from the end.
    pub fn resize(&mut self, line_count: usize) {
        self.stamps.resize(line_count, LineStamp::default());
    }

    /// Apply one edit region: stamp its first line, then splice when the
    /// region changes the line count.
    pub fn apply(&mut self, region: EditRegion, now_ms: i64) {
        if let Some(last) = self.stamps.len().checked_sub(1) {
            self.stamps[region.start_line.min(last)] = LineStamp::edited(now_ms);
        }
        if region.deleted != region.inserted {
            let at = region.start_line.min(self.stamps.len());
            let until = (at + region.deleted).min(self.stamps.len());
            self.stamps.splice(
                at..until,
                std::iter::repeat(LineStamp::edited(now_ms)).take(region.inserted),
            );
        }
    }
}

/// Line-level shape of one text edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditRegion {
    pub start_line: usize,
    /// Lines removed, `end.line - start.line`.
    pub deleted: usize,
    /// Line breaks in the inserted text.
    pub inserted: usize,
}

impl From<&TextEdit> for EditRegion {
    fn from(edit: &TextEdit) -> Self {
        let (start, end) = if edit.start <= edit.end {
            (edit.start, edit.end)
        } else {
            (edit.end, edit.start)
        };
        Self {
            start_line: start.line,
            deleted: end.line - start.line,
            inserted: count_newlines(&edit.text),
        }
    }
}

/// What a blame seed did, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOutcome {
    pub copied: usize,
    pub document_lines: usize,
    pub blame_lines: usize,
}

impl SeedOutcome {
    pub fn mismatched(&self) -> bool {
        self.document_lines != self.blame_lines
    }
}

#[derive(Debug)]
struct Entry {
    ages: Arc<LineAges>,
    seeded: bool,
}

#[derive(Debug, Default)]
pub struct LineAgeStore {
    docs: HashMap<DocumentId, Entry>,
}

impl LineAgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracked(&self, id: &DocumentId) -> bool {
        self.docs.contains_key(id)
    }

    /// Start tracking a document, or bring its length back in line with
    /// `line_count`. Returns true while the document still needs a seed.
    pub fn ensure_tracked(&mut self, id: &DocumentId, line_count: usize) -> bool {
        let entry = self.docs.entry(id.clone()).or_insert_with(|| Entry {
            ages: Arc::new(LineAges::unknown(line_count)),
            seeded: false,
        });
        if entry.ages.len() != line_count {
            Arc::make_mut(&mut entry.ages).resize(line_count);
        }
        !entry.seeded
    }

    /// Apply a batch of edits in order, then reconcile to the final line
    /// count once. An untracked document starts out with unknown ages.
    pub fn apply_edits(
        &mut self,
        id: &DocumentId,
        edits: &[TextEdit],
        final_line_count: usize,
        now_ms: i64,
    ) {
        let entry = self.docs.entry(id.clone()).or_insert_with(|| Entry {
            ages: Arc::new(LineAges::unknown(final_line_count)),
            seeded: false,
        });
        let ages = Arc::make_mut(&mut entry.ages);
        for edit in edits {
            ages.apply(EditRegion::from(edit), now_ms);
        }
        if ages.len() != final_line_count {
            ages.resize(final_line_count);
        }
    }

    /// Replace a document's ages wholesale with blame data, sized exactly to
    /// `line_count`. Only the overlapping prefix is copied; the rest stays
    /// unknown. An empty blame leaves the current ages untouched.
    pub fn replace_from_blame(
        &mut self,
        id: &DocumentId,
        blame: &[BlameLine],
        line_count: usize,
    ) -> SeedOutcome {
        let copied = blame.len().min(line_count);
        let outcome = SeedOutcome {
            copied,
            document_lines: line_count,
            blame_lines: blame.len(),
        };
        if blame.is_empty() {
            return outcome;
        }

        let mut stamps = Vec::with_capacity(line_count);
        stamps.extend(blame.iter().take(copied).map(|line| LineStamp {
            epoch_ms: line.timestamp_ms,
            revision: line.revision.clone(),
        }));
        stamps.resize(line_count, LineStamp::default());

        self.docs.insert(
            id.clone(),
            Entry {
                ages: Arc::new(LineAges::from_stamps(stamps)),
                seeded: true,
            },
        );
        outcome
    }

    /// Snapshot of a document's ages.
    pub fn get(&self, id: &DocumentId) -> Option<Arc<LineAges>> {
        self.docs.get(id).map(|e| Arc::clone(&e.ages))
    }

    pub fn evict(&mut self, id: &DocumentId) {
        self.docs.remove(id);
    }

    /// Drop every document for which `keep` is false.
    pub fn retain(&mut self, mut keep: impl FnMut(&DocumentId) -> bool) {
        self.docs.retain(|id, _| keep(id));
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

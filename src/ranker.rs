//! Line ranking: turns line ages into palette bucket indices.

use std::collections::HashMap;
use std::sync::Arc;

use crate::color::clamp01;
use crate::config::{Config, Mode, RelativeScope};
use crate::history::RevisionId;
use crate::store::LineAges;

/// Lines grouped by bucket. Each line appears in at most one bucket;
/// lines in no bucket are left undecorated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    // Slot 0 is the reserved "no decoration" bucket and stays empty.
    buckets: Vec<Vec<usize>>,
}

impl Assignment {
    pub fn new(bucket_count: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); bucket_count + 1],
        }
    }

    fn push(&mut self, bucket: usize, line: usize) {
        if (1..self.buckets.len()).contains(&bucket) {
            self.buckets[bucket].push(line);
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len() - 1
    }

    /// Lines in `bucket`; empty for 0 and out-of-range indices.
    pub fn lines_in(&self, bucket: usize) -> &[usize] {
        match bucket {
            0 => &[],
            b => self.buckets.get(b).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    pub fn bucket_of(&self, line: usize) -> Option<usize> {
        self.buckets
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, lines)| lines.contains(&line))
            .map(|(bucket, _)| bucket)
    }

    /// Non-empty buckets in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.buckets
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, lines)| !lines.is_empty())
            .map(|(bucket, lines)| (bucket, lines.as_slice()))
    }

    pub fn assigned_lines(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

/// Bucket for a line of the given age, or `None` once it falls outside the
/// window. Age 0 maps to the newest bucket.
pub fn time_bucket(age_ms: f64, max_age_ms: f64, bucket_count: usize) -> Option<usize> {
    let age = if age_ms.is_nan() { 0.0 } else { age_ms.max(0.0) };
    if age >= max_age_ms || max_age_ms.is_nan() {
        return None;
    }
    let fraction_old = clamp01(age / max_age_ms);
    Some(ceil_bucket(1.0 - fraction_old, bucket_count))
}

/// Bucket for the `rank`-th oldest of `count` ranked items.
pub fn rank_bucket(rank: usize, count: usize, bucket_count: usize) -> usize {
    let denom = count.saturating_sub(1).max(1);
    ceil_bucket(rank as f64 / denom as f64, bucket_count)
}

fn ceil_bucket(newest_fraction: f64, bucket_count: usize) -> usize {
    let raw = (clamp01(newest_fraction) * bucket_count as f64).ceil() as usize;
    raw.clamp(1, bucket_count.max(1))
}

pub fn rank_by_time(ages: &LineAges, now_ms: i64, max_age_ms: f64, bucket_count: usize) -> Assignment {
    let mut out = Assignment::new(bucket_count);
    for (line, epoch) in ages.epochs().enumerate() {
        let Some(epoch) = epoch else { continue };
        let age = now_ms.saturating_sub(epoch) as f64;
        if let Some(bucket) = time_bucket(age, max_age_ms, bucket_count) {
            out.push(bucket, line);
        }
    }
    out
}

/// Rank every revision seen in `scope` by its earliest line timestamp,
/// oldest first. Ties keep first-encounter order; revisions without any
/// timestamp are left out.
pub fn revision_ranks<'a>(scope: impl IntoIterator<Item = &'a LineAges>) -> HashMap<RevisionId, usize> {
    let mut order: Vec<(RevisionId, i64)> = Vec::new();
    let mut index: HashMap<RevisionId, usize> = HashMap::new();
    for ages in scope {
        for stamp in ages.stamps() {
            let (Some(rev), Some(epoch)) = (&stamp.revision, stamp.epoch_ms) else {
                continue;
            };
            match index.get(rev) {
                Some(&i) => order[i].1 = order[i].1.min(epoch),
                None => {
                    index.insert(Arc::clone(rev), order.len());
                    order.push((Arc::clone(rev), epoch));
                }
            }
        }
    }
    order.sort_by_key(|(_, epoch)| *epoch);
    order
        .into_iter()
        .enumerate()
        .map(|(rank, (rev, _))| (rev, rank))
        .collect()
}

/// Rank lines of `ages` by the commit order of their revisions across
/// `scope`. When no line of `ages` can be ranked that way, fall back to
/// ordering the lines by their own timestamps, ignoring the age window.
pub fn rank_by_commit_order<'a>(
    ages: &LineAges,
    scope: impl IntoIterator<Item = &'a LineAges>,
    bucket_count: usize,
) -> Assignment {
    let ranks = revision_ranks(scope);
    let mut out = Assignment::new(bucket_count);
    if !ranks.is_empty() {
        for (line, rev) in ages.revisions().enumerate() {
            if let Some(&rank) = rev.and_then(|r| ranks.get(r)) {
                out.push(rank_bucket(rank, ranks.len(), bucket_count), line);
            }
        }
    }
    if out.assigned_lines() > 0 {
        return out;
    }

    let mut dated: Vec<(usize, i64)> = ages
        .epochs()
        .enumerate()
        .filter_map(|(line, epoch)| epoch.map(|e| (line, e)))
        .collect();
    dated.sort_by_key(|(_, epoch)| *epoch);
    let count = dated.len();
    for (rank, (line, _)) in dated.into_iter().enumerate() {
        out.push(rank_bucket(rank, count, bucket_count), line);
    }
    out
}

/// Bucket assignment for one document under `config`. `open` holds the
/// ages of every open document and is only consulted for repo scope.
pub fn assign(
    config: &Config,
    now_ms: i64,
    ages: &LineAges,
    open: &[Arc<LineAges>],
    bucket_count: usize,
) -> Assignment {
    match config.mode {
        Mode::Time => rank_by_time(ages, now_ms, config.max_age_ms(), bucket_count),
        Mode::CommitOrder => match config.relative_scope {
            RelativeScope::File => rank_by_commit_order(ages, [ages], bucket_count),
            RelativeScope::Repo => {
                rank_by_commit_order(ages, open.iter().map(|a| a.as_ref()), bucket_count)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LineStamp;

    const N: usize = 360;
    const MINUTE: i64 = 60_000;

    fn stamped(entries: &[(Option<&str>, Option<i64>)]) -> LineAges {
        LineAges::from_stamps(
            entries
                .iter()
                .map(|(rev, epoch)| LineStamp {
                    epoch_ms: *epoch,
                    revision: rev.map(RevisionId::from),
                })
                .collect(),
        )
    }

    #[test]
    fn time_bucket_edges() {
        assert_eq!(time_bucket(0.0, 1000.0, N), Some(N));
        assert_eq!(time_bucket(1000.0, 1000.0, N), None);
        assert_eq!(time_bucket(5000.0, 1000.0, N), None);
        assert_eq!(time_bucket(999.999, 1000.0, N), Some(1));
        assert_eq!(time_bucket(-50.0, 1000.0, N), Some(N));
        assert_eq!(time_bucket(0.0, 0.0, N), None);
    }

    #[test]
    fn time_buckets_never_increase_with_age() {
        let mut prev = N;
        for age in (0..600).map(|m| (m * MINUTE) as f64) {
            if let Some(bucket) = time_bucket(age, 500.0 * MINUTE as f64, N) {
                assert!(bucket <= prev);
                assert!(bucket >= 1);
                prev = bucket;
            }
        }
    }

    #[test]
    fn time_mode_skips_unknown_and_expired_lines() {
        let now = 100 * MINUTE;
        let ages = stamped(&[
            (None, Some(now)),
            (None, None),
            (None, Some(now - 20 * MINUTE)),
            (None, Some(now - 5 * MINUTE)),
        ]);
        let out = rank_by_time(&ages, now, (10 * MINUTE) as f64, N);
        assert_eq!(out.bucket_of(0), Some(N));
        assert_eq!(out.bucket_of(1), None);
        assert_eq!(out.bucket_of(2), None);
        assert_eq!(out.bucket_of(3), Some(N / 2));
    }

    #[test]
    fn commit_ranks_sort_by_timestamp() {
        let ages = stamped(&[(Some("A"), Some(100)), (Some("B"), Some(300)), (Some("C"), Some(200))]);
        let ranks = revision_ranks([&ages]);
        assert_eq!(ranks["A"], 0);
        assert_eq!(ranks["C"], 1);
        assert_eq!(ranks["B"], 2);

        let out = rank_by_commit_order(&ages, [&ages], N);
        // newestFraction A=0, C=0.5, B=1.
        assert_eq!(out.bucket_of(0), Some(1));
        assert_eq!(out.bucket_of(2), Some(N / 2));
        assert_eq!(out.bucket_of(1), Some(N));
    }

    #[test]
    fn revision_takes_its_earliest_line_and_ties_keep_encounter_order() {
        let ages = stamped(&[
            (Some("X"), Some(500)),
            (Some("Y"), Some(200)),
            (Some("X"), Some(100)),
            (Some("Z"), Some(200)),
        ]);
        let ranks = revision_ranks([&ages]);
        assert_eq!(ranks["X"], 0);
        assert_eq!(ranks["Y"], 1);
        assert_eq!(ranks["Z"], 2);
    }

    #[test]
    fn single_revision_lands_in_first_bucket() {
        let ages = stamped(&[(Some("A"), Some(1)), (Some("A"), Some(1))]);
        let out = rank_by_commit_order(&ages, [&ages], N);
        assert_eq!(out.lines_in(1), &[0, 1]);
    }

    #[test]
    fn untimed_revisions_and_hand_edited_lines_are_skipped() {
        let ages = stamped(&[
            (Some("A"), Some(10)),
            (Some("B"), None),
            (None, Some(99)),
            (Some("C"), Some(20)),
        ]);
        let out = rank_by_commit_order(&ages, [&ages], N);
        assert_eq!(out.bucket_of(0), Some(1));
        assert_eq!(out.bucket_of(1), None);
        assert_eq!(out.bucket_of(2), None);
        assert_eq!(out.bucket_of(3), Some(N));
    }

    #[test]
    fn falls_back_to_line_timestamps_without_revisions() {
        let ages = stamped(&[(None, Some(300)), (None, None), (None, Some(100)), (None, Some(200))]);
        let out = rank_by_commit_order(&ages, [&ages], N);
        assert_eq!(out.bucket_of(2), Some(1));
        assert_eq!(out.bucket_of(3), Some(N / 2));
        assert_eq!(out.bucket_of(0), Some(N));
        assert_eq!(out.bucket_of(1), None);
    }

    #[test]
    fn repo_scope_ranks_against_other_documents() {
        let this = Arc::new(stamped(&[(Some("B"), Some(200))]));
        let other = Arc::new(stamped(&[(Some("A"), Some(100)), (Some("C"), Some(300))]));
        let config = Config {
            relative_scope: RelativeScope::Repo,
            ..Config::default()
        };
        let open = vec![Arc::clone(&this), other];
        let out = assign(&config, 0, &this, &open, N);
        assert_eq!(out.bucket_of(0), Some(N / 2));

        let file_scope = assign(&Config::default(), 0, &this, &open, N);
        assert_eq!(file_scope.bucket_of(0), Some(1));
    }

    #[test]
    fn assignment_ignores_reserved_bucket() {
        let out = Assignment::new(N);
        assert!(out.lines_in(0).is_empty());
        assert!(out.lines_in(N + 5).is_empty());
        assert_eq!(out.iter().count(), 0);
        assert_eq!(out.bucket_count(), N);
    }
}

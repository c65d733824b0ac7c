//! Eventual-consistency poller.
//!
//! Bridges the gap between "document stored in the blob container" and
//! "document chunks visible in the search index". Indexing is asynchronous
//! and provider-controlled, so the only option is to re-query with backoff
//! until the stored name surfaces or the retry budget runs out. Running out
//! is an expected transient state, not a failure.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use azsearch_client::DocumentHit;
use bizlens_common::InsightError;

/// Quick-path backoff, Fibonacci-shaped to bound the total wait near one
/// minute.
pub const QUICK_DELAYS_SECS: [u64; 6] = [2, 3, 5, 8, 13, 21];

/// Attempts on which the quick path nudges the indexer out of band.
const INDEXER_NUDGE_ATTEMPTS: [usize; 2] = [2, 3];

/// Forced path: reset + run, then a longer flat-interval budget.
pub const FORCED_ATTEMPTS: usize = 12;
const FORCED_DELAY_SECS: u64 = 3;

/// The index operations the poller needs. The live implementation wraps the
/// search and indexer clients; tests substitute a scripted fake.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Exact-phrase query for one stored-name candidate.
    async fn search_stored_name(
        &self,
        name: &str,
        top: u32,
    ) -> Result<Vec<DocumentHit>, InsightError>;

    /// Trigger an indexer run. Best-effort; failures only delay visibility.
    async fn run_indexer(&self) -> Result<(), InsightError>;

    /// Reset the indexer's change tracking before a run.
    async fn reset_indexer(&self) -> Result<(), InsightError>;

    /// Drop cached query results. Must run before every poll attempt or the
    /// poller will observe a stale "no hit" result forever.
    fn invalidate_cache(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Confirmed hits for the uploaded document.
    Indexed(Vec<DocumentHit>),
    /// Retry budget exhausted with nothing confirmed; the caller may retry
    /// later.
    NotYetIndexed,
}

/// Candidate match strings for a stored blob name, tried in order: the full
/// stored name, its basename, and the unique-prefix token before the first
/// `_` separator. The index may record any of these transformations.
pub fn match_candidates(stored_name: &str) -> Vec<String> {
    let name = stored_name.trim();
    if name.is_empty() {
        return Vec::new();
    }
    let mut candidates = vec![name.to_string()];
    let base = name.rsplit('/').next().unwrap_or(name);
    if !base.is_empty() && base != name {
        candidates.push(base.to_string());
    }
    if let Some((prefix, _)) = name.split_once('_') {
        if !prefix.is_empty() && prefix != name {
            candidates.push(prefix.to_string());
        }
    }
    candidates
}

/// Wait for a freshly uploaded document to become visible, nudging the
/// indexer on the two designated early attempts.
pub async fn wait_for_document(
    index: &dyn DocumentIndex,
    stored_name: &str,
    top: u32,
) -> PollOutcome {
    let candidates = match_candidates(stored_name);
    if candidates.is_empty() {
        return PollOutcome::NotYetIndexed;
    }

    info!(stored_name, "Waiting for document to appear in the search index");

    for (i, delay) in QUICK_DELAYS_SECS.iter().enumerate() {
        let attempt = i + 1;
        index.invalidate_cache();
        if let Some(hits) = query_confirmed(index, &candidates, top).await {
            info!(stored_name, attempt, hits = hits.len(), "Document visible in index");
            return PollOutcome::Indexed(hits);
        }
        if INDEXER_NUDGE_ATTEMPTS.contains(&attempt) {
            if let Err(e) = index.run_indexer().await {
                debug!(error = %e, "Indexer nudge failed, continuing to wait");
            }
        }
        debug!(stored_name, attempt, delay, "Not indexed yet, backing off");
        sleep(Duration::from_secs(*delay)).await;
    }

    info!(stored_name, "Retry budget exhausted, document not yet indexed");
    PollOutcome::NotYetIndexed
}

/// Forced recovery path: reset the indexer, re-run it, then poll on a flat
/// interval with a doubled attempt budget.
pub async fn force_reindex_and_wait(
    index: &dyn DocumentIndex,
    stored_name: &str,
    top: u32,
) -> PollOutcome {
    let candidates = match_candidates(stored_name);
    if candidates.is_empty() {
        return PollOutcome::NotYetIndexed;
    }

    if let Err(e) = index.reset_indexer().await {
        warn!(error = %e, "Indexer reset failed");
    }
    if let Err(e) = index.run_indexer().await {
        warn!(error = %e, "Indexer run failed");
    }

    for attempt in 1..=FORCED_ATTEMPTS {
        index.invalidate_cache();
        if let Some(hits) = query_confirmed(index, &candidates, top).await {
            info!(stored_name, attempt, hits = hits.len(), "Document visible after reset");
            return PollOutcome::Indexed(hits);
        }
        sleep(Duration::from_secs(FORCED_DELAY_SECS)).await;
    }

    PollOutcome::NotYetIndexed
}

/// Query the candidates in order; the first query returning results settles
/// the attempt. Hits count only when their storage-name field actually
/// contains one of the candidate strings, since the search provider's fuzzy
/// ranking can surface unrelated documents. The check stays substring-only:
/// it does not verify that a hit's content originates from the just-uploaded
/// file.
async fn query_confirmed(
    index: &dyn DocumentIndex,
    candidates: &[String],
    top: u32,
) -> Option<Vec<DocumentHit>> {
    for candidate in candidates {
        let hits = match index.search_stored_name(candidate, top).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(candidate, error = %e, "Stored-name query failed");
                continue;
            }
        };
        if hits.is_empty() {
            continue;
        }
        let confirmed: Vec<DocumentHit> = hits
            .into_iter()
            .filter(|hit| candidates.iter().any(|c| hit.storage_name.contains(c.as_str())))
            .collect();
        if confirmed.is_empty() {
            debug!(candidate, "Query returned hits but none matched a candidate name");
            return None;
        }
        return Some(confirmed);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted index: empty results until `visible_after` attempts have
    /// invalidated the cache, then a single hit named `hit_name`.
    struct FakeIndex {
        visible_after: usize,
        hit_name: String,
        attempts: AtomicUsize,
        nudges: AtomicUsize,
        resets: AtomicUsize,
    }

    impl FakeIndex {
        fn new(visible_after: usize, hit_name: &str) -> Self {
            Self {
                visible_after,
                hit_name: hit_name.to_string(),
                attempts: AtomicUsize::new(0),
                nudges: AtomicUsize::new(0),
                resets: AtomicUsize::new(0),
            }
        }

        fn hit(&self) -> DocumentHit {
            DocumentHit {
                title: self.hit_name.clone(),
                content: "조각 내용".to_string(),
                source: String::new(),
                storage_name: self.hit_name.clone(),
            }
        }
    }

    #[async_trait]
    impl DocumentIndex for FakeIndex {
        async fn search_stored_name(
            &self,
            _name: &str,
            _top: u32,
        ) -> Result<Vec<DocumentHit>, InsightError> {
            if self.attempts.load(Ordering::SeqCst) >= self.visible_after {
                Ok(vec![self.hit()])
            } else {
                Ok(Vec::new())
            }
        }

        async fn run_indexer(&self) -> Result<(), InsightError> {
            self.nudges.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn reset_indexer(&self) -> Result<(), InsightError> {
            self.resets.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn invalidate_cache(&self) {
            self.attempts.fetch_add(1, Ordering::SeqCst);
        }
    }

    const STORED: &str = "c65bd905-5e1a-4d6b-9e6f-000000000000_제안서.pdf";

    #[test]
    fn candidates_are_full_name_then_prefix() {
        let candidates = match_candidates(STORED);
        assert_eq!(
            candidates,
            vec![
                STORED.to_string(),
                "c65bd905-5e1a-4d6b-9e6f-000000000000".to_string()
            ]
        );
    }

    #[test]
    fn candidates_include_basename_for_pathed_names() {
        let candidates = match_candidates("folder/report.pdf");
        assert_eq!(candidates, vec!["folder/report.pdf", "report.pdf"]);
        assert!(match_candidates("  ").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stops_early_when_document_appears() {
        let index = FakeIndex::new(4, STORED);
        let outcome = wait_for_document(&index, STORED, 10).await;

        match outcome {
            PollOutcome::Indexed(hits) => assert_eq!(hits.len(), 1),
            PollOutcome::NotYetIndexed => panic!("expected hits at attempt 4"),
        }
        // visible at attempt 4 of 6, so the remaining budget is not spent
        assert_eq!(index.attempts.load(Ordering::SeqCst), 4);
        // nudged on the two designated early attempts
        assert_eq!(index.nudges.load(Ordering::SeqCst), 2);
        assert_eq!(index.resets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_reports_not_yet_indexed() {
        let index = FakeIndex::new(usize::MAX, STORED);
        let outcome = wait_for_document(&index, STORED, 10).await;
        assert_eq!(outcome, PollOutcome::NotYetIndexed);
        assert_eq!(index.attempts.load(Ordering::SeqCst), QUICK_DELAYS_SECS.len());
    }

    #[tokio::test(start_paused = true)]
    async fn unrelated_hits_are_not_confirmed() {
        // The index always answers, but with a document whose storage name
        // shares nothing with the upload.
        let index = FakeIndex::new(0, "다른문서.pdf");
        let outcome = wait_for_document(&index, STORED, 10).await;
        assert_eq!(outcome, PollOutcome::NotYetIndexed);
    }

    #[tokio::test(start_paused = true)]
    async fn forced_path_resets_then_runs() {
        let index = FakeIndex::new(3, STORED);
        let outcome = force_reindex_and_wait(&index, STORED, 10).await;

        assert!(matches!(outcome, PollOutcome::Indexed(_)));
        assert_eq!(index.resets.load(Ordering::SeqCst), 1);
        // one run trigger up front, no per-attempt nudges
        assert_eq!(index.nudges.load(Ordering::SeqCst), 1);
        assert_eq!(index.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_stored_name_never_queries() {
        let index = FakeIndex::new(0, STORED);
        let outcome = wait_for_document(&index, "", 10).await;
        assert_eq!(outcome, PollOutcome::NotYetIndexed);
        assert_eq!(index.attempts.load(Ordering::SeqCst), 0);
    }
}

//! Auto-match planning.
//!
//! The planner is pure: it reads both record sets and the current links and
//! returns proposals without touching shared state, so a host may run it off
//! the main thread and apply the result later.

use std::collections::HashSet;

use migrate_model::{CardinalityPolicy, Link, RecordKey, RecordSet};
use tracing::debug;

use crate::score::SimilarityScorer;

/// Proposes links for every unlinked old record.
#[derive(Debug, Clone, Copy)]
pub struct AutoMatchPlanner<'a> {
    scorer: &'a SimilarityScorer,
    threshold: f64,
    policy: CardinalityPolicy,
}

impl<'a> AutoMatchPlanner<'a> {
    pub fn new(scorer: &'a SimilarityScorer, threshold: f64, policy: CardinalityPolicy) -> Self {
        Self {
            scorer,
            threshold,
            policy,
        }
    }

    /// Plan proposals in old-set order.
    ///
    /// Already-linked old records are skipped. Each remaining old record gets
    /// its best-scoring available new record (earliest index on ties) when the
    /// score reaches the threshold. Under one-to-one a chosen new record
    /// leaves the pool for the rest of the pass.
    pub fn plan(&self, old: &RecordSet, new: &RecordSet, existing: &[Link]) -> Vec<Link> {
        let linked_old: HashSet<&RecordKey> = existing.iter().map(|l| &l.old_key).collect();
        let shared_new = self.policy.allows_shared_new();
        let mut available: Vec<bool> = if shared_new {
            vec![true; new.len()]
        } else {
            let linked_new: HashSet<&RecordKey> = existing.iter().map(|l| &l.new_key).collect();
            new.keys().iter().map(|k| !linked_new.contains(k)).collect()
        };
        let mut remaining = available.iter().filter(|a| **a).count();

        let mut proposals = Vec::new();
        let mut below_threshold = 0usize;
        for (old_key, old_record) in old.iter() {
            if remaining == 0 {
                break;
            }
            if linked_old.contains(old_key) {
                continue;
            }

            let mut best: Option<(usize, f64)> = None;
            for (position, (_, new_record)) in new.iter().enumerate() {
                if !available[position] {
                    continue;
                }
                let score = self.scorer.score(old_record, new_record);
                match best {
                    Some((_, best_score)) if score <= best_score => {}
                    _ => best = Some((position, score)),
                }
            }

            let Some((position, score)) = best else {
                continue;
            };
            if score < self.threshold {
                below_threshold += 1;
                continue;
            }
            let new_key = &new.keys()[position];
            proposals.push(Link::auto(old_key.clone(), new_key.clone(), score));
            if !shared_new {
                available[position] = false;
                remaining -= 1;
            }
        }

        debug!(
            old = old.len(),
            new = new.len(),
            existing = existing.len(),
            proposals = proposals.len(),
            below_threshold,
            threshold = self.threshold,
            policy = %self.policy,
            "auto-match plan"
        );
        proposals
    }
}

/// Convenience wrapper over [`AutoMatchPlanner`] taking the "allow multiple
/// links" flag directly.
pub fn plan(
    scorer: &SimilarityScorer,
    old: &RecordSet,
    new: &RecordSet,
    existing: &[Link],
    threshold: f64,
    allow_multiple_links: bool,
) -> Vec<Link> {
    AutoMatchPlanner::new(
        scorer,
        threshold,
        CardinalityPolicy::from_allow_multiple(allow_multiple_links),
    )
    .plan(old, new, existing)
}

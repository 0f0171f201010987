//! Migration session façade.
//!
//! A [`MigrationSession`] owns both record sets, the link store and the
//! history. Every mutation goes through it: keys are checked against the
//! record sets, the store enforces the cardinality policy, and each applied
//! change is recorded before the call returns. Mutations take `&mut self`, so
//! calls into one session are serialized by construction.

use migrate_model::{
    CardinalityPolicy, InputError, Link, LinkError, LinkOrigin, RecordKey, RecordSet,
    SessionConfig, Side,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, info_span, warn};

use crate::event::SessionEvent;
use crate::history::{Command, History};
use crate::plan::AutoMatchPlanner;
use crate::score::{RankedCandidate, RecordScore, SimilarityScorer};
use crate::store::LinkStore;

/// Linking progress over the old record set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub linked_old_count: usize,
    pub unlinked_old_count: usize,
    pub total_old_count: usize,
    /// Distinct new records targeted by at least one link.
    pub linked_new_count: usize,
    pub total_new_count: usize,
    /// `linked_old_count / total_old_count`, or 0 for an empty old set.
    pub completion_ratio: f64,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.total_old_count > 0 && self.linked_old_count == self.total_old_count
    }
}

/// Snapshot of a session's mapping handed to the host on export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub key_field: String,
    pub display_field: String,
    pub policy: CardinalityPolicy,
    pub threshold: f64,
    pub progress: Progress,
    pub links: Vec<Link>,
}

/// Coordinates scoring, planning, link state and history for one migration.
///
/// Every mutation queues [`SessionEvent`]s. The queue is unbounded and only
/// shrinks through [`take_events`](Self::take_events); hosts drain it after
/// each call (or batch of calls) they make.
#[derive(Debug, Clone)]
pub struct MigrationSession {
    config: SessionConfig,
    old: RecordSet,
    new: RecordSet,
    scorer: SimilarityScorer,
    store: LinkStore,
    history: History,
    events: Vec<SessionEvent>,
}

impl MigrationSession {
    /// Create a session from raw record payloads.
    ///
    /// Fails before any operation is accepted if the configuration is out of
    /// range or either set has missing, invalid or duplicate keys.
    pub fn new(
        config: SessionConfig,
        old_records: Vec<Value>,
        new_records: Vec<Value>,
    ) -> Result<Self, InputError> {
        config.validate()?;
        let old = RecordSet::from_values(Side::Old, config.key_field.as_str(), old_records)?;
        let new = RecordSet::from_values(Side::New, config.key_field.as_str(), new_records)?;
        Self::from_sets(config, old, new)
    }

    /// Create a session from already keyed record sets.
    pub fn from_sets(
        config: SessionConfig,
        old: RecordSet,
        new: RecordSet,
    ) -> Result<Self, InputError> {
        config.validate()?;
        for set in [&old, &new] {
            if set.key_field() != config.key_field {
                return Err(InputError::InvalidConfig(format!(
                    "{} record set is keyed by '{}', expected '{}'",
                    set.side(),
                    set.key_field(),
                    config.key_field
                )));
            }
        }
        if old.side() != Side::Old || new.side() != Side::New {
            return Err(InputError::InvalidConfig(
                "record sets were built for the wrong sides".to_string(),
            ));
        }

        info!(
            old = old.len(),
            new = new.len(),
            policy = %config.policy,
            threshold = config.threshold,
            "migration session created"
        );
        Ok(Self {
            scorer: SimilarityScorer::from_config(&config),
            store: LinkStore::new(config.policy),
            history: History::with_limit(config.history_limit),
            events: Vec::new(),
            config,
            old,
            new,
        })
    }

    /// Resume from a prior mapping.
    ///
    /// Seed links are validated like manual links but are not undoable.
    pub fn with_links(mut self, seed: impl IntoIterator<Item = Link>) -> Result<Self, InputError> {
        for link in seed {
            if let Err(source) = self.seed_link(&link) {
                return Err(InputError::InvalidSeed {
                    old: link.old_key,
                    new: link.new_key,
                    source,
                });
            }
        }
        debug!(links = self.store.len(), "session seeded");
        Ok(self)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn old_records(&self) -> &RecordSet {
        &self.old
    }

    pub fn new_records(&self) -> &RecordSet {
        &self.new
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    pub fn store(&self) -> &LinkStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Current links in insertion order.
    pub fn links(&self) -> &[Link] {
        self.store.all_links()
    }

    /// Manually link an old record to a new record.
    pub fn link(
        &mut self,
        old_key: impl Into<RecordKey>,
        new_key: impl Into<RecordKey>,
    ) -> Result<Link, LinkError> {
        let old_key = old_key.into();
        let new_key = new_key.into();
        self.ensure_known(Side::Old, &old_key)?;
        self.ensure_known(Side::New, &new_key)?;

        let was_complete = self.is_complete();
        let link = self
            .store
            .add_link(old_key, new_key, None, LinkOrigin::Manual)?;
        debug!(old = %link.old_key, new = %link.new_key, "linked");
        self.history.record(Command::AddLink(link.clone()));
        self.events.push(SessionEvent::LinkCreated { link: link.clone() });
        self.check_completion(was_complete);
        Ok(link)
    }

    /// Remove the link `old_key -> new_key`.
    ///
    /// Returns `Ok(None)` and records nothing when the pair is not linked.
    pub fn unlink(
        &mut self,
        old_key: impl Into<RecordKey>,
        new_key: impl Into<RecordKey>,
    ) -> Result<Option<Link>, LinkError> {
        let old_key = old_key.into();
        let new_key = new_key.into();
        self.ensure_known(Side::Old, &old_key)?;
        self.ensure_known(Side::New, &new_key)?;
        let removed = self.store.remove_link_pair(&old_key, &new_key);
        Ok(removed.map(|removed| self.record_removal(removed.link, removed.position)))
    }

    /// Remove whatever link an old record has.
    pub fn unlink_old(&mut self, old_key: impl Into<RecordKey>) -> Result<Option<Link>, LinkError> {
        let old_key = old_key.into();
        self.ensure_known(Side::Old, &old_key)?;
        let removed = self.store.remove_link(&old_key);
        Ok(removed.map(|removed| self.record_removal(removed.link, removed.position)))
    }

    /// Preview the proposals [`auto_match`](Self::auto_match) would apply.
    pub fn plan_auto_match(&self) -> Vec<Link> {
        AutoMatchPlanner::new(&self.scorer, self.config.threshold, self.config.policy).plan(
            &self.old,
            &self.new,
            self.store.all_links(),
        )
    }

    /// Plan and apply auto-match proposals as one undoable batch.
    ///
    /// Proposals that conflict with the store are skipped. Returns the links
    /// that were applied.
    pub fn auto_match(&mut self) -> Vec<Link> {
        let span = info_span!("auto_match", threshold = self.config.threshold);
        let _guard = span.enter();

        let was_complete = self.is_complete();
        let proposals = self.plan_auto_match();
        let proposed = proposals.len();
        let mut applied = Vec::with_capacity(proposed);
        for link in proposals {
            match self.store.insert(link.clone()) {
                Ok(()) => applied.push(link),
                Err(err) => {
                    warn!(old = %link.old_key, new = %link.new_key, error = %err, "skipping conflicting proposal");
                }
            }
        }

        if !applied.is_empty() {
            self.history.record(Command::BatchAutoMatch(applied.clone()));
        }
        info!(
            proposed,
            applied = applied.len(),
            linked = self.store.len(),
            total = self.old.len(),
            "auto-match applied"
        );
        self.events.push(SessionEvent::AutoMatchCompleted {
            links: applied.clone(),
        });
        self.check_completion(was_complete);
        applied
    }

    /// Remove every link as a single undoable step.
    pub fn clear_links(&mut self) -> Vec<Link> {
        let cleared = self.store.clear();
        if !cleared.is_empty() {
            self.history.record(Command::ClearAll(cleared.clone()));
            for link in &cleared {
                self.events.push(SessionEvent::LinkRemoved { link: link.clone() });
            }
        }
        cleared
    }

    /// Drop all links and all history. Not undoable.
    pub fn reset(&mut self) {
        for link in self.store.clear() {
            self.events.push(SessionEvent::LinkRemoved { link });
        }
        self.history.clear();
        info!("session reset");
    }

    /// Revert the most recent mutation; a batch reverts as one step.
    pub fn undo(&mut self) -> Result<Option<Command>, LinkError> {
        let was_complete = self.is_complete();
        let command = self.history.undo(&mut self.store)?;
        if let Some(command) = &command {
            self.emit_replay(command, false);
        }
        self.check_completion(was_complete);
        Ok(command)
    }

    /// Re-apply the most recently undone mutation.
    pub fn redo(&mut self) -> Result<Option<Command>, LinkError> {
        let was_complete = self.is_complete();
        let command = self.history.redo(&mut self.store)?;
        if let Some(command) = &command {
            self.emit_replay(command, true);
        }
        self.check_completion(was_complete);
        Ok(command)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn progress(&self) -> Progress {
        let total_old_count = self.old.len();
        let linked_old_count = self.store.len();
        let completion_ratio = if total_old_count == 0 {
            0.0
        } else {
            linked_old_count as f64 / total_old_count as f64
        };
        Progress {
            linked_old_count,
            unlinked_old_count: total_old_count - linked_old_count,
            total_old_count,
            linked_new_count: self.store.linked_new_count(),
            total_new_count: self.new.len(),
            completion_ratio,
        }
    }

    /// Snapshot of the current links. Side-effect free.
    pub fn export_mappings(&self) -> Vec<Link> {
        self.store.all_links().to_vec()
    }

    /// Build an export snapshot and notify the host.
    pub fn request_export(&mut self) -> ExportSnapshot {
        let snapshot = ExportSnapshot {
            key_field: self.config.key_field.clone(),
            display_field: self.config.display_field.clone(),
            policy: self.config.policy,
            threshold: self.config.threshold,
            progress: self.progress(),
            links: self.export_mappings(),
        };
        self.events.push(SessionEvent::ExportRequested {
            links: snapshot.links.clone(),
        });
        snapshot
    }

    /// Ranked new-record candidates for one old record.
    ///
    /// Under one-to-one, new records linked from other old records are left
    /// out.
    pub fn suggestions_for(
        &self,
        old_key: impl Into<RecordKey>,
        limit: usize,
    ) -> Result<Vec<RankedCandidate>, LinkError> {
        let old_key = old_key.into();
        let query = self.old.get(&old_key).ok_or_else(|| LinkError::NotFound {
            side: Side::Old,
            key: old_key.clone(),
        })?;
        let shared_new = self.config.policy.allows_shared_new();
        let candidates = self.new.iter().filter(|(new_key, _)| {
            shared_new
                || self
                    .store
                    .links_for_new(new_key)
                    .iter()
                    .all(|l| l.old_key == old_key)
        });
        let mut ranked = self.scorer.rank(query, candidates, limit);
        for candidate in &mut ranked {
            if let Some(position) = self.new.position(&candidate.key) {
                candidate.position = position;
            }
        }
        Ok(ranked)
    }

    /// Score breakdown for one old/new pair.
    pub fn explain(
        &self,
        old_key: impl Into<RecordKey>,
        new_key: impl Into<RecordKey>,
    ) -> Result<RecordScore, LinkError> {
        let old_key = old_key.into();
        let new_key = new_key.into();
        let query = self.old.get(&old_key).ok_or(LinkError::NotFound {
            side: Side::Old,
            key: old_key.clone(),
        })?;
        let candidate = self.new.get(&new_key).ok_or(LinkError::NotFound {
            side: Side::New,
            key: new_key.clone(),
        })?;
        Ok(self.scorer.score_detailed(query, candidate))
    }

    /// Old records without a link, in set order.
    pub fn unlinked_old(&self) -> Vec<&RecordKey> {
        self.old
            .keys()
            .iter()
            .filter(|k| !self.store.is_old_linked(k))
            .collect()
    }

    /// New records no link points at, in set order.
    pub fn unlinked_new(&self) -> Vec<&RecordKey> {
        self.new
            .keys()
            .iter()
            .filter(|k| !self.store.is_new_linked(k))
            .collect()
    }

    /// Number of events waiting to be drained.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Drain queued events, oldest first.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn ensure_known(&self, side: Side, key: &RecordKey) -> Result<(), LinkError> {
        let set = match side {
            Side::Old => &self.old,
            Side::New => &self.new,
        };
        if set.contains(key) {
            Ok(())
        } else {
            Err(LinkError::NotFound {
                side,
                key: key.clone(),
            })
        }
    }

    fn seed_link(&mut self, link: &Link) -> Result<(), LinkError> {
        self.ensure_known(Side::Old, &link.old_key)?;
        self.ensure_known(Side::New, &link.new_key)?;
        self.store.insert(link.clone())
    }

    fn record_removal(&mut self, link: Link, position: usize) -> Link {
        debug!(old = %link.old_key, new = %link.new_key, "unlinked");
        self.history.record(Command::RemoveLink {
            link: link.clone(),
            position,
        });
        self.events.push(SessionEvent::LinkRemoved { link: link.clone() });
        link
    }

    fn emit_replay(&mut self, command: &Command, forwards: bool) {
        let created = command.is_additive() == forwards;
        for link in command.links() {
            let link = link.clone();
            self.events.push(if created {
                SessionEvent::LinkCreated { link }
            } else {
                SessionEvent::LinkRemoved { link }
            });
        }
    }

    fn is_complete(&self) -> bool {
        !self.old.is_empty() && self.store.len() == self.old.len()
    }

    fn check_completion(&mut self, was_complete: bool) {
        if !was_complete && self.is_complete() {
            info!(links = self.store.len(), "migration completed");
            self.events.push(SessionEvent::MigrationCompleted {
                links: self.export_mappings(),
            });
        }
    }
}

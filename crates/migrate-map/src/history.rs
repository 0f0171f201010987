//! Undo/redo over link mutations.
//!
//! Every mutation is captured as an invertible [`Command`]. `apply` replays a
//! command forwards, `revert` undoes it. Multi-link commands are atomic: if
//! one step fails the steps already taken are rolled back before the error is
//! returned, leaving the store as it was.

use migrate_model::{Link, LinkError};
use tracing::warn;

use crate::store::LinkStore;

/// A recorded, reversible link mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A single link was added at the end of the store.
    AddLink(Link),
    /// A single link was removed from `position`.
    RemoveLink { link: Link, position: usize },
    /// An auto-match batch appended these links in order.
    BatchAutoMatch(Vec<Link>),
    /// Every link was cleared; holds them in their former order.
    ClearAll(Vec<Link>),
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Self::AddLink(_) => "add-link",
            Self::RemoveLink { .. } => "remove-link",
            Self::BatchAutoMatch(_) => "batch-auto-match",
            Self::ClearAll(_) => "clear-all",
        }
    }

    /// Links touched by this command.
    pub fn links(&self) -> &[Link] {
        match self {
            Self::AddLink(link) | Self::RemoveLink { link, .. } => std::slice::from_ref(link),
            Self::BatchAutoMatch(links) | Self::ClearAll(links) => links,
        }
    }

    /// True if applying this command adds links (and reverting removes them).
    pub fn is_additive(&self) -> bool {
        matches!(self, Self::AddLink(_) | Self::BatchAutoMatch(_))
    }

    /// Replays the command forwards.
    pub fn apply(&self, store: &mut LinkStore) -> Result<(), LinkError> {
        match self {
            Self::AddLink(link) => store.insert(link.clone()),
            Self::RemoveLink { link, .. } => remove_all(store, std::slice::from_ref(link)),
            Self::BatchAutoMatch(links) => insert_all(store, links),
            Self::ClearAll(links) => remove_all(store, links),
        }
    }

    /// Undoes the command.
    pub fn revert(&self, store: &mut LinkStore) -> Result<(), LinkError> {
        match self {
            Self::AddLink(link) => remove_all(store, std::slice::from_ref(link)),
            Self::RemoveLink { link, position } => store.insert_at(*position, link.clone()),
            Self::BatchAutoMatch(links) => remove_all(store, links),
            Self::ClearAll(links) => insert_all(store, links),
        }
    }
}

/// Appends `links` in order, or none of them.
fn insert_all(store: &mut LinkStore, links: &[Link]) -> Result<(), LinkError> {
    for (applied, link) in links.iter().enumerate() {
        if let Err(err) = store.insert(link.clone()) {
            for done in links[..applied].iter().rev() {
                store.remove_link_pair(&done.old_key, &done.new_key);
            }
            return Err(err);
        }
    }
    Ok(())
}

/// Removes `links` (last first), or none of them.
fn remove_all(store: &mut LinkStore, links: &[Link]) -> Result<(), LinkError> {
    let mut removed = Vec::with_capacity(links.len());
    for link in links.iter().rev() {
        match store.remove_link_pair(&link.old_key, &link.new_key) {
            Some(entry) => removed.push(entry),
            None => {
                for entry in removed.into_iter().rev() {
                    // Positions were valid when taken, so re-insertion cannot conflict.
                    let _ = store.insert_at(entry.position, entry.link);
                }
                return Err(LinkError::NotLinked {
                    old: link.old_key.clone(),
                    new: link.new_key.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Applied and undone command stacks.
#[derive(Debug, Clone, Default)]
pub struct History {
    applied: Vec<Command>,
    undone: Vec<Command>,
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `limit` undoable entries.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Records a freshly applied command and clears the redo stack.
    pub fn record(&mut self, command: Command) {
        self.applied.push(command);
        if let Some(limit) = self.limit
            && self.applied.len() > limit
        {
            let excess = self.applied.len() - limit;
            self.applied.drain(..excess);
        }
        self.undone.clear();
    }

    /// Reverts the most recent command.
    ///
    /// Returns `Ok(None)` when there is nothing to undo. On failure the entry
    /// stays on the applied stack and the store is unchanged.
    pub fn undo(&mut self, store: &mut LinkStore) -> Result<Option<Command>, LinkError> {
        let Some(command) = self.applied.pop() else {
            return Ok(None);
        };
        if let Err(err) = command.revert(store) {
            warn!(command = command.label(), error = %err, "undo failed");
            self.applied.push(command);
            return Err(err);
        }
        self.undone.push(command.clone());
        Ok(Some(command))
    }

    /// Re-applies the most recently undone command.
    pub fn redo(&mut self, store: &mut LinkStore) -> Result<Option<Command>, LinkError> {
        let Some(command) = self.undone.pop() else {
            return Ok(None);
        };
        if let Err(err) = command.apply(store) {
            warn!(command = command.label(), error = %err, "redo failed");
            self.undone.push(command);
            return Err(err);
        }
        self.applied.push(command.clone());
        Ok(Some(command))
    }

    pub fn can_undo(&self) -> bool {
        !self.applied.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.applied.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.undone.len()
    }

    pub fn clear(&mut self) {
        self.applied.clear();
        self.undone.clear();
    }
}

#[cfg(test)]
mod tests {
    use migrate_model::{CardinalityPolicy, RecordKey};

    use super::*;

    fn store_with(links: &[Link]) -> LinkStore {
        LinkStore::with_links(CardinalityPolicy::OneToOne, links.iter().cloned()).unwrap()
    }

    #[test]
    fn undo_redo_single_add() {
        let mut store = LinkStore::new(CardinalityPolicy::OneToOne);
        let mut history = History::new();
        let link = Link::manual(1, 101);
        store.insert(link.clone()).unwrap();
        history.record(Command::AddLink(link.clone()));

        let undone = history.undo(&mut store).unwrap();
        assert_eq!(undone, Some(Command::AddLink(link.clone())));
        assert!(store.is_empty());
        assert!(history.can_redo());

        history.redo(&mut store).unwrap();
        assert_eq!(store.all_links(), &[link]);
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_on_empty_is_noop() {
        let mut store = LinkStore::default();
        let mut history = History::new();
        assert_eq!(history.undo(&mut store).unwrap(), None);
        assert_eq!(history.redo(&mut store).unwrap(), None);
    }

    #[test]
    fn remove_undo_restores_position() {
        let links = [Link::manual(1, 101), Link::manual(2, 102), Link::manual(3, 103)];
        let mut store = store_with(&links);
        let mut history = History::new();
        let removed = store.remove_link(&RecordKey::from(2)).unwrap();
        history.record(Command::RemoveLink {
            link: removed.link,
            position: removed.position,
        });
        history.undo(&mut store).unwrap();
        assert_eq!(store.all_links(), &links);
    }

    #[test]
    fn batch_is_atomic() {
        let mut store = store_with(&[Link::manual(9, 109)]);
        let mut history = History::new();
        let batch = vec![Link::auto(1, 101, 0.9), Link::auto(2, 102, 0.8)];
        Command::BatchAutoMatch(batch.clone()).apply(&mut store).unwrap();
        history.record(Command::BatchAutoMatch(batch));

        history.undo(&mut store).unwrap();
        assert_eq!(store.all_links(), &[Link::manual(9, 109)]);
        history.redo(&mut store).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn failed_replay_rolls_back() {
        // 102 is taken by someone else, so the second insert conflicts.
        let mut store = store_with(&[Link::manual(5, 102)]);
        let batch = Command::BatchAutoMatch(vec![Link::auto(1, 101, 0.9), Link::auto(2, 102, 0.8)]);
        let err = batch.apply(&mut store).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.all_links(), &[Link::manual(5, 102)]);

        let clear = Command::ClearAll(vec![Link::manual(6, 106), Link::manual(5, 102)]);
        let err = clear.apply(&mut store).unwrap_err();
        assert!(matches!(err, LinkError::NotLinked { .. }));
        assert_eq!(store.all_links(), &[Link::manual(5, 102)]);
    }

    #[test]
    fn failed_undo_keeps_entry() {
        let mut store = LinkStore::new(CardinalityPolicy::OneToOne);
        let mut history = History::new();
        history.record(Command::AddLink(Link::manual(1, 101)));
        assert!(history.undo(&mut store).is_err());
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn new_record_clears_redo() {
        let mut store = LinkStore::new(CardinalityPolicy::OneToOne);
        let mut history = History::new();
        store.insert(Link::manual(1, 101)).unwrap();
        history.record(Command::AddLink(Link::manual(1, 101)));
        history.undo(&mut store).unwrap();
        assert_eq!(history.redo_depth(), 1);

        store.insert(Link::manual(2, 102)).unwrap();
        history.record(Command::AddLink(Link::manual(2, 102)));
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn limit_drops_oldest() {
        let mut history = History::with_limit(Some(2));
        for i in 0..3 {
            history.record(Command::AddLink(Link::manual(i, 100 + i)));
        }
        assert_eq!(history.undo_depth(), 2);
        let mut store = store_with(&[Link::manual(1, 101), Link::manual(2, 102)]);
        history.undo(&mut store).unwrap();
        history.undo(&mut store).unwrap();
        assert!(store.is_empty());
        assert!(!history.can_undo());
    }

    #[test]
    fn command_metadata() {
        let command = Command::RemoveLink {
            link: Link::manual(1, 101),
            position: 0,
        };
        assert_eq!(command.label(), "remove-link");
        assert_eq!(command.links().len(), 1);
        assert!(!command.is_additive());
        assert!(Command::BatchAutoMatch(Vec::new()).is_additive());
    }
}

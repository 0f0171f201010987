//! Authoritative link state.
//!
//! The store enforces the cardinality policy on every mutation and never
//! replaces an existing link implicitly: callers unlink first. Record-set
//! membership is checked by the session before keys reach the store.

use migrate_model::{CardinalityPolicy, Link, LinkError, LinkOrigin, RecordKey};

/// A link taken out of the store together with where it sat.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedLink {
    /// Insertion-order position the link occupied.
    pub position: usize,
    pub link: Link,
}

/// Ordered set of links under a cardinality policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkStore {
    policy: CardinalityPolicy,
    links: Vec<Link>,
}

impl LinkStore {
    pub fn new(policy: CardinalityPolicy) -> Self {
        Self {
            policy,
            links: Vec::new(),
        }
    }

    /// Builds a store from existing links, validating each in order.
    pub fn with_links(
        policy: CardinalityPolicy,
        links: impl IntoIterator<Item = Link>,
    ) -> Result<Self, LinkError> {
        let mut store = Self::new(policy);
        for link in links {
            store.insert(link)?;
        }
        Ok(store)
    }

    pub fn policy(&self) -> CardinalityPolicy {
        self.policy
    }

    /// Checks whether `old_key -> new_key` could be added.
    pub fn check(&self, old_key: &RecordKey, new_key: &RecordKey) -> Result<(), LinkError> {
        if let Some(existing) = self.link_for_old(old_key) {
            return Err(LinkError::OldAlreadyLinked {
                old: old_key.clone(),
                existing: existing.new_key.clone(),
            });
        }
        if !self.policy.allows_shared_new()
            && let Some(existing) = self.links.iter().find(|l| &l.new_key == new_key)
        {
            return Err(LinkError::NewAlreadyLinked {
                new: new_key.clone(),
                existing: existing.old_key.clone(),
            });
        }
        Ok(())
    }

    /// Adds a link at the end of the insertion order.
    pub fn add_link(
        &mut self,
        old_key: RecordKey,
        new_key: RecordKey,
        score: Option<f64>,
        origin: LinkOrigin,
    ) -> Result<Link, LinkError> {
        let link = Link {
            old_key,
            new_key,
            score: score.map(|s| s.clamp(0.0, 1.0)),
            origin,
        };
        self.insert(link.clone())?;
        Ok(link)
    }

    /// Appends a prepared link.
    pub fn insert(&mut self, link: Link) -> Result<(), LinkError> {
        check_score(&link)?;
        self.check(&link.old_key, &link.new_key)?;
        self.links.push(link);
        Ok(())
    }

    /// Inserts a link at `position`, clamped to the current length.
    ///
    /// Used to put a removed link back where it was.
    pub fn insert_at(&mut self, position: usize, link: Link) -> Result<(), LinkError> {
        check_score(&link)?;
        self.check(&link.old_key, &link.new_key)?;
        let position = position.min(self.links.len());
        self.links.insert(position, link);
        Ok(())
    }

    /// Removes the link of an old record, if any.
    pub fn remove_link(&mut self, old_key: &RecordKey) -> Option<RemovedLink> {
        let position = self.links.iter().position(|l| &l.old_key == old_key)?;
        Some(RemovedLink {
            position,
            link: self.links.remove(position),
        })
    }

    /// Removes the link connecting exactly `old_key -> new_key`, if any.
    pub fn remove_link_pair(
        &mut self,
        old_key: &RecordKey,
        new_key: &RecordKey,
    ) -> Option<RemovedLink> {
        let position = self.links.iter().position(|l| l.connects(old_key, new_key))?;
        Some(RemovedLink {
            position,
            link: self.links.remove(position),
        })
    }

    /// Removes every link and returns them in insertion order.
    pub fn clear(&mut self) -> Vec<Link> {
        std::mem::take(&mut self.links)
    }

    pub fn link_for_old(&self, old_key: &RecordKey) -> Option<&Link> {
        self.links.iter().find(|l| &l.old_key == old_key)
    }

    /// Links starting at an old record; at most one.
    pub fn links_for_old(&self, old_key: &RecordKey) -> Vec<&Link> {
        self.links.iter().filter(|l| &l.old_key == old_key).collect()
    }

    /// Links targeting a new record; several under many-to-one.
    pub fn links_for_new(&self, new_key: &RecordKey) -> Vec<&Link> {
        self.links.iter().filter(|l| &l.new_key == new_key).collect()
    }

    /// All links in insertion order.
    pub fn all_links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_old_linked(&self, old_key: &RecordKey) -> bool {
        self.links.iter().any(|l| &l.old_key == old_key)
    }

    pub fn is_new_linked(&self, new_key: &RecordKey) -> bool {
        self.links.iter().any(|l| &l.new_key == new_key)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of distinct new records targeted by at least one link.
    pub fn linked_new_count(&self) -> usize {
        let mut targets: Vec<&RecordKey> = self.links.iter().map(|l| &l.new_key).collect();
        targets.sort_unstable();
        targets.dedup();
        targets.len()
    }
}

/// Rejects scores outside `[0, 1]`, NaN included.
fn check_score(link: &Link) -> Result<(), LinkError> {
    match link.score {
        Some(score) if !(0.0..=1.0).contains(&score) => Err(LinkError::InvalidScore {
            old: link.old_key.clone(),
            new: link.new_key.clone(),
            score,
        }),
        _ => Ok(()),
    }
}

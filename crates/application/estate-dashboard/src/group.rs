//! Exclusive-selection button group
//!
//! A set of mutually exclusive triggers where exactly one member is active
//! after a selection. Used for the chart category nav and the sidebar's view
//! nav.

use estate_core::{Error, Result};
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusiveGroup<K> {
    members: Vec<K>,
    active: Option<K>,
}

impl<K: Copy + PartialEq + Debug> ExclusiveGroup<K> {
    pub fn new(members: impl IntoIterator<Item = K>) -> Self {
        Self {
            members: members.into_iter().collect(),
            active: None,
        }
    }

    pub fn members(&self) -> &[K] {
        &self.members
    }

    pub fn active(&self) -> Option<K> {
        self.active
    }

    pub fn is_active(&self, key: K) -> bool {
        self.active == Some(key)
    }

    /// Members paired with their active flag, in member order
    pub fn states(&self) -> impl Iterator<Item = (K, bool)> + '_ {
        self.members.iter().map(move |&k| (k, self.is_active(k)))
    }

    /// Mark `key` active, every other member inactive, then run its action.
    ///
    /// Re-selecting the active member runs the action again. Non-members are
    /// rejected without touching the current selection.
    pub fn select<R, F>(&mut self, key: K, action: F) -> Result<R>
    where
        F: FnOnce(K) -> Result<R>,
    {
        if !self.members.contains(&key) {
            return Err(Error::InvalidInput(format!("{:?} is not a member of this group", key)));
        }
        self.active = Some(key);
        action(key)
    }

    /// Mark `key` active without running anything
    pub fn mark(&mut self, key: K) -> Result<()> {
        self.select(key, |_| Ok(()))
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

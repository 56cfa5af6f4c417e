//! In-flight registry
//!
//! Tracks keys with an outstanding external call. A claim is released when
//! its guard drops, including on early return or task cancellation.

use dashmap::DashSet;
use std::hash::Hash;

#[derive(Debug)]
pub struct InFlight<K: Eq + Hash> {
    keys: DashSet<K>,
}

impl<K: Eq + Hash> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            keys: DashSet::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`; `None` if it is already claimed
    pub fn try_claim(&self, key: K) -> Option<Claim<'_, K>> {
        if self.keys.insert(key.clone()) {
            Some(Claim { owner: self, key })
        } else {
            None
        }
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Held claim on one key
#[derive(Debug)]
pub struct Claim<'a, K: Eq + Hash> {
    owner: &'a InFlight<K>,
    key: K,
}

impl<K: Eq + Hash> Drop for Claim<'_, K> {
    fn drop(&mut self) {
        self.owner.keys.remove(&self.key);
    }
}

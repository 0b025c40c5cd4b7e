use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::FollowKey;

/// Why an acquisition was refused.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rejected {
    AlreadyFollowed,
    AtCapacity,
}

/// Set of keys that currently have a live follower.
///
/// Cloning yields another handle to the same set. A key is inserted when a follow
/// attempt is accepted and removed when that attempt reaches a terminal state.
#[derive(Clone, Debug, Default)]
pub struct FollowerRegistry {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    active: Mutex<HashSet<FollowKey>>,
    limit: Option<usize>,
}

impl FollowerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that refuses new keys while `limit` keys are already followed.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                active: Mutex::new(HashSet::new()),
                limit: Some(limit),
            }),
        }
    }

    /// Atomically inserts `key` if absent. Returns whether the caller now owns it.
    pub fn try_acquire(&self, key: &FollowKey) -> bool {
        self.insert(key).is_ok()
    }

    /// Removes `key`. Releasing an absent key is a no-op.
    pub fn release(&self, key: &FollowKey) -> bool {
        self.inner.active.lock().remove(key)
    }

    /// Acquires `key` and returns a guard that releases it on drop.
    pub fn acquire(&self, key: FollowKey) -> Result<FollowGuard, Rejected> {
        self.insert(&key)?;
        Ok(FollowGuard {
            registry: self.clone(),
            key,
        })
    }

    pub fn contains(&self, key: &FollowKey) -> bool {
        self.inner.active.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.active.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, key: &FollowKey) -> Result<(), Rejected> {
        let mut active = self.inner.active.lock();
        if active.contains(key) {
            return Err(Rejected::AlreadyFollowed);
        }
        if let Some(limit) = self.inner.limit {
            if active.len() >= limit {
                return Err(Rejected::AtCapacity);
            }
        }
        active.insert(key.clone());
        Ok(())
    }
}

/// Ownership of one registry entry. Dropping it releases the key.
#[derive(Debug)]
pub struct FollowGuard {
    registry: FollowerRegistry,
    key: FollowKey,
}

impl FollowGuard {
    pub fn key(&self) -> &FollowKey {
        &self.key
    }
}

impl Drop for FollowGuard {
    fn drop(&mut self) {
        if self.registry.release(&self.key) {
            tracing::debug!(key = %self.key, "released follower");
        } else {
            tracing::debug!(key = %self.key, "no follower found to release");
        }
    }
}

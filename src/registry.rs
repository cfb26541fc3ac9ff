//! Copy-on-write registration sets.
//!
//! Writers clone the member list, modify the clone and swap it in under a
//! short write lock. Readers take an `Arc` snapshot and iterate it without
//! holding any lock, so iteration never observes a partially updated set and
//! never blocks registration.

use std::sync::{Arc, PoisonError, RwLock};

use crate::trigger::BuildTrigger;

/// Set of live build triggers.
pub type TriggerRegistry = SnapshotSet<dyn BuildTrigger>;

/// A set of shared members, unique by `Arc` identity.
pub struct SnapshotSet<T: ?Sized> {
    members: RwLock<Arc<Vec<Arc<T>>>>,
}

impl<T: ?Sized> SnapshotSet<T> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            members: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Add a member. Returns false if the same `Arc` is already present.
    pub fn insert(&self, member: Arc<T>) -> bool {
        // The guarded value is only ever replaced wholesale, so a poisoned
        // lock still holds a consistent list.
        let mut guard = self.members.write().unwrap_or_else(PoisonError::into_inner);
        if guard.iter().any(|m| same(m, &member)) {
            return false;
        }
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(member);
        *guard = Arc::new(next);
        true
    }

    /// Remove a member. Returns false if it was not present.
    pub fn remove(&self, member: &Arc<T>) -> bool {
        let mut guard = self.members.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.iter().any(|m| same(m, member)) {
            return false;
        }
        let next: Vec<Arc<T>> = guard.iter().filter(|m| !same(m, member)).cloned().collect();
        *guard = Arc::new(next);
        true
    }

    /// Returns true if this exact `Arc` is a member.
    #[must_use]
    pub fn contains(&self, member: &Arc<T>) -> bool {
        self.snapshot().iter().any(|m| same(m, member))
    }

    /// The current members. Later changes do not affect the returned list.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        Arc::clone(&self.members.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns true if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized> Default for SnapshotSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for SnapshotSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotSet").field("len", &self.len()).finish()
    }
}

// Compare data pointers only; vtable pointers of the same object may differ
// across codegen units.
fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

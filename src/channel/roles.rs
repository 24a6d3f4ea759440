//! Concurrent membership sets keyed by thread identity.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};
use std::thread::ThreadId;

/// A set of thread identities under a reader-writer lock.
///
/// Membership is the only query; there is no ordering. A thread's
/// capability is a runtime fact looked up here, not a static type.
pub(crate) struct RoleSet {
    ids: RwLock<HashSet<ThreadId>>,
}

impl RoleSet {
    pub(crate) fn new() -> Self {
        Self {
            ids: RwLock::new(HashSet::new()),
        }
    }

    /// A set seeded with one member, for the channel creator's implicit
    /// roles.
    pub(crate) fn with_member(id: ThreadId) -> Self {
        let set = Self::new();
        set.add(id);
        set
    }

    pub(crate) fn contains(&self, id: ThreadId) -> bool {
        self.ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    /// Adds `id` to the set. Adding a present member is a no-op.
    pub(crate) fn add(&self, id: ThreadId) {
        self.ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }

    /// Removes `id` from the set. Removing an absent member is a no-op.
    pub(crate) fn remove(&self, id: ThreadId) {
        self.ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn add_contains_remove() {
        let set = RoleSet::new();
        let me = thread::current().id();

        assert!(!set.contains(me));
        set.add(me);
        assert!(set.contains(me));
        set.remove(me);
        assert!(!set.contains(me));
    }

    #[test]
    fn add_and_remove_are_idempotent() {
        let set = RoleSet::new();
        let me = thread::current().id();

        set.add(me);
        set.add(me);
        assert!(set.contains(me));

        set.remove(me);
        set.remove(me);
        assert!(!set.contains(me));
    }

    #[test]
    fn with_member_seeds_the_set() {
        let me = thread::current().id();
        let set = RoleSet::with_member(me);
        assert!(set.contains(me));
    }

    #[test]
    fn membership_is_per_thread() {
        let set = RoleSet::with_member(thread::current().id());

        thread::scope(|scope| {
            scope.spawn(|| {
                let worker = thread::current().id();
                assert!(!set.contains(worker));
                set.add(worker);
                assert!(set.contains(worker));
            });
        });

        assert!(set.contains(thread::current().id()));
    }
}

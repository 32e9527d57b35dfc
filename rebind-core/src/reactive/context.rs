//! Internal-set guard
//!
//! When a view writes to its own model, an observable model echoes the write
//! back through the adapter. The view has already notified its bus, so the
//! echo must be dropped or every binding would render twice.
//!
//! # Implementation
//!
//! The guard is a depth counter. `enter` increments it and returns a scope
//! that decrements it on drop, so nested sets and early returns (including
//! `?` on a failing handler) keep the count balanced.

use std::cell::Cell;

/// Tracks whether a view is inside one of its own `set` calls.
#[derive(Debug, Default)]
pub struct InternalSet {
    depth: Cell<usize>,
}

impl InternalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a set as in flight until the returned scope is dropped.
    pub fn enter(&self) -> InternalSetScope<'_> {
        self.depth.set(self.depth.get() + 1);
        InternalSetScope { guard: self }
    }

    /// Check if a set is in flight.
    pub fn is_active(&self) -> bool {
        self.depth.get() > 0
    }
}

/// Scope returned by `InternalSet::enter`.
pub struct InternalSetScope<'a> {
    guard: &'a InternalSet,
}

impl Drop for InternalSetScope<'_> {
    fn drop(&mut self) {
        let depth = self.guard.depth.get();
        debug_assert!(depth > 0, "InternalSet scope dropped twice");
        self.guard.depth.set(depth.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_tracks_activity() {
        let guard = InternalSet::new();
        assert!(!guard.is_active());

        {
            let _scope = guard.enter();
            assert!(guard.is_active());
        }

        assert!(!guard.is_active());
    }

    #[test]
    fn nested_scopes() {
        let guard = InternalSet::new();

        {
            let _outer = guard.enter();
            {
                let _inner = guard.enter();
                assert!(guard.is_active());
            }
            // Outer scope still holds the guard.
            assert!(guard.is_active());
        }

        assert!(!guard.is_active());
    }

    #[test]
    fn early_return_releases() {
        fn failing(guard: &InternalSet) -> Result<(), ()> {
            let _scope = guard.enter();
            Err(())
        }

        let guard = InternalSet::new();
        assert!(failing(&guard).is_err());
        assert!(!guard.is_active());
    }
}

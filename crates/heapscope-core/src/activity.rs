use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cloneable flag marking that a heap diff is in flight.
///
/// The differ raises the flag around snapshot capture and graph traversal;
/// collection-event sources read it and drop events produced while it is
/// raised, so the differ's own transient allocations are not misread as
/// application growth.
///
/// Guards nest: the flag stays raised until the last outstanding
/// [`ActivityGuard`] drops.
#[derive(Clone, Default)]
pub struct ActivityFlag {
    active: Arc<AtomicUsize>,
}

impl ActivityFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any guard is currently held.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) > 0
    }

    /// Raise the flag for the lifetime of the returned guard.
    pub fn enter(&self) -> ActivityGuard {
        self.active.fetch_add(1, Ordering::AcqRel);
        ActivityGuard {
            active: self.active.clone(),
        }
    }
}

impl fmt::Debug for ActivityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityFlag")
            .field("active", &self.is_active())
            .finish()
    }
}

/// RAII guard returned by [`ActivityFlag::enter`].
pub struct ActivityGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

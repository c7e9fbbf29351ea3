//! Non-blocking reentrancy gate.

use std::sync::atomic::{AtomicBool, Ordering};

/// Runs a closure only when no other closure is running through the same guard.
///
/// A nested call is skipped, not queued. The binding routes both sync
/// directions through one guard so that applying a change on one side never
/// echoes back to the other.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    active: AtomicBool,
}

/// Releases the guard when dropped, including during unwinding.
struct ActiveScope<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for ActiveScope<'_> {
    fn drop(&mut self) {
        self.guard.active.store(false, Ordering::Release);
    }
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` unless the guard is already held. Returns `None` when skipped.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        if self
            .active
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return None;
        }
        let _scope = ActiveScope { guard: self };
        Some(f())
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

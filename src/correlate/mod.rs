//! Pending-timer correlation table.
//!
//! # Responsibilities
//! - Map invocation id -> start instant for in-flight operations
//! - Turn a matched response into a whole-millisecond elapsed time
//!
//! # Design Decisions
//! - Owned by exactly one [`Trace`](crate::trace::Trace); the trace is
//!   single-owner per request, so a plain map needs no locking
//! - A later `arm` for the same id overwrites the earlier one. Reusing one
//!   invocation id for two concurrent sibling operations therefore
//!   cross-talks; callers should mint a fresh id per operation
//! - Unmatched entries are not expired; they are dropped wholesale when the
//!   owning trace resets

use std::collections::HashMap;
use std::time::Instant;

/// Table of armed timers keyed by invocation id.
#[derive(Debug, Default)]
pub struct PendingTimers {
    entries: HashMap<String, Instant>,
}

impl PendingTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer for `invoke` at `at`. Overwrites any prior entry.
    pub fn arm(&mut self, invoke: &str, at: Instant) {
        self.entries.insert(invoke.to_string(), at);
    }

    /// Resolve the timer for `invoke`, removing it and returning the elapsed
    /// whole milliseconds up to `at`. `None` when nothing was armed.
    pub fn resolve(&mut self, invoke: &str, at: Instant) -> Option<u64> {
        self.entries
            .remove(invoke)
            .map(|start| at.saturating_duration_since(start).as_millis() as u64)
    }

    /// Drop every armed timer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_arm_then_resolve_yields_delta() {
        let mut timers = PendingTimers::new();
        let t0 = Instant::now();
        timers.arm("i1", t0);

        let elapsed = timers.resolve("i1", t0 + Duration::from_millis(42));
        assert_eq!(elapsed, Some(42));
        // Entry is consumed.
        assert!(timers.is_empty());
    }

    #[test]
    fn test_resolve_without_arm_is_absent() {
        let mut timers = PendingTimers::new();
        assert_eq!(timers.resolve("never-armed", Instant::now()), None);
    }

    #[test]
    fn test_later_arm_wins() {
        let mut timers = PendingTimers::new();
        let t0 = Instant::now();
        timers.arm("dup", t0);
        timers.arm("dup", t0 + Duration::from_millis(100));

        let elapsed = timers.resolve("dup", t0 + Duration::from_millis(150));
        assert_eq!(elapsed, Some(50));
    }

    #[test]
    fn test_resolve_never_goes_negative() {
        let mut timers = PendingTimers::new();
        let t0 = Instant::now();
        timers.arm("back", t0 + Duration::from_millis(10));

        // Resolution instant before the armed instant saturates to zero.
        assert_eq!(timers.resolve("back", t0), Some(0));
    }

    #[test]
    fn test_clear_drops_all_entries() {
        let mut timers = PendingTimers::new();
        let now = Instant::now();
        timers.arm("a", now);
        timers.arm("b", now);
        assert_eq!(timers.len(), 2);

        timers.clear();
        assert!(timers.is_empty());
        assert_eq!(timers.resolve("a", now), None);
    }
}

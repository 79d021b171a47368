//! Per-vessel cleanup timers
//!
//! A cancellable deadline per vessel on a virtual clock. Scheduling a vessel
//! again replaces (cancels) its previous deadline. Nothing fires by itself:
//! the owner polls [`CleanupTimers::take_due`] with the current time, which
//! keeps expiry serialized with position updates and lets tests drive time
//! explicitly.

use std::collections::HashMap;

use crate::vessel::Timestamp;

/// Cleanup deadlines keyed by vessel id
#[derive(Debug, Clone, Default)]
pub struct CleanupTimers {
    deadlines: HashMap<String, Timestamp>,
}

impl CleanupTimers {
    pub fn new() -> Self {
        CleanupTimers::default()
    }

    /// Schedule (or reschedule) the deadline for a vessel.
    ///
    /// Returns the deadline that was cancelled, if any.
    pub fn schedule(&mut self, id: &str, deadline: Timestamp) -> Option<Timestamp> {
        self.deadlines.insert(id.to_string(), deadline)
    }

    /// Cancel a vessel's deadline. Returns true if one was pending.
    pub fn cancel(&mut self, id: &str) -> bool {
        self.deadlines.remove(id).is_some()
    }

    pub fn deadline(&self, id: &str) -> Option<Timestamp> {
        self.deadlines.get(id).copied()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.deadlines.values().min().copied()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Remove and return every vessel whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_due(&mut self, now: Timestamp) -> Vec<String> {
        let mut due: Vec<(Timestamp, String)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, deadline)| (*deadline, id.clone()))
            .collect();
        due.sort();

        for (_, id) in &due {
            self.deadlines.remove(id);
        }
        due.into_iter().map(|(_, id)| id).collect()
    }
}

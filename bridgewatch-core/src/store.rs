//! Vessel State Store
//!
//! Owns every tracked vessel. Each write reschedules the vessel's cleanup
//! timer with a zone-dependent timeout and applies the grace rule that drops
//! passed or idle vessels after repeated irrelevant updates.

use std::collections::HashMap;

use crate::bridges::BridgeId;
use crate::proximity::Zone;
use crate::settings::Settings;
use crate::timers::CleanupTimers;
use crate::vessel::{Timestamp, Vessel, VesselStatus};

/// Repository of tracked vessels keyed by id
#[derive(Debug, Clone)]
pub struct VesselStateStore {
    vessels: HashMap<String, Vessel>,
    timers: CleanupTimers,
    settings: Settings,
}

impl Default for VesselStateStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl VesselStateStore {
    pub fn new(settings: Settings) -> Self {
        VesselStateStore {
            vessels: HashMap::new(),
            timers: CleanupTimers::new(),
            settings,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Vessel> {
        self.vessels.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vessels.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    /// All vessels, ordered by id
    pub fn list(&self) -> Vec<&Vessel> {
        let mut list: Vec<&Vessel> = self.vessels.values().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    /// Cleanup timeout for a vessel in milliseconds.
    ///
    /// Sized by zone, never shorter than the waiting timeout while waiting.
    pub fn timeout_ms(&self, vessel: &Vessel) -> u64 {
        let secs = match Zone::classify(vessel.distance_to_nearest) {
            Zone::Bridge => self.settings.bridge_zone_timeout_secs,
            Zone::Near => self.settings.near_zone_timeout_secs,
            Zone::Far => self.settings.far_zone_timeout_secs,
        };
        let secs = if vessel.status == VesselStatus::Waiting {
            secs.max(self.settings.waiting_timeout_secs)
        } else {
            secs
        };
        secs.saturating_mul(1000)
    }

    /// A vessel is relevant while it is heading for a target or sits at a
    /// bridge, and is not idle.
    pub fn is_relevant(vessel: &Vessel) -> bool {
        vessel.status != VesselStatus::Idle
            && (vessel.target_bridge.is_some() || vessel.near_bridge.is_some())
    }

    /// Write a vessel back and reschedule its cleanup timer.
    ///
    /// Returns false if the grace rule removed the vessel instead.
    pub fn upsert(&mut self, mut vessel: Vessel, now: Timestamp) -> bool {
        if Self::is_relevant(&vessel) {
            vessel.grace_misses = 0;
        } else {
            vessel.grace_misses = vessel.grace_misses.saturating_add(1);
            log::trace!(
                "{}: irrelevant update, grace miss {}/{}",
                vessel.id,
                vessel.grace_misses,
                self.settings.grace_miss_limit
            );
        }

        if vessel.grace_misses >= self.settings.grace_miss_limit
            && matches!(vessel.status, VesselStatus::Passed | VesselStatus::Idle)
        {
            log::info!(
                "{}: removed after {} irrelevant updates ({})",
                vessel.id,
                vessel.grace_misses,
                vessel.status
            );
            self.remove(&vessel.id);
            return false;
        }

        let deadline = now.saturating_add(self.timeout_ms(&vessel));
        self.timers.schedule(&vessel.id, deadline);
        self.vessels.insert(vessel.id.clone(), vessel);
        true
    }

    /// Remove a vessel and cancel its timer
    pub fn remove(&mut self, id: &str) -> Option<Vessel> {
        self.timers.cancel(id);
        self.vessels.remove(id)
    }

    /// Remove every vessel whose cleanup timer has fired
    pub fn expire(&mut self, now: Timestamp) -> Vec<Vessel> {
        let mut removed = Vec::new();
        for id in self.timers.take_due(now) {
            if let Some(vessel) = self.vessels.remove(&id) {
                log::info!(
                    "{}: no update for {} s, removed",
                    id,
                    now.saturating_sub(vessel.timestamp) / 1000
                );
                removed.push(vessel);
            }
        }
        removed
    }

    pub fn deadline(&self, id: &str) -> Option<Timestamp> {
        self.timers.deadline(id)
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.next_deadline()
    }

    /// Whether any vessel (at `bridge`, if given) reported within `window_ms`.
    ///
    /// A vessel counts for a bridge when it is near it or heading to it.
    pub fn activity_within(&self, bridge: Option<BridgeId>, window_ms: u64, now: Timestamp) -> bool {
        self.vessels
            .values()
            .any(|v| Self::is_active(v, bridge, window_ms, now))
    }

    /// Whether one vessel counts as activity for [`Self::activity_within`]
    pub fn is_active(vessel: &Vessel, bridge: Option<BridgeId>, window_ms: u64, now: Timestamp) -> bool {
        vessel.timestamp.saturating_add(window_ms) >= now
            && match bridge {
                None => true,
                Some(b) => vessel.near_bridge == Some(b) || vessel.target_bridge == Some(b),
            }
    }
}

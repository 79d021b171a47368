//! Status Classifier
//!
//! The per-vessel state machine. Exactly one status is chosen per update,
//! checked in this order:
//!
//! | Priority | Status | Condition |
//! |----------|--------|-----------|
//! | 1 | UnderBridge | nearest bridge is the target and closer than 50 m |
//! | 2 | Waiting | within 300 m of a bridge, slow, for the dwell time |
//! | 3 | Passed | passage detected now, or within the display window |
//! | 4 | Approaching | within 500 m of a relevant bridge and heading towards it |
//! | 5 | Idle | slow and more than 300 m from every bridge |
//! | 6 | EnRoute | default while the vessel has a target |
//!
//! Passage detection uses hysteresis: a vessel is armed once it comes within
//! 400 m of its target and the passage fires only when it is more than 50 m
//! away again on the other side of the bridge. The slow-vessel dwell timer
//! does the same job for waiting. The no-opening bridge never produces
//! `Waiting`.

use serde::Serialize;

use crate::bridges::BridgeId;
use crate::geo::{Direction, Side};
use crate::proximity::{ProximityReport, APPROACH_RADIUS_M, BRIDGE_ZONE_M, UNDER_BRIDGE_M};
use crate::settings::Settings;
use crate::target::TargetBridgeResolver;
use crate::vessel::{Timestamp, Vessel, VesselStatus};

/// A vessel within this distance of its target is armed for passage detection
pub const PASSAGE_ARM_DISTANCE_M: f64 = 400.0;

/// Leaving the bridge without changing side counts as a passage only beyond
/// this distance
pub const UNDER_BRIDGE_EXIT_M: f64 = 100.0;

/// Below this speed and away from every bridge a vessel is idle
pub const IDLE_SPEED_KN: f64 = 0.20;

/// A detected bridge passage
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    pub bridge: BridgeId,
    pub direction: Direction,
    /// Target after the passage; `None` once the last target is behind
    pub new_target: Option<BridgeId>,
    pub at: Timestamp,
}

/// Chooses the status of a vessel on every update
#[derive(Debug, Clone)]
pub struct StatusClassifier {
    waiting_dwell_ms: u64,
    waiting_speed_kn: f64,
    passed_display_ms: u64,
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl StatusClassifier {
    pub fn new(settings: &Settings) -> Self {
        StatusClassifier {
            waiting_dwell_ms: settings.waiting_dwell_ms(),
            waiting_speed_kn: settings.waiting_speed_kn,
            passed_display_ms: settings.passed_display_ms(),
        }
    }

    /// Classify a vessel whose position, proximity and target are current.
    ///
    /// Sets `vessel.status` and returns the passage detected on this update,
    /// if any. A passage of the target re-targets the vessel.
    pub fn classify(
        &self,
        vessel: &mut Vessel,
        proximity: &ProximityReport,
        now: Timestamp,
    ) -> Option<Passage> {
        let passage = self
            .track_target_passage(vessel, proximity, now)
            .or_else(|| self.track_checkpoint_passage(vessel, proximity, now));
        let waiting = self.update_wait(vessel, proximity, now);

        let status = if Self::is_under_bridge(vessel, proximity) {
            VesselStatus::UnderBridge
        } else if waiting {
            VesselStatus::Waiting
        } else if passage.is_some() || vessel.recently_passed(now, self.passed_display_ms) {
            VesselStatus::Passed
        } else if Self::is_approaching(vessel, proximity) {
            VesselStatus::Approaching
        } else if vessel.sog < IDLE_SPEED_KN && proximity.nearest_distance() > BRIDGE_ZONE_M {
            VesselStatus::Idle
        } else if vessel.target_bridge.is_none() && !vessel.passed_bridges.is_empty() {
            // Beyond the last target: stays passed until grace removes it
            VesselStatus::Passed
        } else {
            VesselStatus::EnRoute
        };

        if status != vessel.status {
            log::debug!(
                "{}: {} -> {} ({:.0} m from {}, {:.1} kn)",
                vessel.id,
                vessel.status,
                status,
                proximity.nearest_distance(),
                proximity
                    .nearest_bridge()
                    .map(|b| b.name())
                    .unwrap_or("no bridge"),
                vessel.sog
            );
        }
        vessel.status = status;
        passage
    }

    fn is_under_bridge(vessel: &Vessel, proximity: &ProximityReport) -> bool {
        match vessel.target_bridge {
            Some(target) => {
                proximity.near_bridge == Some(target) && proximity.distance_to(target) < UNDER_BRIDGE_M
            }
            None => false,
        }
    }

    fn is_approaching(vessel: &Vessel, proximity: &ProximityReport) -> bool {
        match proximity.nearest {
            Some((bridge, distance)) if distance <= APPROACH_RADIUS_M => {
                (vessel.target_bridge.is_some() || bridge.is_target())
                    && TargetBridgeResolver::is_heading_towards(vessel, bridge)
            }
            _ => false,
        }
    }

    /// Run the dwell timer. True once the vessel has been slow near a bridge
    /// for the full dwell time; any speed-up resets it immediately.
    fn update_wait(&self, vessel: &mut Vessel, proximity: &ProximityReport, now: Timestamp) -> bool {
        let near = proximity.nearest_distance() <= BRIDGE_ZONE_M;
        let at_special = proximity.nearest_bridge().is_some_and(|b| b.is_special());

        if near && !at_special && vessel.sog < self.waiting_speed_kn {
            let since = *vessel.wait_since.get_or_insert(now);
            now.saturating_sub(since) >= self.waiting_dwell_ms
        } else {
            vessel.wait_since = None;
            false
        }
    }

    /// Hysteresis passage detection for the target bridge
    fn track_target_passage(
        &self,
        vessel: &mut Vessel,
        proximity: &ProximityReport,
        now: Timestamp,
    ) -> Option<Passage> {
        let target = vessel.target_bridge?;
        let distance = proximity.distance_to(target);
        let side = Side::of(vessel.lat, target.bridge());

        if !vessel.was_inside_target {
            if distance <= PASSAGE_ARM_DISTANCE_M {
                vessel.was_inside_target = true;
                vessel.target_entry_side = Some(side);
                log::trace!("{}: armed for {} at {:.0} m", vessel.id, target, distance);
            }
            return None;
        }

        let entry = vessel.target_entry_side;
        let crossed = entry.is_some_and(|e| e != side)
            || (vessel.status == VesselStatus::UnderBridge
                && distance > UNDER_BRIDGE_EXIT_M
                && !TargetBridgeResolver::is_heading_towards(vessel, target));

        if distance > UNDER_BRIDGE_M && crossed {
            let direction = entry
                .and_then(|e| e.crossing_to(side))
                .unwrap_or_else(|| vessel.direction());
            let new_target = TargetBridgeResolver::retarget_after_passage(target, direction);

            Self::record_passage(vessel, target, now);
            vessel.was_inside_target = false;
            vessel.target_entry_side = None;
            vessel.target_bridge = new_target;
            vessel.distance_to_target = new_target
                .map(|t| proximity.distance_to(t))
                .unwrap_or(f64::INFINITY);

            log::info!(
                "{}: passed {} {}, next target {}",
                vessel.id,
                target,
                direction,
                new_target.map(|t| t.name()).unwrap_or("none")
            );
            return Some(Passage {
                bridge: target,
                direction,
                new_target,
                at: now,
            });
        }

        if distance > PASSAGE_ARM_DISTANCE_M {
            // Left the zone without crossing
            vessel.was_inside_target = false;
            vessel.target_entry_side = None;
        }
        None
    }

    /// Passage detection for intermediate bridges and the no-opening bridge.
    /// The target is kept; a vessel without one picks up the next in sequence.
    fn track_checkpoint_passage(
        &self,
        vessel: &mut Vessel,
        proximity: &ProximityReport,
        now: Timestamp,
    ) -> Option<Passage> {
        if let Some(near) = proximity.near_bridge {
            let watching = vessel.checkpoint.map(|(b, _)| b);
            if !near.is_target() && watching != Some(near) {
                vessel.checkpoint = Some((near, Side::of(vessel.lat, near.bridge())));
                return None;
            }
        }

        let (bridge, entry) = vessel.checkpoint?;
        let distance = proximity.distance_to(bridge);
        let side = Side::of(vessel.lat, bridge.bridge());

        if distance > UNDER_BRIDGE_M && side != entry {
            let direction = entry.crossing_to(side).unwrap_or_else(|| vessel.direction());
            vessel.checkpoint = None;
            Self::record_passage(vessel, bridge, now);

            if vessel.target_bridge.is_none() {
                vessel.target_bridge = bridge.next_target(direction);
                vessel.distance_to_target = vessel
                    .target_bridge
                    .map(|t| proximity.distance_to(t))
                    .unwrap_or(f64::INFINITY);
            }
            log::info!(
                "{}: passed {} {}, heading to {}",
                vessel.id,
                bridge,
                direction,
                vessel.target_bridge.map(|t| t.name()).unwrap_or("none")
            );
            return Some(Passage {
                bridge,
                direction,
                new_target: vessel.target_bridge,
                at: now,
            });
        }

        if distance > bridge.bridge().radius {
            vessel.checkpoint = None;
        }
        None
    }

    fn record_passage(vessel: &mut Vessel, bridge: BridgeId, now: Timestamp) {
        vessel.passed_bridges.insert(bridge);
        vessel.last_passed_bridge = Some(bridge);
        vessel.last_passed_bridge_time = Some(now);
        vessel.wait_since = None;
    }
}

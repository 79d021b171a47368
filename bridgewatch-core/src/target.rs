//! Target Bridge Resolver
//!
//! Decides which of the two opening bridges a vessel is heading for and keeps
//! that assignment valid as the vessel moves.
//!
//! # Rules
//!
//! | Step | Condition | Result |
//! |------|-----------|--------|
//! | validate | within 300 m of target | keep |
//! | validate | > 800 m and < 0.3 kn | clear |
//! | validate | > 400 m and not heading towards target | clear |
//! | assign | within 300 m of, or approaching within 500 m, an intermediate or special bridge, moving | next target in sequence |
//! | assign | > 1000 m | reject |
//! | assign | > 600 m and < 0.5 kn | reject |
//! | assign | > 300 m and < 0.2 kn | reject |
//! | assign | not heading towards candidate | reject |
//!
//! The candidate is always the next target bridge along the vessel's
//! direction of travel, so a vessel that starts between two bridges locks on
//! to the one ahead of it rather than the one nearest to it.

use crate::bridges::{next_target_from, BridgeId};
use crate::geo::{is_heading_towards, Direction};
use crate::proximity::{ProximityReport, APPROACH_RADIUS_M};
use crate::vessel::Vessel;

/// Beyond this distance no target is assigned
pub const MAX_ASSIGN_DISTANCE_M: f64 = 1000.0;
/// Beyond this distance a target needs at least [`SLOW_ASSIGN_MIN_SPEED_KN`]
pub const SLOW_ASSIGN_DISTANCE_M: f64 = 600.0;
pub const SLOW_ASSIGN_MIN_SPEED_KN: f64 = 0.5;
/// Beyond this distance a target needs at least [`NEAR_ASSIGN_MIN_SPEED_KN`]
pub const NEAR_ASSIGN_DISTANCE_M: f64 = 300.0;
pub const NEAR_ASSIGN_MIN_SPEED_KN: f64 = 0.2;

/// A stalled vessel beyond this distance loses its target
pub const CLEAR_STALLED_DISTANCE_M: f64 = 800.0;
pub const CLEAR_STALLED_SPEED_KN: f64 = 0.3;
/// A vessel turned away beyond this distance loses its target
pub const CLEAR_HEADING_DISTANCE_M: f64 = 400.0;
/// Within this distance of its target a vessel never loses it
pub const PROTECTED_DISTANCE_M: f64 = 300.0;

/// Why a candidate target was not assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentRejection {
    NoCandidate,
    TooFar,
    TooSlowFar,
    TooSlowNear,
    NotHeadingTowards,
}

/// Why an existing target was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    Stalled,
    TurnedAway,
}

/// What the resolver did to a vessel's target
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetChange {
    /// No target before or after
    Unassigned,
    Kept(BridgeId),
    Assigned(BridgeId),
    Cleared(BridgeId, ClearReason),
    Retargeted { from: BridgeId, to: BridgeId },
}

/// Assigns, validates and clears target bridges
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetBridgeResolver;

impl TargetBridgeResolver {
    pub fn new() -> Self {
        TargetBridgeResolver
    }

    pub fn is_heading_towards(vessel: &Vessel, bridge: BridgeId) -> bool {
        is_heading_towards(vessel.cog, vessel.lat, vessel.lon, bridge.bridge())
    }

    /// Distance and speed gate for a candidate target
    pub fn check_assignment(
        distance: f64,
        sog: f64,
        heading_towards: bool,
    ) -> Result<(), AssignmentRejection> {
        if distance.is_nan() || distance > MAX_ASSIGN_DISTANCE_M {
            return Err(AssignmentRejection::TooFar);
        }
        if distance > SLOW_ASSIGN_DISTANCE_M && sog < SLOW_ASSIGN_MIN_SPEED_KN {
            return Err(AssignmentRejection::TooSlowFar);
        }
        if distance > NEAR_ASSIGN_DISTANCE_M && sog < NEAR_ASSIGN_MIN_SPEED_KN {
            return Err(AssignmentRejection::TooSlowNear);
        }
        if !heading_towards {
            return Err(AssignmentRejection::NotHeadingTowards);
        }
        Ok(())
    }

    /// The next target bridge along the vessel's course
    pub fn sequence_target(vessel: &Vessel) -> Option<BridgeId> {
        next_target_from(vessel.lat, vessel.direction())
    }

    /// Whether an existing target should be dropped
    pub fn validate(
        vessel: &Vessel,
        target: BridgeId,
        proximity: &ProximityReport,
    ) -> Option<ClearReason> {
        let distance = proximity.distance_to(target);
        if distance <= PROTECTED_DISTANCE_M {
            return None;
        }
        if distance > CLEAR_STALLED_DISTANCE_M && vessel.sog < CLEAR_STALLED_SPEED_KN {
            return Some(ClearReason::Stalled);
        }
        if distance > CLEAR_HEADING_DISTANCE_M && !Self::is_heading_towards(vessel, target) {
            return Some(ClearReason::TurnedAway);
        }
        None
    }

    /// The nearest bridge if it is not a target and the vessel is inside its
    /// radius, or within [`APPROACH_RADIUS_M`] and heading towards it
    pub fn checkpoint_ahead(vessel: &Vessel, proximity: &ProximityReport) -> Option<BridgeId> {
        let (bridge, distance) = proximity.nearest?;
        if bridge.is_target() {
            return None;
        }
        let inside = proximity.near_bridge == Some(bridge);
        let approaching =
            distance <= APPROACH_RADIUS_M && Self::is_heading_towards(vessel, bridge);
        (inside || approaching).then_some(bridge)
    }

    /// Pick a target for a vessel that has none
    pub fn assign(
        vessel: &Vessel,
        proximity: &ProximityReport,
    ) -> Result<BridgeId, AssignmentRejection> {
        let candidate = Self::sequence_target(vessel).ok_or(AssignmentRejection::NoCandidate)?;
        let heading = Self::is_heading_towards(vessel, candidate);

        // At or approaching an intermediate or the special bridge the vessel
        // is between targets: the sequence decides, whatever the distance
        if vessel.sog >= NEAR_ASSIGN_MIN_SPEED_KN && heading {
            if let Some(checkpoint) = Self::checkpoint_ahead(vessel, proximity) {
                log::trace!(
                    "{}: at {}, {} next in sequence",
                    vessel.id,
                    checkpoint,
                    candidate
                );
                return Ok(candidate);
            }
        }

        let distance = proximity.distance_to(candidate);
        Self::check_assignment(distance, vessel.sog, heading).map(|_| candidate)
    }

    /// Validate the current target, then assign one if there is none.
    ///
    /// Updates `vessel.target_bridge` and `vessel.distance_to_target`.
    pub fn resolve(&self, vessel: &mut Vessel, proximity: &ProximityReport) -> TargetChange {
        let mut cleared = None;

        if let Some(target) = vessel.target_bridge {
            match Self::validate(vessel, target, proximity) {
                None => {
                    vessel.distance_to_target = proximity.distance_to(target);
                    return TargetChange::Kept(target);
                }
                Some(reason) => {
                    log::debug!(
                        "{}: target {} cleared ({:?}) at {:.0} m",
                        vessel.id,
                        target,
                        reason,
                        proximity.distance_to(target)
                    );
                    vessel.target_bridge = None;
                    vessel.was_inside_target = false;
                    vessel.target_entry_side = None;
                    cleared = Some((target, reason));
                }
            }
        }

        let change = match Self::assign(vessel, proximity) {
            Ok(target) => {
                log::debug!(
                    "{}: target {} assigned at {:.0} m, {:.1} kn",
                    vessel.id,
                    target,
                    proximity.distance_to(target),
                    vessel.sog
                );
                vessel.target_bridge = Some(target);
                match cleared {
                    Some((from, _)) if from != target => TargetChange::Retargeted { from, to: target },
                    _ => TargetChange::Assigned(target),
                }
            }
            Err(rejection) => {
                log::trace!("{}: no target ({:?})", vessel.id, rejection);
                match cleared {
                    Some((from, reason)) => TargetChange::Cleared(from, reason),
                    None => TargetChange::Unassigned,
                }
            }
        };

        vessel.distance_to_target = vessel
            .target_bridge
            .map(|t| proximity.distance_to(t))
            .unwrap_or(f64::INFINITY);
        change
    }

    /// Target after passing `passed` in `direction`: the next target in
    /// sequence, or `None` past the last one.
    pub fn retarget_after_passage(passed: BridgeId, direction: Direction) -> Option<BridgeId> {
        passed.next_target(direction)
    }
}

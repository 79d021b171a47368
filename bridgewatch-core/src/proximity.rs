//! Proximity Engine
//!
//! Distance from a position to every bridge, the nearest bridge, and the
//! distance zone that drives timeouts and eligibility gates. Pure functions
//! of position; called once per update.

use serde::{Deserialize, Serialize};

use crate::bridges::{Bridge, BridgeId, BRIDGES};
use crate::geo::haversine_distance;

/// Upper bound of the bridge zone
pub const BRIDGE_ZONE_M: f64 = 300.0;

/// Upper bound of the near zone
pub const NEAR_ZONE_M: f64 = 600.0;

/// Distance at which a vessel counts as approaching a bridge
pub const APPROACH_RADIUS_M: f64 = 500.0;

/// Distance at which a vessel counts as under a bridge
pub const UNDER_BRIDGE_M: f64 = 50.0;

/// Distance band around the nearest bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Within 300 m
    Bridge,
    /// 300 to 600 m
    Near,
    /// Beyond 600 m, or distance unknown
    Far,
}

impl Zone {
    pub fn classify(distance: f64) -> Self {
        if distance <= BRIDGE_ZONE_M {
            Zone::Bridge
        } else if distance <= NEAR_ZONE_M {
            Zone::Near
        } else {
            // NaN also lands here
            Zone::Far
        }
    }
}

/// Result of one proximity pass
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityReport {
    /// Distance to every bridge, indexed by [`BridgeId::sequence`].
    /// `f64::INFINITY` when the position is unusable.
    pub distances: [f64; BRIDGES.len()],
    /// Nearest bridge and its distance
    pub nearest: Option<(BridgeId, f64)>,
    /// Nearest bridge if the position is inside its radius
    pub near_bridge: Option<BridgeId>,
    pub zone: Zone,
}

impl ProximityReport {
    pub fn distance_to(&self, bridge: BridgeId) -> f64 {
        self.distances[bridge.sequence()]
    }

    /// Distance to the nearest bridge, or infinity if none is known
    pub fn nearest_distance(&self) -> f64 {
        self.nearest.map(|(_, d)| d).unwrap_or(f64::INFINITY)
    }

    pub fn nearest_bridge(&self) -> Option<BridgeId> {
        self.nearest.map(|(id, _)| id)
    }
}

/// Computes distances from vessel positions to the bridge table
#[derive(Debug, Clone)]
pub struct ProximityEngine {
    bridges: &'static [Bridge],
}

impl Default for ProximityEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProximityEngine {
    pub fn new() -> Self {
        ProximityEngine { bridges: &BRIDGES }
    }

    pub fn bridges(&self) -> &'static [Bridge] {
        self.bridges
    }

    /// Measure a position against every bridge
    pub fn analyze(&self, lat: f64, lon: f64) -> ProximityReport {
        let mut distances = [f64::INFINITY; BRIDGES.len()];
        let mut nearest: Option<(BridgeId, f64)> = None;

        for bridge in self.bridges {
            let d = haversine_distance(lat, lon, bridge.lat, bridge.lon);
            if !d.is_finite() {
                continue;
            }
            distances[bridge.id.sequence()] = d;
            if nearest.map_or(true, |(_, best)| d < best) {
                nearest = Some((bridge.id, d));
            }
        }

        let near_bridge = nearest
            .filter(|(id, d)| *d <= id.bridge().radius)
            .map(|(id, _)| id);
        let zone = Zone::classify(nearest.map(|(_, d)| d).unwrap_or(f64::INFINITY));

        ProximityReport {
            distances,
            nearest,
            near_bridge,
            zone,
        }
    }

    /// Nearest bridge and distance, if the position is usable
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<(BridgeId, f64)> {
        self.analyze(lat, lon).nearest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_boundaries() {
        assert_eq!(Zone::classify(0.0), Zone::Bridge);
        assert_eq!(Zone::classify(300.0), Zone::Bridge);
        assert_eq!(Zone::classify(300.1), Zone::Near);
        assert_eq!(Zone::classify(600.0), Zone::Near);
        assert_eq!(Zone::classify(600.1), Zone::Far);
        assert_eq!(Zone::classify(f64::NAN), Zone::Far);
        assert_eq!(Zone::classify(f64::INFINITY), Zone::Far);
    }

    #[test]
    fn test_on_bridge() {
        let engine = ProximityEngine::new();
        let klaff = BridgeId::Klaffbron.bridge();
        let report = engine.analyze(klaff.lat, klaff.lon);
        assert_eq!(report.nearest_bridge(), Some(BridgeId::Klaffbron));
        assert!(report.nearest_distance() < 0.001);
        assert_eq!(report.near_bridge, Some(BridgeId::Klaffbron));
        assert_eq!(report.zone, Zone::Bridge);
        assert!(report.distance_to(BridgeId::Stridsbergsbron) > 1000.0);
    }

    #[test]
    fn test_far_from_everything() {
        let engine = ProximityEngine::new();
        let report = engine.analyze(58.40, 12.40);
        assert!(report.nearest.is_some());
        assert_eq!(report.near_bridge, None);
        assert_eq!(report.zone, Zone::Far);
    }

    #[test]
    fn test_unusable_position() {
        let engine = ProximityEngine::new();
        let report = engine.analyze(f64::NAN, 12.28);
        assert_eq!(report.nearest, None);
        assert_eq!(report.near_bridge, None);
        assert_eq!(report.zone, Zone::Far);
        assert!(report.distance_to(BridgeId::Klaffbron).is_infinite());
    }
}

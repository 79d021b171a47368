//! Geodesy helpers
//!
//! Great-circle distance and bearing on a spherical earth, plus the
//! direction-of-travel and side-of-bridge helpers the resolver and the
//! state machine share.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bridges::Bridge;

/// Mean earth radius used for haversine distances
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Knots to meters per second
pub const KN_TO_MS: f64 = 0.514444;

/// Great-circle distance in meters between two positions in degrees.
///
/// Returns NaN if any coordinate is NaN; callers treat non-finite distances
/// as "unknown".
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing from the first to the second position,
/// in degrees `[0, 360)`.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Absolute difference between two angles in degrees, normalized to `[0, 180]`.
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// A course is "heading towards" a bridge when it is within 90 degrees
/// of the bearing from the vessel to the bridge.
pub fn is_heading_towards(cog: f64, lat: f64, lon: f64, bridge: &Bridge) -> bool {
    if !(cog.is_finite() && lat.is_finite() && lon.is_finite()) {
        return false;
    }
    let to_bridge = bearing(lat, lon, bridge.lat, bridge.lon);
    angle_difference(cog, to_bridge) < 90.0
}

/// Direction of travel along the waterway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Northbound,
    Southbound,
}

impl Direction {
    /// Northbound for any course in the northern half-circle.
    pub fn from_course(cog: f64) -> Self {
        let cog = cog.rem_euclid(360.0);
        if cog >= 270.0 || cog <= 90.0 {
            Direction::Northbound
        } else {
            Direction::Southbound
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Northbound => write!(f, "northbound"),
            Direction::Southbound => write!(f, "southbound"),
        }
    }
}

/// Which side of a bridge a position is on.
///
/// The waterway crosses every bridge roughly south to north, so latitude is
/// enough to tell the two banks of the crossing apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    South,
    North,
}

impl Side {
    pub fn of(lat: f64, bridge: &Bridge) -> Self {
        if lat < bridge.lat {
            Side::South
        } else {
            Side::North
        }
    }

    /// Direction of a vessel that entered on `self` and left on `exit`.
    pub fn crossing_to(self, exit: Side) -> Option<Direction> {
        match (self, exit) {
            (Side::South, Side::North) => Some(Direction::Northbound),
            (Side::North, Side::South) => Some(Direction::Southbound),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridges::BridgeId;

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_distance(58.0, 12.0, 59.0, 12.0);
        // 1 degree of latitude on a 6371 km sphere
        assert!((d - 111_194.9).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_haversine_zero_and_nan() {
        assert_eq!(haversine_distance(58.28, 12.28, 58.28, 12.28), 0.0);
        assert!(haversine_distance(f64::NAN, 12.28, 58.28, 12.28).is_nan());
    }

    #[test]
    fn test_bearing_cardinal() {
        assert!((bearing(58.0, 12.0, 59.0, 12.0) - 0.0).abs() < 1e-6);
        assert!((bearing(59.0, 12.0, 58.0, 12.0) - 180.0).abs() < 1e-6);
        let east = bearing(58.0, 12.0, 58.0, 12.1);
        assert!((east - 90.0).abs() < 0.1, "got {}", east);
    }

    #[test]
    fn test_angle_difference() {
        assert_eq!(angle_difference(10.0, 350.0), 20.0);
        assert_eq!(angle_difference(350.0, 10.0), 20.0);
        assert_eq!(angle_difference(0.0, 180.0), 180.0);
        assert_eq!(angle_difference(90.0, 90.0), 0.0);
        assert_eq!(angle_difference(-30.0, 30.0), 60.0);
    }

    #[test]
    fn test_heading_towards() {
        let bridge = BridgeId::Klaffbron.bridge();
        let lat = bridge.lat - 0.005;
        let lon = bridge.lon;
        assert!(is_heading_towards(10.0, lat, lon, bridge));
        assert!(!is_heading_towards(190.0, lat, lon, bridge));
        assert!(!is_heading_towards(f64::NAN, lat, lon, bridge));
    }

    #[test]
    fn test_direction_from_course() {
        assert_eq!(Direction::from_course(0.0), Direction::Northbound);
        assert_eq!(Direction::from_course(45.0), Direction::Northbound);
        assert_eq!(Direction::from_course(300.0), Direction::Northbound);
        assert_eq!(Direction::from_course(180.0), Direction::Southbound);
        assert_eq!(Direction::from_course(225.0), Direction::Southbound);
        assert_eq!(Direction::from_course(360.0), Direction::Northbound);
    }

    #[test]
    fn test_side_crossing() {
        let bridge = BridgeId::Klaffbron.bridge();
        assert_eq!(Side::of(bridge.lat - 0.001, bridge), Side::South);
        assert_eq!(Side::of(bridge.lat + 0.001, bridge), Side::North);
        assert_eq!(
            Side::South.crossing_to(Side::North),
            Some(Direction::Northbound)
        );
        assert_eq!(Side::North.crossing_to(Side::North), None);
    }
}

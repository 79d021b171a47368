//! ETA Calculator
//!
//! Converts the distance to the target bridge into minutes. Slow AIS speeds
//! near a bridge would give absurd estimates, so the speed used is floored
//! depending on distance, and waiting vessels use the speed they had before
//! they stopped.

use crate::geo::KN_TO_MS;
use crate::vessel::{Eta, Vessel, VesselStatus};

/// Minimum effective speed for a waiting vessel (knots)
pub const WAITING_MIN_SPEED_KN: f64 = 2.0;

/// Displayed ETAs are capped here and shown as "999+"
pub const MAX_DISPLAY_MINUTES: f64 = 999.0;

/// Speed floor for the distance to the bridge (knots)
pub fn speed_floor(distance: f64) -> f64 {
    if distance < 200.0 {
        0.5
    } else if distance <= 500.0 {
        1.5
    } else {
        2.0
    }
}

/// Stateless ETA computation
#[derive(Debug, Clone, Copy, Default)]
pub struct EtaCalculator;

impl EtaCalculator {
    /// Speed in knots used for the estimate
    pub fn effective_speed(status: VesselStatus, sog: f64, max_recent_speed: f64, distance: f64) -> f64 {
        if status == VesselStatus::Waiting {
            max_recent_speed.max(WAITING_MIN_SPEED_KN)
        } else {
            sog.max(speed_floor(distance))
        }
    }

    /// Raw minutes for a distance at a speed in knots
    pub fn minutes(distance: f64, speed_kn: f64) -> f64 {
        (distance / (speed_kn * KN_TO_MS)) / 60.0
    }

    /// ETA for a distance with the floors and special cases applied.
    ///
    /// - under the bridge: `0`
    /// - zero distance: [`Eta::Waiting`]
    /// - negative distance (corrupted input): infinite minutes
    /// - NaN distance or speed: `None`
    pub fn estimate(
        status: VesselStatus,
        distance: f64,
        sog: f64,
        max_recent_speed: f64,
    ) -> Option<Eta> {
        if status == VesselStatus::UnderBridge {
            return Some(Eta::Minutes(0.0));
        }
        if distance.is_nan() || sog.is_nan() {
            return None;
        }
        if distance < 0.0 || distance.is_infinite() {
            return Some(Eta::Minutes(f64::INFINITY));
        }
        if distance == 0.0 {
            return Some(Eta::Waiting);
        }
        let max_recent_speed = if max_recent_speed.is_finite() {
            max_recent_speed
        } else {
            0.0
        };
        let speed = Self::effective_speed(status, sog, max_recent_speed, distance);
        Some(Eta::Minutes(Self::minutes(distance, speed)))
    }

    /// ETA to the vessel's target bridge, `None` without a target
    pub fn calculate(vessel: &Vessel) -> Option<Eta> {
        vessel.target_bridge?;
        Self::estimate(
            vessel.status,
            vessel.distance_to_target,
            vessel.sog,
            vessel.max_recent_speed,
        )
    }
}

/// Render minutes for display: whole minutes, capped at "999+".
///
/// Returns `None` for anything that is not a finite, non-negative number so
/// no NaN or infinity ever reaches the text.
pub fn format_eta(minutes: f64) -> Option<String> {
    if !minutes.is_finite() || minutes < 0.0 {
        return None;
    }
    let rounded = minutes.round();
    let text = if rounded > MAX_DISPLAY_MINUTES {
        "999+ minutes".to_string()
    } else if rounded < 1.0 {
        "less than 1 minute".to_string()
    } else if rounded == 1.0 {
        "1 minute".to_string()
    } else {
        format!("{} minutes", rounded as u32)
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_speed_floor_bands() {
        assert_eq!(speed_floor(199.9), 0.5);
        assert_eq!(speed_floor(200.0), 1.5);
        assert_eq!(speed_floor(500.0), 1.5);
        assert_eq!(speed_floor(500.1), 2.0);
    }

    #[test]
    fn test_effective_speed() {
        // Moving faster than the floor: actual speed
        assert_eq!(
            EtaCalculator::effective_speed(VesselStatus::Approaching, 4.0, 4.0, 300.0),
            4.0
        );
        // Crawling far out: floor
        assert_eq!(
            EtaCalculator::effective_speed(VesselStatus::EnRoute, 0.3, 5.0, 800.0),
            2.0
        );
        // Waiting: the speed it had before stopping
        assert_eq!(
            EtaCalculator::effective_speed(VesselStatus::Waiting, 0.1, 5.0, 100.0),
            5.0
        );
        assert_eq!(
            EtaCalculator::effective_speed(VesselStatus::Waiting, 0.1, 1.0, 100.0),
            2.0
        );
    }

    #[test]
    fn test_estimate_known_value() {
        // 926 m at 5 kn = 6 minutes
        let eta = EtaCalculator::estimate(VesselStatus::EnRoute, 926.0, 5.0, 5.0).unwrap();
        let m = eta.minutes().unwrap();
        assert!((m - 6.0).abs() < 0.01, "got {}", m);
    }

    #[test]
    fn test_estimate_special_cases() {
        assert_eq!(
            EtaCalculator::estimate(VesselStatus::UnderBridge, 30.0, 3.0, 3.0),
            Some(Eta::Minutes(0.0))
        );
        assert_eq!(
            EtaCalculator::estimate(VesselStatus::Approaching, 0.0, 3.0, 3.0),
            Some(Eta::Waiting)
        );
        assert_eq!(
            EtaCalculator::estimate(VesselStatus::Approaching, -10.0, 3.0, 3.0),
            Some(Eta::Minutes(f64::INFINITY))
        );
        assert_eq!(
            EtaCalculator::estimate(VesselStatus::Approaching, f64::NAN, 3.0, 3.0),
            None
        );
        // Under bridge wins over the zero-distance sentinel
        assert_eq!(
            EtaCalculator::estimate(VesselStatus::UnderBridge, 0.0, 3.0, 3.0),
            Some(Eta::Minutes(0.0))
        );
    }

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(999.0).as_deref(), Some("999 minutes"));
        assert_eq!(format_eta(1500.0).as_deref(), Some("999+ minutes"));
        assert_eq!(format_eta(999.4).as_deref(), Some("999 minutes"));
        assert_eq!(format_eta(4.6).as_deref(), Some("5 minutes"));
        assert_eq!(format_eta(1.2).as_deref(), Some("1 minute"));
        assert_eq!(format_eta(0.2).as_deref(), Some("less than 1 minute"));
        assert_eq!(format_eta(f64::NAN), None);
        assert_eq!(format_eta(f64::INFINITY), None);
        assert_eq!(format_eta(-1.0), None);
    }

    proptest! {
        /// At a fixed speed above every floor, the ETA falls strictly as the
        /// distance falls.
        #[test]
        fn prop_eta_decreases_with_distance(
            speed in 2.0f64..20.0,
            start in 50.0f64..5000.0,
            steps in proptest::collection::vec(0.01f64..0.5, 1..20),
        ) {
            let mut distance = start;
            let mut previous = EtaCalculator::estimate(VesselStatus::EnRoute, distance, speed, speed)
                .and_then(|e| e.minutes())
                .unwrap();
            for step in steps {
                distance *= 1.0 - step;
                let eta = EtaCalculator::estimate(VesselStatus::EnRoute, distance, speed, speed)
                    .and_then(|e| e.minutes())
                    .unwrap();
                prop_assert!(eta < previous, "{} !< {} at {} m", eta, previous, distance);
                previous = eta;
            }
        }

        #[test]
        fn prop_format_never_leaks_non_numbers(minutes in proptest::num::f64::ANY) {
            if let Some(text) = format_eta(minutes) {
                prop_assert!(!text.contains("NaN"));
                prop_assert!(!text.contains("inf"));
            }
        }
    }
}

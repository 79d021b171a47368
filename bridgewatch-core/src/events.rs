//! Flow trigger payloads
//!
//! A [`BoatNearEvent`] is produced when a vessel comes within the radius of a
//! bridge it was not near on its previous report. Consumers publish it as-is.

use serde::Serialize;

use crate::bridges::BridgeId;
use crate::geo::Direction;
use crate::vessel::Vessel;

/// "Boat near a bridge" trigger payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoatNearEvent {
    pub bridge_id: BridgeId,
    pub bridge_name: String,
    pub vessel_id: String,
    pub vessel_name: String,
    pub direction: Direction,
    /// ETA to the target bridge in whole minutes, `None` if not numeric
    pub eta_minutes: Option<f64>,
}

impl BoatNearEvent {
    /// Event for a vessel that just entered the radius of `bridge`
    pub fn new(vessel: &Vessel, bridge: BridgeId) -> Self {
        BoatNearEvent {
            bridge_id: bridge,
            bridge_name: bridge.name().to_string(),
            vessel_id: vessel.id.clone(),
            vessel_name: vessel.name.clone(),
            direction: vessel.direction(),
            eta_minutes: vessel
                .eta_minutes
                .and_then(|eta| eta.minutes())
                .map(|m| m.round()),
        }
    }

    /// Event for a vessel whose near bridge moved from `previous` to its
    /// current one, if that is a change to a new bridge
    pub fn on_change(vessel: &Vessel, previous: Option<BridgeId>) -> Option<Self> {
        match vessel.near_bridge {
            Some(bridge) if previous != Some(bridge) => Some(Self::new(vessel, bridge)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vessel::{AisReport, Eta};

    fn vessel() -> Vessel {
        let mut v = Vessel::new(&AisReport {
            id: "265000010".to_string(),
            name: "LINDA".to_string(),
            lat: 58.283,
            lon: 12.283,
            sog: 4.0,
            cog: 15.0,
            timestamp: 0,
        });
        v.near_bridge = Some(BridgeId::Klaffbron);
        v.eta_minutes = Some(Eta::Minutes(2.4));
        v
    }

    #[test]
    fn test_fires_only_on_change() {
        let v = vessel();
        let event = BoatNearEvent::on_change(&v, None).unwrap();
        assert_eq!(event.bridge_id, BridgeId::Klaffbron);
        assert_eq!(event.direction, Direction::Northbound);
        assert_eq!(event.eta_minutes, Some(2.0));

        assert!(BoatNearEvent::on_change(&v, Some(BridgeId::Klaffbron)).is_none());
        assert!(BoatNearEvent::on_change(&v, Some(BridgeId::Olidebron)).is_some());
    }

    #[test]
    fn test_json_payload() {
        let mut v = vessel();
        v.eta_minutes = Some(Eta::Waiting);
        let json = serde_json::to_value(BoatNearEvent::new(&v, BridgeId::Jarnvagsbron)).unwrap();
        assert_eq!(json["bridgeName"], "Järnvägsbron");
        assert_eq!(json["vesselName"], "LINDA");
        assert_eq!(json["direction"], "northbound");
        assert!(json["etaMinutes"].is_null());
    }
}

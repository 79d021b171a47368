//! Published monitor state
//!
//! The monitor task is the only writer of the vessel map. Readers get a
//! [`Snapshot`] through a `tokio::sync::watch` channel and never block it.

use bridgewatch_core::{BridgeId, BridgeText, Timestamp, Vessel, VesselStateStore};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub bridge_text: String,
    pub alarm_generic: bool,
    pub vessels: Vec<Vessel>,
    pub updated_at: DateTime<Utc>,
    /// Monitor clock when the snapshot was taken (ms since epoch)
    #[serde(skip)]
    pub clock: Timestamp,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot::new(BridgeText::default(), Vec::new(), 0)
    }
}

impl Snapshot {
    pub fn new(text: BridgeText, vessels: Vec<Vessel>, clock: Timestamp) -> Self {
        let updated_at = i64::try_from(clock)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now);
        Snapshot {
            bridge_text: text.text,
            alarm_generic: text.alarm,
            vessels,
            updated_at,
            clock,
        }
    }

    /// Flow-condition query over the snapshot's vessels
    pub fn activity_within(&self, bridge: Option<BridgeId>, window_ms: u64, now: Timestamp) -> bool {
        self.vessels
            .iter()
            .any(|v| VesselStateStore::is_active(v, bridge, window_ms, now))
    }
}

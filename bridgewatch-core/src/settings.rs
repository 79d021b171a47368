//! Tunable timing parameters
//!
//! Distance and speed gates are `pub const` values next to the code that uses
//! them. The timing values below are the ones a deployment may want to tune;
//! every field has a default so a partial JSON file is enough.

use serde::{Deserialize, Serialize};

/// Monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// How long a slow vessel must stay near a bridge before it counts as waiting
    pub waiting_dwell_secs: u64,

    /// Speed below which a vessel near a bridge may be waiting (knots)
    pub waiting_speed_kn: f64,

    /// How long a vessel is shown as "just passed" after a passage
    pub passed_display_secs: u64,

    /// Consecutive irrelevant updates before a passed or idle vessel is dropped
    pub grace_miss_limit: u8,

    /// Cleanup timeout for vessels within 300 m of a bridge
    pub bridge_zone_timeout_secs: u64,

    /// Cleanup timeout for vessels 300 to 600 m from a bridge
    pub near_zone_timeout_secs: u64,

    /// Cleanup timeout for vessels beyond 600 m
    pub far_zone_timeout_secs: u64,

    /// Minimum cleanup timeout while a vessel is waiting, regardless of zone
    pub waiting_timeout_secs: u64,

    /// Minimum interval between two text regenerations (used by the server)
    pub text_debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            waiting_dwell_secs: 120,
            waiting_speed_kn: 0.20,
            passed_display_secs: 60,
            grace_miss_limit: 3,
            bridge_zone_timeout_secs: 20 * 60,
            near_zone_timeout_secs: 10 * 60,
            far_zone_timeout_secs: 2 * 60,
            waiting_timeout_secs: 20 * 60,
            text_debounce_ms: 1000,
        }
    }
}

impl Settings {
    pub fn waiting_dwell_ms(&self) -> u64 {
        self.waiting_dwell_secs.saturating_mul(1000)
    }

    pub fn passed_display_ms(&self) -> u64 {
        self.passed_display_secs.saturating_mul(1000)
    }

    /// Parse settings from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Settings, serde_json::Error> {
        serde_json::from_str(json)
    }
}

//! Vessel records
//!
//! [`AisReport`] is the decoded input record handed over by the transport.
//! [`Vessel`] is the tracked state, owned by the
//! [`VesselStateStore`](crate::store::VesselStateStore) and mutated by every
//! stage of the pipeline.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use crate::bridges::BridgeId;
use crate::error::InputError;
use crate::geo::{Direction, Side};

/// Milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Highest speed over ground accepted as real; faster reports are clamped
pub const MAX_PLAUSIBLE_SOG_KN: f64 = 50.0;

/// Speed above which a vessel counts as actively moving
pub const ACTIVE_SPEED_KN: f64 = 0.5;

/// One decoded AIS position report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AisReport {
    /// Vessel identity (MMSI)
    #[serde(alias = "mmsi")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Speed over ground in knots
    #[serde(alias = "speed")]
    pub sog: f64,
    /// Course over ground in degrees
    #[serde(alias = "course")]
    pub cog: f64,
    pub timestamp: Timestamp,
}

impl AisReport {
    /// Reject unusable reports and clamp implausible kinematics.
    ///
    /// Position, speed and course must be finite and the id non-empty. Speed
    /// is clamped to `[0, 50]` knots and course to `[0, 360]`, with 360 read
    /// as 0. The name is trimmed but may be empty.
    pub fn sanitize(mut self) -> Result<AisReport, InputError> {
        let malformed = |id: &str, field| InputError::Malformed {
            id: id.to_string(),
            field,
        };

        self.id = self.id.trim().to_string();
        if self.id.is_empty() {
            return Err(malformed("<no id>", "id"));
        }
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(malformed(&self.id, "lat"));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(malformed(&self.id, "lon"));
        }
        if !self.sog.is_finite() {
            return Err(malformed(&self.id, "sog"));
        }
        if !self.cog.is_finite() {
            return Err(malformed(&self.id, "cog"));
        }

        let sog = self.sog.clamp(0.0, MAX_PLAUSIBLE_SOG_KN);
        if sog != self.sog {
            log::debug!("{}: speed {:.1} kn clamped to {:.1}", self.id, self.sog, sog);
            self.sog = sog;
        }
        let mut cog = self.cog.clamp(0.0, 360.0);
        if cog != self.cog {
            log::debug!("{}: course {:.1} clamped to {:.1}", self.id, self.cog, cog);
        }
        if cog == 360.0 {
            cog = 0.0;
        }
        self.cog = cog;
        self.name = self.name.trim().to_string();

        Ok(self)
    }
}

/// Navigational status of a vessel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VesselStatus {
    EnRoute,
    Approaching,
    Waiting,
    UnderBridge,
    Passed,
    Idle,
}

impl Default for VesselStatus {
    fn default() -> Self {
        VesselStatus::EnRoute
    }
}

impl fmt::Display for VesselStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VesselStatus::EnRoute => "en-route",
            VesselStatus::Approaching => "approaching",
            VesselStatus::Waiting => "waiting",
            VesselStatus::UnderBridge => "under-bridge",
            VesselStatus::Passed => "passed",
            VesselStatus::Idle => "idle",
        };
        write!(f, "{}", s)
    }
}

/// Estimated time of arrival at the target bridge
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eta {
    /// Minutes, unrounded. May be infinite for corrupted distances.
    Minutes(f64),
    /// Zero distance: the vessel is at the bridge
    Waiting,
}

impl Eta {
    /// Numeric minutes if finite
    pub fn minutes(&self) -> Option<f64> {
        match self {
            Eta::Minutes(m) if m.is_finite() => Some(*m),
            _ => None,
        }
    }
}

impl Serialize for Eta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Eta::Minutes(m) if m.is_finite() => serializer.serialize_f64(*m),
            Eta::Minutes(_) => serializer.serialize_none(),
            Eta::Waiting => serializer.serialize_str("waiting"),
        }
    }
}

/// A tracked vessel
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessel {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Speed over ground in knots
    pub sog: f64,
    /// Course over ground in degrees
    pub cog: f64,
    /// Time of the last applied report
    pub timestamp: Timestamp,
    /// Time of the first report
    pub first_seen: Timestamp,

    pub status: VesselStatus,
    /// Always `None` or one of the two target bridges
    pub target_bridge: Option<BridgeId>,
    /// Nearest bridge, if within its radius
    pub near_bridge: Option<BridgeId>,
    /// Nearest bridge at any distance
    pub nearest_bridge: Option<BridgeId>,
    #[serde(serialize_with = "serialize_distance")]
    pub distance_to_nearest: f64,
    #[serde(serialize_with = "serialize_distance")]
    pub distance_to_target: f64,
    pub eta_minutes: Option<Eta>,
    /// Highest speed seen while actively moving
    pub max_recent_speed: f64,

    pub passed_bridges: BTreeSet<BridgeId>,
    pub last_passed_bridge: Option<BridgeId>,
    pub last_passed_bridge_time: Option<Timestamp>,

    /// Start of the current slow-near-bridge stretch
    pub wait_since: Option<Timestamp>,
    /// Set once the vessel has been within 400 m of its target
    pub was_inside_target: bool,
    /// Side of the target bridge the vessel was on when `was_inside_target` was set
    #[serde(skip)]
    pub target_entry_side: Option<Side>,
    /// Non-target bridge currently being watched for a passage, and entry side
    #[serde(skip)]
    pub checkpoint: Option<(BridgeId, Side)>,

    pub grace_misses: u8,
    /// Consecutive reports with unchanged position and speed
    #[serde(skip)]
    pub duplicate_reports: u32,
}

fn serialize_distance<S: Serializer>(d: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if d.is_finite() {
        serializer.serialize_f64(*d)
    } else {
        serializer.serialize_none()
    }
}

impl Vessel {
    /// Create a vessel from its first report
    pub fn new(report: &AisReport) -> Self {
        Vessel {
            id: report.id.clone(),
            name: report.name.clone(),
            lat: report.lat,
            lon: report.lon,
            sog: report.sog,
            cog: report.cog,
            timestamp: report.timestamp,
            first_seen: report.timestamp,
            status: VesselStatus::EnRoute,
            target_bridge: None,
            near_bridge: None,
            nearest_bridge: None,
            distance_to_nearest: f64::INFINITY,
            distance_to_target: f64::INFINITY,
            eta_minutes: None,
            max_recent_speed: if report.sog >= ACTIVE_SPEED_KN {
                report.sog
            } else {
                0.0
            },
            passed_bridges: BTreeSet::new(),
            last_passed_bridge: None,
            last_passed_bridge_time: None,
            wait_since: None,
            was_inside_target: false,
            target_entry_side: None,
            checkpoint: None,
            grace_misses: 0,
            duplicate_reports: 0,
        }
    }

    /// Apply the kinematic fields of a new report.
    ///
    /// A report without a name keeps the name already known.
    pub fn apply_report(&mut self, report: &AisReport) {
        if !report.name.is_empty() {
            self.name = report.name.clone();
        }
        self.lat = report.lat;
        self.lon = report.lon;
        self.sog = report.sog;
        self.cog = report.cog;
        self.timestamp = report.timestamp;
        if report.sog >= ACTIVE_SPEED_KN && report.sog > self.max_recent_speed {
            self.max_recent_speed = report.sog;
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::from_course(self.cog)
    }

    /// Whether the last passage is still within the display window
    pub fn recently_passed(&self, now: Timestamp, window_ms: u64) -> bool {
        self.last_passed_bridge_time
            .is_some_and(|t| now.saturating_sub(t) < window_ms)
    }
}

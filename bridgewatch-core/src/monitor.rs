//! Bridge Monitor
//!
//! The pipeline facade. Each report is processed to completion before the
//! next one is accepted:
//!
//! ```text
//! AisReport ─► sanitize ─► continuity ─► Proximity ─► Target ─► Status ─► ETA ─► Store
//!                                                                  │
//!                                                                  └─► BoatNearEvent
//! ```
//!
//! The monitor owns the only mutable copy of the vessel map. Callers that need
//! concurrency wrap the monitor, not its parts, so cleanup and updates stay
//! serialized.

use crate::bridges::BridgeId;
use crate::error::InputError;
use crate::eta::EtaCalculator;
use crate::events::BoatNearEvent;
use crate::geo::{haversine_distance, KN_TO_MS};
use crate::proximity::ProximityEngine;
use crate::settings::Settings;
use crate::status::{Passage, StatusClassifier};
use crate::store::VesselStateStore;
use crate::target::{TargetBridgeResolver, TargetChange};
use crate::text::{BridgeText, BridgeTextGenerator};
use crate::vessel::{AisReport, Timestamp, Vessel, VesselStatus, MAX_PLAUSIBLE_SOG_KN};

/// Position jumps beyond this are logged
pub const JUMP_NOTICE_M: f64 = 100.0;

/// Position jumps beyond this are rejected when the implied speed is implausible
pub const MAX_JUMP_M: f64 = 500.0;

/// Identical reports in a row before a stale feed warning
pub const STALE_DUPLICATE_REPORTS: u32 = 3;

/// Result of applying one report
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub vessel_id: String,
    /// Status before the update, `None` for a new vessel
    pub previous_status: Option<VesselStatus>,
    pub status: VesselStatus,
    pub target: TargetChange,
    pub passage: Option<Passage>,
    pub events: Vec<BoatNearEvent>,
    /// The grace rule dropped the vessel after this update
    pub removed: bool,
}

impl UpdateOutcome {
    pub fn status_changed(&self) -> bool {
        self.previous_status != Some(self.status)
    }
}

/// Owns the vessel store and runs every report through the pipeline
#[derive(Debug, Clone)]
pub struct BridgeMonitor {
    settings: Settings,
    proximity: ProximityEngine,
    resolver: TargetBridgeResolver,
    classifier: StatusClassifier,
    generator: BridgeTextGenerator,
    store: VesselStateStore,
}

impl Default for BridgeMonitor {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl BridgeMonitor {
    pub fn new(settings: Settings) -> Self {
        BridgeMonitor {
            proximity: ProximityEngine::new(),
            resolver: TargetBridgeResolver::new(),
            classifier: StatusClassifier::new(&settings),
            generator: BridgeTextGenerator::new(&settings),
            store: VesselStateStore::new(settings.clone()),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Apply one position report at time `now`.
    ///
    /// A rejected report leaves the stored vessel untouched.
    pub fn process(&mut self, report: AisReport, now: Timestamp) -> Result<UpdateOutcome, InputError> {
        self.apply(report, now).map_err(|e| {
            log::warn!("{}", e);
            e
        })
    }

    fn apply(&mut self, report: AisReport, now: Timestamp) -> Result<UpdateOutcome, InputError> {
        let report = report.sanitize()?;

        let (mut vessel, previous_status, previous_near) = match self.store.get(&report.id) {
            Some(stored) => {
                Self::check_continuity(stored, &report)?;
                let mut vessel = stored.clone();
                Self::track_duplicates(&mut vessel, &report);
                vessel.apply_report(&report);
                (vessel, Some(stored.status), stored.near_bridge)
            }
            None => {
                log::info!(
                    "{}: tracking {:?} at {:.5},{:.5}",
                    report.id,
                    report.name,
                    report.lat,
                    report.lon
                );
                (Vessel::new(&report), None, None)
            }
        };

        let proximity = self.proximity.analyze(vessel.lat, vessel.lon);
        vessel.near_bridge = proximity.near_bridge;
        vessel.nearest_bridge = proximity.nearest_bridge();
        vessel.distance_to_nearest = proximity.nearest_distance();

        let target = self.resolver.resolve(&mut vessel, &proximity);
        let passage = self.classifier.classify(&mut vessel, &proximity, now);
        vessel.eta_minutes = EtaCalculator::calculate(&vessel);

        let events: Vec<BoatNearEvent> = BoatNearEvent::on_change(&vessel, previous_near)
            .into_iter()
            .collect();
        for event in &events {
            log::debug!(
                "{}: near {} {}",
                event.vessel_id,
                event.bridge_name,
                event.direction
            );
        }

        let vessel_id = vessel.id.clone();
        let status = vessel.status;
        let kept = self.store.upsert(vessel, now);

        Ok(UpdateOutcome {
            vessel_id,
            previous_status,
            status,
            target,
            passage,
            events,
            removed: !kept,
        })
    }

    /// Reject reports that go back in time or teleport the vessel
    fn check_continuity(stored: &Vessel, report: &AisReport) -> Result<(), InputError> {
        if report.timestamp < stored.timestamp {
            return Err(InputError::OutOfOrder {
                id: report.id.clone(),
                timestamp: report.timestamp,
            });
        }

        let jump = haversine_distance(stored.lat, stored.lon, report.lat, report.lon);
        if jump > MAX_JUMP_M {
            let elapsed_secs = (report.timestamp - stored.timestamp) as f64 / 1000.0;
            let implied_kn = if elapsed_secs > 0.0 {
                jump / elapsed_secs / KN_TO_MS
            } else {
                f64::INFINITY
            };
            if implied_kn > MAX_PLAUSIBLE_SOG_KN {
                return Err(InputError::ImplausiblePosition {
                    id: report.id.clone(),
                    jump_m: jump,
                    implied_kn,
                });
            }
        }
        if jump > JUMP_NOTICE_M {
            log::info!("{}: position jumped {:.0} m", report.id, jump);
        }
        Ok(())
    }

    fn track_duplicates(vessel: &mut Vessel, report: &AisReport) {
        let same = vessel.lat == report.lat
            && vessel.lon == report.lon
            && vessel.sog == report.sog
            && report.timestamp > vessel.timestamp;
        if !same {
            vessel.duplicate_reports = 0;
            return;
        }
        vessel.duplicate_reports = vessel.duplicate_reports.saturating_add(1);
        if vessel.duplicate_reports + 1 == STALE_DUPLICATE_REPORTS {
            log::warn!(
                "{}: {} identical reports in a row, feed may be stale",
                vessel.id,
                STALE_DUPLICATE_REPORTS
            );
        }
    }

    /// Fire due cleanup timers. Returns the ids of removed vessels.
    pub fn expire(&mut self, now: Timestamp) -> Vec<String> {
        self.store
            .expire(now)
            .into_iter()
            .map(|vessel| vessel.id)
            .collect()
    }

    pub fn bridge_text(&self, now: Timestamp) -> BridgeText {
        self.generator.generate(self.store.list(), now)
    }

    /// Snapshot of all tracked vessels, ordered by id
    pub fn vessels(&self) -> Vec<&Vessel> {
        self.store.list()
    }

    pub fn vessel(&self, id: &str) -> Option<&Vessel> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Earliest pending cleanup deadline
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.store.next_deadline()
    }

    /// Whether any vessel (at `bridge`, if given) reported in the last `window_ms`
    pub fn activity_within(&self, bridge: Option<BridgeId>, window_ms: u64, now: Timestamp) -> bool {
        self.store.activity_within(bridge, window_ms, now)
    }
}

//! Scenario tests for the bridge monitor.
//!
//! Each test drives [`BridgeMonitor`] with synthetic AIS reports on a virtual
//! clock and checks the resulting statuses, passages and status sentence.
//!
//! Run with: `cargo test --test scenarios`

use bridgewatch_core::{
    AisReport, BridgeId, BridgeMonitor, InputError, Settings, Timestamp, UpdateOutcome,
    VesselStatus, DEFAULT_MESSAGE,
};

// ============================================================================
// Test Helpers
// ============================================================================

const NORTH: f64 = 0.0;
const SOUTH: f64 = 180.0;

/// Meters per degree of latitude on the haversine sphere
const M_PER_DEG_LAT: f64 = 111_195.0;

/// Position `meters` south of a bridge on its meridian (negative: north)
fn south_of(bridge: BridgeId, meters: f64) -> (f64, f64) {
    let b = bridge.bridge();
    (b.lat - meters / M_PER_DEG_LAT, b.lon)
}

/// A monitor plus a virtual clock
struct Scenario {
    monitor: BridgeMonitor,
    now: Timestamp,
}

impl Scenario {
    fn new() -> Self {
        Scenario {
            monitor: BridgeMonitor::new(Settings::default()),
            now: 1_700_000_000_000,
        }
    }

    fn advance(&mut self, secs: u64) -> &mut Self {
        self.now += secs * 1000;
        self
    }

    /// Report vessel `id` at `meters` south of `bridge`
    fn report(
        &mut self,
        id: &str,
        bridge: BridgeId,
        meters: f64,
        sog: f64,
        cog: f64,
    ) -> Result<UpdateOutcome, InputError> {
        let (lat, lon) = south_of(bridge, meters);
        self.monitor.process(
            AisReport {
                id: id.to_string(),
                name: format!("VESSEL {}", id),
                lat,
                lon,
                sog,
                cog,
                timestamp: self.now,
            },
            self.now,
        )
    }

    fn status(&self, id: &str) -> Option<VesselStatus> {
        self.monitor.vessel(id).map(|v| v.status)
    }

    fn text(&self) -> String {
        self.monitor.bridge_text(self.now).text
    }
}

// ============================================================================
// Default state
// ============================================================================

#[test]
fn test_empty_monitor_default_sentence() {
    let scenario = Scenario::new();
    let text = scenario.monitor.bridge_text(scenario.now);
    assert_eq!(text.text, DEFAULT_MESSAGE);
    assert!(!text.alarm);
}

// ============================================================================
// Approach and aggregation
// ============================================================================

#[test]
fn test_single_approach() {
    let mut s = Scenario::new();
    s.report("1", BridgeId::Klaffbron, 200.0, 3.0, NORTH).unwrap();

    let text = s.monitor.bridge_text(s.now);
    assert!(text.alarm);
    assert!(text.text.contains("approaching Klaffbron"), "{}", text.text);
    assert!(text.text.contains("ETA 2 minutes"), "{}", text.text);
}

#[test]
fn test_multi_vessel_aggregation() {
    let mut s = Scenario::new();
    s.report("1", BridgeId::Klaffbron, 150.0, 3.0, NORTH).unwrap();
    s.advance(10);
    s.report("1", BridgeId::Klaffbron, 80.0, 0.1, NORTH).unwrap();
    s.report("2", BridgeId::Klaffbron, 250.0, 1.5, NORTH).unwrap();

    // Slow, but not for long enough yet
    assert_ne!(s.status("1"), Some(VesselStatus::Waiting));

    s.advance(120);
    s.report("1", BridgeId::Klaffbron, 80.0, 0.1, NORTH).unwrap();
    s.report("2", BridgeId::Klaffbron, 250.0, 1.5, NORTH).unwrap();

    assert_eq!(s.status("1"), Some(VesselStatus::Waiting));
    assert_eq!(s.status("2"), Some(VesselStatus::Approaching));
    let text = s.text();
    assert_eq!(
        text,
        "A boat waiting at Klaffbron, plus 1 more boat approaching"
    );
    assert!(!text.contains("No boats"));
}

// ============================================================================
// Thresholds
// ============================================================================

#[test]
fn test_waiting_boundary() {
    let mut s = Scenario::new();
    s.report("1", BridgeId::Klaffbron, 299.0, 0.1, NORTH).unwrap();
    s.advance(120);
    s.report("1", BridgeId::Klaffbron, 299.0, 0.1, NORTH).unwrap();
    assert_eq!(s.status("1"), Some(VesselStatus::Waiting));

    s.advance(10);
    s.report("1", BridgeId::Klaffbron, 301.0, 0.1, NORTH).unwrap();
    assert_ne!(s.status("1"), Some(VesselStatus::Waiting));
}

// ============================================================================
// Passages
// ============================================================================

#[test]
fn test_passage_fires_once_and_retargets() {
    let mut s = Scenario::new();
    let mut passages = Vec::new();

    for meters in [900.0, 350.0, 200.0, 30.0, -80.0, -200.0] {
        let outcome = s.report("1", BridgeId::Klaffbron, meters, 4.0, NORTH).unwrap();
        passages.extend(outcome.passage);
        if meters == -80.0 {
            assert_eq!(outcome.status, VesselStatus::Passed);
            let text = s.text();
            assert!(
                text.starts_with("A boat just passed Klaffbron, heading to Stridsbergsbron, ETA"),
                "{}",
                text
            );
        }
        s.advance(60);
    }

    assert_eq!(passages.len(), 1);
    assert_eq!(passages[0].bridge, BridgeId::Klaffbron);
    let v = s.monitor.vessel("1").unwrap();
    assert_eq!(v.target_bridge, Some(BridgeId::Stridsbergsbron));
    assert!(v.passed_bridges.contains(&BridgeId::Klaffbron));
}

#[test]
fn test_no_passage_outside_400m() {
    let mut s = Scenario::new();
    for (meters, cog) in [(900.0, NORTH), (600.0, NORTH), (450.0, NORTH), (600.0, SOUTH), (800.0, SOUTH)] {
        let outcome = s.report("1", BridgeId::Klaffbron, meters, 4.0, cog).unwrap();
        assert_eq!(outcome.passage, None);
        assert_ne!(outcome.status, VesselStatus::Passed);
        s.advance(60);
    }
    assert!(s.monitor.vessel("1").unwrap().passed_bridges.is_empty());
}

#[test]
fn test_beyond_last_target_removed_by_grace() {
    let mut s = Scenario::new();
    let strids = BridgeId::Stridsbergsbron;
    for meters in [350.0, 100.0, 30.0, -80.0] {
        s.report("1", strids, meters, 3.0, NORTH).unwrap();
        s.advance(30);
    }
    let v = s.monitor.vessel("1").unwrap();
    assert_eq!(v.target_bridge, None);
    assert!(v.passed_bridges.contains(&BridgeId::Jarnvagsbron));
    assert!(v.passed_bridges.contains(&strids));

    let first = s.report("1", strids, -400.0, 3.0, NORTH).unwrap();
    assert_eq!(first.status, VesselStatus::Passed);
    assert!(!first.removed);
    s.advance(30);
    assert!(!s.report("1", strids, -500.0, 3.0, NORTH).unwrap().removed);
    s.advance(30);
    assert!(s.report("1", strids, -600.0, 3.0, NORTH).unwrap().removed);
    assert!(s.monitor.is_empty());
}

// ============================================================================
// No-opening bridge
// ============================================================================

#[test]
fn test_no_opening_bridge_vocabulary() {
    let mut s = Scenario::new();
    let special = BridgeId::Stallbackabron;
    let mut texts = Vec::new();

    for meters in [-250.0, -150.0, -30.0, 100.0] {
        s.report("1", special, meters, 8.0, 190.0).unwrap();
        texts.push(s.text());
        s.advance(30);
    }

    assert!(texts[0].starts_with("A boat passing Stallbackabron, heading to Stridsbergsbron, ETA"));
    assert!(texts[2].starts_with("A boat gliding under Stallbackabron, heading to Stridsbergsbron, ETA"));
    assert!(texts[3].starts_with("A boat just passed Stallbackabron, heading to Stridsbergsbron, ETA"));
    for text in &texts {
        assert!(!text.contains("waiting"), "{}", text);
        assert!(!text.contains("opening"), "{}", text);
    }

    let v = s.monitor.vessel("1").unwrap();
    assert_eq!(v.target_bridge, Some(BridgeId::Stridsbergsbron));
    assert!(v.passed_bridges.contains(&special));
}

#[test]
fn test_approaching_no_opening_bridge_from_north() {
    let mut s = Scenario::new();
    let special = BridgeId::Stallbackabron;

    for meters in [-480.0, -420.0, -360.0, -310.0] {
        s.report("1", special, meters, 5.0, SOUTH).unwrap();
        assert_eq!(s.status("1"), Some(VesselStatus::Approaching));
        let text = s.text();
        assert!(
            text.starts_with("A boat approaching Stallbackabron, heading to Stridsbergsbron, ETA"),
            "{} m: {}",
            meters,
            text
        );
        s.advance(30);
    }
    assert_eq!(
        s.monitor.vessel("1").unwrap().target_bridge,
        Some(BridgeId::Stridsbergsbron)
    );
}

#[test]
fn test_never_waiting_at_no_opening_bridge() {
    let mut s = Scenario::new();
    for _ in 0..10 {
        s.report("1", BridgeId::Stallbackabron, 100.0, 0.05, SOUTH).unwrap();
        assert_ne!(s.status("1"), Some(VesselStatus::Waiting));
        assert!(!s.text().contains("waiting at Stallbackabron"));
        s.advance(60);
    }
}

// ============================================================================
// Cleanup and queries
// ============================================================================

#[test]
fn test_cleanup_timers_by_zone() {
    let mut s = Scenario::new();
    s.report("near", BridgeId::Klaffbron, 100.0, 3.0, NORTH).unwrap();
    s.report("far", BridgeId::Klaffbron, 900.0, 3.0, NORTH).unwrap();

    s.advance(2 * 60);
    assert_eq!(s.monitor.expire(s.now), vec!["far".to_string()]);
    assert!(s.monitor.vessel("near").is_some());

    s.advance(18 * 60);
    assert_eq!(s.monitor.expire(s.now), vec!["near".to_string()]);
    assert!(s.monitor.bridge_text(s.now).text == DEFAULT_MESSAGE);
}

#[test]
fn test_activity_query() {
    let mut s = Scenario::new();
    s.report("1", BridgeId::Klaffbron, 200.0, 3.0, NORTH).unwrap();
    s.advance(5 * 60);

    assert!(s.monitor.activity_within(Some(BridgeId::Klaffbron), 10 * 60_000, s.now));
    assert!(!s.monitor.activity_within(Some(BridgeId::Stridsbergsbron), 10 * 60_000, s.now));
    assert!(!s.monitor.activity_within(None, 60_000, s.now));
}

//! Bridge approach inference for AIS position reports
//!
//! This crate turns a stream of decoded AIS position reports into a per-vessel
//! navigational status, a target bridge, an ETA and one human-readable status
//! sentence for the two opening bridges it watches. It is platform-independent:
//! no I/O, no async, no clock. Callers pass time in as milliseconds since the
//! epoch, which keeps every timer deterministic under test.
//!
//! # Architecture
//!
//! - **bridges**: static bridge table and north-south ordering
//! - **geo**: haversine distance, bearings, direction of travel
//! - **proximity**: distance to every bridge, nearest bridge, zones
//! - **target**: target bridge assignment, validation and re-targeting
//! - **status**: per-vessel state machine with hysteresis
//! - **eta**: ETA with distance and status dependent speed floors
//! - **store**: vessel map, cleanup timers, grace-based removal
//! - **text**: the status sentence and alarm flag
//! - **events**: "boat near a bridge" trigger payloads
//! - **monitor**: the pipeline facade tying it all together
//!
//! # Usage
//!
//! ```rust,ignore
//! use bridgewatch_core::{AisReport, BridgeMonitor, Settings};
//!
//! let mut monitor = BridgeMonitor::new(Settings::default());
//! let outcome = monitor.process(report, now_ms)?;
//! for event in outcome.events {
//!     // fire flow triggers
//! }
//! monitor.expire(now_ms);
//! let text = monitor.bridge_text(now_ms);
//! println!("{} (alarm: {})", text.text, text.alarm);
//! ```

pub mod bridges;
pub mod error;
pub mod eta;
pub mod events;
pub mod geo;
pub mod monitor;
pub mod proximity;
pub mod settings;
pub mod status;
pub mod store;
pub mod target;
pub mod text;
pub mod timers;
pub mod vessel;

pub use bridges::{Bridge, BridgeId, BridgeRole, BRIDGES};
pub use error::InputError;
pub use eta::{format_eta, EtaCalculator};
pub use events::BoatNearEvent;
pub use geo::{Direction, Side};
pub use monitor::{BridgeMonitor, UpdateOutcome};
pub use proximity::{ProximityEngine, ProximityReport, Zone};
pub use settings::Settings;
pub use status::{Passage, StatusClassifier};
pub use store::VesselStateStore;
pub use target::{TargetBridgeResolver, TargetChange};
pub use text::{BridgeText, BridgeTextGenerator, DEFAULT_MESSAGE};
pub use timers::CleanupTimers;
pub use vessel::{AisReport, Eta, Timestamp, Vessel, VesselStatus};

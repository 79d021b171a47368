//! Monitor subsystem
//!
//! Owns the [`BridgeMonitor`]. Reports from the feed, cleanup and text
//! regeneration all run on this one task, so the vessel map is never touched
//! concurrently. The status sentence is regenerated at most once per debounce
//! interval and published only when something changed.
//!
//! In replay mode the clock follows the report timestamps instead of the wall
//! clock, and the service shuts the daemon down once the feed is exhausted.

use std::time::Duration;

use bridgewatch_core::{AisReport, BridgeMonitor, BridgeText, Settings, Timestamp, Vessel};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tokio_graceful_shutdown::SubsystemHandle;

use crate::snapshot::Snapshot;
use crate::Cli;

/// Milliseconds since the epoch on the wall clock
pub fn wall_clock() -> Timestamp {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

pub struct MonitorService {
    monitor: BridgeMonitor,
    rx: mpsc::Receiver<AisReport>,
    snapshot_tx: watch::Sender<Snapshot>,
    replay: bool,
    output: bool,
    debounce: Duration,
    /// Latest report timestamp, the clock in replay mode
    replay_clock: Timestamp,
    last_text: Option<BridgeText>,
    /// Reports applied since the last publish
    dirty: bool,
}

impl MonitorService {
    pub fn new(
        settings: Settings,
        rx: mpsc::Receiver<AisReport>,
        snapshot_tx: watch::Sender<Snapshot>,
        args: &Cli,
    ) -> Self {
        MonitorService {
            debounce: Duration::from_millis(settings.text_debounce_ms.max(1)),
            monitor: BridgeMonitor::new(settings),
            rx,
            snapshot_tx,
            replay: args.replay,
            output: args.output,
            replay_clock: 0,
            last_text: None,
            dirty: false,
        }
    }

    pub fn now(&self) -> Timestamp {
        if self.replay {
            self.replay_clock
        } else {
            wall_clock()
        }
    }

    pub fn monitor(&self) -> &BridgeMonitor {
        &self.monitor
    }

    pub async fn run(mut self, subsys: SubsystemHandle) -> anyhow::Result<()> {
        let mut ticker = interval(self.debounce);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut feed_open = true;

        log::debug!("monitor: started, debounce {:?}", self.debounce);
        loop {
            tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("monitor: shutdown");
                    return Ok(());
                },

                r = self.rx.recv(), if feed_open => {
                    match r {
                        Some(report) => self.handle_report(report),
                        None => {
                            feed_open = false;
                            log::info!("monitor: feed closed, {} vessels tracked", self.monitor.len());
                            if self.replay {
                                self.tick();
                                subsys.request_shutdown();
                            }
                        }
                    }
                },

                _ = ticker.tick() => {
                    self.tick();
                },
            }
        }
    }

    /// Run one report through the monitor.
    ///
    /// In replay mode only an accepted report moves the clock forward.
    pub fn handle_report(&mut self, report: AisReport) {
        let now = if self.replay {
            self.replay_clock.max(report.timestamp)
        } else {
            wall_clock()
        };

        // Rejections are logged by the monitor
        if let Ok(outcome) = self.monitor.process(report, now) {
            if self.replay {
                self.replay_clock = now;
                self.expire(now);
            }
            if outcome.status_changed() {
                log::debug!(
                    "{}: {} -> {}",
                    outcome.vessel_id,
                    outcome
                        .previous_status
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "new".to_string()),
                    outcome.status
                );
            }
            for event in &outcome.events {
                log::info!(
                    "{}: boat near {} ({}), ETA {:?}",
                    event.vessel_id,
                    event.bridge_name,
                    event.direction,
                    event.eta_minutes
                );
                self.emit("boatNear", event);
            }
            if let Some(passage) = &outcome.passage {
                self.emit("passage", passage);
            }
            self.dirty = true;
        }
    }

    /// Fire cleanup timers and publish if anything changed
    pub fn tick(&mut self) {
        let now = self.now();
        self.expire(now);
        self.publish(now);
    }

    fn expire(&mut self, now: Timestamp) {
        if !self.monitor.expire(now).is_empty() {
            self.dirty = true;
        }
    }

    fn publish(&mut self, now: Timestamp) {
        let text = self.monitor.bridge_text(now);
        let text_changed = self.last_text.as_ref() != Some(&text);
        if !text_changed && !self.dirty {
            return;
        }

        if text_changed {
            log::info!("{}", text.text);
            self.emit("bridgeText", &text);
        }
        let vessels: Vec<Vessel> = self.monitor.vessels().into_iter().cloned().collect();
        self.snapshot_tx
            .send_replace(Snapshot::new(text.clone(), vessels, now));
        self.last_text = Some(text);
        self.dirty = false;
    }

    fn emit<T: Serialize>(&self, kind: &str, data: &T) {
        if !self.output {
            return;
        }
        let line = serde_json::json!({ "type": kind, "data": data });
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridgewatch_core::{BridgeId, VesselStatus, DEFAULT_MESSAGE};
    use clap::Parser;

    fn service(replay: bool) -> (MonitorService, watch::Receiver<Snapshot>) {
        let (_tx, rx) = mpsc::channel(4);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let mut argv = vec!["bridgewatch-server", "-p", "0"];
        if replay {
            argv.push("--replay");
        }
        let args = Cli::parse_from(argv);
        (
            MonitorService::new(Settings::default(), rx, snapshot_tx, &args),
            snapshot_rx,
        )
    }

    fn report(id: &str, meters_south: f64, timestamp: Timestamp) -> AisReport {
        let b = BridgeId::Klaffbron.bridge();
        AisReport {
            id: id.to_string(),
            name: "TEST".to_string(),
            lat: b.lat - meters_south / 111_195.0,
            lon: b.lon,
            sog: 3.0,
            cog: 0.0,
            timestamp,
        }
    }

    #[test]
    fn test_replay_clock_follows_reports() {
        let (mut service, _rx) = service(true);
        service.handle_report(report("1", 200.0, 5_000));
        assert_eq!(service.now(), 5_000);

        // An older report does not move the clock back
        service.handle_report(report("2", 200.0, 4_000));
        assert_eq!(service.now(), 5_000);
    }

    #[test]
    fn test_rejected_report_keeps_replay_clock() {
        let (mut service, _rx) = service(true);
        service.handle_report(report("1", 200.0, 1_000));

        let mut broken = report("2", 200.0, 10_000_000_000);
        broken.lat = f64::NAN;
        service.handle_report(broken);

        assert_eq!(service.now(), 1_000);
        assert!(service.monitor().vessel("1").is_some());
        assert!(service.monitor().vessel("2").is_none());
    }

    #[test]
    fn test_publish_snapshot() {
        let (mut service, rx) = service(true);
        service.tick();
        assert_eq!(rx.borrow().bridge_text, DEFAULT_MESSAGE);

        service.handle_report(report("1", 200.0, 1_000));
        service.tick();
        let snapshot = rx.borrow().clone();
        assert!(snapshot.alarm_generic);
        assert!(snapshot.bridge_text.contains("approaching Klaffbron"));
        assert_eq!(snapshot.vessels.len(), 1);
        assert_eq!(snapshot.vessels[0].status, VesselStatus::Approaching);
        assert_eq!(snapshot.clock, 1_000);
    }

    #[test]
    fn test_replay_expires_on_report_time() {
        let (mut service, rx) = service(true);
        // Far zone: two minute timeout
        service.handle_report(report("1", 900.0, 0));
        service.handle_report(report("2", 200.0, 200_000));
        assert!(service.monitor().vessel("1").is_none());

        service.tick();
        assert_eq!(rx.borrow().vessels.len(), 1);
    }
}

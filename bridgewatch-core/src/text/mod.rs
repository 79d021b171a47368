//! Bridge Text Generator
//!
//! Builds the single status sentence shown to the user, plus the alarm flag
//! that is raised whenever the sentence is anything other than the default.
//!
//! # Algorithm
//!
//! 1. Keep eligible vessels: not idle, heading for one of the two target
//!    bridges, named, with a finite distance. Passed vessels only within the
//!    display window.
//! 2. Group by target bridge, south to north.
//! 3. Per group pick one phrase, in priority order:
//!
//! | Priority | Phrase |
//! |----------|--------|
//! | 1 | bridge opening in progress at {target} |
//! | 2 | {n} boat(s) waiting at {target} |
//! | 3 | a boat waiting at {intermediate}, heading to {target}, ETA |
//! | 4 | a boat just passed {bridge}, heading to {target}, ETA |
//! | 5 | lead vessel: approaching / special bridge / on its way |
//!
//! 4. Suffix ", plus N more boat(s) approaching" for the members the phrase
//!    does not speak for, join groups with "; " and capitalize.
//!
//! Vessel names never reach the sentence. Every fragment is fixed vocabulary,
//! a bridge name, or an ETA from [`format_eta`], so the text cannot contain
//! `NaN`, `null` or `undefined`.

mod phrase;

pub use phrase::{more_boats, Phrase, SpecialState};

use serde::Serialize;

use crate::bridges::{BridgeId, BridgeRole};
use crate::eta::{format_eta, EtaCalculator};
use crate::proximity::{APPROACH_RADIUS_M, UNDER_BRIDGE_M};
use crate::settings::Settings;
use crate::vessel::{Timestamp, Vessel, VesselStatus};

/// Sentence shown when no vessel is eligible
pub const DEFAULT_MESSAGE: &str = "No boats near Klaffbron or Stridsbergsbron";

/// Generated status sentence and alarm flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeText {
    pub text: String,
    /// True iff `text` is not [`DEFAULT_MESSAGE`]
    pub alarm: bool,
}

impl Default for BridgeText {
    fn default() -> Self {
        BridgeText {
            text: DEFAULT_MESSAGE.to_string(),
            alarm: false,
        }
    }
}

impl BridgeText {
    pub fn is_default(&self) -> bool {
        self.text == DEFAULT_MESSAGE
    }
}

/// Read-only pass over the vessel set producing a [`BridgeText`]
#[derive(Debug, Clone)]
pub struct BridgeTextGenerator {
    passed_display_ms: u64,
}

impl Default for BridgeTextGenerator {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl BridgeTextGenerator {
    pub fn new(settings: &Settings) -> Self {
        BridgeTextGenerator {
            passed_display_ms: settings.passed_display_ms(),
        }
    }

    /// Whether a vessel may take part in the sentence
    pub fn is_eligible(&self, vessel: &Vessel, now: Timestamp) -> bool {
        let target_ok = vessel.target_bridge.is_some_and(|t| t.is_target());
        let distance_ok = vessel.distance_to_target.is_finite() && vessel.distance_to_target >= 0.0;
        let status_ok = match vessel.status {
            VesselStatus::Idle => false,
            VesselStatus::Passed => vessel.recently_passed(now, self.passed_display_ms),
            _ => true,
        };
        target_ok && distance_ok && status_ok && !vessel.name.trim().is_empty()
    }

    pub fn generate<'a, I>(&self, vessels: I, now: Timestamp) -> BridgeText
    where
        I: IntoIterator<Item = &'a Vessel>,
    {
        let eligible: Vec<&Vessel> = vessels
            .into_iter()
            .filter(|v| self.is_eligible(v, now))
            .collect();

        let parts: Vec<String> = BridgeId::TARGETS
            .iter()
            .filter_map(|target| {
                let members: Vec<&Vessel> = eligible
                    .iter()
                    .copied()
                    .filter(|v| v.target_bridge == Some(*target))
                    .collect();
                Self::group_sentence(*target, members)
            })
            .collect();

        if parts.is_empty() {
            return BridgeText::default();
        }
        let text = capitalize(&parts.join("; "));
        log::trace!("bridge text: {}", text);
        BridgeText { text, alarm: true }
    }

    fn group_sentence(target: BridgeId, mut members: Vec<&Vessel>) -> Option<String> {
        if members.is_empty() {
            return None;
        }
        members.sort_by(|a, b| {
            a.distance_to_target
                .total_cmp(&b.distance_to_target)
                .then_with(|| a.id.cmp(&b.id))
        });

        let phrase = Self::group_phrase(target, &members);
        let extra = members.len().saturating_sub(phrase.covers());
        Some(format!("{}{}", phrase, more_boats(extra)))
    }

    /// Phrase for a non-empty group sorted by distance to target, lead first
    fn group_phrase(target: BridgeId, members: &[&Vessel]) -> Phrase {
        if members
            .iter()
            .any(|v| v.status == VesselStatus::UnderBridge && v.near_bridge == Some(target))
        {
            return Phrase::Opening { target };
        }

        let waiting_here = members
            .iter()
            .filter(|v| v.status == VesselStatus::Waiting && v.near_bridge == Some(target))
            .count();
        if waiting_here > 0 {
            return Phrase::WaitingAtTarget {
                target,
                count: waiting_here,
            };
        }

        let waiting_elsewhere = members.iter().find_map(|v| match v.near_bridge {
            Some(b) if v.status == VesselStatus::Waiting && b.role() == BridgeRole::Intermediate => {
                Some((b, *v))
            }
            _ => None,
        });
        if let Some((bridge, v)) = waiting_elsewhere {
            return Phrase::WaitingAt {
                at: bridge,
                target,
                eta: eta_text(v),
            };
        }

        let passed = members.iter().find_map(|v| match v.last_passed_bridge {
            Some(b) if v.status == VesselStatus::Passed => Some((b, *v)),
            _ => None,
        });
        if let Some((bridge, v)) = passed {
            let eta = eta_text(v);
            return if bridge.is_special() {
                Phrase::Special {
                    state: SpecialState::JustPassed,
                    bridge,
                    target,
                    eta,
                }
            } else {
                Phrase::JustPassed {
                    passed: bridge,
                    target,
                    eta,
                }
            };
        }

        Self::lead_phrase(target, members[0])
    }

    fn lead_phrase(target: BridgeId, lead: &Vessel) -> Phrase {
        let eta = eta_text(lead);
        let nearest = lead.nearest_bridge;
        let distance = lead.distance_to_nearest;

        if let Some(bridge) = nearest.filter(|b| b.is_special()) {
            let state = if distance < UNDER_BRIDGE_M {
                Some(SpecialState::GlidingUnder)
            } else if distance <= bridge.bridge().radius {
                Some(SpecialState::Passing)
            } else if distance <= APPROACH_RADIUS_M && lead.status == VesselStatus::Approaching {
                Some(SpecialState::Approaching)
            } else {
                None
            };
            if let Some(state) = state {
                return Phrase::Special {
                    state,
                    bridge,
                    target,
                    eta,
                };
            }
        }

        if lead.status == VesselStatus::Approaching {
            return match nearest {
                Some(via) if via.role() == BridgeRole::Intermediate => {
                    Phrase::ApproachingVia { via, target, eta }
                }
                _ => Phrase::Approaching { target, eta },
            };
        }
        Phrase::EnRoute { target, eta }
    }
}

/// Display ETA for a vessel: the stored estimate, or one computed from the
/// live position and speed when none is stored
fn eta_text(vessel: &Vessel) -> Option<String> {
    vessel
        .eta_minutes
        .and_then(|eta| eta.minutes())
        .or_else(|| {
            EtaCalculator::estimate(
                VesselStatus::EnRoute,
                vessel.distance_to_target,
                vessel.sog,
                vessel.max_recent_speed,
            )
            .and_then(|eta| eta.minutes())
        })
        .and_then(format_eta)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

//! Phrase vocabulary
//!
//! One [`Phrase`] per target group. Rendering is the only place sentence
//! fragments are spelled out, so every fragment is a fixed string, a bridge
//! name or an already formatted ETA.

use std::fmt;

use crate::bridges::BridgeId;

/// What a vessel is doing at the no-opening bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialState {
    Approaching,
    Passing,
    GlidingUnder,
    JustPassed,
}

impl SpecialState {
    fn verb(self) -> &'static str {
        match self {
            SpecialState::Approaching => "approaching",
            SpecialState::Passing => "passing",
            SpecialState::GlidingUnder => "gliding under",
            SpecialState::JustPassed => "just passed",
        }
    }
}

/// The lead phrase of one target group
#[derive(Debug, Clone, PartialEq)]
pub enum Phrase {
    /// A vessel under the target bridge
    Opening { target: BridgeId },
    /// `count` vessels waiting at the target bridge itself
    WaitingAtTarget { target: BridgeId, count: usize },
    /// Waiting at an intermediate bridge on the way to the target
    WaitingAt {
        at: BridgeId,
        target: BridgeId,
        eta: Option<String>,
    },
    JustPassed {
        passed: BridgeId,
        target: BridgeId,
        eta: Option<String>,
    },
    /// Approaching the target bridge itself
    Approaching { target: BridgeId, eta: Option<String> },
    /// Approaching an intermediate bridge on the way to the target
    ApproachingVia {
        via: BridgeId,
        target: BridgeId,
        eta: Option<String>,
    },
    Special {
        state: SpecialState,
        bridge: BridgeId,
        target: BridgeId,
        eta: Option<String>,
    },
    EnRoute { target: BridgeId, eta: Option<String> },
}

impl Phrase {
    /// Number of group members this phrase already speaks for
    pub fn covers(&self) -> usize {
        match self {
            Phrase::WaitingAtTarget { count, .. } => *count,
            _ => 1,
        }
    }
}

fn write_eta(f: &mut fmt::Formatter<'_>, eta: &Option<String>) -> fmt::Result {
    match eta {
        Some(eta) => write!(f, ", ETA {}", eta),
        None => Ok(()),
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phrase::Opening { target } => {
                write!(f, "bridge opening in progress at {}", target)
            }
            Phrase::WaitingAtTarget { target, count } => {
                if *count > 1 {
                    write!(f, "{} boats waiting at {}", count, target)
                } else {
                    write!(f, "a boat waiting at {}", target)
                }
            }
            Phrase::WaitingAt { at, target, eta } => {
                write!(f, "a boat waiting at {}, heading to {}", at, target)?;
                write_eta(f, eta)
            }
            Phrase::JustPassed {
                passed,
                target,
                eta,
            } => {
                write!(f, "a boat just passed {}, heading to {}", passed, target)?;
                write_eta(f, eta)
            }
            Phrase::Approaching { target, eta } => {
                write!(f, "a boat approaching {}", target)?;
                write_eta(f, eta)
            }
            Phrase::ApproachingVia { via, target, eta } => {
                write!(f, "a boat approaching {}, heading to {}", via, target)?;
                write_eta(f, eta)
            }
            Phrase::Special {
                state,
                bridge,
                target,
                eta,
            } => {
                write!(f, "a boat {} {}, heading to {}", state.verb(), bridge, target)?;
                write_eta(f, eta)
            }
            Phrase::EnRoute { target, eta } => {
                write!(f, "a boat on its way to {}", target)?;
                write_eta(f, eta)
            }
        }
    }
}

/// ", plus N more boat(s) approaching", empty for no extra boats
pub fn more_boats(extra: usize) -> String {
    match extra {
        0 => String::new(),
        1 => ", plus 1 more boat approaching".to_string(),
        n => format!(", plus {} more boats approaching", n),
    }
}

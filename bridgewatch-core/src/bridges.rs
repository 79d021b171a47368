//! Bridge Registry
//!
//! Static table of the bridges along the waterway, in their fixed
//! south-to-north order. Two bridges open for traffic and get status lines
//! of their own (targets); the others are passed on the way to a target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geo::Direction;

/// Default detection radius around every bridge, in meters
pub const BRIDGE_RADIUS_M: f64 = 300.0;

/// What a bridge means for the status text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeRole {
    /// Opening bridge with its own status line
    Target,
    /// Opening bridge passed on the way to a target
    Intermediate,
    /// High bridge that never opens
    SpecialNoOpening,
}

/// Bridge identity
///
/// Variants are declared south to north, so the derived ordering is the
/// sequence a northbound vessel meets them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeId {
    Olidebron,
    Klaffbron,
    Jarnvagsbron,
    Stridsbergsbron,
    Stallbackabron,
}

/// A bridge on the waterway
#[derive(Debug, Clone, PartialEq)]
pub struct Bridge {
    pub id: BridgeId,
    /// Display name
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    /// Radius of the bridge zone in meters
    pub radius: f64,
    pub role: BridgeRole,
}

/// All bridges, south to north. Indexed by [`BridgeId::sequence`].
pub static BRIDGES: [Bridge; 5] = [
    Bridge {
        id: BridgeId::Olidebron,
        name: "Olidebron",
        lat: 58.272743,
        lon: 12.275116,
        radius: BRIDGE_RADIUS_M,
        role: BridgeRole::Intermediate,
    },
    Bridge {
        id: BridgeId::Klaffbron,
        name: "Klaffbron",
        lat: 58.284096,
        lon: 12.283930,
        radius: BRIDGE_RADIUS_M,
        role: BridgeRole::Target,
    },
    Bridge {
        id: BridgeId::Jarnvagsbron,
        name: "Järnvägsbron",
        lat: 58.291640,
        lon: 12.292025,
        radius: BRIDGE_RADIUS_M,
        role: BridgeRole::Intermediate,
    },
    Bridge {
        id: BridgeId::Stridsbergsbron,
        name: "Stridsbergsbron",
        lat: 58.293524,
        lon: 12.294566,
        radius: BRIDGE_RADIUS_M,
        role: BridgeRole::Target,
    },
    Bridge {
        id: BridgeId::Stallbackabron,
        name: "Stallbackabron",
        lat: 58.311430,
        lon: 12.314564,
        radius: BRIDGE_RADIUS_M,
        role: BridgeRole::SpecialNoOpening,
    },
];

impl BridgeId {
    /// Every bridge, south to north
    pub const ALL: [BridgeId; 5] = [
        BridgeId::Olidebron,
        BridgeId::Klaffbron,
        BridgeId::Jarnvagsbron,
        BridgeId::Stridsbergsbron,
        BridgeId::Stallbackabron,
    ];

    /// The two opening bridges that get status lines, south to north
    pub const TARGETS: [BridgeId; 2] = [BridgeId::Klaffbron, BridgeId::Stridsbergsbron];

    /// Position in the south-to-north sequence
    pub fn sequence(self) -> usize {
        self as usize
    }

    pub fn bridge(self) -> &'static Bridge {
        &BRIDGES[self.sequence()]
    }

    pub fn name(self) -> &'static str {
        self.bridge().name
    }

    pub fn role(self) -> BridgeRole {
        self.bridge().role
    }

    pub fn is_target(self) -> bool {
        self.role() == BridgeRole::Target
    }

    pub fn is_special(self) -> bool {
        self.role() == BridgeRole::SpecialNoOpening
    }

    /// The next target bridge beyond `self` when travelling in `direction`.
    ///
    /// Returns `None` when `self` is the last target in that direction.
    pub fn next_target(self, direction: Direction) -> Option<BridgeId> {
        match direction {
            Direction::Northbound => BridgeId::TARGETS
                .iter()
                .copied()
                .find(|t| t.sequence() > self.sequence()),
            Direction::Southbound => BridgeId::TARGETS
                .iter()
                .rev()
                .copied()
                .find(|t| t.sequence() < self.sequence()),
        }
    }
}

/// The first target bridge ahead of a position when travelling in `direction`.
///
/// The waterway runs south to north, so "ahead" is decided on latitude.
pub fn next_target_from(lat: f64, direction: Direction) -> Option<BridgeId> {
    if !lat.is_finite() {
        return None;
    }
    match direction {
        Direction::Northbound => BridgeId::TARGETS
            .iter()
            .copied()
            .find(|t| t.bridge().lat > lat),
        Direction::Southbound => BridgeId::TARGETS
            .iter()
            .rev()
            .copied()
            .find(|t| t.bridge().lat < lat),
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a bridge name is not in the registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bridge '{0}'")]
pub struct UnknownBridge(pub String);

impl FromStr for BridgeId {
    type Err = UnknownBridge;

    /// Case-insensitive; accepts both "Järnvägsbron" and "jarnvagsbron"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold_name(s);
        BridgeId::ALL
            .iter()
            .copied()
            .find(|id| fold_name(id.name()) == wanted)
            .ok_or_else(|| UnknownBridge(s.to_string()))
    }
}

fn fold_name(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ä' | 'å' => 'a',
            'ö' => 'o',
            c => c,
        })
        .collect()
}

//! Input rejection errors
//!
//! Position reports are transient telemetry: nothing here is retried. A
//! rejected report leaves the stored vessel untouched and it ages out through
//! the normal cleanup timer if the problem persists.

/// Why a position report was not applied
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// Missing or non-finite position, speed or course, or an empty id
    #[error("{id}: malformed report, invalid {field}")]
    Malformed { id: String, field: &'static str },

    /// The position jumped further than the vessel could have travelled
    #[error("{id}: implausible position jump of {jump_m:.0} m ({implied_kn:.1} kn)")]
    ImplausiblePosition {
        id: String,
        jump_m: f64,
        implied_kn: f64,
    },

    /// The report is older than the last one applied
    #[error("{id}: report at {timestamp} is older than the last accepted one")]
    OutOfOrder { id: String, timestamp: u64 },
}

impl InputError {
    /// Vessel the rejected report belonged to
    pub fn vessel_id(&self) -> &str {
        match self {
            InputError::Malformed { id, .. }
            | InputError::ImplausiblePosition { id, .. }
            | InputError::OutOfOrder { id, .. } => id,
        }
    }
}

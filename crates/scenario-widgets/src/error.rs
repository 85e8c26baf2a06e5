//! Widget errors

use scenario_model::ValidationFailure;

/// Errors raised by resource widgets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    /// The edit breaks a resource rule; nothing was committed
    #[error("{0}")]
    Rejected(#[from] ValidationFailure),

    /// Slot index past the end of the region
    #[error("region '{region}' has no slot {slot}")]
    SlotOutOfRange {
        /// Region name
        region: String,
        /// Requested slot index
        slot: usize,
    },

    /// Name is not one of the selector's options
    #[error("unknown VM name: {0}")]
    UnknownVmName(String),
}

impl WidgetError {
    /// Rule the edit broke, if it was a rule rejection
    #[inline]
    #[must_use]
    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Rejected(failure) => Some(failure),
            _ => None,
        }
    }

    pub(crate) fn out_of_range(region: &str, slot: usize) -> Self {
        Self::SlotOutOfRange {
            region: region.to_string(),
            slot,
        }
    }
}

//! Virtual BDF text field

use scenario_model::{Bdf, IvshmemRegion, IvshmemSlot, ValidationFailure};

use crate::error::WidgetError;
use crate::slot::SlotState;

/// Text input for a slot's virtual BDF
///
/// Text is committed to the slot only when it is a well-formed `BB:DD.F`
/// address that no other slot of the region uses. Anything else keeps the
/// last committed value and shows [`BdfTextField::error`] inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BdfTextField {
    committed: String,
    error: Option<ValidationFailure>,
}

impl BdfTextField {
    /// Field showing a slot's current BDF
    #[must_use]
    pub fn from_slot(slot: &IvshmemSlot) -> Self {
        Self {
            committed: slot.bdf.clone(),
            error: None,
        }
    }

    /// Last committed text
    #[inline]
    #[must_use]
    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// Inline error from the last input, if it was refused
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&ValidationFailure> {
        self.error.as_ref()
    }

    /// Handle text typed into the field for slot `slot` of `region`
    ///
    /// Accepted text is written to the slot as typed. Returns the slot's
    /// state after the commit.
    ///
    /// # Errors
    /// - [`WidgetError::SlotOutOfRange`] for a bad index
    /// - [`WidgetError::Rejected`] with `MalformedBdf` or `DuplicateBdf`;
    ///   the same failure is kept in [`BdfTextField::error`]
    pub fn input(&mut self, text: &str, region: &mut IvshmemRegion, slot: usize) -> Result<SlotState, WidgetError> {
        let current = region
            .slots()
            .get(slot)
            .ok_or_else(|| WidgetError::out_of_range(&region.name, slot))?;

        let candidate = IvshmemSlot {
            bdf: text.to_string(),
            ..current.clone()
        };
        let state = if Bdf::is_well_formed(text) {
            SlotState::classify(region, Some(slot), &candidate)
        } else {
            SlotState::Invalid(ValidationFailure::MalformedBdf(text.to_string()))
        };

        if let SlotState::Invalid(failure) = state {
            tracing::debug!("Refused BDF '{}' for slot {} of {}: {}", text, slot, region.name, failure);
            self.error = Some(failure.clone());
            return Err(WidgetError::Rejected(failure));
        }

        region.slots_mut()[slot] = candidate;
        self.committed = text.to_string();
        self.error = None;
        Ok(state)
    }
}

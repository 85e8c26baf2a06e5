//! Slot classification and checked region edits

use scenario_model::{Bdf, IvshmemRegion, IvshmemSlot, ValidationFailure};

use crate::error::WidgetError;

/// Where a slot stands against the region's resource rules
///
/// `Empty → PartiallyFilled → Valid | Invalid`. Only `Valid` slots commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    /// Neither VM name nor BDF set
    Empty,
    /// One of the two set, nothing wrong so far
    PartiallyFilled,
    /// Both set, well formed and unique within the region
    Valid,
    /// Breaks a rule
    Invalid(ValidationFailure),
}

impl SlotState {
    /// Classify `slot` as if it sat at position `index` of `region`
    ///
    /// `index` is excluded from the uniqueness checks; `None` classifies a
    /// slot about to be appended.
    #[must_use]
    pub fn classify(region: &IvshmemRegion, index: Option<usize>, slot: &IvshmemSlot) -> Self {
        if slot.is_empty() {
            return Self::Empty;
        }

        if region.vm_name_taken(&slot.vm_name, index) {
            return Self::Invalid(ValidationFailure::DuplicateVmName {
                region: region.name.clone(),
                name: slot.vm_name.clone(),
            });
        }

        if !slot.bdf.is_empty() {
            let Ok(bdf) = slot.bdf.parse::<Bdf>() else {
                return Self::Invalid(ValidationFailure::MalformedBdf(slot.bdf.clone()));
            };
            if region.bdf_taken(bdf, index) {
                return Self::Invalid(ValidationFailure::DuplicateBdf {
                    region: region.name.clone(),
                    bdf: bdf.to_string(),
                });
            }
        }

        if slot.vm_name.is_empty() || slot.bdf.is_empty() {
            Self::PartiallyFilled
        } else {
            Self::Valid
        }
    }

    /// Classify the slot stored at `index`
    #[must_use]
    pub fn of(region: &IvshmemRegion, index: usize) -> Option<Self> {
        region
            .slots()
            .get(index)
            .map(|slot| Self::classify(region, Some(index), slot))
    }

    /// Check if the slot may be committed
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Broken rule, if any
    #[inline]
    #[must_use]
    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Invalid(failure) => Some(failure),
            _ => None,
        }
    }

    /// Demand a committable slot
    ///
    /// # Errors
    /// The broken rule for `Invalid`, [`ValidationFailure::IncompleteSlot`]
    /// for `Empty` and `PartiallyFilled`
    pub fn require_valid(self, region: &str, index: usize) -> Result<(), ValidationFailure> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(failure) => Err(failure),
            Self::Empty | Self::PartiallyFilled => Err(ValidationFailure::IncompleteSlot {
                region: region.to_string(),
                slot: index,
            }),
        }
    }
}

/// Checked slot edits on a region
///
/// An edit applies only when the resulting slot is [`SlotState::Valid`];
/// otherwise the region is left as it was.
pub trait RegionEditor {
    /// Append a slot
    ///
    /// # Errors
    /// [`WidgetError::Rejected`] if the slot would not be valid
    fn try_push_slot(&mut self, slot: IvshmemSlot) -> Result<usize, WidgetError>;

    /// Replace the slot at `index`
    ///
    /// # Errors
    /// [`WidgetError::SlotOutOfRange`] for a bad index,
    /// [`WidgetError::Rejected`] if the slot would not be valid
    fn try_set_slot(&mut self, index: usize, slot: IvshmemSlot) -> Result<(), WidgetError>;

    /// Check every slot
    ///
    /// # Errors
    /// The first slot that is not valid
    fn validate_slots(&self) -> Result<(), ValidationFailure>;
}

impl RegionEditor for IvshmemRegion {
    fn try_push_slot(&mut self, slot: IvshmemSlot) -> Result<usize, WidgetError> {
        let index = self.slots().len();
        SlotState::classify(self, None, &slot).require_valid(&self.name, index)?;
        self.slots_mut().push(slot);
        Ok(index)
    }

    fn try_set_slot(&mut self, index: usize, slot: IvshmemSlot) -> Result<(), WidgetError> {
        if index >= self.slots().len() {
            return Err(WidgetError::out_of_range(&self.name, index));
        }
        SlotState::classify(self, Some(index), &slot).require_valid(&self.name, index)?;
        self.slots_mut()[index] = slot;
        Ok(())
    }

    fn validate_slots(&self) -> Result<(), ValidationFailure> {
        self.slots()
            .iter()
            .enumerate()
            .try_for_each(|(index, slot)| {
                SlotState::classify(self, Some(index), slot).require_valid(&self.name, index)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> IvshmemRegion {
        IvshmemRegion::new("shm_region_0").with_slot(IvshmemSlot::new("VM1", "00:01.0"))
    }

    #[test]
    fn classify_states() {
        let region = region();
        assert_eq!(SlotState::classify(&region, None, &IvshmemSlot::default()), SlotState::Empty);
        assert_eq!(
            SlotState::classify(&region, None, &IvshmemSlot::new("VM2", "")),
            SlotState::PartiallyFilled
        );
        assert_eq!(
            SlotState::classify(&region, None, &IvshmemSlot::new("", "00:02.0")),
            SlotState::PartiallyFilled
        );
        assert_eq!(
            SlotState::classify(&region, None, &IvshmemSlot::new("VM2", "00:02.0")),
            SlotState::Valid
        );
    }

    #[test]
    fn classify_failures() {
        let region = region();
        assert_eq!(
            SlotState::classify(&region, None, &IvshmemSlot::new("VM1", "00:02.0")).failure(),
            Some(&ValidationFailure::DuplicateVmName {
                region: "shm_region_0".to_string(),
                name: "VM1".to_string(),
            })
        );
        assert_eq!(
            SlotState::classify(&region, None, &IvshmemSlot::new("VM2", "0:1.0")).failure(),
            Some(&ValidationFailure::MalformedBdf("0:1.0".to_string()))
        );
        assert!(matches!(
            SlotState::classify(&region, None, &IvshmemSlot::new("VM2", "00:01.0")),
            SlotState::Invalid(ValidationFailure::DuplicateBdf { .. })
        ));
    }

    #[test]
    fn classify_excludes_own_index() {
        let region = region();
        assert_eq!(SlotState::of(&region, 0), Some(SlotState::Valid));
        assert_eq!(SlotState::of(&region, 1), None);
    }

    #[test]
    fn push_rejects_and_leaves_region() {
        let mut region = region();
        let before = region.clone();

        let err = region.try_push_slot(IvshmemSlot::new("VM1", "00:02.0")).unwrap_err();
        assert!(matches!(err.failure(), Some(ValidationFailure::DuplicateVmName { .. })));
        assert_eq!(region, before);

        let err = region.try_push_slot(IvshmemSlot::new("VM2", "")).unwrap_err();
        assert_eq!(
            err,
            WidgetError::Rejected(ValidationFailure::IncompleteSlot {
                region: "shm_region_0".to_string(),
                slot: 1,
            })
        );
        assert_eq!(region, before);

        assert_eq!(region.try_push_slot(IvshmemSlot::new("VM2", "00:02.0")), Ok(1));
        assert_eq!(region.slots().len(), 2);
    }

    #[test]
    fn set_slot_checks() {
        let mut region = region().with_slot(IvshmemSlot::new("VM2", "00:02.0"));

        // Rewriting a slot with its own values is fine.
        assert!(region.try_set_slot(1, IvshmemSlot::new("VM2", "00:02.0")).is_ok());
        assert!(region.try_set_slot(1, IvshmemSlot::new("VM2", "00:01.0")).is_err());
        assert_eq!(
            region.try_set_slot(5, IvshmemSlot::new("VM3", "00:03.0")),
            Err(WidgetError::out_of_range("shm_region_0", 5))
        );
        assert!(region.try_set_slot(1, IvshmemSlot::new("VM3", "00:03.0")).is_ok());
        assert_eq!(region.slots()[1].vm_name, "VM3");
    }

    #[test]
    fn validate_slots_reports_first_bad_slot() {
        assert!(region().validate_slots().is_ok());

        let doubled = region()
            .with_slot(IvshmemSlot::new("VM2", "00:02.0"))
            .with_slot(IvshmemSlot::new("VM2", "00:03.0"));
        assert!(matches!(
            doubled.validate_slots(),
            Err(ValidationFailure::DuplicateVmName { .. })
        ));
    }
}

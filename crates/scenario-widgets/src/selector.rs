//! VM name selector

use scenario_model::{IvshmemRegion, IvshmemSlot, ScenarioConfig};

use crate::error::WidgetError;
use crate::slot::SlotState;

/// Drop-down of known VM names for an IVSHMEM slot
///
/// A name may attach to a region once. Picking a name another slot of the
/// region already uses is refused; the selector never dedupes silently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmNameSelector {
    options: Vec<String>,
}

impl VmNameSelector {
    /// Selector offering the scenario's VM names
    #[must_use]
    pub fn new(scenario: &ScenarioConfig) -> Self {
        Self {
            options: Self::options(scenario),
        }
    }

    /// Selector with explicit options
    #[must_use]
    pub fn with_options<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// VM names known to the scenario, in scenario order
    #[must_use]
    pub fn options(scenario: &ScenarioConfig) -> Vec<String> {
        scenario.vm_names().into_iter().map(str::to_string).collect()
    }

    /// Names this selector offers
    #[inline]
    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.options
    }

    /// Names not yet used by another slot of `region`
    #[must_use]
    pub fn available(&self, region: &IvshmemRegion, slot: usize) -> Vec<&str> {
        self.options
            .iter()
            .filter(|name| !region.vm_name_taken(name, Some(slot)))
            .map(String::as_str)
            .collect()
    }

    /// Set the VM name of slot `slot`
    ///
    /// The slot keeps its BDF; the returned state is the slot's state after
    /// the change. On error the region is unchanged.
    ///
    /// # Errors
    /// - [`WidgetError::SlotOutOfRange`] for a bad index
    /// - [`WidgetError::UnknownVmName`] if `name` is not an option
    /// - [`WidgetError::Rejected`] if another slot uses `name`
    pub fn select(&self, region: &mut IvshmemRegion, slot: usize, name: &str) -> Result<SlotState, WidgetError> {
        let current = region
            .slots()
            .get(slot)
            .ok_or_else(|| WidgetError::out_of_range(&region.name, slot))?;
        if !self.options.iter().any(|option| option == name) {
            return Err(WidgetError::UnknownVmName(name.to_string()));
        }

        let candidate = IvshmemSlot {
            vm_name: name.to_string(),
            ..current.clone()
        };
        let state = SlotState::classify(region, Some(slot), &candidate);
        if let SlotState::Invalid(failure) = state {
            tracing::debug!("Refused VM name {} for slot {} of {}: {}", name, slot, region.name, failure);
            return Err(WidgetError::Rejected(failure));
        }

        region.slots_mut()[slot] = candidate;
        Ok(state)
    }
}

//! IVSHMEM write-path guard

use scenario_model::{IvshmemTable, Target, ValidationFailure};
use scenario_store::SectionGuard;
use serde_json::Value;

use crate::slot::RegionEditor;

/// Refuses section values whose IVSHMEM slots are not all valid
///
/// Applies to any section that carries `IVSHMEM.IVSHMEM_REGION`; other
/// sections pass. A region list that cannot be read is refused, since its
/// slots cannot be checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct IvshmemGuard;

impl IvshmemGuard {
    /// Create the guard
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SectionGuard for IvshmemGuard {
    fn name(&self) -> &'static str {
        "ivshmem"
    }

    fn check(&self, target: Target, section: &str, value: &Value) -> Result<(), ValidationFailure> {
        let table = match IvshmemTable::from_section(value) {
            Ok(Some(table)) => table,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::debug!("Unreadable IVSHMEM table in {} of {}: {}", section, target, e);
                return Err(ValidationFailure::UnreadableResourceTable {
                    section: section.to_string(),
                    reason: e.to_string(),
                });
            }
        };
        table.regions.iter().try_for_each(|region| region.validate_slots())
    }
}

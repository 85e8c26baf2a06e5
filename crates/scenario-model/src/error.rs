//! Error types for the scenario model
//!
//! Two families:
//! - [`ModelError`]: malformed input while building or decoding the model
//! - [`ValidationFailure`]: field-level resource rule violations, surfaced
//!   inline by widgets and never written to the scenario

use crate::ids::VmId;

/// Errors raised while constructing or decoding scenario data
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Text is not a `bus:device.function` address
    #[error("invalid BDF '{0}': expected BB:DD.F in hexadecimal")]
    InvalidBdf(String),

    /// Load order text does not name a known class
    #[error("unknown load order: '{0}'")]
    UnknownLoadOrder(String),

    /// Raw target id is neither `-1` nor a valid VM id
    #[error("invalid target id: {0}")]
    InvalidTarget(i64),

    /// VM id already present in the scenario
    #[error("duplicate VM id: {0}")]
    DuplicateVmId(VmId),

    /// VM entry has neither `load_order` nor `hidden.load_order`
    #[error("VM {0} has no load order")]
    MissingLoadOrder(VmId),

    /// `IVSHMEM_REGION` is present but cannot be read as regions and slots
    #[error("invalid IVSHMEM region list: {0}")]
    InvalidResourceTable(String),

    /// Section name collides with a VM identity field
    #[error("'{0}' is reserved for VM identity and cannot be used as a section")]
    ReservedSection(String),

    /// JSON shape did not match the model
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Field-level resource rule violation
///
/// Terminal at the widget boundary: a value that fails one of these checks
/// is never committed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    /// Another slot in the same region already uses this VM name
    #[error("VM name '{name}' is already used in region '{region}'")]
    DuplicateVmName {
        /// Region name
        region: String,
        /// Offending VM name
        name: String,
    },

    /// Another slot in the same region already uses this BDF
    #[error("BDF {bdf} is already used in region '{region}'")]
    DuplicateBdf {
        /// Region name
        region: String,
        /// Offending address
        bdf: String,
    },

    /// Text does not match the `BB:DD.F` grammar
    #[error("'{0}' is not a valid BDF (expected BB:DD.F)")]
    MalformedBdf(String),

    /// Slot is missing its VM name or its BDF
    #[error("slot {slot} in region '{region}' is incomplete")]
    IncompleteSlot {
        /// Region name
        region: String,
        /// Slot position within the region
        slot: usize,
    },

    /// A resource table is present but its shape cannot be checked
    #[error("unreadable resource table in section '{section}': {reason}")]
    UnreadableResourceTable {
        /// Section holding the table
        section: String,
        /// Decoder message
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_display() {
        let err = ModelError::UnknownLoadOrder("SAFETY_VM".to_string());
        assert_eq!(err.to_string(), "unknown load order: 'SAFETY_VM'");
    }

    #[test]
    fn duplicate_vm_id_display() {
        let err = ModelError::DuplicateVmId(VmId(3));
        assert_eq!(err.to_string(), "duplicate VM id: 3");
    }

    #[test]
    fn validation_failure_display() {
        let err = ValidationFailure::DuplicateVmName {
            region: "hv:/shm_region_0".to_string(),
            name: "VM1".to_string(),
        };
        assert!(err.to_string().contains("VM1"));
        assert!(err.to_string().contains("hv:/shm_region_0"));
    }
}

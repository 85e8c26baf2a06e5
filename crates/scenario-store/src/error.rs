//! Error types for the store layer
//!
//! - Lookup failures ([`StoreError`]) propagate to the resolver/sync engine
//! - Resolution failures ([`ResolveError`]) never carry partial data
//! - Write-back failures ([`SyncError`]) mean nothing was written

use scenario_model::{LoadOrder, Target, ValidationFailure, VmId};

/// Store lookup and mutation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Section key unknown to the schema catalog
    #[error("section not in schema catalog: {0}")]
    NotFound(String),

    /// No VM has this id
    #[error("VM not found: {0}")]
    VmNotFound(VmId),

    /// VM exists but has no such section
    #[error("VM {id} has no section '{section}'")]
    SectionNotFound {
        /// VM id
        id: VmId,
        /// Section name
        section: String,
    },

    /// VM id already present
    #[error("VM {0} already exists")]
    DuplicateVm(VmId),

    /// Section name is a VM identity key
    #[error("'{0}' is a VM identity key, not a section")]
    ReservedSection(String),

    /// Edit was resolved for another schema family than the VM's
    #[error("VM {id} is {actual}, edit is for {requested}")]
    LoadOrderMismatch {
        /// VM id
        id: VmId,
        /// Family the edit was resolved against
        requested: LoadOrder,
        /// VM's `hidden.load_order`
        actual: LoadOrder,
    },
}

impl StoreError {
    /// Check if this error signals a schema/catalog mismatch
    ///
    /// These are configuration or programming errors; callers should treat
    /// them as fatal for the current form.
    #[inline]
    #[must_use]
    pub fn is_catalog_mismatch(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Context resolution errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No schema for this section in the target's schema family
    #[error("no schema for section '{section}' on {target}")]
    NotFound {
        /// Requested target
        target: Target,
        /// Requested section
        section: String,
    },

    /// Target VM is not in the scenario
    #[error("VM not found: {0}")]
    VmNotFound(VmId),

    /// Store lookup failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Form write-back errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    /// Payload does not carry a value under the section key
    #[error("payload has no value for section '{0}'")]
    MissingSectionPayload(String),

    /// Renderer snapshot lacks identity fields or has the wrong types
    #[error("invalid form snapshot: {0}")]
    InvalidSnapshot(String),

    /// A section guard refused the value
    #[error("rejected by {guard}: {failure}")]
    Rejected {
        /// Guard name
        guard: &'static str,
        /// Failed rule
        failure: ValidationFailure,
    },

    /// Store mutation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Engine configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("invalid TOML: {0}")]
    InvalidToml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::SectionNotFound {
            id: VmId(2),
            section: "FEATURES".to_string(),
        };
        assert_eq!(err.to_string(), "VM 2 has no section 'FEATURES'");
    }

    #[test]
    fn catalog_mismatch_classification() {
        assert!(StoreError::NotFound("X".to_string()).is_catalog_mismatch());
        assert!(!StoreError::VmNotFound(VmId(1)).is_catalog_mismatch());
    }

    #[test]
    fn resolve_error_from_store() {
        let err: ResolveError = StoreError::NotFound("MEMORY".to_string()).into();
        assert!(matches!(err, ResolveError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn resolve_not_found_display() {
        let err = ResolveError::NotFound {
            target: Target::Vm(VmId(1)),
            section: "os_config".to_string(),
        };
        assert_eq!(err.to_string(), "no schema for section 'os_config' on vm 1");
    }
}

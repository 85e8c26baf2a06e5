//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Behavior switches for the binding engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Surface `VmNotFound` from VM section writes instead of a silent no-op
    pub strict_vm_writes: bool,
    /// Hide fields that only match `additionalProperties`
    pub hide_additional_properties: bool,
    /// Run section guards before every write
    pub enforce_resource_guards: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns error if the TOML is invalid
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// With strict VM writes
    #[inline]
    #[must_use]
    pub fn with_strict_vm_writes(mut self, strict: bool) -> Self {
        self.strict_vm_writes = strict;
        self
    }

    /// With additional-property hiding
    #[inline]
    #[must_use]
    pub fn with_hide_additional_properties(mut self, hide: bool) -> Self {
        self.hide_additional_properties = hide;
        self
    }

    /// With resource guard enforcement
    #[inline]
    #[must_use]
    pub fn with_resource_guards(mut self, enforce: bool) -> Self {
        self.enforce_resource_guards = enforce;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_vm_writes: false,
            hide_additional_properties: true,
            enforce_resource_guards: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::new();
        assert!(!config.strict_vm_writes);
        assert!(config.hide_additional_properties);
        assert!(config.enforce_resource_guards);
    }

    #[test]
    fn from_partial_toml() {
        let config = EngineConfig::from_toml("strict_vm_writes = true").unwrap();
        assert!(config.strict_vm_writes);
        assert!(config.hide_additional_properties);
    }

    #[test]
    fn from_empty_toml() {
        assert_eq!(EngineConfig::from_toml("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn invalid_toml() {
        assert!(EngineConfig::from_toml("strict_vm_writes = ").is_err());
        assert!(EngineConfig::from_toml("strict_vm_writes = \"yes\"").is_err());
    }

    #[test]
    fn builders() {
        let config = EngineConfig::new()
            .with_strict_vm_writes(true)
            .with_hide_additional_properties(false)
            .with_resource_guards(false);
        assert!(config.strict_vm_writes);
        assert!(!config.hide_additional_properties);
        assert!(!config.enforce_resource_guards);
    }
}

//! Canonical in-memory scenario
//!
//! [`ScenarioStore`] owns the one mutable scenario of an editing session.
//! VMs are addressed by [`VmId`] only; their position in the sequence is
//! never used for matching.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use scenario_model::{is_reserved_section, LoadOrder, ScenarioConfig, VmConfig, VmId};
use scenario_schema::SchemaCatalog;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::StoreError;

/// Read result for a known hypervisor section that has no value yet
static UNSET: Value = Value::Null;

/// Result of a VM section write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WriteOutcome {
    /// The section was replaced
    Applied,
    /// No VM had the id in the requested family; nothing changed
    VmMissing,
}

impl WriteOutcome {
    /// Check if the write changed the scenario
    #[inline]
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Owner of the editing session's scenario
#[derive(Debug, Clone)]
pub struct ScenarioStore {
    catalog: Arc<SchemaCatalog>,
    scenario: ScenarioConfig,
    config: EngineConfig,
}

impl ScenarioStore {
    /// Create a store over a loaded scenario
    #[inline]
    #[must_use]
    pub fn new(catalog: Arc<SchemaCatalog>, scenario: ScenarioConfig) -> Self {
        Self {
            catalog,
            scenario,
            config: EngineConfig::default(),
        }
    }

    /// With engine configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Schema catalog the store checks section keys against
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current value of a hypervisor section
    ///
    /// A section the catalog knows but the scenario has not set reads as
    /// `null`.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if the catalog has no such hypervisor section
    pub fn hypervisor_section(&self, section: &str) -> Result<&Value, StoreError> {
        if !self.catalog.has_hypervisor_section(section) {
            return Err(StoreError::NotFound(section.to_string()));
        }
        Ok(self.scenario.hypervisor_section(section).unwrap_or(&UNSET))
    }

    /// Current value of a VM section
    ///
    /// # Errors
    /// [`StoreError::VmNotFound`] if no VM has the id,
    /// [`StoreError::SectionNotFound`] if the VM lacks the section
    pub fn vm_section(&self, id: VmId, section: &str) -> Result<&Value, StoreError> {
        let vm = self.scenario.vm(id).ok_or(StoreError::VmNotFound(id))?;
        vm.section(section).ok_or_else(|| StoreError::SectionNotFound {
            id,
            section: section.to_string(),
        })
    }

    /// Replace a hypervisor section
    ///
    /// No schema validation happens here.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if the catalog has no such hypervisor section
    pub fn set_hypervisor_section(&mut self, section: &str, value: Value) -> Result<(), StoreError> {
        if !self.catalog.has_hypervisor_section(section) {
            return Err(StoreError::NotFound(section.to_string()));
        }
        tracing::debug!("Replacing hypervisor section {}", section);
        self.scenario.set_hypervisor_section(section, value);
        Ok(())
    }

    /// Replace a VM section in place
    ///
    /// A missing VM is a silent no-op reported as
    /// [`WriteOutcome::VmMissing`], unless
    /// [`EngineConfig::strict_vm_writes`] is set.
    ///
    /// # Errors
    /// - [`StoreError::ReservedSection`] if the section name is a VM
    ///   identity key
    /// - [`StoreError::VmNotFound`] for a missing VM in strict mode only
    pub fn set_vm_section(
        &mut self,
        id: VmId,
        section: &str,
        value: Value,
    ) -> Result<WriteOutcome, StoreError> {
        self.write_vm_section(id, None, section, value)
    }

    /// Replace a section of a VM looked up within one schema family
    ///
    /// Like [`ScenarioStore::set_vm_section`], but a VM whose
    /// `hidden.load_order` is not `load_order` counts as missing.
    ///
    /// # Errors
    /// As [`ScenarioStore::set_vm_section`]; in strict mode a family mismatch
    /// is [`StoreError::LoadOrderMismatch`]
    pub fn set_vm_section_in(
        &mut self,
        id: VmId,
        load_order: LoadOrder,
        section: &str,
        value: Value,
    ) -> Result<WriteOutcome, StoreError> {
        self.write_vm_section(id, Some(load_order), section, value)
    }

    fn write_vm_section(
        &mut self,
        id: VmId,
        load_order: Option<LoadOrder>,
        section: &str,
        value: Value,
    ) -> Result<WriteOutcome, StoreError> {
        if is_reserved_section(section) {
            return Err(StoreError::ReservedSection(section.to_string()));
        }
        let strict = self.config.strict_vm_writes;

        let Some(vm) = self.scenario.vm_mut(id) else {
            if strict {
                return Err(StoreError::VmNotFound(id));
            }
            tracing::warn!("Dropping write to section {} of missing VM {}", section, id);
            return Ok(WriteOutcome::VmMissing);
        };

        if let Some(requested) = load_order {
            let actual = vm.hidden().load_order;
            if requested != actual {
                if strict {
                    return Err(StoreError::LoadOrderMismatch { id, requested, actual });
                }
                tracing::warn!(
                    "Dropping write to section {} of VM {}: edit is for {}, VM is {}",
                    section,
                    id,
                    requested,
                    actual
                );
                return Ok(WriteOutcome::VmMissing);
            }
        }

        tracing::debug!("Replacing section {} of VM {}", section, id);
        vm.set_section(section, value)
            .map_err(|_| StoreError::ReservedSection(section.to_string()))?;
        Ok(WriteOutcome::Applied)
    }

    /// Current scenario, for schema and context resolution
    ///
    /// This is the live state, not a snapshot taken at load.
    #[inline]
    #[must_use]
    pub fn origin_scenario_data(&self) -> &ScenarioConfig {
        &self.scenario
    }

    /// Add a VM
    ///
    /// # Errors
    /// [`StoreError::DuplicateVm`] if the id is taken
    pub fn add_vm(&mut self, vm: VmConfig) -> Result<(), StoreError> {
        let id = vm.id();
        self.scenario
            .push_vm(vm)
            .map_err(|_| StoreError::DuplicateVm(id))?;
        tracing::info!("Added VM {}", id);
        Ok(())
    }

    /// Remove a VM
    pub fn remove_vm(&mut self, id: VmId) -> Option<VmConfig> {
        let removed = self.scenario.remove_vm(id);
        if removed.is_some() {
            tracing::info!("Removed VM {}", id);
        }
        removed
    }

    /// VM ids in scenario order
    #[must_use]
    pub fn vm_ids(&self) -> Vec<VmId> {
        self.scenario.vms().map(VmConfig::id).collect()
    }

    /// Known VM names in scenario order
    #[must_use]
    pub fn vm_names(&self) -> Vec<String> {
        self.scenario.vm_names().into_iter().map(str::to_string).collect()
    }

    /// Take the scenario out of the store
    #[inline]
    #[must_use]
    pub fn into_scenario(self) -> ScenarioConfig {
        self.scenario
    }
}

/// Store shared between event sources
///
/// Writers are serialized by the lock, so edits from different sources keep
/// last-write-wins ordering per section.
#[derive(Debug, Clone)]
pub struct SharedScenarioStore {
    inner: Arc<RwLock<ScenarioStore>>,
}

impl SharedScenarioStore {
    /// Wrap a store
    #[inline]
    #[must_use]
    pub fn new(store: ScenarioStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Shared read access
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, ScenarioStore> {
        self.inner.read()
    }

    /// Exclusive write access
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, ScenarioStore> {
        self.inner.write()
    }

    /// Clone of the current scenario
    #[must_use]
    pub fn snapshot(&self) -> ScenarioConfig {
        self.inner.read().origin_scenario_data().clone()
    }
}

//! Scenario aggregate: hypervisor sections and per-VM configuration
//!
//! The serialized shape follows the scenario document the configurator loads:
//!
//! ```text
//! {
//!   "hv": { "<SECTION>": <value>, ... },
//!   "vm": [ { "@id": 0, "load_order": "SERVICE_VM",
//!             "hidden": { "load_order": "SERVICE_VM" },
//!             "<SECTION>": <value>, ... }, ... ]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;
use crate::ids::VmId;
use crate::load_order::LoadOrder;

/// Section name → arbitrary configuration tree
pub type SectionMap = serde_json::Map<String, Value>;

/// Section holding a VM's display name
const NAME_SECTION: &str = "name";

/// Keys a VM entry uses for its identity; never valid section names
pub const RESERVED_VM_KEYS: [&str; 3] = ["@id", "load_order", "hidden"];

/// Derived metadata stored alongside a VM
///
/// Carries the load order again because schema lookup reads it from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenMeta {
    /// Mirror of [`VmConfig::load_order`]
    pub load_order: LoadOrder,
}

/// One virtual machine's configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVmConfig")]
pub struct VmConfig {
    #[serde(rename = "@id")]
    id: VmId,
    load_order: LoadOrder,
    hidden: HiddenMeta,
    #[serde(flatten)]
    sections: SectionMap,
}

impl VmConfig {
    /// Create an empty VM of the given class
    #[inline]
    #[must_use]
    pub fn new(id: VmId, load_order: LoadOrder) -> Self {
        Self {
            id,
            load_order,
            hidden: HiddenMeta { load_order },
            sections: SectionMap::new(),
        }
    }

    /// With an initial section value
    ///
    /// A name in [`RESERVED_VM_KEYS`] is ignored.
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>, value: Value) -> Self {
        let section = section.into();
        if !is_reserved_section(&section) {
            self.sections.insert(section, value);
        }
        self
    }

    /// Stable identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> VmId {
        self.id
    }

    /// Load order class
    #[inline]
    #[must_use]
    pub fn load_order(&self) -> LoadOrder {
        self.load_order
    }

    /// Derived metadata
    #[inline]
    #[must_use]
    pub fn hidden(&self) -> &HiddenMeta {
        &self.hidden
    }

    /// Change the load order, keeping the hidden copy in sync
    pub fn set_load_order(&mut self, load_order: LoadOrder) {
        self.load_order = load_order;
        self.hidden.load_order = load_order;
    }

    /// VM name, when the `name` section holds a string
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.sections.get(NAME_SECTION).and_then(Value::as_str)
    }

    /// Get a section value
    #[inline]
    #[must_use]
    pub fn section(&self, section: &str) -> Option<&Value> {
        self.sections.get(section)
    }

    /// Replace a section value, returning the previous one
    ///
    /// # Errors
    /// [`ModelError::ReservedSection`] if the name is one of
    /// [`RESERVED_VM_KEYS`]; the VM is unchanged
    pub fn set_section(&mut self, section: impl Into<String>, value: Value) -> Result<Option<Value>, ModelError> {
        let section = section.into();
        if is_reserved_section(&section) {
            return Err(ModelError::ReservedSection(section));
        }
        Ok(self.sections.insert(section, value))
    }

    /// All sections
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &SectionMap {
        &self.sections
    }
}

/// Check if a name collides with a VM identity key
#[inline]
#[must_use]
pub fn is_reserved_section(section: &str) -> bool {
    RESERVED_VM_KEYS.contains(&section)
}

/// Wire form accepted on input: either load order copy may be missing
///
/// The identity keys are named fields, so they never land in `sections`.
#[derive(Deserialize)]
struct RawVmConfig {
    #[serde(rename = "@id")]
    id: VmId,
    #[serde(default)]
    load_order: Option<LoadOrder>,
    #[serde(default)]
    hidden: Option<HiddenMeta>,
    #[serde(flatten)]
    sections: SectionMap,
}

impl TryFrom<RawVmConfig> for VmConfig {
    type Error = ModelError;

    fn try_from(raw: RawVmConfig) -> Result<Self, Self::Error> {
        // The hidden copy is the one schema lookup trusts.
        let load_order = raw
            .hidden
            .map(|h| h.load_order)
            .or(raw.load_order)
            .ok_or(ModelError::MissingLoadOrder(raw.id))?;

        Ok(Self {
            id: raw.id,
            load_order,
            hidden: HiddenMeta { load_order },
            sections: raw.sections,
        })
    }
}

/// Root scenario aggregate
///
/// VMs are kept in insertion order and indexed by [`VmId`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(rename = "hv", default)]
    hypervisor: SectionMap,
    #[serde(rename = "vm", default, with = "vm_sequence")]
    vms: IndexMap<VmId, VmConfig>,
}

impl ScenarioConfig {
    /// Create an empty scenario
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a JSON document
    ///
    /// # Errors
    /// Returns error if JSON is invalid, a VM lacks a load order or VM ids repeat
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode from a JSON value
    ///
    /// # Errors
    /// Same as [`ScenarioConfig::from_json`]
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to a JSON value
    ///
    /// # Errors
    /// Returns error if serialization fails (not expected for JSON trees)
    pub fn to_value(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Hypervisor sections
    #[inline]
    #[must_use]
    pub fn hypervisor(&self) -> &SectionMap {
        &self.hypervisor
    }

    /// Get a hypervisor section value
    #[inline]
    #[must_use]
    pub fn hypervisor_section(&self, section: &str) -> Option<&Value> {
        self.hypervisor.get(section)
    }

    /// Replace a hypervisor section value, returning the previous one
    #[inline]
    pub fn set_hypervisor_section(
        &mut self,
        section: impl Into<String>,
        value: Value,
    ) -> Option<Value> {
        self.hypervisor.insert(section.into(), value)
    }

    /// Append a VM
    ///
    /// # Errors
    /// Returns [`ModelError::DuplicateVmId`] if the id is taken
    pub fn push_vm(&mut self, vm: VmConfig) -> Result<(), ModelError> {
        if self.vms.contains_key(&vm.id) {
            return Err(ModelError::DuplicateVmId(vm.id));
        }
        self.vms.insert(vm.id, vm);
        Ok(())
    }

    /// Remove a VM, preserving the order of the rest
    pub fn remove_vm(&mut self, id: VmId) -> Option<VmConfig> {
        self.vms.shift_remove(&id)
    }

    /// Look up a VM by id
    #[inline]
    #[must_use]
    pub fn vm(&self, id: VmId) -> Option<&VmConfig> {
        self.vms.get(&id)
    }

    /// Look up a VM by id for in-place mutation
    #[inline]
    pub fn vm_mut(&mut self, id: VmId) -> Option<&mut VmConfig> {
        self.vms.get_mut(&id)
    }

    /// VMs in scenario order
    pub fn vms(&self) -> impl Iterator<Item = &VmConfig> {
        self.vms.values()
    }

    /// Number of VMs
    #[inline]
    #[must_use]
    pub fn vm_count(&self) -> usize {
        self.vms.len()
    }

    /// Names of all VMs that have one, in scenario order
    #[must_use]
    pub fn vm_names(&self) -> Vec<&str> {
        self.vms.values().filter_map(VmConfig::name).collect()
    }
}

/// Serialize the VM arena as the ordered sequence the document uses
mod vm_sequence {
    use indexmap::IndexMap;
    use serde::de::Error as _;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::VmConfig;
    use crate::ids::VmId;

    pub(super) fn serialize<S>(vms: &IndexMap<VmId, VmConfig>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(vms.len()))?;
        for vm in vms.values() {
            seq.serialize_element(vm)?;
        }
        seq.end()
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<IndexMap<VmId, VmConfig>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Vec::<VmConfig>::deserialize(deserializer)?;
        let mut vms = IndexMap::with_capacity(list.len());
        for vm in list {
            let id = vm.id();
            if vms.insert(id, vm).is_some() {
                return Err(D::Error::custom(format!("duplicate VM id: {id}")));
            }
        }
        Ok(vms)
    }
}

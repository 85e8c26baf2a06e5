//! IVSHMEM shared-memory resource table
//!
//! Lives inside a section value (usually `FEATURES`) as:
//!
//! ```text
//! IVSHMEM:
//!   IVSHMEM_REGION: [
//!     { NAME, PROVIDED_BY?, IVSHMEM_SIZE?,
//!       IVSHMEM_VMS: { IVSHMEM_VM: [ { VM_NAME, VBDF }, ... ] } },
//!     ...
//!   ]
//! ```
//!
//! Keys the model does not know about are carried through untouched. A
//! `null` `VM_NAME` or `VBDF` reads as unset, and a list holding one element
//! may be collapsed to that element.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::bdf::Bdf;
use crate::error::ModelError;

const IVSHMEM_KEY: &str = "IVSHMEM";
const REGION_KEY: &str = "IVSHMEM_REGION";

/// One VM's attachment to a shared-memory region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IvshmemSlot {
    /// Attached VM name; empty when unset
    #[serde(rename = "VM_NAME", default, deserialize_with = "null_as_empty")]
    pub vm_name: String,
    /// Virtual BDF text as entered; empty when unset
    #[serde(rename = "VBDF", default, deserialize_with = "null_as_empty")]
    pub bdf: String,
    /// Pass-through keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IvshmemSlot {
    /// Create a slot from a VM name and BDF text
    #[must_use]
    pub fn new(vm_name: impl Into<String>, bdf: impl Into<String>) -> Self {
        Self {
            vm_name: vm_name.into(),
            bdf: bdf.into(),
            extra: Map::new(),
        }
    }

    /// Check if neither field is set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vm_name.is_empty() && self.bdf.is_empty()
    }

    /// Parsed BDF, if set and well formed
    #[inline]
    #[must_use]
    pub fn parsed_bdf(&self) -> Option<Bdf> {
        self.bdf.parse().ok()
    }
}

/// Slot list wrapper matching the `IVSHMEM_VMS` node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IvshmemVms {
    /// Slots in display order
    #[serde(rename = "IVSHMEM_VM", default, deserialize_with = "one_or_many")]
    pub slots: Vec<IvshmemSlot>,
    /// Pass-through keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shared-memory region with its attached VM slots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IvshmemRegion {
    /// Region name
    #[serde(rename = "NAME", default)]
    pub name: String,
    /// Provider (`Hypervisor` or `Device Model`)
    #[serde(rename = "PROVIDED_BY", default, skip_serializing_if = "Option::is_none")]
    pub provided_by: Option<String>,
    /// Attached VMs
    #[serde(rename = "IVSHMEM_VMS", default)]
    pub vms: IvshmemVms,
    /// Pass-through keys (size, etc.)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IvshmemRegion {
    /// Create an empty region
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With a slot appended, without any checks
    #[must_use]
    pub fn with_slot(mut self, slot: IvshmemSlot) -> Self {
        self.vms.slots.push(slot);
        self
    }

    /// Slots in display order
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[IvshmemSlot] {
        &self.vms.slots
    }

    /// Mutable slot list
    #[inline]
    pub fn slots_mut(&mut self) -> &mut Vec<IvshmemSlot> {
        &mut self.vms.slots
    }

    /// Check if a slot other than `except` uses this VM name
    #[must_use]
    pub fn vm_name_taken(&self, name: &str, except: Option<usize>) -> bool {
        !name.is_empty()
            && self
                .slots()
                .iter()
                .enumerate()
                .any(|(i, s)| Some(i) != except && s.vm_name == name)
    }

    /// Check if a slot other than `except` uses this address
    #[must_use]
    pub fn bdf_taken(&self, bdf: Bdf, except: Option<usize>) -> bool {
        self.slots()
            .iter()
            .enumerate()
            .any(|(i, s)| Some(i) != except && s.parsed_bdf() == Some(bdf))
    }
}

/// All shared-memory regions of one section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IvshmemTable {
    /// Regions in display order
    pub regions: Vec<IvshmemRegion>,
}

impl IvshmemTable {
    /// Extract the table from a section value
    ///
    /// Looks for `IVSHMEM.IVSHMEM_REGION`, then for `IVSHMEM_REGION` at the
    /// root (when the section is the `IVSHMEM` node itself). Returns `None`
    /// when neither is present.
    ///
    /// # Errors
    /// [`ModelError::InvalidResourceTable`] if the region list is present but
    /// does not have the expected shape
    pub fn from_section(section: &Value) -> Result<Option<Self>, ModelError> {
        let Some(list) = Self::region_node(section) else {
            return Ok(None);
        };
        let regions = one_or_many(list.clone())
            .map_err(|e| ModelError::InvalidResourceTable(e.to_string()))?;
        Ok(Some(Self { regions }))
    }

    /// Write the table back into a section value
    ///
    /// Only the region list is replaced; sibling keys are untouched. A region
    /// list that was collapsed to one object stays an object while it holds
    /// exactly one region. Slot lists are always written as arrays, unset
    /// slot fields as `""`, and a region read without `NAME` or `IVSHMEM_VMS`
    /// gets them back with empty values.
    ///
    /// # Errors
    /// Returns error if the regions cannot be serialized
    pub fn write_into(&self, section: &mut Value) -> Result<(), ModelError> {
        let collapsed = matches!(Self::region_node(section), Some(Value::Object(_)));
        let regions = match self.regions.as_slice() {
            [only] if collapsed => serde_json::to_value(only)?,
            regions => serde_json::to_value(regions)?,
        };

        if let Some(node) = section.get_mut(IVSHMEM_KEY).and_then(Value::as_object_mut) {
            node.insert(REGION_KEY.to_string(), regions);
            return Ok(());
        }
        if let Some(root) = section.as_object_mut() {
            if root.contains_key(REGION_KEY) {
                root.insert(REGION_KEY.to_string(), regions);
            } else {
                let mut node = Map::new();
                node.insert(REGION_KEY.to_string(), regions);
                root.insert(IVSHMEM_KEY.to_string(), Value::Object(node));
            }
            return Ok(());
        }

        let mut node = Map::new();
        node.insert(REGION_KEY.to_string(), regions);
        let mut root = Map::new();
        root.insert(IVSHMEM_KEY.to_string(), Value::Object(node));
        *section = Value::Object(root);
        Ok(())
    }

    /// Find a region by name
    #[must_use]
    pub fn region(&self, name: &str) -> Option<&IvshmemRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Find a region by name for mutation
    pub fn region_mut(&mut self, name: &str) -> Option<&mut IvshmemRegion> {
        self.regions.iter_mut().find(|r| r.name == name)
    }

    fn region_node(section: &Value) -> Option<&Value> {
        section
            .get(IVSHMEM_KEY)
            .and_then(|node| node.get(REGION_KEY))
            .or_else(|| section.get(REGION_KEY))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
    })
}

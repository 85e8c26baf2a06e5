//! VM identifiers and edit targets

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Wire value of the hypervisor target
pub const HYPERVISOR_TARGET_ID: i64 = -1;

/// Stable VM identifier
///
/// Opaque: it is never a position in the VM sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VmId(pub u16);

impl Display for VmId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for VmId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// Which slice of the scenario an edit or lookup addresses
///
/// On the wire this is a single integer with `-1` meaning the hypervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Target {
    /// Hypervisor-global configuration
    Hypervisor,
    /// A specific VM
    Vm(VmId),
}

impl Target {
    /// Decode a raw target id
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidTarget`] for negative ids other than `-1`
    /// and for ids beyond the VM id range.
    pub fn from_raw(raw: i64) -> Result<Self, ModelError> {
        if raw == HYPERVISOR_TARGET_ID {
            return Ok(Self::Hypervisor);
        }
        u16::try_from(raw)
            .map(|id| Self::Vm(VmId(id)))
            .map_err(|_| ModelError::InvalidTarget(raw))
    }

    /// Raw wire value
    #[inline]
    #[must_use]
    pub fn raw(self) -> i64 {
        match self {
            Self::Hypervisor => HYPERVISOR_TARGET_ID,
            Self::Vm(id) => i64::from(id.0),
        }
    }

    /// VM id, if this targets a VM
    #[inline]
    #[must_use]
    pub fn vm_id(self) -> Option<VmId> {
        match self {
            Self::Hypervisor => None,
            Self::Vm(id) => Some(id),
        }
    }

    /// Check if this targets the hypervisor
    #[inline]
    #[must_use]
    pub fn is_hypervisor(self) -> bool {
        matches!(self, Self::Hypervisor)
    }
}

impl TryFrom<i64> for Target {
    type Error = ModelError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

impl From<Target> for i64 {
    fn from(target: Target) -> Self {
        target.raw()
    }
}

impl From<VmId> for Target {
    fn from(id: VmId) -> Self {
        Self::Vm(id)
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hypervisor => f.write_str("hypervisor"),
            Self::Vm(id) => write!(f, "vm {id}"),
        }
    }
}

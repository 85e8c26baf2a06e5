//! VM load order classes

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Boot/priority class of a VM
///
/// Selects which schema family applies to the VM's sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LoadOrder {
    /// Launched by the hypervisor before the service VM
    #[serde(rename = "PRE_LAUNCHED_VM", alias = "pre-launched")]
    PreLaunched,
    /// The service VM hosting the device model
    #[serde(rename = "SERVICE_VM", alias = "service")]
    Service,
    /// Launched later by the service VM
    #[serde(rename = "POST_LAUNCHED_VM", alias = "post-launched")]
    PostLaunched,
}

impl LoadOrder {
    /// All classes, in boot order
    pub const ALL: [Self; 3] = [Self::PreLaunched, Self::Service, Self::PostLaunched];

    /// Canonical text form
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreLaunched => "PRE_LAUNCHED_VM",
            Self::Service => "SERVICE_VM",
            Self::PostLaunched => "POST_LAUNCHED_VM",
        }
    }
}

impl Display for LoadOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadOrder {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "pre-launched-vm" | "pre-launched" => Ok(Self::PreLaunched),
            "service-vm" | "service" => Ok(Self::Service),
            "post-launched-vm" | "post-launched" => Ok(Self::PostLaunched),
            _ => Err(ModelError::UnknownLoadOrder(s.to_string())),
        }
    }
}

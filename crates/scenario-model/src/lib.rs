//! Scenario Data Model
//!
//! Typed representation of a hypervisor scenario as edited by the configurator.
//!
//! # Core Concepts
//!
//! - [`ScenarioConfig`]: Root aggregate (hypervisor sections + ordered VMs)
//! - [`VmConfig`]: One virtual machine, identified by a stable [`VmId`]
//! - [`LoadOrder`]: Boot/priority class selecting a VM's schema family
//! - [`Target`]: Either the hypervisor or a specific VM
//! - [`IvshmemTable`]: Shared-memory regions and their VM slots
//! - [`Bdf`]: PCI `bus:device.function` address
//!
//! # Example
//!
//! ```rust
//! use scenario_model::{LoadOrder, ScenarioConfig, VmConfig, VmId};
//! use serde_json::json;
//!
//! let mut scenario = ScenarioConfig::new();
//! scenario.set_hypervisor_section("DEBUG_OPTIONS", json!({"BUILD_TYPE": "release"}));
//! scenario
//!     .push_vm(VmConfig::new(VmId(0), LoadOrder::Service).with_section("name", json!("VM0")))
//!     .unwrap();
//!
//! assert_eq!(scenario.vm(VmId(0)).and_then(VmConfig::name), Some("VM0"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod bdf;
mod error;
mod ids;
mod ivshmem;
mod load_order;
mod scenario;

pub use bdf::Bdf;
pub use error::{ModelError, ValidationFailure};
pub use ids::{Target, VmId, HYPERVISOR_TARGET_ID};
pub use ivshmem::{IvshmemRegion, IvshmemSlot, IvshmemTable, IvshmemVms};
pub use load_order::LoadOrder;
pub use scenario::{is_reserved_section, HiddenMeta, ScenarioConfig, SectionMap, VmConfig, RESERVED_VM_KEYS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with scenario data
    pub use crate::{
        Bdf, IvshmemRegion, IvshmemSlot, IvshmemTable, LoadOrder, ModelError, ScenarioConfig,
        SectionMap, Target, ValidationFailure, VmConfig, VmId,
    };
}

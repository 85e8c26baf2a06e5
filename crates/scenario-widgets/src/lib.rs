//! Scenario Widgets
//!
//! Field-level guards for IVSHMEM resource slots: invariants a JSON-Schema
//! validator cannot express.
//!
//! - [`VmNameSelector`]: a VM may attach to a region at most once
//! - [`BdfTextField`]: only well-formed, unused virtual BDFs are committed
//! - [`SlotState`]: classification of a slot; only `Valid` slots commit
//! - [`IvshmemGuard`]: the same rules on the store's write path
//!
//! Failures stop here; they are shown inline and never reach the store.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod bdf_field;
mod error;
mod guard;
mod selector;
mod slot;

pub use bdf_field::BdfTextField;
pub use error::WidgetError;
pub use guard::IvshmemGuard;
pub use selector::VmNameSelector;
pub use slot::{RegionEditor, SlotState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for resource widgets
    pub use crate::{BdfTextField, IvshmemGuard, RegionEditor, SlotState, VmNameSelector, WidgetError};
    pub use scenario_model::{IvshmemRegion, IvshmemSlot, ValidationFailure};
}

//! Scenario Store
//!
//! The data-binding core between schema-driven forms and the in-memory
//! scenario.
//!
//! # Core Operations
//!
//! - **Resolve**: [`ContextResolver`] picks the schema, layout hints and
//!   initial data for the hypervisor or one VM
//! - **Write back**: [`FormSyncEngine`] replaces exactly one section of the
//!   [`ScenarioStore`] per edit
//!
//! # Architecture
//!
//! ```text
//! ContextResolver → (schema, hints, form data) → renderer → EditRequest
//!        ↑                                                      ↓
//!   ScenarioStore  ←──────────── FormSyncEngine (+ SectionGuards)
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use scenario_model::{ScenarioConfig, Target};
//! use scenario_schema::SchemaCatalog;
//! use scenario_store::{ContextResolver, EditRequest, FormSyncEngine, ScenarioStore};
//! use serde_json::json;
//!
//! let catalog = SchemaCatalog::builder()
//!     .hypervisor_section("DEBUG_OPTIONS", json!({"type": "object"}))
//!     .build()
//!     .unwrap();
//! let mut scenario = ScenarioConfig::new();
//! scenario.set_hypervisor_section("DEBUG_OPTIONS", json!({"BUILD_TYPE": "release"}));
//! let mut store = ScenarioStore::new(Arc::new(catalog), scenario);
//!
//! let context = ContextResolver::new()
//!     .resolve(&store, Target::Hypervisor, "DEBUG_OPTIONS")
//!     .unwrap();
//! assert_eq!(context.form_data.value, json!({"BUILD_TYPE": "release"}));
//!
//! let edit = EditRequest::hypervisor("DEBUG_OPTIONS", json!({"BUILD_TYPE": "debug"}));
//! FormSyncEngine::new().apply(&mut store, &edit).unwrap();
//! assert_eq!(
//!     store.hypervisor_section("DEBUG_OPTIONS").unwrap(),
//!     &json!({"BUILD_TYPE": "debug"})
//! );
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod resolver;
pub mod store;
pub mod sync;

pub use config::EngineConfig;
pub use error::{ConfigError, ResolveError, StoreError, SyncError};
pub use resolver::{ContextResolver, FormData, ResolvedContext};
pub use store::{ScenarioStore, SharedScenarioStore, WriteOutcome};
pub use sync::{EditRequest, FormSyncEngine, SectionGuard};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for binding forms to a scenario
    pub use crate::config::EngineConfig;
    pub use crate::error::{ResolveError, StoreError, SyncError};
    pub use crate::resolver::{ContextResolver, FormData, ResolvedContext};
    pub use crate::store::{ScenarioStore, SharedScenarioStore, WriteOutcome};
    pub use crate::sync::{EditRequest, FormSyncEngine, SectionGuard};
    pub use scenario_model::{LoadOrder, ScenarioConfig, Target, VmConfig, VmId};
    pub use scenario_schema::SchemaCatalog;
}

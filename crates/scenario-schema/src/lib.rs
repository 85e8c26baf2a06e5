//! Scenario Schema Layer
//!
//! Read-only schema lookup and presentation hints for scenario forms.
//!
//! # Core Concepts
//!
//! - [`SchemaCatalog`]: Hypervisor and per-load-order section schemas,
//!   loaded once and shared as `Arc<SchemaCatalog>`
//! - [`LayoutOverrideEngine`]: Builds [`LayoutHints`] that sit on top of a
//!   schema without touching it
//! - [`WidgetKind`]: Closed set of widgets a hint can select
//!
//! # Example
//!
//! ```rust
//! use scenario_schema::{LayoutOverrideEngine, SchemaCatalog, WidgetKind};
//! use serde_json::json;
//!
//! let catalog = SchemaCatalog::from_value(json!({
//!     "hv": {"DEBUG_OPTIONS": {
//!         "type": "object",
//!         "properties": {"BUILD_TYPE": {"enum": ["release", "debug"]}}
//!     }},
//!     "vm": {}
//! }))
//! .unwrap();
//!
//! let schema = catalog.hypervisor_schema("DEBUG_OPTIONS").unwrap();
//! let hints = LayoutOverrideEngine::new().overrides_for("DEBUG_OPTIONS", schema);
//! assert_eq!(hints.property("BUILD_TYPE").unwrap().hint.widget, WidgetKind::Radio);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod catalog;
pub mod error;
pub mod layout;

pub use catalog::{SchemaCatalog, SchemaCatalogBuilder};
pub use error::CatalogError;
pub use layout::{
    LabelAlign, LayoutHints, LayoutOverrideEngine, LayoutRule, NodeHint, PathSegment, WidgetKind,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

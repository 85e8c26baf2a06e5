//! Context resolution
//!
//! Picks the schema, layout hints and initial data for one section of either
//! the hypervisor or a single VM. The VM's schema family comes from
//! `hidden.load_order`.

use scenario_model::{LoadOrder, Target};
use scenario_schema::{LayoutHints, LayoutOverrideEngine};
use serde_json::{json, Map, Value};

use crate::config::EngineConfig;
use crate::error::ResolveError;
use crate::store::ScenarioStore;

/// Initial data handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct FormData {
    /// Whose data this is
    pub target: Target,
    /// Section being edited
    pub section: String,
    /// Schema family; `None` for the hypervisor
    pub load_order: Option<LoadOrder>,
    /// Current section value, `null` if never set
    pub value: Value,
}

impl FormData {
    /// Render in the renderer's snapshot shape
    ///
    /// `{"VMID": n, "mode": section, "load_order": ..., <section>: value}`;
    /// `load_order` is omitted for the hypervisor.
    #[must_use]
    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        document.insert("VMID".to_string(), json!(self.target.raw()));
        document.insert("mode".to_string(), json!(self.section));
        if let Some(order) = self.load_order {
            document.insert("load_order".to_string(), json!(order.as_str()));
        }
        document.insert(self.section.clone(), self.value.clone());
        Value::Object(document)
    }
}

/// Everything the renderer needs for one form
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContext {
    /// Section schema, unmodified
    pub schema: Value,
    /// Presentation hints mirroring the schema
    pub layout: LayoutHints,
    /// Initial data
    pub form_data: FormData,
}

impl ResolvedContext {
    /// Form data in the renderer's snapshot shape
    #[inline]
    #[must_use]
    pub fn to_form_document(&self) -> Value {
        self.form_data.to_document()
    }

    /// Layout hints as a ui schema
    #[inline]
    #[must_use]
    pub fn ui_schema(&self) -> Value {
        self.layout.to_ui_schema()
    }
}

/// Resolves form contexts against a [`ScenarioStore`]
///
/// Stateless apart from its layout engine; one instance can serve every form.
#[derive(Debug, Clone, Default)]
pub struct ContextResolver {
    layout: LayoutOverrideEngine,
}

impl ContextResolver {
    /// Create a resolver with the built-in layout rules
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a custom layout engine
    #[inline]
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutOverrideEngine) -> Self {
        self.layout = layout;
        self
    }

    /// Create a resolver honoring engine configuration
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new().with_layout(
            LayoutOverrideEngine::new().with_hide_additional(config.hide_additional_properties),
        )
    }

    /// Resolve the form context for `section` of `target`
    ///
    /// # Errors
    /// - [`ResolveError::VmNotFound`] if the target VM is not in the scenario
    /// - [`ResolveError::NotFound`] if the target's schema family has no
    ///   such section
    pub fn resolve(
        &self,
        store: &ScenarioStore,
        target: Target,
        section: &str,
    ) -> Result<ResolvedContext, ResolveError> {
        let catalog = store.catalog();
        let not_found = || ResolveError::NotFound {
            target,
            section: section.to_string(),
        };

        let (schema, load_order, value) = match target {
            Target::Hypervisor => {
                let schema = catalog.hypervisor_schema(section).ok_or_else(not_found)?;
                let value = store.hypervisor_section(section)?;
                (schema, None, value.clone())
            }
            Target::Vm(id) => {
                let vm = store
                    .origin_scenario_data()
                    .vm(id)
                    .ok_or(ResolveError::VmNotFound(id))?;
                let order = vm.hidden().load_order;
                let schema = catalog.vm_schema(order, section).ok_or_else(not_found)?;
                let value = vm.section(section).cloned().unwrap_or(Value::Null);
                (schema, Some(order), value)
            }
        };

        tracing::debug!("Resolved section {} for {}", section, target);

        Ok(ResolvedContext {
            layout: self.layout.overrides_for(section, schema),
            schema: schema.clone(),
            form_data: FormData {
                target,
                section: section.to_string(),
                load_order,
                value,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use pretty_assertions::assert_eq;
    use scenario_model::{ScenarioConfig, VmConfig, VmId};
    use scenario_schema::{SchemaCatalog, WidgetKind};

    fn store() -> ScenarioStore {
        let catalog = SchemaCatalog::builder()
            .hypervisor_section(
                "DEBUG_OPTIONS",
                json!({
                    "type": "object",
                    "properties": {"BUILD_TYPE": {"type": "string", "enum": ["release", "debug"]}}
                }),
            )
            .vm_section(LoadOrder::PostLaunched, "FEATURES", json!({"type": "object"}))
            .vm_section(LoadOrder::Service, "os_config", json!({"type": "object"}))
            .build()
            .unwrap();

        let mut scenario = ScenarioConfig::new();
        scenario.set_hypervisor_section("DEBUG_OPTIONS", json!({"BUILD_TYPE": "release"}));
        scenario
            .push_vm(VmConfig::new(VmId(0), LoadOrder::Service).with_section("os_config", json!({"name": "sos"})))
            .unwrap();
        scenario
            .push_vm(VmConfig::new(VmId(2), LoadOrder::PostLaunched).with_section("FEATURES", json!({"rt": true})))
            .unwrap();
        ScenarioStore::new(Arc::new(catalog), scenario)
    }

    #[test]
    fn resolve_hypervisor() {
        let store = store();
        let context = ContextResolver::new()
            .resolve(&store, Target::Hypervisor, "DEBUG_OPTIONS")
            .unwrap();

        assert_eq!(context.form_data.value, json!({"BUILD_TYPE": "release"}));
        assert_eq!(context.form_data.load_order, None);
        assert_eq!(
            context.layout.property("BUILD_TYPE").map(|h| h.hint.widget),
            Some(WidgetKind::Radio)
        );
        assert_eq!(
            context.to_form_document(),
            json!({"VMID": -1, "mode": "DEBUG_OPTIONS", "DEBUG_OPTIONS": {"BUILD_TYPE": "release"}})
        );
    }

    #[test]
    fn resolve_vm_uses_load_order_family() {
        let store = store();
        let context = ContextResolver::new()
            .resolve(&store, Target::Vm(VmId(2)), "FEATURES")
            .unwrap();

        assert_eq!(context.form_data.load_order, Some(LoadOrder::PostLaunched));
        assert_eq!(context.form_data.value, json!({"rt": true}));
        assert_eq!(
            context.to_form_document(),
            json!({
                "VMID": 2,
                "mode": "FEATURES",
                "load_order": "POST_LAUNCHED_VM",
                "FEATURES": {"rt": true}
            })
        );
    }

    #[test]
    fn resolve_vm_section_from_other_family() {
        // VM 0 is a service VM; FEATURES only exists for post-launched VMs.
        let store = store();
        let err = ContextResolver::new()
            .resolve(&store, Target::Vm(VmId(0)), "FEATURES")
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn resolve_vm_unset_section_is_null() {
        let mut store = store();
        store
            .add_vm(VmConfig::new(VmId(3), LoadOrder::PostLaunched))
            .unwrap();
        let context = ContextResolver::new()
            .resolve(&store, Target::Vm(VmId(3)), "FEATURES")
            .unwrap();
        assert_eq!(context.form_data.value, Value::Null);
    }

    #[test]
    fn resolve_missing_vm() {
        let store = store();
        let err = ContextResolver::new()
            .resolve(&store, Target::Vm(VmId(99)), "FEATURES")
            .unwrap_err();
        assert_eq!(err, ResolveError::VmNotFound(VmId(99)));
    }

    #[test]
    fn resolve_unknown_hypervisor_section() {
        let store = store();
        let err = ContextResolver::new()
            .resolve(&store, Target::Hypervisor, "MEMORY")
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotFound {
                target: Target::Hypervisor,
                section: "MEMORY".to_string(),
            }
        );
    }

    #[test]
    fn resolve_reads_current_state() {
        let mut store = store();
        assert!(store
            .set_vm_section(VmId(2), "FEATURES", json!({"rt": false}))
            .unwrap()
            .is_applied());
        let context = ContextResolver::new()
            .resolve(&store, Target::Vm(VmId(2)), "FEATURES")
            .unwrap();
        assert_eq!(context.form_data.value, json!({"rt": false}));
    }
}
